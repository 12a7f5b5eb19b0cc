//! Exchange orchestration for incoming URLs.
//!
//! One entry point per platform URL channel feeds into
//! [`LinkExchanger::handle_incoming_url`]; everything downstream is
//! idempotent, so the same physical URL delivered through several
//! channels produces exactly one exchange attempt.

use crate::link_fsm::{AuthLinkStore, LinkIntent};
use crate::provider::IdentityProvider;
use crate::{AuthError, AuthResult};
use committed_core::Session;
use deep_link::{parse, query_param, ParsedLink};
use std::sync::Arc;
use std::time::Duration;
use token_store::{CallbackGuard, TokenStore, PROCESSING_TIMEOUT};
use tracing::{debug, info, warn};

/// What handling an incoming URL did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Auth link exchanged for a session.
    SignedIn(Session),
    /// Auth link skipped: already exchanged, or an exchange is in flight.
    Skipped,
    /// Non-auth link recorded for replay after authentication.
    Recorded,
    /// Unrecognized URL; no deep-link action taken.
    Ignored,
}

/// Orchestrates the exchange of auth links for sessions.
pub struct LinkExchanger<P: IdentityProvider> {
    provider: P,
    store: Arc<TokenStore>,
    guard: Arc<CallbackGuard>,
    links: Arc<AuthLinkStore>,
    timeout: Duration,
}

impl<P: IdentityProvider> LinkExchanger<P> {
    /// Create an exchanger with the default processing timeout.
    pub fn new(
        provider: P,
        store: Arc<TokenStore>,
        guard: Arc<CallbackGuard>,
        links: Arc<AuthLinkStore>,
    ) -> Self {
        Self {
            provider,
            store,
            guard,
            links,
            timeout: PROCESSING_TIMEOUT,
        }
    }

    /// Create an exchanger with a custom processing timeout.
    pub fn with_timeout(
        provider: P,
        store: Arc<TokenStore>,
        guard: Arc<CallbackGuard>,
        links: Arc<AuthLinkStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            guard,
            links,
            timeout,
        }
    }

    /// Classify and handle one incoming URL from any platform channel.
    pub async fn handle_incoming_url(&self, raw: &str) -> AuthResult<LinkOutcome> {
        match parse(raw) {
            None => {
                debug!(url = %raw, "Ignoring unrecognized URL");
                Ok(LinkOutcome::Ignored)
            }
            Some(ParsedLink::Auth { raw }) => {
                // Capture recovery intent synchronously, before any await:
                // the originating hash can be consumed by platform
                // navigation once this handler yields.
                if LinkIntent::from_url(&raw) == LinkIntent::Recovery {
                    self.store.mark_password_recovery();
                }
                self.store.set_pending_auth_url(&raw);

                match self.exchange(&raw).await? {
                    Some(session) => Ok(LinkOutcome::SignedIn(session)),
                    None => Ok(LinkOutcome::Skipped),
                }
            }
            Some(ParsedLink::Post { id, .. }) => {
                self.store.set_pending_route(format!("/post/{id}"));
                Ok(LinkOutcome::Recorded)
            }
            Some(ParsedLink::Reel { id, .. }) => {
                self.store.set_pending_route(format!("/reel/{id}"));
                Ok(LinkOutcome::Recorded)
            }
            Some(ParsedLink::Referral { code, .. }) => {
                self.store.set_pending_referral_code(code);
                Ok(LinkOutcome::Recorded)
            }
        }
    }

    /// Exchange one auth URL for a session, at most once per URL string.
    ///
    /// Returns `Ok(None)` when the URL was silently absorbed (already
    /// exchanged, or a competing exchange is running). A duplicate is
    /// never an error.
    pub async fn exchange(&self, url: &str) -> AuthResult<Option<Session>> {
        if self.guard.was_processed(url) {
            debug!(url = %url, "Callback URL already exchanged, skipping");
            return Ok(None);
        }
        if self.guard.is_processing() {
            debug!(url = %url, "Exchange already in flight, skipping");
            return Ok(None);
        }

        let intent = LinkIntent::from_url(url);
        self.guard.set_processing(true);
        if let Err(e) = self.links.begin(intent) {
            self.guard.set_processing(false);
            return Err(e);
        }

        // Hash the URL once the attempt is dispatched, and only once.
        self.guard.mark_processed(url);

        let result = match tokio::time::timeout(self.timeout, self.dispatch(url, intent)).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::Timeout),
        };
        self.guard.set_processing(false);

        match result {
            Ok(session) => {
                self.links.succeed()?;
                self.store.take_pending_auth_url();
                info!(user_id = %session.user_id, intent = ?intent, "Auth link exchanged");
                Ok(Some(session))
            }
            Err(e) => {
                self.links.fail(e.to_string())?;
                warn!(error = %e, "Auth link exchange failed");
                Err(e)
            }
        }
    }

    /// Pick the provider call matching the URL's credential shape.
    async fn dispatch(&self, url: &str, intent: LinkIntent) -> AuthResult<Session> {
        if let Some(token) = query_param(url, "token") {
            self.provider.verify_link_token(&token, intent).await
        } else {
            self.provider.exchange_code_for_session(url).await
        }
    }
}
