//! The app gate orchestrator.

use crate::resolver::{resolve, RouteInput, RoutePath};
use auth_link::{AuthLinkStore, LinkStatus};
use committed_core::{CurrentUser, Session};
use std::sync::{Arc, Mutex};
use token_store::{CallbackGuard, TokenStore};
use tracing::debug;

/// Platform navigation collaborator. `replace` swaps the current route
/// without growing history.
pub trait Navigator {
    fn replace(&self, route: &str);
}

/// What the gate renders for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRender {
    /// Placeholder while session/user state is resolving.
    Loading,
    /// The wrapped screen tree.
    Children,
}

/// The gate's view of the world at evaluation time.
#[derive(Debug, Clone, Copy)]
pub struct GateSnapshot<'a> {
    /// Whether the initial session read is still in flight.
    pub hydrating: bool,
    /// Current session, if any.
    pub session: Option<&'a Session>,
    /// Loaded user record; None while resolving.
    pub current_user: Option<&'a CurrentUser>,
    /// Route currently on screen.
    pub current_route: &'a str,
}

/// The single component allowed to issue auth-driven navigation.
///
/// Issues at most one `replace` per genuine state transition: repeated
/// evaluations for the same resolved state are suppressed, and nothing
/// navigates while hydration or a link exchange is in flight.
pub struct AppGate<N: Navigator> {
    navigator: N,
    store: Arc<TokenStore>,
    guard: Arc<CallbackGuard>,
    links: Arc<AuthLinkStore>,
    /// Target of the redirect already issued for the current state.
    last_redirect: Mutex<Option<String>>,
    /// Tracks the auth->unauth edge that re-arms redirect suppression.
    was_authenticated: Mutex<bool>,
}

/// Routes an unauthenticated user may sit on without being redirected.
fn unauth_allowed(route: &str) -> bool {
    route == RoutePath::Landing.as_str()
        || route == RoutePath::SignIn.as_str()
        || route == RoutePath::Legal.as_str()
        || route.starts_with("/legal/")
}

/// Whether a replayable shared-content route looks like one.
fn is_content_route(route: &str) -> bool {
    route.starts_with("/post/") || route.starts_with("/reel/")
}

/// Gates a pending content link may override once satisfied-enough:
/// onboarding and legal can wait, an unverified email cannot.
fn content_route_may_override(resolved: RoutePath) -> bool {
    matches!(
        resolved,
        RoutePath::Legal | RoutePath::Onboarding | RoutePath::Home
    )
}

impl<N: Navigator> AppGate<N> {
    /// Create a gate around the given collaborators.
    pub fn new(
        navigator: N,
        store: Arc<TokenStore>,
        guard: Arc<CallbackGuard>,
        links: Arc<AuthLinkStore>,
    ) -> Self {
        Self {
            navigator,
            store,
            guard,
            links,
            last_redirect: Mutex::new(None),
            was_authenticated: Mutex::new(false),
        }
    }

    /// Evaluate the current state: decide what to render and issue at
    /// most one navigation call.
    pub fn evaluate(&self, snapshot: &GateSnapshot<'_>) -> GateRender {
        if snapshot.hydrating {
            return GateRender::Loading;
        }

        let link_busy =
            self.guard.is_processing() || self.links.status() == LinkStatus::Processing;

        if snapshot.session.is_none() {
            {
                let mut was = self.was_authenticated.lock().unwrap();
                if *was {
                    *was = false;
                    self.last_redirect.lock().unwrap().take();
                }
            }

            if link_busy {
                // An exchange may be about to produce a session; a landing
                // redirect now would race it.
                return GateRender::Children;
            }

            let route = snapshot.current_route;
            if route == RoutePath::VerifyEmail.as_str()
                || route == RoutePath::ResetPassword.as_str()
            {
                // Recovery surfaces are not valid without starting auth.
                self.redirect_once(route, RoutePath::SignIn.as_str());
            } else if !unauth_allowed(route) {
                self.redirect_once(route, RoutePath::Landing.as_str());
            }
            return GateRender::Children;
        }

        *self.was_authenticated.lock().unwrap() = true;

        let input = RouteInput::from_state(
            snapshot.session,
            snapshot.current_user,
            self.store.peek_password_recovery(),
        );
        let Some(resolved) = resolve(&input) else {
            // Session present but the user record is still settling.
            return GateRender::Loading;
        };

        let target = if content_route_may_override(resolved) {
            match self.store.peek_pending_route() {
                Some(pending) if is_content_route(&pending) => {
                    // Consume only when actually used.
                    self.store.take_pending_route().unwrap_or(pending)
                }
                _ => resolved.as_str().to_string(),
            }
        } else {
            resolved.as_str().to_string()
        };

        self.redirect_once(snapshot.current_route, &target);
        GateRender::Children
    }

    /// Issue a redirect unless the user is already there or the same
    /// redirect was already issued for the current state.
    fn redirect_once(&self, current: &str, target: &str) {
        if current == target {
            return;
        }
        let mut last = self.last_redirect.lock().unwrap();
        if last.as_deref() == Some(target) {
            return;
        }
        debug!(from = %current, to = %target, "Gate redirect");
        self.navigator.replace(target);
        *last = Some(target.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_link::LinkIntent;
    use committed_core::LegalAcceptanceStatus;

    struct RecordingNavigator {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingNavigator {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Navigator for RecordingNavigator {
        fn replace(&self, route: &str) {
            self.calls.lock().unwrap().push(route.to_string());
        }
    }

    fn gate() -> AppGate<RecordingNavigator> {
        AppGate::new(
            RecordingNavigator::new(),
            Arc::new(TokenStore::new()),
            Arc::new(CallbackGuard::new()),
            Arc::new(AuthLinkStore::new()),
        )
    }

    fn calls(gate: &AppGate<RecordingNavigator>) -> Vec<String> {
        gate.navigator.calls.lock().unwrap().clone()
    }

    fn session() -> Session {
        Session {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            user_id: "user-1".to_string(),
            email: None,
            email_confirmed_at: Some("2025-06-01T00:00:00Z".to_string()),
            expires_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn user(
        email_verified: bool,
        legal: LegalAcceptanceStatus,
        onboarding_complete: Option<bool>,
    ) -> CurrentUser {
        CurrentUser {
            id: "user-1".to_string(),
            email_verified,
            is_banned: false,
            legal,
            onboarding_complete,
        }
    }

    fn qualified_user() -> CurrentUser {
        user(true, LegalAcceptanceStatus::Accepted, Some(true))
    }

    #[test]
    fn test_hydrating_renders_loading_without_navigation() {
        let gate = gate();
        let render = gate.evaluate(&GateSnapshot {
            hydrating: true,
            session: None,
            current_user: None,
            current_route: "/home",
        });
        assert_eq!(render, GateRender::Loading);
        assert!(calls(&gate).is_empty());
    }

    #[test]
    fn test_unauth_on_landing_renders_children_without_redirect() {
        let gate = gate();
        let snapshot = GateSnapshot {
            hydrating: false,
            session: None,
            current_user: None,
            current_route: "/",
        };

        // Repeated renders must never produce a redirect loop.
        for _ in 0..3 {
            let render = gate.evaluate(&snapshot);
            assert_eq!(render, GateRender::Children);
        }
        assert!(calls(&gate).is_empty());
    }

    #[test]
    fn test_unauth_on_protected_route_redirects_to_landing_once() {
        let gate = gate();
        let snapshot = GateSnapshot {
            hydrating: false,
            session: None,
            current_user: None,
            current_route: "/home",
        };

        gate.evaluate(&snapshot);
        gate.evaluate(&snapshot);
        assert_eq!(calls(&gate), vec!["/".to_string()]);
    }

    #[test]
    fn test_unauth_recovery_screens_redirect_to_sign_in() {
        let gate = gate();
        gate.evaluate(&GateSnapshot {
            hydrating: false,
            session: None,
            current_user: None,
            current_route: "/reset-password",
        });
        assert_eq!(calls(&gate), vec!["/sign-in".to_string()]);
    }

    #[test]
    fn test_unauth_legal_routes_render_directly() {
        let gate = gate();
        gate.evaluate(&GateSnapshot {
            hydrating: false,
            session: None,
            current_user: None,
            current_route: "/legal/terms",
        });
        assert!(calls(&gate).is_empty());
    }

    #[test]
    fn test_unauth_defers_while_exchange_in_flight() {
        let gate = gate();
        gate.links.begin(LinkIntent::Recovery).unwrap();

        let render = gate.evaluate(&GateSnapshot {
            hydrating: false,
            session: None,
            current_user: None,
            current_route: "/auth-callback",
        });
        assert_eq!(render, GateRender::Children);
        assert!(calls(&gate).is_empty());
    }

    #[test]
    fn test_session_without_user_renders_loading() {
        let gate = gate();
        let s = session();
        let render = gate.evaluate(&GateSnapshot {
            hydrating: false,
            session: Some(&s),
            current_user: None,
            current_route: "/",
        });
        assert_eq!(render, GateRender::Loading);
        assert!(calls(&gate).is_empty());
    }

    #[test]
    fn test_recovery_flag_routes_to_reset_password() {
        let gate = gate();
        gate.store.mark_password_recovery();
        let s = session();
        let u = user(false, LegalAcceptanceStatus::Required, Some(false));

        gate.evaluate(&GateSnapshot {
            hydrating: false,
            session: Some(&s),
            current_user: Some(&u),
            current_route: "/",
        });
        assert_eq!(calls(&gate), vec!["/reset-password".to_string()]);
    }

    #[test]
    fn test_authenticated_gating_redirects_once() {
        let gate = gate();
        let s = session();
        let u = user(true, LegalAcceptanceStatus::Accepted, Some(false));
        let snapshot = GateSnapshot {
            hydrating: false,
            session: Some(&s),
            current_user: Some(&u),
            current_route: "/",
        };

        gate.evaluate(&snapshot);
        gate.evaluate(&snapshot);
        assert_eq!(calls(&gate), vec!["/onboarding".to_string()]);
    }

    #[test]
    fn test_already_on_resolved_route_does_not_navigate() {
        let gate = gate();
        let s = session();
        let u = qualified_user();

        gate.evaluate(&GateSnapshot {
            hydrating: false,
            session: Some(&s),
            current_user: Some(&u),
            current_route: "/home",
        });
        assert!(calls(&gate).is_empty());
    }

    #[test]
    fn test_pending_content_route_wins_over_onboarding() {
        let gate = gate();
        gate.store.set_pending_route("/reel/99");
        let s = session();
        let u = user(true, LegalAcceptanceStatus::Accepted, Some(false));

        gate.evaluate(&GateSnapshot {
            hydrating: false,
            session: Some(&s),
            current_user: Some(&u),
            current_route: "/",
        });
        assert_eq!(calls(&gate), vec!["/reel/99".to_string()]);
        // Consumed on use: the same link must not replay.
        assert_eq!(gate.store.peek_pending_route(), None);
    }

    #[test]
    fn test_pending_content_route_does_not_override_email_verification() {
        let gate = gate();
        gate.store.set_pending_route("/post/42");
        let s = session();
        let u = user(false, LegalAcceptanceStatus::Accepted, Some(true));

        gate.evaluate(&GateSnapshot {
            hydrating: false,
            session: Some(&s),
            current_user: Some(&u),
            current_route: "/",
        });
        assert_eq!(calls(&gate), vec!["/verify-email".to_string()]);
        // Kept for replay once the email gate clears.
        assert_eq!(gate.store.peek_pending_route().as_deref(), Some("/post/42"));
    }

    #[test]
    fn test_non_content_pending_route_is_not_replayed() {
        let gate = gate();
        gate.store.set_pending_route("/settings");
        let s = session();
        let u = qualified_user();

        gate.evaluate(&GateSnapshot {
            hydrating: false,
            session: Some(&s),
            current_user: Some(&u),
            current_route: "/",
        });
        assert_eq!(calls(&gate), vec!["/home".to_string()]);
    }

    #[test]
    fn test_suppression_resets_when_unauthenticated_again() {
        let gate = gate();
        let s = session();
        let u = qualified_user();
        let authed = GateSnapshot {
            hydrating: false,
            session: Some(&s),
            current_user: Some(&u),
            current_route: "/",
        };

        gate.evaluate(&authed);
        assert_eq!(calls(&gate), vec!["/home".to_string()]);

        // Sign out while sitting on a protected route.
        gate.evaluate(&GateSnapshot {
            hydrating: false,
            session: None,
            current_user: None,
            current_route: "/home",
        });
        assert_eq!(calls(&gate), vec!["/home".to_string(), "/".to_string()]);

        // Sign back in: the earlier /home redirect must not be suppressed.
        gate.evaluate(&authed);
        assert_eq!(
            calls(&gate),
            vec!["/home".to_string(), "/".to_string(), "/home".to_string()]
        );
    }
}
