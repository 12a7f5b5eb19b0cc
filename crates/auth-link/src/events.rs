//! Session-state bookkeeping driven by provider auth events.
//!
//! The app-wide context owns the current session and the derived user
//! record; this module is the single place that applies the provider's
//! auth-state callbacks to it. The one non-obvious rule lives here: an
//! invalid refresh token clears the session instead of retrying.

use crate::AuthError;
use committed_core::{CurrentUser, Session};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Auth-state change reported by the identity provider.
#[derive(Debug)]
pub enum AuthStateEvent {
    /// A session was established (sign-in, sign-up, or link exchange).
    SignedIn(Session),
    /// The provider transparently rotated the session.
    TokenRefreshed(Session),
    /// The session ended.
    SignedOut,
    /// A transparent refresh failed.
    RefreshFailed(AuthError),
}

/// Holder of the hydration flag, current session, and derived user.
///
/// Starts hydrating; the shell calls [`SessionState::finish_hydration`]
/// once the initial session read has settled, whatever it found.
pub struct SessionState {
    session: Mutex<Option<Session>>,
    current_user: Mutex<Option<CurrentUser>>,
    hydrating: Mutex<bool>,
}

impl SessionState {
    /// Create a hydrating state with no session.
    pub fn new() -> Self {
        Self {
            session: Mutex::new(None),
            current_user: Mutex::new(None),
            hydrating: Mutex::new(true),
        }
    }

    /// Whether the initial session read is still in flight.
    pub fn is_hydrating(&self) -> bool {
        *self.hydrating.lock().unwrap()
    }

    /// Mark initial hydration complete.
    pub fn finish_hydration(&self) {
        debug!("Session hydration complete");
        *self.hydrating.lock().unwrap() = false;
    }

    /// Current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    /// Current user record, if loaded.
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.current_user.lock().unwrap().clone()
    }

    /// Store the user record derived from the session's user id.
    pub fn set_current_user(&self, user: CurrentUser) {
        *self.current_user.lock().unwrap() = Some(user);
    }

    /// Drop the session and, with it, the derived user record.
    pub fn clear(&self) {
        *self.session.lock().unwrap() = None;
        *self.current_user.lock().unwrap() = None;
    }

    /// Apply one provider auth event.
    pub fn apply(&self, event: AuthStateEvent) {
        match event {
            AuthStateEvent::SignedIn(session) | AuthStateEvent::TokenRefreshed(session) => {
                debug!(user_id = %session.user_id, "Session updated");
                *self.session.lock().unwrap() = Some(session);
            }
            AuthStateEvent::SignedOut => {
                info!("Signed out");
                self.clear();
            }
            AuthStateEvent::RefreshFailed(error) => {
                if matches!(error, AuthError::InvalidRefreshToken) {
                    // Revoked or rotated-away token: retrying forever would
                    // strand the user. Clear and let routing fall to landing.
                    warn!("Refresh token invalid, clearing session");
                    self.clear();
                } else {
                    warn!(error = %error, "Transient refresh failure, keeping session");
                }
            }
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> Session {
        Session {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            user_id: "user-1".to_string(),
            email: None,
            email_confirmed_at: None,
            expires_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn test_user() -> CurrentUser {
        CurrentUser {
            id: "user-1".to_string(),
            email_verified: true,
            is_banned: false,
            legal: committed_core::LegalAcceptanceStatus::Accepted,
            onboarding_complete: Some(true),
        }
    }

    #[test]
    fn test_starts_hydrating_without_session() {
        let state = SessionState::new();
        assert!(state.is_hydrating());
        assert!(state.session().is_none());

        state.finish_hydration();
        assert!(!state.is_hydrating());
    }

    #[test]
    fn test_signed_in_then_out() {
        let state = SessionState::new();
        state.apply(AuthStateEvent::SignedIn(test_session()));
        state.set_current_user(test_user());
        assert!(state.session().is_some());
        assert!(state.current_user().is_some());

        state.apply(AuthStateEvent::SignedOut);
        assert!(state.session().is_none());
        // The derived user record goes with the session.
        assert!(state.current_user().is_none());
    }

    #[test]
    fn test_invalid_refresh_token_clears_session() {
        let state = SessionState::new();
        state.apply(AuthStateEvent::SignedIn(test_session()));
        state.set_current_user(test_user());

        state.apply(AuthStateEvent::RefreshFailed(AuthError::InvalidRefreshToken));
        assert!(state.session().is_none());
        assert!(state.current_user().is_none());
    }

    #[test]
    fn test_transient_refresh_failure_keeps_session() {
        let state = SessionState::new();
        state.apply(AuthStateEvent::SignedIn(test_session()));

        state.apply(AuthStateEvent::RefreshFailed(AuthError::NetworkUnavailable));
        assert!(state.session().is_some());
    }

    #[test]
    fn test_token_refreshed_replaces_session() {
        let state = SessionState::new();
        state.apply(AuthStateEvent::SignedIn(test_session()));

        let mut rotated = test_session();
        rotated.access_token = "at-2".to_string();
        state.apply(AuthStateEvent::TokenRefreshed(rotated));
        assert_eq!(state.session().unwrap().access_token, "at-2");
    }
}
