//! Pending-value cells.

use std::sync::Mutex;
use tracing::debug;

/// Process-wide pending values written by the URL-handling path and
/// consumed by whichever component completes the flow.
///
/// Each cell has one canonical writer role per transition even though the
/// setters are callable from anywhere; that convention is what keeps the
/// cells coherent without coordination.
pub struct TokenStore {
    /// Auth-type URL seen while no callback screen was mounted.
    /// Last write wins; cleared after a successful exchange.
    pending_auth_url: Mutex<Option<String>>,
    /// Route to replay after authentication completes (content links).
    pending_route: Mutex<Option<String>>,
    /// Referral code to replay once sign-up completes.
    pending_referral_code: Mutex<Option<String>>,
    /// Recovery intent captured synchronously before the originating URL
    /// hash can be lost to platform navigation.
    password_recovery: Mutex<bool>,
}

impl TokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            pending_auth_url: Mutex::new(None),
            pending_route: Mutex::new(None),
            pending_referral_code: Mutex::new(None),
            password_recovery: Mutex::new(false),
        }
    }

    /// Record an auth-type URL for a consumer that is not mounted yet.
    pub fn set_pending_auth_url(&self, url: impl Into<String>) {
        let url = url.into();
        debug!(url = %url, "Pending auth URL recorded");
        *self.pending_auth_url.lock().unwrap() = Some(url);
    }

    /// Read the pending auth URL without clearing it.
    pub fn peek_pending_auth_url(&self) -> Option<String> {
        self.pending_auth_url.lock().unwrap().clone()
    }

    /// Read and clear the pending auth URL.
    pub fn take_pending_auth_url(&self) -> Option<String> {
        self.pending_auth_url.lock().unwrap().take()
    }

    /// Record a route to replay after authentication completes.
    pub fn set_pending_route(&self, route: impl Into<String>) {
        let route = route.into();
        debug!(route = %route, "Pending route recorded");
        *self.pending_route.lock().unwrap() = Some(route);
    }

    /// Read the pending route without clearing it.
    pub fn peek_pending_route(&self) -> Option<String> {
        self.pending_route.lock().unwrap().clone()
    }

    /// Read and clear the pending route. A read always empties the cell,
    /// so a stored route can never be replayed twice.
    pub fn take_pending_route(&self) -> Option<String> {
        self.pending_route.lock().unwrap().take()
    }

    /// Record a referral code for replay once sign-up completes.
    pub fn set_pending_referral_code(&self, code: impl Into<String>) {
        let code = code.into();
        debug!(code = %code, "Pending referral code recorded");
        *self.pending_referral_code.lock().unwrap() = Some(code);
    }

    /// Read the pending referral code without clearing it.
    pub fn peek_pending_referral_code(&self) -> Option<String> {
        self.pending_referral_code.lock().unwrap().clone()
    }

    /// Read and clear the pending referral code.
    pub fn take_pending_referral_code(&self) -> Option<String> {
        self.pending_referral_code.lock().unwrap().take()
    }

    /// Mark that a password-recovery link has been seen.
    ///
    /// Must be called synchronously as soon as the recovery marker is
    /// detectable; the originating URL hash can be consumed by platform
    /// navigation before any asynchronous handler inspects it.
    pub fn mark_password_recovery(&self) {
        debug!("Password recovery marked");
        *self.password_recovery.lock().unwrap() = true;
    }

    /// Read the recovery flag without clearing it.
    pub fn peek_password_recovery(&self) -> bool {
        *self.password_recovery.lock().unwrap()
    }

    /// Read and clear the recovery flag.
    pub fn take_password_recovery(&self) -> bool {
        std::mem::take(&mut *self.password_recovery.lock().unwrap())
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_auth_url_last_write_wins() {
        let store = TokenStore::new();
        store.set_pending_auth_url("committed://auth-callback?token=a");
        store.set_pending_auth_url("committed://auth-callback?token=b");
        assert_eq!(
            store.peek_pending_auth_url().as_deref(),
            Some("committed://auth-callback?token=b")
        );
    }

    #[test]
    fn test_pending_route_get_and_clear() {
        let store = TokenStore::new();
        store.set_pending_route("/post/42");
        assert_eq!(store.take_pending_route().as_deref(), Some("/post/42"));
        assert_eq!(store.take_pending_route(), None);
    }

    #[test]
    fn test_peek_does_not_clear() {
        let store = TokenStore::new();
        store.set_pending_route("/reel/7");
        assert_eq!(store.peek_pending_route().as_deref(), Some("/reel/7"));
        assert_eq!(store.peek_pending_route().as_deref(), Some("/reel/7"));
        assert_eq!(store.take_pending_route().as_deref(), Some("/reel/7"));
    }

    #[test]
    fn test_referral_code_cell() {
        let store = TokenStore::new();
        assert_eq!(store.peek_pending_referral_code(), None);
        store.set_pending_referral_code("ABC123");
        assert_eq!(store.take_pending_referral_code().as_deref(), Some("ABC123"));
        assert_eq!(store.take_pending_referral_code(), None);
    }

    #[test]
    fn test_password_recovery_flag() {
        let store = TokenStore::new();
        assert!(!store.peek_password_recovery());

        store.mark_password_recovery();
        assert!(store.peek_password_recovery());
        assert!(store.peek_password_recovery());

        assert!(store.take_password_recovery());
        assert!(!store.peek_password_recovery());
        assert!(!store.take_password_recovery());
    }
}
