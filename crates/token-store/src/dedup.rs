//! Callback de-duplication guard.
//!
//! The same physical URL can reach the app through up to three channels:
//! a live URL-opened event, the cold-start initial URL, and (on web) a
//! hash fragment re-read on mount. The provider exchanges a given link
//! token exactly once; a second attempt fails and must not surface as a
//! real error. The guard absorbs those duplicates.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// How many processed-URL hashes are retained. Oldest evicted first.
pub const PROCESSED_URL_CAPACITY: usize = 20;

/// Policy constant for callers racing an exchange against a deadline.
/// The guard itself runs no timers.
pub const PROCESSING_TIMEOUT: Duration = Duration::from_millis(12_000);

/// Idempotency guard over exchanged callback URLs.
///
/// Hashes are deliberately ephemeral (not persisted): cold-start URLs are
/// fresh per process lifetime. The hash is a cheap non-cryptographic one;
/// a collision reads as "already processed" and costs at worst a skipped
/// re-exchange.
pub struct CallbackGuard {
    /// FIFO ring of hashes of already-exchanged URLs.
    processed: Mutex<VecDeque<u64>>,
    /// Busy flag, distinct from the hash ring: set while an exchange is
    /// actively running so the gate can hold off competing redirects even
    /// for a URL not yet hashed.
    processing: Mutex<bool>,
}

fn hash_url(url: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    hasher.finish()
}

impl CallbackGuard {
    /// Create an empty guard.
    pub fn new() -> Self {
        Self {
            processed: Mutex::new(VecDeque::with_capacity(PROCESSED_URL_CAPACITY)),
            processing: Mutex::new(false),
        }
    }

    /// Whether this exact URL string was previously recorded as exchanged.
    pub fn was_processed(&self, url: &str) -> bool {
        let hash = hash_url(url);
        self.processed.lock().unwrap().contains(&hash)
    }

    /// Record a URL as exchanged, evicting the oldest entry at capacity.
    pub fn mark_processed(&self, url: &str) {
        let hash = hash_url(url);
        let mut processed = self.processed.lock().unwrap();
        if processed.len() == PROCESSED_URL_CAPACITY {
            processed.pop_front();
        }
        processed.push_back(hash);
        debug!("Callback URL recorded: {:016x}", hash);
    }

    /// Whether an exchange is actively running.
    pub fn is_processing(&self) -> bool {
        *self.processing.lock().unwrap()
    }

    /// Set or clear the busy flag.
    pub fn set_processing(&self, processing: bool) {
        *self.processing.lock().unwrap() = processing;
    }
}

impl Default for CallbackGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_then_was_processed() {
        let guard = CallbackGuard::new();
        let url = "committed://auth-callback?type=verify&token=abc";

        assert!(!guard.was_processed(url));
        guard.mark_processed(url);
        assert!(guard.was_processed(url));
        assert!(!guard.was_processed("committed://auth-callback?type=verify&token=def"));
    }

    #[test]
    fn test_fifo_eviction() {
        let guard = CallbackGuard::new();
        let url_for = |i: usize| format!("https://committed.app/auth-callback?token=t{i}");

        for i in 0..PROCESSED_URL_CAPACITY {
            guard.mark_processed(&url_for(i));
        }
        assert!(guard.was_processed(&url_for(0)));

        // One past capacity evicts the oldest entry only.
        guard.mark_processed(&url_for(PROCESSED_URL_CAPACITY));
        assert!(!guard.was_processed(&url_for(0)));
        assert!(guard.was_processed(&url_for(1)));
        assert!(guard.was_processed(&url_for(PROCESSED_URL_CAPACITY)));
    }

    #[test]
    fn test_processing_flag() {
        let guard = CallbackGuard::new();
        assert!(!guard.is_processing());

        guard.set_processing(true);
        assert!(guard.is_processing());

        guard.set_processing(false);
        assert!(!guard.is_processing());
    }

    #[test]
    fn test_processing_flag_independent_of_hashes() {
        let guard = CallbackGuard::new();
        guard.set_processing(true);
        assert!(!guard.was_processed("committed://auth-callback?token=x"));
    }

    #[test]
    fn test_timeout_constant() {
        assert_eq!(PROCESSING_TIMEOUT, Duration::from_millis(12_000));
    }
}
