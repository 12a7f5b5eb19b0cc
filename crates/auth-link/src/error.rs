//! Auth-link error types.

use thiserror::Error;

/// Error type for link exchange and provider calls.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The link token was rejected as invalid or expired. Not retried
    /// automatically; the user must request a new link.
    #[error("Link invalid or expired: {0}")]
    ExpiredLink(String),

    /// Exchange failed for a reason other than token validity.
    #[error("Exchange failed: {0}")]
    Exchange(String),

    /// The provider rejected the session's refresh token. The session
    /// must be cleared rather than retried.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Invalid transition in the link state machine
    #[error("Invalid auth link state transition: {0}")]
    InvalidStateTransition(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Exchange did not complete within the processing window
    #[error("Operation timed out")]
    Timeout,

    /// Network unavailable (transient error, can retry)
    #[error("Network unavailable")]
    NetworkUnavailable,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Returns true if this error is transient and the operation can be retried.
    ///
    /// Transient errors include:
    /// - Network unavailable
    /// - HTTP errors with 5xx status codes
    /// - Connection timeouts
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::NetworkUnavailable => true,
            AuthError::Timeout => true,
            AuthError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
