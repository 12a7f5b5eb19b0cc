//! Shared data model consumed by the link-exchange and routing crates.

use serde::{Deserialize, Serialize};

/// Authenticated session issued by the identity provider.
///
/// Opaque credential bundle: created by sign-in, sign-up, or a link-token
/// exchange; destroyed on sign-out or when the provider reports an invalid
/// refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for provider REST calls.
    pub access_token: String,
    /// Token used by the provider's transparent refresh.
    pub refresh_token: String,
    /// User UUID this session belongs to.
    pub user_id: String,
    /// User email if available.
    #[serde(default)]
    pub email: Option<String>,
    /// When the email was confirmed (RFC 3339), if it has been.
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
    /// Session expiry (RFC 3339).
    pub expires_at: String,
}

impl Session {
    /// Whether the provider has recorded an email confirmation for this session.
    pub fn email_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// Acceptance status of the required legal documents.
///
/// Unrecognized wire values deserialize to `Required` so an ambiguous
/// snapshot never skips the legal gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalAcceptanceStatus {
    /// All required documents accepted.
    Accepted,
    /// At least one required document is unaccepted or state is unknown.
    Required,
}

impl<'de> serde::Deserialize<'de> for LegalAcceptanceStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(match value.as_str() {
            "accepted" => LegalAcceptanceStatus::Accepted,
            _ => LegalAcceptanceStatus::Required,
        })
    }
}

/// Profile record derived from the backing user row, keyed by the
/// session's user id. Becomes unavailable whenever the session does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User UUID.
    pub id: String,
    /// Whether the user's email address has been verified.
    pub email_verified: bool,
    /// Whether the account is banned.
    #[serde(default)]
    pub is_banned: bool,
    /// Snapshot of legal-document acceptance.
    pub legal: LegalAcceptanceStatus,
    /// Whether onboarding has been completed; None while still being determined.
    #[serde(default)]
    pub onboarding_complete: Option<bool>,
}
