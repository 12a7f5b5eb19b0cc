//! Parsed deep-link intents.

use serde::{Deserialize, Serialize};

/// Structured intent extracted from a raw URL.
///
/// Every variant carries the original raw URL for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParsedLink {
    /// Verification/recovery/OAuth-callback link that must be exchanged
    /// for a session.
    Auth {
        /// Original URL as delivered by the platform.
        raw: String,
    },
    /// Referral link carrying an invite code.
    Referral {
        /// The referral code.
        code: String,
        /// Original URL as delivered by the platform.
        raw: String,
    },
    /// Shared post link.
    Post {
        /// Post identifier.
        id: String,
        /// Original URL as delivered by the platform.
        raw: String,
    },
    /// Shared reel link.
    Reel {
        /// Reel identifier.
        id: String,
        /// Original URL as delivered by the platform.
        raw: String,
    },
}

impl ParsedLink {
    /// The original URL this intent was parsed from.
    pub fn raw(&self) -> &str {
        match self {
            ParsedLink::Auth { raw }
            | ParsedLink::Referral { raw, .. }
            | ParsedLink::Post { raw, .. }
            | ParsedLink::Reel { raw, .. } => raw,
        }
    }

    /// The in-app route a content link replays to, if this is one.
    pub fn content_route(&self) -> Option<String> {
        match self {
            ParsedLink::Post { id, .. } => Some(format!("/post/{id}")),
            ParsedLink::Reel { id, .. } => Some(format!("/reel/{id}")),
            _ => None,
        }
    }
}
