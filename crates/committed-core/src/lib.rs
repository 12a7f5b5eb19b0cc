//! Core configuration, logging, and shared data model for the Committed
//! auth-link and session-routing engine.
//!
//! This crate provides:
//! - Compile-time-defaulted configuration for the hosted identity provider
//! - Logging initialization shared by the CLI and test harnesses
//! - The session and profile records the routing core consumes

mod config;
mod error;
mod logging;
mod types;

pub use config::{
    Config, DEFAULT_API_URL, DEFAULT_APP_SCHEME, DEFAULT_LOG_LEVEL, DEFAULT_PUBLISHABLE_KEY,
    DEFAULT_WEB_ORIGIN,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use types::{CurrentUser, LegalAcceptanceStatus, Session};
