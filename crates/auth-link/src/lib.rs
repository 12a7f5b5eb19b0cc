//! Auth-link exchange for the Committed routing engine.
//!
//! This crate provides:
//! - Explicit FSM-based status for in-flight link exchanges
//! - The identity-provider client (link-token verify, PKCE code exchange,
//!   user fetch, password update)
//! - The exchange orchestrator that converts an incoming URL into a
//!   session exactly once
//! - Session-state bookkeeping driven by provider auth events

mod error;
mod events;
mod exchange;
mod link_fsm;
mod provider;

pub use error::{AuthError, AuthResult};
pub use events::{AuthStateEvent, SessionState};
pub use exchange::{LinkExchanger, LinkOutcome};
pub use link_fsm::link_machine;
pub use link_fsm::{
    AuthLinkSnapshot, AuthLinkStore, LinkIntent, LinkMachine, LinkMachineInput, LinkMachineState,
    LinkStatus, LinkStateCallback,
};
pub use provider::{AuthApiClient, IdentityProvider};
