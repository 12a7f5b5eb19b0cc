//! Auth-link state machine using rust-fsm.
//!
//! Tracks the lifecycle of an in-flight recovery/verification link
//! exchange so dependent screens never render a false "expired" state
//! while an exchange triggered by a different component is still running.
//!
//! ## State Diagram
//!
//! ```text
//! ┌──────────┐  Begin   ┌──────────────┐
//! │   Idle   │ ───────► │  Processing  │
//! └──────────┘          └──────┬───────┘
//!      ▲                       │ Succeed / Fail
//!      │ Reset                 ▼
//! ┌────┴─────────────────────────────┐
//! │        Success / Error           │
//! └──────────────────────────────────┘
//!            │ Begin (retry, clears stale error)
//!            ▼
//!        Processing
//! ```
//!
//! The store is process-wide on purpose: status must persist across
//! screen remounts until the consumer explicitly resets it.

use crate::{AuthError, AuthResult};
use rust_fsm::*;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::debug;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub link_machine(Idle)

    Idle => {
        Begin => Processing
    },
    Processing => {
        Succeed => Success,
        Fail => Error
    },
    Success => {
        Reset => Idle,
        Begin => Processing
    },
    Error => {
        Reset => Idle,
        Begin => Processing
    }
}

// Re-export the generated types with clearer names
pub use link_machine::Input as LinkMachineInput;
pub use link_machine::State as LinkMachineState;
pub use link_machine::StateMachine as LinkMachine;

/// What the auth link is for. Selected by the link's `type` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkIntent {
    /// Password-recovery link.
    Recovery,
    /// Email-verification link.
    Verify,
}

impl LinkIntent {
    /// Derive the intent from a raw auth URL.
    pub fn from_url(raw: &str) -> Self {
        if raw.contains("type=recovery") {
            LinkIntent::Recovery
        } else {
            LinkIntent::Verify
        }
    }

    /// The provider's wire name for this verification type.
    pub fn wire_type(&self) -> &'static str {
        match self {
            LinkIntent::Recovery => "recovery",
            LinkIntent::Verify => "email",
        }
    }
}

/// Simplified status view for consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// No exchange seen since the last reset.
    Idle,
    /// An exchange is in flight.
    Processing,
    /// The last exchange produced a session.
    Success,
    /// The last exchange failed.
    Error,
}

impl From<&LinkMachineState> for LinkStatus {
    fn from(state: &LinkMachineState) -> Self {
        match state {
            LinkMachineState::Idle => LinkStatus::Idle,
            LinkMachineState::Processing => LinkStatus::Processing,
            LinkMachineState::Success => LinkStatus::Success,
            LinkMachineState::Error => LinkStatus::Error,
        }
    }
}

/// Snapshot of the link exchange state.
///
/// `intent` and `error` are meaningful only outside `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthLinkSnapshot {
    /// Current status.
    pub status: LinkStatus,
    /// What the in-flight or settled link was for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<LinkIntent>,
    /// Human-readable failure message when status is `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Callback type for status change notifications.
pub type LinkStateCallback = Box<dyn Fn(AuthLinkSnapshot) + Send + Sync>;

struct Inner {
    machine: LinkMachine,
    intent: Option<LinkIntent>,
    error: Option<String>,
}

/// Process-wide holder of the link exchange status.
///
/// State persists across screen remounts; the consumer resets it
/// explicitly after fully handling a terminal state.
pub struct AuthLinkStore {
    inner: Mutex<Inner>,
    state_callback: Mutex<Option<LinkStateCallback>>,
}

impl AuthLinkStore {
    /// Create a store in the `Idle` state.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                machine: LinkMachine::new(),
                intent: None,
                error: None,
            }),
            state_callback: Mutex::new(None),
        }
    }

    /// Set a callback to be notified of status changes.
    pub fn set_state_callback(&self, callback: LinkStateCallback) {
        let mut cb = self.state_callback.lock().unwrap();
        *cb = Some(callback);
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> AuthLinkSnapshot {
        let inner = self.inner.lock().unwrap();
        AuthLinkSnapshot {
            status: LinkStatus::from(inner.machine.state()),
            intent: inner.intent,
            error: inner.error.clone(),
        }
    }

    /// Current status.
    pub fn status(&self) -> LinkStatus {
        LinkStatus::from(self.inner.lock().unwrap().machine.state())
    }

    /// Begin an exchange. Always clears any stale error so a retry never
    /// shows the previous failure.
    pub fn begin(&self, intent: LinkIntent) -> AuthResult<()> {
        self.transition(&LinkMachineInput::Begin, |inner| {
            inner.intent = Some(intent);
            inner.error = None;
        })
    }

    /// Record a successful exchange.
    pub fn succeed(&self) -> AuthResult<()> {
        self.transition(&LinkMachineInput::Succeed, |_| {})
    }

    /// Record a failed exchange with a user-facing message.
    pub fn fail(&self, message: impl Into<String>) -> AuthResult<()> {
        let message = message.into();
        self.transition(&LinkMachineInput::Fail, move |inner| {
            inner.error = Some(message);
        })
    }

    /// Reset to `Idle` after the consumer has fully handled a terminal
    /// state. Clears intent and error.
    pub fn reset(&self) -> AuthResult<()> {
        self.transition(&LinkMachineInput::Reset, |inner| {
            inner.intent = None;
            inner.error = None;
        })
    }

    fn transition<F>(&self, input: &LinkMachineInput, apply: F) -> AuthResult<()>
    where
        F: FnOnce(&mut Inner),
    {
        let mut inner = self.inner.lock().unwrap();
        let old_status = LinkStatus::from(inner.machine.state());

        inner.machine.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                inner.machine.state()
            ))
        })?;

        apply(&mut inner);

        let snapshot = AuthLinkSnapshot {
            status: LinkStatus::from(inner.machine.state()),
            intent: inner.intent,
            error: inner.error.clone(),
        };
        drop(inner);

        if old_status != snapshot.status {
            debug!(
                old_status = ?old_status,
                new_status = ?snapshot.status,
                "Auth link status transition"
            );
            let cb = self.state_callback.lock().unwrap();
            if let Some(callback) = cb.as_ref() {
                callback(snapshot);
            }
        }

        Ok(())
    }
}

impl Default for AuthLinkStore {
    fn default() -> Self {
        Self::new()
    }
}
