//! The route decision table.

use committed_core::{CurrentUser, LegalAcceptanceStatus, Session};

/// Canonical routes the gate can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePath {
    /// Unauthenticated landing page.
    Landing,
    /// Sign-in screen.
    SignIn,
    /// Email-verification gate.
    VerifyEmail,
    /// Legal-acceptance flow.
    Legal,
    /// Onboarding flow.
    Onboarding,
    /// Password-reset screen.
    ResetPassword,
    /// Authenticated home.
    Home,
}

impl RoutePath {
    /// The path string the navigator understands.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutePath::Landing => "/",
            RoutePath::SignIn => "/sign-in",
            RoutePath::VerifyEmail => "/verify-email",
            RoutePath::Legal => "/legal",
            RoutePath::Onboarding => "/onboarding",
            RoutePath::ResetPassword => "/reset-password",
            RoutePath::Home => "/home",
        }
    }
}

/// The gate-relevant view of the loaded user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserGates {
    /// Whether the user's email address has been verified.
    pub email_verified: bool,
    /// Legal-document acceptance snapshot.
    pub legal: LegalAcceptanceStatus,
    /// Onboarding completion; None while still being determined.
    pub onboarding_complete: Option<bool>,
}

/// Input to [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteInput {
    /// Whether a session exists.
    pub has_session: bool,
    /// The loaded user record; None while it is still resolving.
    pub user: Option<UserGates>,
    /// Whether a password-recovery flow is in progress.
    pub password_recovery: bool,
}

impl RouteInput {
    /// Build resolver input from the live session state.
    pub fn from_state(
        session: Option<&Session>,
        user: Option<&CurrentUser>,
        password_recovery: bool,
    ) -> Self {
        Self {
            has_session: session.is_some(),
            user: user.map(|u| UserGates {
                email_verified: u.email_verified,
                legal: u.legal,
                onboarding_complete: u.onboarding_complete,
            }),
            password_recovery,
        }
    }
}

/// Compute the canonical route for the given auth state.
///
/// Pure and idempotent. `None` means "no decision yet": the caller must
/// keep waiting rather than guess. Rules are evaluated top-down and the
/// first match wins, so an ambiguous combination always lands on the most
/// restrictive applicable gate instead of leaking into the main app.
pub fn resolve(input: &RouteInput) -> Option<RoutePath> {
    // Recovery must not be interrupted by any other gating.
    if input.password_recovery {
        return Some(RoutePath::ResetPassword);
    }

    if !input.has_session {
        return Some(RoutePath::Landing);
    }

    // Session present but the user record has not settled yet.
    let user = input.user.as_ref()?;

    if !user.email_verified {
        return Some(RoutePath::VerifyEmail);
    }

    if user.legal == LegalAcceptanceStatus::Required {
        return Some(RoutePath::Legal);
    }

    match user.onboarding_complete {
        Some(false) => Some(RoutePath::Onboarding),
        None => None,
        Some(true) => Some(RoutePath::Home),
    }
}
