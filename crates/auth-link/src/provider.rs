//! Identity provider REST client.
//!
//! The hosted provider is an external collaborator: this module only
//! wraps its `/auth/v1/*` endpoints and maps failures into the crate's
//! error taxonomy. Nothing here owns auth state.

use crate::{AuthError, AuthResult, LinkIntent};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use committed_core::{CurrentUser, LegalAcceptanceStatus, Session};
use serde::Deserialize;
use tracing::{debug, warn};

/// Black-box identity provider operations the exchange flow depends on.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange the credentials embedded in an auth-callback URL
    /// (PKCE code or implicit-flow tokens) for a session.
    async fn exchange_code_for_session(&self, url: &str) -> AuthResult<Session>;

    /// Verify an emailed link token (recovery or verification) and
    /// exchange it for a session.
    async fn verify_link_token(&self, token: &str, intent: LinkIntent) -> AuthResult<Session>;

    /// Fetch the profile record for the session's user.
    async fn get_user(&self, access_token: &str) -> AuthResult<CurrentUser>;

    /// Set a new password for the authenticated user (recovery flow).
    async fn update_password(&self, access_token: &str, new_password: &str) -> AuthResult<()>;

    /// Invalidate the session server-side.
    async fn sign_out(&self, access_token: &str) -> AuthResult<()>;
}

/// Session payload returned by token endpoints.
#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: SessionUser,
}

#[derive(Debug, Deserialize)]
struct SessionUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<String>,
}

impl SessionResponse {
    fn into_session(self) -> Session {
        let expires_at = Utc::now() + Duration::seconds(self.expires_in);
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.user.id,
            email: self.user.email,
            email_confirmed_at: self.user.email_confirmed_at,
            expires_at: expires_at.to_rfc3339(),
        }
    }
}

/// User payload from the user endpoint.
#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email_confirmed_at: Option<String>,
    #[serde(default)]
    banned_until: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl UserResponse {
    fn into_current_user(self) -> CurrentUser {
        let legal = if self.user_metadata.get("legal_accepted").and_then(|v| v.as_bool())
            == Some(true)
        {
            LegalAcceptanceStatus::Accepted
        } else {
            LegalAcceptanceStatus::Required
        };
        CurrentUser {
            id: self.id,
            email_verified: self.email_confirmed_at.is_some(),
            is_banned: self.banned_until.is_some(),
            legal,
            onboarding_complete: self
                .user_metadata
                .get("onboarding_complete")
                .and_then(|v| v.as_bool()),
        }
    }
}

/// REST client for the hosted identity provider.
#[derive(Clone)]
pub struct AuthApiClient {
    http_client: reqwest::Client,
    api_url: String,
    publishable_key: String,
}

impl AuthApiClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_url` - The provider project URL (e.g., `https://auth.committed.app`)
    /// * `publishable_key` - The publishable API key
    pub fn new(api_url: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url: api_url.into(),
            publishable_key: publishable_key.into(),
        }
    }

    /// Build the auth API URL for an endpoint.
    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.api_url, endpoint)
    }

    /// Map a non-success response into the error taxonomy.
    ///
    /// 4xx on a token endpoint means the credential was rejected
    /// (expired/used link, or a dead refresh token); everything else is a
    /// generic exchange failure.
    async fn error_from_response(context: &str, response: reqwest::Response) -> AuthError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, context = %context, "Provider call failed");

        if status.is_client_error() {
            if body.contains("refresh_token") || body.contains("Refresh Token") {
                AuthError::InvalidRefreshToken
            } else {
                AuthError::ExpiredLink(format!("HTTP {status}: {body}"))
            }
        } else {
            AuthError::Exchange(format!("HTTP {status}: {body}"))
        }
    }
}

#[async_trait]
impl IdentityProvider for AuthApiClient {
    async fn exchange_code_for_session(&self, url: &str) -> AuthResult<Session> {
        if let Some(code) = param_anywhere(url, "code") {
            let exchange_url = self.auth_url("token?grant_type=pkce");
            debug!(url = %exchange_url, "Exchanging auth code for session");

            let response = self
                .http_client
                .post(&exchange_url)
                .header("apikey", &self.publishable_key)
                .header("Content-Type", "application/json")
                .json(&serde_json::json!({ "auth_code": code }))
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(Self::error_from_response("code exchange", response).await);
            }

            let data: SessionResponse = response.json().await?;
            return Ok(data.into_session());
        }

        // Implicit-flow links carry the session material directly.
        let access_token = param_anywhere(url, "access_token").ok_or_else(|| {
            AuthError::Exchange("URL carries no exchangeable credentials".to_string())
        })?;
        let refresh_token = param_anywhere(url, "refresh_token").unwrap_or_default();
        let expires_in = param_anywhere(url, "expires_in")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let user = self.get_user(&access_token).await?;
        let expires_at = Utc::now() + Duration::seconds(expires_in);

        Ok(Session {
            access_token,
            refresh_token,
            user_id: user.id,
            email: None,
            email_confirmed_at: user.email_verified.then(|| Utc::now().to_rfc3339()),
            expires_at: expires_at.to_rfc3339(),
        })
    }

    async fn verify_link_token(&self, token: &str, intent: LinkIntent) -> AuthResult<Session> {
        let verify_url = self.auth_url("verify");
        debug!(url = %verify_url, intent = ?intent, "Verifying link token");

        let response = self
            .http_client
            .post(&verify_url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "type": intent.wire_type(),
                "token_hash": token,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("link verify", response).await);
        }

        let data: SessionResponse = response.json().await?;
        Ok(data.into_session())
    }

    async fn get_user(&self, access_token: &str) -> AuthResult<CurrentUser> {
        let user_url = self.auth_url("user");
        debug!(url = %user_url, "Fetching user record");

        let response = self
            .http_client
            .get(&user_url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("user fetch", response).await);
        }

        let data: UserResponse = response.json().await?;
        Ok(data.into_current_user())
    }

    async fn update_password(&self, access_token: &str, new_password: &str) -> AuthResult<()> {
        let user_url = self.auth_url("user");
        debug!(url = %user_url, "Updating password");

        let response = self
            .http_client
            .put(&user_url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("password update", response).await);
        }

        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let logout_url = self.auth_url("logout");
        debug!(url = %logout_url, "Signing out");

        let response = self
            .http_client
            .post(&logout_url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Sign-out failed");
            // Local session clearing proceeds regardless
        }

        Ok(())
    }
}

/// Find a parameter in the query or the hash fragment.
///
/// Implicit-flow links put session material after `#`, which
/// query-only parsing drops.
fn param_anywhere(url: &str, name: &str) -> Option<String> {
    if let Some(value) = deep_link::query_param(url, name) {
        return Some(value);
    }
    let fragment = url.split('#').nth(1)?;
    fragment.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?;
        if key == name {
            let value = parts.next().unwrap_or("");
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}
