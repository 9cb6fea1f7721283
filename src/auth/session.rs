//! Session lifecycle: token evaluation on startup, login, logout, profile refresh

use serde::Deserialize;
use std::sync::Arc;

use super::claims::{decode_claims, is_token_expired, needs_token_refresh, TokenClaims};
use super::tokens::CredentialPair;
use crate::api::client::{ApiClient, RefreshedTokens};
use crate::api::error::ApiError;
use crate::api::paths;
use crate::api::transport::ApiRequest;
use crate::models::{LoginData, RegisterData, User};
use crate::notify::Notifier;

/// Who the session belongs to, and how much that can be trusted.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    /// Profile returned by the server
    Verified(User),
    /// Claims read from the access token without signature checks.
    /// Never use for authorization-sensitive decisions.
    Unverified(TokenClaims),
}

impl Identity {
    pub fn is_verified(&self) -> bool {
        matches!(self, Identity::Verified(_))
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Identity::Verified(user) => Some(user.email.as_str()),
            Identity::Unverified(claims) => claims.email.as_deref(),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Identity::Verified(user) => Some(user.id),
            Identity::Unverified(claims) => claims.user_id,
        }
    }

    pub fn display_name(&self) -> String {
        let (first, last) = match self {
            Identity::Verified(user) => (&user.first_name, &user.last_name),
            Identity::Unverified(claims) => (&claims.first_name, &claims.last_name),
        };
        let name = format!("{} {}", first, last).trim().to_string();
        if name.is_empty() {
            self.email().unwrap_or("(unknown)").to_string()
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub user: Option<Identity>,
    pub loading: bool,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
    user: User,
}

/// Single owner of session state. Build one per process and hand it to
/// whatever needs the current identity.
pub struct SessionManager {
    api: Arc<ApiClient>,
    notifier: Arc<dyn Notifier>,
    state: SessionState,
    initialized: bool,
}

impl SessionManager {
    pub fn new(api: Arc<ApiClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            state: SessionState {
                user: None,
                loading: true,
            },
            initialized: false,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&Identity> {
        self.state.user.as_ref()
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.user.is_some()
    }

    /// Drop all session state and allow `initialize` to run again.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
        self.initialized = false;
    }

    /// Restore the session from stored tokens. Runs once until `reset`.
    pub async fn initialize(&mut self) {
        if self.initialized {
            tracing::debug!("Session already initialized");
            return;
        }
        self.initialized = true;

        self.state.user = self.restore().await;
        self.state.loading = false;
    }

    async fn restore(&self) -> Option<Identity> {
        let tokens = self.api.tokens();
        let CredentialPair {
            access_token,
            refresh_token,
        } = match tokens.credentials() {
            Some(pair) => pair,
            None => {
                tracing::debug!("No stored credentials");
                return None;
            }
        };

        if !needs_token_refresh(&access_token, &refresh_token) {
            if !is_token_expired(&access_token) {
                return self.profile_or_claims(&access_token, true).await;
            }

            tracing::info!("Access and refresh tokens expired, clearing session");
            self.clear_stored_tokens();
            return None;
        }

        tracing::info!("Access token expired, refreshing...");
        match self.api.exchange_refresh_token(&refresh_token).await {
            Ok(refreshed) => {
                self.persist_refreshed(&refreshed);
                self.profile_or_claims(&refreshed.access_token, false).await
            }
            Err(e) => {
                tracing::warn!("Token refresh failed during startup: {}", e);
                match decode_claims(&access_token) {
                    Ok(claims) => {
                        tracing::warn!("Using identity from expired access token");
                        Some(Identity::Unverified(claims))
                    }
                    Err(decode_err) => {
                        tracing::warn!("Stored access token unreadable: {}", decode_err);
                        self.clear_stored_tokens();
                        None
                    }
                }
            }
        }
    }

    fn persist_refreshed(&self, refreshed: &RefreshedTokens) {
        let tokens = self.api.tokens();
        if let Err(e) = tokens.set_access_token(&refreshed.access_token) {
            tracing::warn!("Failed to store refreshed access token: {:#}", e);
        }
        if let Some(rotated) = &refreshed.refresh_token {
            if let Err(e) = tokens.set_refresh_token(rotated) {
                tracing::warn!("Failed to store rotated refresh token: {:#}", e);
            }
        }
    }

    fn clear_stored_tokens(&self) {
        if let Err(e) = self.api.tokens().clear_tokens() {
            tracing::warn!("Failed to clear stored tokens: {:#}", e);
        }
    }

    /// Server profile, falling back to claims decoded from `access_token`.
    /// With `allow_refresh` unset a 401 is not followed by another refresh.
    /// If a rejected refresh cleared the stored tokens, there is no session.
    async fn profile_or_claims(
        &self,
        access_token: &str,
        allow_refresh: bool,
    ) -> Option<Identity> {
        let fetched = if allow_refresh {
            self.fetch_profile().await
        } else {
            self.fetch_profile_once().await
        };

        match fetched {
            Ok(user) => Some(Identity::Verified(user)),
            Err(e) => {
                if self.api.tokens().credentials().is_none() {
                    tracing::info!("Session cleared while fetching profile: {}", e);
                    return None;
                }
                tracing::warn!("Profile fetch failed, using token claims: {}", e);
                match decode_claims(access_token) {
                    Ok(claims) => Some(Identity::Unverified(claims)),
                    Err(decode_err) => {
                        tracing::warn!("Access token unreadable: {}", decode_err);
                        None
                    }
                }
            }
        }
    }

    async fn fetch_profile(&self) -> Result<User, ApiError> {
        let resp = self.api.authed(ApiRequest::get(paths::PROFILE)).await?;
        resp.json(paths::PROFILE)
    }

    async fn fetch_profile_once(&self) -> Result<User, ApiError> {
        let resp = self.api.authed_once(ApiRequest::get(paths::PROFILE)).await?;
        resp.json(paths::PROFILE)
    }

    /// Log in and establish a session. Failure is re-signalled so the
    /// caller can stop whatever depended on it.
    pub async fn login(&mut self, data: &LoginData) -> Result<(), ApiError> {
        match self.try_login(data).await {
            Ok(user) => {
                self.state.user = Some(Identity::Verified(user));
                self.state.loading = false;
                self.initialized = true;
                self.notifier.success("Login successful!");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                self.notifier.error(&e.user_message("Login failed"));
                Err(e)
            }
        }
    }

    async fn try_login(&self, data: &LoginData) -> Result<User, ApiError> {
        let body = serde_json::to_value(data).map_err(|e| ApiError::Decode {
            path: paths::LOGIN.to_string(),
            message: e.to_string(),
        })?;
        let resp = self
            .api
            .public(ApiRequest::post(paths::LOGIN).json(body))
            .await?;
        let login: LoginResponse = resp.json(paths::LOGIN)?;

        self.api.tokens().set_credentials(&CredentialPair {
            access_token: login.access,
            refresh_token: login.refresh,
        })?;
        Ok(login.user)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, data: &RegisterData) -> Result<(), ApiError> {
        let body = serde_json::to_value(data).map_err(|e| ApiError::Decode {
            path: paths::REGISTER.to_string(),
            message: e.to_string(),
        })?;

        match self
            .api
            .public(ApiRequest::post(paths::REGISTER).json(body))
            .await
        {
            Ok(_) => {
                self.notifier.success(
                    "Registration successful! Please check your email for verification.",
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Registration failed: {}", e);
                match e.field_errors() {
                    Some(fields) => {
                        for msg in fields.messages() {
                            self.notifier.error(&msg);
                        }
                    }
                    None => self.notifier.error(&e.user_message("Registration failed")),
                }
                Err(e)
            }
        }
    }

    /// Best-effort server logout, then unconditional local cleanup.
    pub async fn logout(&mut self) {
        let tokens = self.api.tokens();
        if tokens.access_token().is_some() {
            let body = serde_json::json!({ "refresh": tokens.refresh_token() });
            if let Err(e) = self
                .api
                .authed_once(ApiRequest::post(paths::LOGOUT).json(body))
                .await
            {
                tracing::warn!("Logout request failed: {}", e);
            }
        }

        self.clear_stored_tokens();
        self.reset();
        self.notifier.success("Logged out successfully");
    }

    /// Re-fetch the profile. On failure the current state is kept.
    pub async fn refresh_user(&mut self) -> Result<(), ApiError> {
        if self.api.tokens().access_token().is_none() {
            return Err(ApiError::NoSession);
        }

        match self.fetch_profile().await {
            Ok(user) => {
                self.state.user = Some(Identity::Verified(user));
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to refresh user: {}", e);
                Err(e)
            }
        }
    }
}
