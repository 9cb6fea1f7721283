//! Storefront HTTP client
//!
//! Two pipelines share one transport: `public` sends without credentials,
//! `authed` attaches the stored access token and, on a 401, refreshes it
//! once and resends. Every request carries a `_t` timestamp so that no
//! intermediate cache answers it.

use serde::Deserialize;
use std::sync::Arc;

use super::error::{check_response, ApiError};
use super::transport::{ApiRequest, ApiResponse, Transport};
use super::paths;
use crate::auth::TokenStore;

/// Resends allowed after a silent token refresh.
const MAX_AUTH_RETRIES: u32 = 1;

const CACHE_BUST_PARAM: &str = "_t";

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// Result of exchanging a refresh token
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshedTokens {
    pub access_token: String,
    /// Present when the server rotates refresh tokens
    pub refresh_token: Option<String>,
}

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, tokens: TokenStore) -> Self {
        Self { transport, tokens }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn stamp(req: &ApiRequest) -> ApiRequest {
        let millis = chrono::Utc::now().timestamp_millis();
        req.clone().query(CACHE_BUST_PARAM, millis)
    }

    /// Unauthenticated pipeline.
    pub async fn public(&self, req: ApiRequest) -> Result<ApiResponse, ApiError> {
        let resp = self.transport.send(&Self::stamp(&req)).await?;
        check_response(resp, &req.path)
    }

    /// Authenticated pipeline with at most one refresh-and-retry.
    pub async fn authed(&self, req: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut attempt = 0;
        loop {
            let resp = self.send_authenticated(&req, attempt).await?;
            if resp.status != 401 || attempt >= MAX_AUTH_RETRIES {
                return check_response(resp, &req.path);
            }

            tracing::debug!("401 for {}, attempting silent token refresh", req.path);
            if let Err(e) = self.refresh_access_token().await {
                tracing::debug!("Silent refresh failed: {}", e);
                return check_response(resp, &req.path);
            }
            attempt += 1;
        }
    }

    /// Authenticated pipeline without the refresh-and-retry step.
    pub async fn authed_once(&self, req: ApiRequest) -> Result<ApiResponse, ApiError> {
        let resp = self.send_authenticated(&req, MAX_AUTH_RETRIES).await?;
        check_response(resp, &req.path)
    }

    async fn send_authenticated(
        &self,
        req: &ApiRequest,
        attempt: u32,
    ) -> Result<ApiResponse, ApiError> {
        let stamped = Self::stamp(req).bearer(self.tokens.access_token());
        if attempt > 0 {
            tracing::debug!("Retrying {} (attempt {})", req.path, attempt + 1);
        }
        self.transport.send(&stamped).await
    }

    /// Exchange `refresh_token` for a new access token. Nothing is persisted.
    pub async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshedTokens, ApiError> {
        let req = ApiRequest::post(paths::TOKEN_REFRESH)
            .json(serde_json::json!({ "refresh": refresh_token }));
        let resp = self.public(req).await?;
        let body: RefreshResponse = resp.json(paths::TOKEN_REFRESH)?;
        Ok(RefreshedTokens {
            access_token: body.access,
            refresh_token: body.refresh,
        })
    }

    /// Refresh the stored access token. Tokens are cleared only when the
    /// server rejects the refresh token itself.
    pub async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let refresh_token = self.tokens.refresh_token().ok_or(ApiError::NoSession)?;

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(refreshed) => {
                self.tokens.set_access_token(&refreshed.access_token)?;
                if let Some(rotated) = &refreshed.refresh_token {
                    self.tokens.set_refresh_token(rotated)?;
                }
                tracing::info!("Access token refreshed");
                Ok(refreshed.access_token)
            }
            Err(e) if rejects_refresh_token(&e) => {
                tracing::warn!("Refresh token rejected, clearing session: {}", e);
                self.tokens.clear_tokens()?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

fn rejects_refresh_token(e: &ApiError) -> bool {
    e.is_unauthorized()
        || matches!(
            e,
            ApiError::Validation { .. } | ApiError::Http { status: 400, .. }
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::MockTransport;
    use crate::auth::claims::test_token_expiring_in;
    use crate::auth::tokens::CredentialPair;
    use crate::config::MemoryStore;
    use reqwest::Method;
    use serde_json::json;

    fn client_with_tokens(access: &str, refresh: &str) -> (Arc<MockTransport>, ApiClient) {
        let mock = Arc::new(MockTransport::new());
        let tokens = TokenStore::new(Arc::new(MemoryStore::default()));
        tokens
            .set_credentials(&CredentialPair {
                access_token: access.into(),
                refresh_token: refresh.into(),
            })
            .unwrap();
        let client = ApiClient::new(mock.clone(), tokens);
        (mock, client)
    }

    #[tokio::test]
    async fn test_every_request_is_cache_busted() {
        let (mock, client) = client_with_tokens("a1", "r1");
        mock.on(Method::GET, "/api/products/", 200, json!([]));
        mock.on(Method::GET, "/api/user/", 200, json!({"id": 1, "email": "a@b.com"}));

        client.public(ApiRequest::get("/api/products/")).await.unwrap();
        client.authed(ApiRequest::get("/api/user/")).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        for req in &requests {
            let stamp = req.query_value("_t").expect("missing _t");
            assert!(stamp.parse::<i64>().is_ok());
        }
        assert_eq!(requests[0].bearer, None);
        assert_eq!(requests[1].bearer.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_401_refreshes_and_retries_once() {
        let (mock, client) = client_with_tokens("old", "r1");
        mock.on(Method::GET, "/api/user/orders/", 401, json!({"detail": "expired"}));
        mock.on(Method::GET, "/api/user/orders/", 200, json!([]));
        mock.on(Method::POST, paths::TOKEN_REFRESH, 200, json!({"access": "new"}));

        let resp = client.authed(ApiRequest::get("/api/user/orders/")).await.unwrap();
        assert_eq!(resp.status, 200);

        assert_eq!(mock.count(Method::POST, paths::TOKEN_REFRESH), 1);
        let order_calls: Vec<_> = mock
            .requests()
            .into_iter()
            .filter(|r| r.path == "/api/user/orders/")
            .collect();
        assert_eq!(order_calls.len(), 2);
        assert_eq!(order_calls[0].bearer.as_deref(), Some("old"));
        assert_eq!(order_calls[1].bearer.as_deref(), Some("new"));

        let refresh_call = mock
            .requests()
            .into_iter()
            .find(|r| r.path == paths::TOKEN_REFRESH)
            .unwrap();
        assert_eq!(refresh_call.bearer, None);
        assert_eq!(refresh_call.body, Some(json!({"refresh": "r1"})));

        assert_eq!(client.tokens().access_token().as_deref(), Some("new"));
        assert_eq!(client.tokens().refresh_token().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_persistent_401_is_surfaced_after_one_retry() {
        let (mock, client) = client_with_tokens("old", "r1");
        mock.on(Method::GET, "/api/user/orders/", 401, json!({"detail": "nope"}));
        mock.on(Method::POST, paths::TOKEN_REFRESH, 200, json!({"access": "new"}));

        let err = client
            .authed(ApiRequest::get("/api/user/orders/"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());

        assert_eq!(mock.count(Method::POST, paths::TOKEN_REFRESH), 1);
        assert_eq!(mock.count(Method::GET, "/api/user/orders/"), 2);
        // A persistent 401 does not log the user out.
        assert_eq!(client.tokens().refresh_token().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_rejected_refresh_token_clears_session() {
        let (mock, client) = client_with_tokens("old", "r1");
        mock.on(Method::GET, "/api/user/", 401, json!({}));
        mock.on(
            Method::POST,
            paths::TOKEN_REFRESH,
            401,
            json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}),
        );

        let err = client.authed(ApiRequest::get("/api/user/")).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(mock.count(Method::GET, "/api/user/"), 1);
        assert!(client.tokens().access_token().is_none());
        assert!(client.tokens().refresh_token().is_none());
    }

    #[tokio::test]
    async fn test_network_failure_during_refresh_keeps_tokens() {
        let (mock, client) = client_with_tokens("old", "r1");
        mock.on(Method::GET, "/api/user/", 401, json!({}));
        mock.fail(Method::POST, paths::TOKEN_REFRESH, "connection reset");

        let err = client.authed(ApiRequest::get("/api/user/")).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(client.tokens().access_token().as_deref(), Some("old"));
        assert_eq!(client.tokens().refresh_token().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_is_stored() {
        let refresh = test_token_expiring_in(86_400);
        let (mock, client) = client_with_tokens("old", &refresh);
        mock.on(
            Method::POST,
            paths::TOKEN_REFRESH,
            200,
            json!({"access": "a2", "refresh": "r2"}),
        );

        let access = client.refresh_access_token().await.unwrap();
        assert_eq!(access, "a2");
        assert_eq!(client.tokens().refresh_token().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_authed_once_does_not_refresh() {
        let (mock, client) = client_with_tokens("old", "r1");
        mock.on(Method::POST, paths::LOGOUT, 401, json!({}));
        mock.on(Method::POST, paths::TOKEN_REFRESH, 200, json!({"access": "new"}));

        let err = client
            .authed_once(ApiRequest::post(paths::LOGOUT))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(mock.count(Method::POST, paths::TOKEN_REFRESH), 0);
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let mock = Arc::new(MockTransport::new());
        let tokens = TokenStore::new(Arc::new(MemoryStore::default()));
        let client = ApiClient::new(mock.clone(), tokens);
        let err = client.refresh_access_token().await.unwrap_err();
        assert!(matches!(err, ApiError::NoSession));
        assert!(mock.requests().is_empty());
    }
}
