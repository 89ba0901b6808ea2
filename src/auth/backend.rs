/// Auth endpoints of the REST API
///
/// Login and refresh calls go straight to the server with their own
/// request, never through the [`ApiClient`](crate::api_client::ApiClient)
/// gateway, so a 401 here can never trigger another refresh.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::token_store::TokenPair;
use crate::envelope;
use crate::error::ApiError;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// The user summary returned alongside login tokens
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `data` of a successful login
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    #[serde(default)]
    pub user: Option<LoginUser>,
}

/// Network side of the session: exchanging credentials or a refresh token
/// for a new token pair.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError>;
}

/// [`AuthBackend`] talking to the REST API over HTTP
#[derive(Clone)]
pub struct HttpAuthBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(reqwest::StatusCode, Value), ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(ApiError::from)?;
        // Error statuses may come back without a JSON body.
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok((status, body))
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let (status, body) = self.post_json(LOGIN_PATH, request).await?;

        if !status.is_success() {
            return Err(ApiError::from_status(status, envelope::message(&body)));
        }

        envelope::normalize(body)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let (status, body) = self
            .post_json(REFRESH_PATH, &RefreshRequest { refresh_token })
            .await?;

        if !status.is_success() {
            return Err(ApiError::from_status(status, envelope::message(&body)));
        }

        // Only an explicit `success: true` counts.
        if body.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(ApiError::Rejected(envelope::message(&body)));
        }

        envelope::normalize(body)
    }
}
