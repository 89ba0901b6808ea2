/// Request gateway for the REST API
///
/// Every call to a protected resource goes through [`ApiClient`]:
/// 1. The stored access token is attached as a bearer token
/// 2. A 401 triggers one refresh (shared with any other refresh in flight)
///    and one replay of the same request with the new token
/// 3. A refresh that fails logs the user out and redirects to login
/// 4. Every other failure is classified, logged, and returned unchanged

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::auth::{CurrentUser, SessionManager};
use crate::envelope;
use crate::error::{ApiError, ErrorContext};

pub const CURRENT_USER_PATH: &str = "/api/auth/me";

/// One logical request. Cloneable so it can be replayed after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    // Set once the request has been replayed after a refresh.
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

/// A successful response. `body` is `Null` when the server sent none.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        http_client: reqwest::Client,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Send `request`, refreshing and replaying it once on a 401.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let context = ErrorContext::new(format!("{} {}", request.method, request.path));

        let error = match self.execute(&request, &context).await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };

        if !error.is_unauthorized() || request.retried {
            context.log_api_error(&error);
            return Err(error);
        }

        request.retried = true;
        tracing::info!(request_id = %context.request_id, "Unauthorized, refreshing session");

        if !self.session.refresh().await {
            tracing::warn!(request_id = %context.request_id, "Refresh failed, redirecting to login");
            self.session.logout(&self.session.routes().login);
            return Err(error);
        }

        tracing::info!(request_id = %context.request_id, "Replaying request with refreshed token");
        let replay = self.execute(&request, &context).await;
        if let Err(e) = &replay {
            context.log_api_error(e);
        }
        replay
    }

    async fn execute(
        &self,
        request: &ApiRequest,
        context: &ErrorContext,
    ) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http_client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        // No token is fine: some endpoints are public.
        if let Some(token) = self.session.access_token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(ApiError::from)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(ApiError::from)?;

        tracing::debug!(
            request_id = %context.request_id,
            status = status.as_u16(),
            retried = request.retried,
            "Response received"
        );

        if !status.is_success() {
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            return Err(ApiError::from_status(status, envelope::message(&body)));
        }

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok(ApiResponse { status, body })
    }

    /// GET a single payload, unwrapping the response envelope.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(ApiRequest::get(path)).await?;
        envelope::normalize(response.body)
    }

    /// GET a list payload from `{"data": [...]}` or a bare array.
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let response = self.send(ApiRequest::get(path)).await?;
        envelope::normalize_list(response.body)
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        let response = self.send(ApiRequest::post(path, body)).await?;
        envelope::normalize(response.body)
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        let response = self.send(ApiRequest::put(path, body)).await?;
        envelope::normalize(response.body)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.send(ApiRequest::delete(path)).await?;
        if envelope::is_rejected(&response.body) {
            return Err(ApiError::Rejected(envelope::message(&response.body)));
        }
        Ok(())
    }

    /// Fetch the signed-in user.
    pub async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.get(CURRENT_USER_PATH).await
    }
}
