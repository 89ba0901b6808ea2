/// Error Handling Module
///
/// Unified error types for the session client:
/// 1. Domain-specific error enums (validation, API transport, auth, config)
/// 2. A central `AppError` that all of them convert into
/// 3. Status classification for responses coming back from the REST API
/// 4. Structured error logging with request context

use reqwest::StatusCode;
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for locally checked input (login form)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
        }
    }
}

impl StdError for ValidationError {}

/// Failures of a call to the remote REST API.
///
/// Only `Unauthorized` is ever recovered by the gateway (one refresh and
/// replay). Everything else is returned to the caller as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 401 from the server
    Unauthorized(Option<String>),
    /// 403 from the server
    Forbidden(Option<String>),
    /// 404 from the server
    NotFound(Option<String>),
    /// 5xx from the server
    Server(u16, Option<String>),
    /// Any other non-success status
    Status(u16, Option<String>),
    /// Envelope carried `success: false`
    Rejected(Option<String>),
    /// Client-side timeout expired
    Timeout,
    /// No response received (connection refused, DNS, reset)
    Network(String),
    /// Response body did not match the expected shape
    Decode(String),
}

impl ApiError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            code @ 500..=599 => ApiError::Server(code, message),
            code => ApiError::Status(code, message),
        }
    }

    /// HTTP status this error was built from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Server(code, _) | ApiError::Status(code, _) => Some(*code),
            _ => None,
        }
    }

    /// Server-provided message, when the error body carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::NotFound(m)
            | ApiError::Server(_, m)
            | ApiError::Status(_, m)
            | ApiError::Rejected(m) => m.as_deref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(_) => write!(f, "Unauthorized"),
            ApiError::Forbidden(_) => write!(f, "Access forbidden"),
            ApiError::NotFound(_) => write!(f, "Resource not found"),
            ApiError::Server(code, _) => write!(f, "Server error ({})", code),
            ApiError::Status(code, _) => write!(f, "Request failed with status {}", code),
            ApiError::Rejected(Some(msg)) => write!(f, "Request rejected: {}", msg),
            ApiError::Rejected(None) => write!(f, "Request rejected"),
            ApiError::Timeout => write!(f, "Request timed out"),
            ApiError::Network(msg) => write!(f, "Network error - no response received: {}", msg),
            ApiError::Decode(msg) => write!(f, "Unexpected response body: {}", msg),
        }
    }
}

impl StdError for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if let Some(status) = err.status() {
            ApiError::from_status(status, None)
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Authentication and session errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Login rejected; carries the message to show next to the form
    InvalidCredentials(String),
    /// Login could not reach the server
    ServerUnreachable,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials(msg) => write!(f, "{}", msg),
            AuthError::ServerUnreachable => write!(f, "Unable to reach the server"),
        }
    }
}

impl StdError for AuthError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that all client errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Api(ApiError),
    Auth(AuthError),
    Config(ConfigError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Api(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError::Api(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(ConfigError::ParseError(err.to_string()))
    }
}

// ============================================================================
// 3. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Error context for enhanced logging and debugging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_request_id(mut self, request_id: String) -> Self {
        self.request_id = request_id;
        self
    }

    /// Log an API failure at a level matching its class.
    pub fn log_api_error(&self, error: &ApiError) {
        match error {
            ApiError::Unauthorized(_) => {
                tracing::warn!(
                    request_id = %self.request_id,
                    operation = %self.operation,
                    "Unauthorized response"
                );
            }
            ApiError::Forbidden(_) => {
                tracing::error!(
                    request_id = %self.request_id,
                    operation = %self.operation,
                    "Access forbidden"
                );
            }
            ApiError::NotFound(_) => {
                tracing::error!(
                    request_id = %self.request_id,
                    operation = %self.operation,
                    "Resource not found"
                );
            }
            ApiError::Server(code, _) => {
                tracing::error!(
                    request_id = %self.request_id,
                    operation = %self.operation,
                    status = code,
                    "Server error"
                );
            }
            ApiError::Timeout | ApiError::Network(_) => {
                tracing::error!(
                    request_id = %self.request_id,
                    operation = %self.operation,
                    error = %error,
                    elapsed_ms = (chrono::Utc::now() - self.timestamp).num_milliseconds(),
                    "Network error - no response received"
                );
            }
            _ => {
                tracing::error!(
                    request_id = %self.request_id,
                    operation = %self.operation,
                    error = %error,
                    message = error.server_message().unwrap_or_default(),
                    "An error occurred"
                );
            }
        }
    }
}
