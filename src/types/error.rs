//! Error types for the login gateway
//!
//! Three kinds of failure exist and they never blur into each other:
//! client-correctable rejections (bad credentials, duplicate key, unknown key),
//! authentication rejections (access denied), and internal faults.
//! A token that fails verification is not an error at all; see `auth::jwt`.

use hyper::StatusCode;

/// Main error type for gateway operations
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad credentials")]
    BadCredentials,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Access denied")]
    AccessDenied,

    #[error("Token creation error: {0}")]
    TokenCreation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadCredentials => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::TokenCreation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for broken preconditions that operators must see.
    ///
    /// Faults are logged at error level and reach the client only as a
    /// generic internal error.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::TokenCreation(_) | Self::Database(_) | Self::Internal(_) | Self::Config(_)
        )
    }

    /// Body sent to the client, if any.
    ///
    /// Only faults carry a body, and it never includes the detail. Every
    /// client rejection is signalled by its status alone.
    pub fn client_body(&self) -> Option<serde_json::Value> {
        self.is_fault()
            .then(|| serde_json::json!({ "error": "Internal Server Error" }))
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("Invalid JSON: {}", err))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<mongodb::error::Error> for GatewayError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
