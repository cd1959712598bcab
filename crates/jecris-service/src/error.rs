//! API error types and responses.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use jecris_core::CoreError;
use jecris_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or malformed credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Login failed. Unknown email and wrong password are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A bearer token was presented but is invalid or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Forbidden - valid credentials but no access to the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation needs a payment first.
    #[error("payment required: {0}")]
    PaymentRequired(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error envelope.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: &'static str,
    code: &'static str,
    message: String,
    data: Option<()>,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InvalidToken | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            Self::Unauthorized => ("unauthorized", "Authentication required".to_string()),
            Self::InvalidCredentials => (
                "invalid_credentials",
                "Invalid email or password".to_string(),
            ),
            Self::InvalidToken => ("invalid_token", "Invalid or expired token".to_string()),
            Self::Forbidden(msg) => ("forbidden", msg.clone()),
            Self::NotFound(msg) => ("not_found", msg.clone()),
            Self::BadRequest(msg) => ("bad_request", msg.clone()),
            Self::Conflict(msg) => ("conflict", msg.clone()),
            Self::PaymentRequired(msg) => ("payment_required", msg.clone()),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                ("internal_error", "An internal error occurred".to_string())
            }
            Self::ExternalService(msg) => {
                tracing::warn!(error = %msg, "External service error");
                ("external_service_error", msg.clone())
            }
        };

        let body = ErrorResponse {
            status: "error",
            code,
            message,
            data: None,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Database(msg) => Self::Internal(msg),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Page(_) => Self::NotFound(err.to_string()),
            CoreError::Metadata(_)
            | CoreError::InvalidAmount(_)
            | CoreError::Validation { .. } => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
