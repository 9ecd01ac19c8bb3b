//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding. All route handlers return `Result<T, AppError>`, which
//! renders as:
//!
//! ```json
//! { "error": { "message": "...", "code": "VALIDATION_ERROR", "suggestion": "..." } }
//! ```

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use maani_core::seller::SellerError;
use maani_core::subscription::SubscriptionError;
use maani_core::{EmailError, GeoError};

use crate::db::RepositoryError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Client input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error code in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    Conflict,
    ServerError,
}

impl ErrorCode {
    const fn status(self) -> StatusCode {
        match self {
            Self::ValidationError => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn suggestion(self) -> &'static str {
        match self {
            Self::ValidationError => "Check the request parameters and try again.",
            Self::NotFound => "Verify the identifier and try again.",
            Self::Conflict => "The resource already exists; fetch it instead of creating it.",
            Self::ServerError => "Please try again later.",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    message: String,
    code: ErrorCode,
    suggestion: &'static str,
}

impl AppError {
    /// The envelope code this error renders with.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::NotFound(_) | Self::Database(RepositoryError::NotFound) => ErrorCode::NotFound,
            Self::Conflict(_) | Self::Database(RepositoryError::Conflict(_)) => ErrorCode::Conflict,
            Self::Database(_) | Self::Internal(_) => ErrorCode::ServerError,
        }
    }

    /// Client-facing message. Server errors never leak internals.
    fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) | Self::Conflict(msg) => msg.clone(),
            Self::Database(RepositoryError::NotFound) => "Resource not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();

        // Capture server errors to Sentry
        if code == ErrorCode::ServerError {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            error: ErrorDetail {
                message: self.public_message(),
                code,
                suggestion: code.suggestion(),
            },
        };

        (code.status(), Json(body)).into_response()
    }
}

impl From<GeoError> for AppError {
    fn from(err: GeoError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<SellerError> for AppError {
    fn from(err: SellerError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<SubscriptionError> for AppError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::DateOverflow => Self::Internal(err.to_string()),
            SubscriptionError::InvalidAmount(_) | SubscriptionError::EmptyTransactionId => {
                Self::Validation(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for a domain action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}
