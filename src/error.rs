use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error;
use std::fmt;

use crate::service::BookError;

/// The HTTP-facing error type.
///
/// Every variant renders to a JSON body of the form
/// `{"error": {"code", "message"}, "status", "timestamp"}`. Internal causes are
/// never placed in the body; they travel to the access log through the
/// [`HandlerError`] response extension instead.
#[derive(Debug)]
pub enum AppError {
    /// Unexpected failures (database, I/O). Rendered as a generic 500.
    Internal(anyhow::Error),
    /// The request is malformed or fails validation.
    BadRequest(String),
    NotFound(String),
    /// The request conflicts with current state, e.g. a duplicate title.
    Conflict(String),
    PayloadTooLarge(String),
}

/// Error text attached to a response for the access logger.
#[derive(Debug, Clone)]
pub struct HandlerError(pub String);

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Internal(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let log_text = match &self {
            AppError::Internal(e) => format!("{:#}", e),
            other => other.to_string(),
        };

        let (status, error_code, error_message, details) = match self {
            AppError::Internal(e) => {
                let error_id = uuid::Uuid::new_v4();
                tracing::error!(error_id = %error_id, "Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    Some(json!({ "error_id": error_id.to_string() })),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg, None),
        };

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": error_message,
            },
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let Some(details) = details {
            body["error"]["details"] = details;
        }

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(HandlerError(log_text));
        response
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        let message = err.to_string();
        match err {
            BookError::BadInput => AppError::BadRequest(message),
            BookError::TitleConflict => AppError::Conflict(message),
            BookError::NotFound => AppError::NotFound(message),
            BookError::Internal(e) => AppError::Internal(e),
        }
    }
}

/// A type alias for `Result<T, AppError>`, used by the route handlers.
pub type AppResult<T> = Result<T, AppError>;
