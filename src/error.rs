use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// Every failure a request can end in. Each variant maps to exactly one HTTP
/// status and is rendered as `{"error": "<message>"}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, malformed or expired credential, or no principal in context.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but the role or identity is not allowed here.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Request could not be extracted (path, body or content type). Keeps the
    /// status axum chose for the rejection.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Server-side fault. The message is logged, never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Database(e) => match e.as_database_error() {
                Some(db) if db.is_unique_violation() => StatusCode::CONFLICT,
                Some(db) if db.is_foreign_key_violation() => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Database(_) if status == StatusCode::CONFLICT => {
                "resource already exists".to_string()
            }
            ApiError::Database(_) if status == StatusCode::NOT_FOUND => {
                "referenced resource not found".to_string()
            }
            ApiError::Database(e) => {
                tracing::error!(error = ?e, "database failure");
                "internal server error".to_string()
            }
            ApiError::Internal(cause) => {
                tracing::error!(%cause, "internal failure");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "path rejected");
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "body rejected");
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
