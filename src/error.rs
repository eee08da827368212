//! Common error type and result alias.
//!
//! `AppError` doubles as the HTTP error surface: every variant renders to a
//! JSON body `{"error": ..., "details"?: ...}` with a status reflecting its
//! category (bad input, missing config, upstream failure, server error).
//!
//! Upstream failures (a non-success reply from Replicate or A1111, or a job
//! that ends unsuccessfully) are reported as `502 Bad Gateway`, not the
//! generic `500` older clients of this API received for them.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing fields")]
    MissingFields,

    #[error("Unknown backend")]
    UnknownBackend,

    #[error("Please upload an image!")]
    MissingImage,

    /// Request body could not be read at all, e.g. it exceeds the size limit.
    #[error("{message}")]
    UnreadableBody { status: StatusCode, message: String },

    #[error("{0} backend not implemented")]
    NotImplemented(&'static str),

    #[error("{0} not set")]
    MissingCredential(&'static str),

    /// Non-success status from an external service; carries its body.
    #[error("{0}")]
    Upstream(String),

    /// Remote job reached a terminal state other than success.
    #[error("generation failed")]
    GenerationFailed { details: Value },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFields | AppError::UnknownBackend | AppError::MissingImage => {
                StatusCode::BAD_REQUEST
            }
            AppError::UnreadableBody { status, .. } => *status,
            AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            AppError::Upstream(_) | AppError::GenerationFailed { .. } => StatusCode::BAD_GATEWAY,
            AppError::MissingCredential(_) | AppError::HttpClient(_) | AppError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// JSON payload returned to the caller.
    pub fn body(&self) -> Value {
        match self {
            AppError::GenerationFailed { details } => {
                json!({ "error": self.to_string(), "details": details })
            }
            AppError::HttpClient(_) | AppError::Json(_) => {
                json!({ "error": "Server error", "details": self.to_string() })
            }
            _ => json!({ "error": self.to_string() }),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, "{}", self);
        } else {
            tracing::warn!(%status, "{}", self);
        }
        (status, Json(self.body())).into_response()
    }
}
