//! Axum request handlers for the HTTP API.
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::routes::AppState;
use crate::backends::EditOutput;
use crate::error::AppError;
use crate::generate::GenerateRequest;
use crate::hairstyle::{self, MatchRequest, MatchResult};

/// Malformed JSON reads as an empty request; a body that could not be
/// buffered (too large, aborted) is reported with its own status.
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(request)) => Ok(request),
        Err(JsonRejection::BytesRejection(rejection)) => Err(AppError::UnreadableBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }),
        Err(rejection) => {
            tracing::debug!("Unreadable request body: {}", rejection);
            Ok(T::default())
        }
    }
}

pub async fn root() -> &'static str {
    "Image Generation Router"
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<EditOutput>, AppError> {
    let request: GenerateRequest = body_or_default(payload)?;
    let settings = state.settings.resolve();
    crate::generate::generate(&request, &settings, &state.http)
        .await
        .map(Json)
}

pub async fn match_hairstyle(
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchResult>, AppError> {
    let request: MatchRequest = body_or_default(payload)?;
    hairstyle::match_hairstyle(request.image_base64.as_deref()).map(Json)
}

pub async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (StatusCode::METHOD_NOT_ALLOWED, Json(json!({ "error": "Method not allowed" })))
}
