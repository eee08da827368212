//! Hairstyle matcher stub.
//!
//! Accepts an uploaded image and always reports the same canned match. The
//! image is neither analysed nor forwarded anywhere.
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const CANNED_MATCH: &str = "Match found: New Trendy Hairstyle!";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub result: String,
}

pub fn match_hairstyle(image_base64: Option<&str>) -> AppResult<MatchResult> {
    match image_base64 {
        Some(image) if !image.is_empty() => {
            tracing::debug!(image_len = image.len(), "Returning canned hairstyle match");
            Ok(MatchResult { result: CANNED_MATCH.to_string() })
        }
        _ => Err(AppError::MissingImage),
    }
}
