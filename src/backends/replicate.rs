//! Thin HTTP client for the Replicate predictions API.
//!
//! An edit is three steps: upload the source image to `/files`, create a
//! prediction against a pinned instruct-pix2pix version, then poll
//! `/predictions/{id}` at a fixed interval until the job is terminal.
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const MODEL_VERSION: &str = "fb8af171bfe0aab52b0da41da652262e7490efa4693e6e5d42c1b6c3b5b6d0d6";
const UPLOAD_FILENAME: &str = "input.png";
const GUIDANCE_SCALE: u32 = 7;
const NUM_INFERENCE_STEPS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    /// Anything else, including a missing status field.
    Unknown,
}

impl PredictionStatus {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "starting" => PredictionStatus::Starting,
            "processing" => PredictionStatus::Processing,
            "succeeded" => PredictionStatus::Succeeded,
            "failed" => PredictionStatus::Failed,
            "canceled" => PredictionStatus::Canceled,
            _ => PredictionStatus::Unknown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PredictionStatus::Starting | PredictionStatus::Processing)
    }
}

/// A prediction as last reported by the API. The raw JSON is kept so it can
/// be surfaced verbatim when the job fails.
#[derive(Debug, Clone)]
pub struct Prediction {
    raw: Value,
}

impl Prediction {
    pub fn from_value(raw: Value) -> Self {
        Prediction { raw }
    }

    pub fn id(&self) -> Option<&str> {
        self.raw.get("id").and_then(Value::as_str)
    }

    pub fn status(&self) -> PredictionStatus {
        self.raw.get("status")
            .and_then(Value::as_str)
            .map(PredictionStatus::from_tag)
            .unwrap_or(PredictionStatus::Unknown)
    }

    /// First element of `output` when it is a list, otherwise `output` itself.
    pub fn first_output(&self) -> Option<Value> {
        match self.raw.get("output")? {
            Value::Array(items) => items.first().cloned(),
            Value::Null => None,
            other => Some(other.clone()),
        }
    }

    /// The job's `error` field when set, otherwise the whole prediction.
    pub fn failure_details(&self) -> Value {
        match self.raw.get("error") {
            Some(Value::Null) | None => self.raw.clone(),
            Some(Value::String(s)) if s.is_empty() => self.raw.clone(),
            Some(err) => err.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    content: &'a str,
    filename: &'static str,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
}

#[derive(Debug, Serialize)]
pub struct PredictionRequest<'a> {
    pub version: &'static str,
    pub input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
pub struct PredictionInput<'a> {
    pub image: &'a str,
    pub prompt: &'a str,
    pub guidance_scale: u32,
    pub num_inference_steps: u32,
}

impl<'a> PredictionRequest<'a> {
    pub fn new(image_url: &'a str, prompt: &'a str) -> Self {
        PredictionRequest {
            version: MODEL_VERSION,
            input: PredictionInput {
                image: image_url,
                prompt,
                guidance_scale: GUIDANCE_SCALE,
                num_inference_steps: NUM_INFERENCE_STEPS,
            },
        }
    }
}

#[derive(Clone)]
pub struct ReplicateClient {
    client: Client,
    base_url: String,
    token: String,
    poll_interval: Duration,
}

impl ReplicateClient {
    pub fn new(client: Client, base_url: &str, token: String, poll_interval: Duration) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        ReplicateClient { client, base_url: base, token, poll_interval }
    }

    /// Upload, predict and poll. Returns the first output value on success.
    pub async fn edit(&self, prompt: &str, image_base64: &str) -> AppResult<Option<Value>> {
        let file_id = self.upload_file(image_base64).await?;
        let image_url = self.file_content_url(&file_id);

        let mut prediction = self.create_prediction(&image_url, prompt).await?;
        let prediction = loop {
            if prediction.status().is_terminal() {
                break prediction;
            }
            let id = prediction.id()
                .ok_or_else(|| AppError::Upstream("prediction response missing id".to_string()))?
                .to_string();
            tracing::debug!(prediction_id = %id, status = ?prediction.status(), "Prediction in progress");
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.get_prediction(&id).await?;
        };

        if prediction.status() != PredictionStatus::Succeeded {
            tracing::error!(status = ?prediction.status(), "Prediction did not succeed");
            return Err(AppError::GenerationFailed { details: prediction.failure_details() });
        }
        tracing::info!("Prediction succeeded");
        Ok(prediction.first_output())
    }

    /// Upload base64 image content; returns the file id.
    pub async fn upload_file(&self, image_base64: &str) -> AppResult<String> {
        let url = format!("{}/files", self.base_url);
        tracing::info!("Uploading input image to Replicate at URL: {}", url);

        let response = self.client.post(&url)
            .bearer_auth(&self.token)
            .json(&UploadRequest { content: image_base64, filename: UPLOAD_FILENAME })
            .send()
            .await?;

        if response.status().is_success() {
            let file: UploadedFile = response.json().await?;
            tracing::debug!(file_id = %file.id, "Uploaded input image");
            Ok(file.id)
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
            tracing::error!("Replicate upload failed. Status: {}, Body: {}", status, error_body);
            Err(AppError::Upstream(format!("upload failed: {}", error_body)))
        }
    }

    pub fn file_content_url(&self, file_id: &str) -> String {
        format!("{}/files/{}/content", self.base_url, file_id)
    }

    pub async fn create_prediction(&self, image_url: &str, prompt: &str) -> AppResult<Prediction> {
        let url = format!("{}/predictions", self.base_url);
        tracing::info!("Creating prediction at URL: {}", url);

        let response = self.client.post(&url)
            .bearer_auth(&self.token)
            .json(&PredictionRequest::new(image_url, prompt))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(Prediction::from_value(response.json().await?))
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
            tracing::error!("Replicate prediction failed. Status: {}, Body: {}", status, error_body);
            Err(AppError::Upstream(format!("predict failed: {}", error_body)))
        }
    }

    /// Fetch the current state of a prediction. The HTTP status is not
    /// inspected; whatever JSON comes back replaces the previous state.
    pub async fn get_prediction(&self, id: &str) -> AppResult<Prediction> {
        let url = format!("{}/predictions/{}", self.base_url, id);
        let response = self.client.get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(Prediction::from_value(response.json().await?))
    }
}
