//! Request validation and backend dispatch shared by the HTTP API and `genctl`.
use reqwest::Client;
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::backends::{A1111Client, Backend, EditOutput, ReplicateClient};
use crate::config::{BackendSettings, REPLICATE_API_TOKEN};
use crate::error::{AppError, AppResult};

/// Inbound edit request. Fields are optional so that absence is reported as
/// `MissingFields` rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
}

impl GenerateRequest {
    pub fn new(backend: impl Into<String>, prompt: impl Into<String>, image_base64: impl Into<String>) -> Self {
        GenerateRequest {
            backend: Some(backend.into()),
            prompt: Some(prompt.into()),
            image_base64: Some(image_base64.into()),
        }
    }

    /// All three fields present and non-empty, in declaration order.
    fn required_fields(&self) -> AppResult<(&str, &str, &str)> {
        fn field(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.is_empty())
        }
        match (field(&self.backend), field(&self.prompt), field(&self.image_base64)) {
            (Some(backend), Some(prompt), Some(image)) => Ok((backend, prompt, image)),
            _ => Err(AppError::MissingFields),
        }
    }
}

/// Validate `request` and forward it to the selected backend.
pub async fn generate(request: &GenerateRequest, settings: &BackendSettings, http: &Client) -> AppResult<EditOutput> {
    let (tag, prompt, image_base64) = request.required_fields()?;
    let backend: Backend = tag.parse()?;

    let span = tracing::info_span!("generate", request_id = %Uuid::new_v4(), %backend);
    dispatch(backend, prompt, image_base64, settings, http).instrument(span).await
}

async fn dispatch(
    backend: Backend,
    prompt: &str,
    image_base64: &str,
    settings: &BackendSettings,
    http: &Client,
) -> AppResult<EditOutput> {
    tracing::info!(prompt_len = prompt.len(), image_len = image_base64.len(), "Dispatching edit request");
    match backend {
        Backend::Replicate => {
            let token = settings.replicate_token.clone()
                .ok_or(AppError::MissingCredential(REPLICATE_API_TOKEN))?;
            let client = ReplicateClient::new(
                http.clone(),
                &settings.replicate_api_url,
                token,
                settings.poll_interval,
            );
            let image_url = client.edit(prompt, image_base64).await?;
            Ok(EditOutput::Url { image_url })
        }
        Backend::A1111 => {
            let client = A1111Client::new(http.clone(), &settings.a1111_base_url);
            let image_base64 = client.img2img(prompt, image_base64).await?;
            Ok(EditOutput::Base64 { image_base64 })
        }
        Backend::OpenAi => Err(AppError::NotImplemented("OpenAI")),
    }
}
