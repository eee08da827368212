//! Thin HTTP client for the Automatic1111 web UI.
//!
//! Only `img2img` is used; the call is synchronous and the first returned
//! image is handed back unchanged.
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const NEGATIVE_PROMPT: &str = "deformed, extra fingers, disfigured, poorly drawn, low quality, blurry";
const DENOISING_STRENGTH: f64 = 0.55;
const CFG_SCALE: u32 = 7;
const STEPS: u32 = 35;
const SAMPLER_NAME: &str = "DPM++ 2M Karras";

#[derive(Debug, Serialize)]
pub struct Img2ImgRequest<'a> {
    pub prompt: &'a str,
    pub negative_prompt: &'static str,
    pub denoising_strength: f64,
    pub cfg_scale: u32,
    pub steps: u32,
    pub sampler_name: &'static str,
    pub init_images: Vec<String>,
    pub resize_mode: u8,
}

impl<'a> Img2ImgRequest<'a> {
    pub fn new(prompt: &'a str, image_base64: &str) -> Self {
        Img2ImgRequest {
            prompt,
            negative_prompt: NEGATIVE_PROMPT,
            denoising_strength: DENOISING_STRENGTH,
            cfg_scale: CFG_SCALE,
            steps: STEPS,
            sampler_name: SAMPLER_NAME,
            init_images: vec![format!("data:image/png;base64,{}", image_base64)],
            resize_mode: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Img2ImgResponse {
    // Absent and `null` both mean no images.
    #[serde(default)]
    images: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct A1111Client {
    client: Client,
    base_url: String,
}

impl A1111Client {
    pub fn new(client: Client, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        A1111Client { client, base_url: base }
    }

    /// Run `img2img` and return the first image of the output list, if any.
    pub async fn img2img(&self, prompt: &str, image_base64: &str) -> AppResult<Option<String>> {
        let url = format!("{}/sdapi/v1/img2img", self.base_url);
        tracing::info!("Sending img2img request to A1111 at URL: {}", url);

        let response = self.client.post(&url)
            .json(&Img2ImgRequest::new(prompt, image_base64))
            .send()
            .await?;

        if response.status().is_success() {
            let out: Img2ImgResponse = response.json().await?;
            let images = out.images.unwrap_or_default();
            tracing::info!("A1111 returned {} image(s)", images.len());
            Ok(images.into_iter().next())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
            tracing::error!("A1111 img2img failed. Status: {}, Body: {}", status, error_body);
            Err(AppError::Upstream(format!("a1111 failed: {}", error_body)))
        }
    }
}
