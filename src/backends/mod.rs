//! Outbound image-generation backends.
//!
//! - `replicate`: hosted inference API (upload, create prediction, poll).
//! - `a1111`: locally-run Automatic1111 web UI (`img2img`, synchronous).
//! - `openai`: accepted as a tag but never called.
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

pub mod a1111;
pub mod replicate;

pub use a1111::A1111Client;
pub use replicate::ReplicateClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Replicate,
    A1111,
    OpenAi,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Replicate => "replicate",
            Backend::A1111 => "a1111",
            Backend::OpenAi => "openai",
        }
    }
}

impl FromStr for Backend {
    type Err = AppError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "replicate" => Ok(Backend::Replicate),
            "a1111" => Ok(Backend::A1111),
            "openai" => Ok(Backend::OpenAi),
            _ => Err(AppError::UnknownBackend),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful result of an edit, passed through from the backend as-is.
///
/// A backend that returned nothing serializes to `{}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EditOutput {
    Url {
        #[serde(skip_serializing_if = "Option::is_none")]
        image_url: Option<Value>,
    },
    Base64 {
        #[serde(skip_serializing_if = "Option::is_none")]
        image_base64: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_parse_exactly() {
        assert_eq!("replicate".parse::<Backend>().unwrap(), Backend::Replicate);
        assert_eq!("a1111".parse::<Backend>().unwrap(), Backend::A1111);
        assert_eq!("openai".parse::<Backend>().unwrap(), Backend::OpenAi);
        assert!(matches!("Replicate".parse::<Backend>(), Err(AppError::UnknownBackend)));
        assert!(matches!("dalle".parse::<Backend>(), Err(AppError::UnknownBackend)));
    }

    #[test]
    fn output_serializes_to_single_key() {
        let url = EditOutput::Url { image_url: Some(json!("https://cdn.example/out.png")) };
        assert_eq!(serde_json::to_value(url).unwrap(), json!({"image_url": "https://cdn.example/out.png"}));

        let b64 = EditOutput::Base64 { image_base64: Some("iVBORw0KGgo=".into()) };
        assert_eq!(serde_json::to_value(b64).unwrap(), json!({"image_base64": "iVBORw0KGgo="}));
    }

    #[test]
    fn empty_output_serializes_to_empty_object() {
        let out = EditOutput::Base64 { image_base64: None };
        assert_eq!(serde_json::to_value(out).unwrap(), json!({}));
    }
}
