//! Image API request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ServerError;

/// Longest accepted prompt, in characters
pub const MAX_PROMPT_CHARS: usize = 2000;

const MIN_DIMENSION: u32 = 256;
const MAX_DIMENSION: u32 = 1536;
const MAX_OUTPUTS: u32 = 4;

/// The kind of provider call a request turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Generate,
    Upscale,
    Inpaint,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Upscale => "upscale",
            Self::Inpaint => "inpaint",
        }
    }
}

/// Request body for POST /v1/images/generate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    #[serde(default = "default_dimension")]
    pub width: u32,

    #[serde(default = "default_dimension")]
    pub height: u32,

    #[serde(default = "default_outputs")]
    pub num_outputs: u32,
}

fn default_dimension() -> u32 {
    1024
}

fn default_outputs() -> u32 {
    1
}

impl GenerateImageRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        validate_prompt(&self.prompt)?;
        validate_dimension("width", self.width)?;
        validate_dimension("height", self.height)?;
        if !(1..=MAX_OUTPUTS).contains(&self.num_outputs) {
            return Err(ServerError::invalid(format!(
                "num_outputs must be between 1 and {MAX_OUTPUTS}"
            )));
        }
        Ok(())
    }

    /// Model input for the provider
    pub fn to_input(&self) -> Value {
        let mut input = json!({
            "prompt": self.prompt.trim(),
            "width": self.width,
            "height": self.height,
            "num_outputs": self.num_outputs,
        });
        if let Some(negative) = self.negative_prompt.as_deref().filter(|n| !n.trim().is_empty()) {
            input["negative_prompt"] = json!(negative.trim());
        }
        input
    }
}

/// Request body for POST /v1/images/upscale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpscaleImageRequest {
    pub image_url: String,

    #[serde(default = "default_scale")]
    pub scale: u32,
}

fn default_scale() -> u32 {
    2
}

impl UpscaleImageRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        validate_url("image_url", &self.image_url)?;
        if !matches!(self.scale, 2 | 4) {
            return Err(ServerError::invalid("scale must be 2 or 4"));
        }
        Ok(())
    }

    pub fn to_input(&self) -> Value {
        json!({ "image": self.image_url, "scale": self.scale })
    }
}

/// Request body for POST /v1/images/inpaint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InpaintImageRequest {
    pub image_url: String,
    pub mask_url: String,
    pub prompt: String,
}

impl InpaintImageRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        validate_url("image_url", &self.image_url)?;
        validate_url("mask_url", &self.mask_url)?;
        validate_prompt(&self.prompt)
    }

    pub fn to_input(&self) -> Value {
        json!({
            "image": self.image_url,
            "mask": self.mask_url,
            "prompt": self.prompt.trim(),
        })
    }
}

/// Response body shared by all image endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    /// Request id, also present in server logs
    pub id: String,
    pub operation: Operation,
    /// Provider prediction id
    pub prediction_id: String,
    pub status: String,
    pub output: Vec<String>,
    pub elapsed_ms: u64,
}

fn validate_prompt(prompt: &str) -> Result<(), ServerError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(ServerError::invalid("prompt must not be empty"));
    }
    if trimmed.chars().count() > MAX_PROMPT_CHARS {
        return Err(ServerError::invalid(format!(
            "prompt must be at most {MAX_PROMPT_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_dimension(name: &str, value: u32) -> Result<(), ServerError> {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) || value % 8 != 0 {
        return Err(ServerError::invalid(format!(
            "{name} must be a multiple of 8 between {MIN_DIMENSION} and {MAX_DIMENSION}"
        )));
    }
    Ok(())
}

fn validate_url(name: &str, url: &str) -> Result<(), ServerError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ServerError::invalid(format!("{name} must be an http(s) URL")))
    }
}
