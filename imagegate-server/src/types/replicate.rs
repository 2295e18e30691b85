//! Replicate prediction types.
//!
//! Based on the Replicate HTTP API reference:
//! https://replicate.com/docs/reference/http

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body for creating a prediction
#[derive(Debug, Clone, Serialize)]
pub struct CreatePrediction {
    /// Model version id, only for `POST /predictions`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Model-specific input
    pub input: Value,
}

/// Lifecycle status of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    /// Whether the prediction will not change any more
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }
}

/// Links returned with a prediction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionUrls {
    /// Poll URL
    #[serde(default)]
    pub get: Option<String>,

    #[serde(default)]
    pub cancel: Option<String>,
}

/// A prediction as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,

    pub status: PredictionStatus,

    /// A single URL or a list of URLs, depending on the model
    #[serde(default)]
    pub output: Option<Value>,

    /// Failure description when `status` is `failed`
    #[serde(default)]
    pub error: Option<Value>,

    #[serde(default)]
    pub urls: PredictionUrls,
}

impl Prediction {
    /// Output image URLs, flattened from whatever shape the model returned
    pub fn output_urls(&self) -> Vec<String> {
        match &self.output {
            Some(Value::String(url)) => vec![url.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Human-readable failure reason
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(msg)) => msg.clone(),
            Some(other) => other.to_string(),
            None => format!("prediction {}", self.status.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_succeeded_prediction() {
        let prediction: Prediction = serde_json::from_value(json!({
            "id": "gm3qorzdhgbfurvjtvhg6dckhu",
            "status": "succeeded",
            "output": ["https://replicate.delivery/a.png", "https://replicate.delivery/b.png"],
            "error": null,
            "urls": {
                "get": "https://api.replicate.com/v1/predictions/gm3qorzdhgbfurvjtvhg6dckhu",
                "cancel": "https://api.replicate.com/v1/predictions/gm3qorzdhgbfurvjtvhg6dckhu/cancel"
            }
        }))
        .unwrap();

        assert!(prediction.status.is_terminal());
        assert_eq!(prediction.output_urls().len(), 2);
        assert!(prediction.urls.get.unwrap().ends_with("gm3qorzdhgbfurvjtvhg6dckhu"));
    }

    #[test]
    fn test_single_url_output() {
        let prediction: Prediction = serde_json::from_value(json!({
            "id": "abc",
            "status": "succeeded",
            "output": "https://replicate.delivery/upscaled.png"
        }))
        .unwrap();

        assert_eq!(prediction.output_urls(), vec!["https://replicate.delivery/upscaled.png"]);
    }

    #[test]
    fn test_failed_prediction_message() {
        let prediction: Prediction = serde_json::from_value(json!({
            "id": "abc",
            "status": "failed",
            "error": "CUDA out of memory"
        }))
        .unwrap();

        assert_eq!(prediction.status, PredictionStatus::Failed);
        assert_eq!(prediction.error_message(), "CUDA out of memory");
        assert!(prediction.output_urls().is_empty());
    }

    #[test]
    fn test_version_omitted_when_absent() {
        let body = CreatePrediction { version: None, input: json!({"prompt": "a cat"}) };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("version").is_none());
    }
}
