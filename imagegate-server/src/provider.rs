//! Client for the Replicate inference API.
//!
//! Every call creates a prediction and polls it to a terminal status. The
//! admission queue treats a call as an opaque unit of work; nothing here
//! knows about queueing.

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::config::ProviderConfig;
use crate::types::replicate::{CreatePrediction, Prediction, PredictionStatus};

/// Provider error types
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Failed to reach the provider
    #[error("Failed to connect to provider: {0}")]
    Connection(String),

    /// The provider answered with an error status
    #[error("Provider returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// The prediction ended in `failed` or `canceled`
    #[error("{0}")]
    PredictionFailed(String),

    /// The prediction did not finish in time
    #[error("Prediction {id} did not finish within {timeout:?}")]
    TimedOut { id: String, timeout: Duration },

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Replicate API client
#[derive(Clone)]
pub struct ReplicateClient {
    /// HTTP client
    client: Client,
    /// API base URL, without trailing slash
    base_url: String,
    api_token: Option<String>,
    poll_interval: Duration,
    timeout: Duration,
}

impl ReplicateClient {
    /// Create a new client
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        info!(url = %base_url, "Creating Replicate client");

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("imagegate/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
            poll_interval: config.poll_interval,
            timeout: config.timeout,
        })
    }

    /// Get the API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a model to completion and return the finished prediction.
    ///
    /// `model` is either `owner/name` (latest version) or
    /// `owner/name:version`.
    #[instrument(skip(self, input))]
    pub async fn run(&self, model: &str, input: Value) -> Result<Prediction, ProviderError> {
        let started = Instant::now();
        let (url, body) = self.create_request(model, input);
        debug!(url = %url, "Creating prediction");

        let mut prediction: Prediction = self.send(self.client.post(&url).json(&body)).await?;
        debug!(id = %prediction.id, status = prediction.status.as_str(), "Prediction created");

        while !prediction.status.is_terminal() {
            if started.elapsed() >= self.timeout {
                error!(id = %prediction.id, "Prediction timed out");
                return Err(ProviderError::TimedOut { id: prediction.id, timeout: self.timeout });
            }
            tokio::time::sleep(self.poll_interval).await;

            let poll_url = prediction
                .urls
                .get
                .clone()
                .unwrap_or_else(|| format!("{}/predictions/{}", self.base_url, prediction.id));
            prediction = self.send(self.client.get(&poll_url)).await?;
        }

        match prediction.status {
            PredictionStatus::Succeeded => {
                info!(
                    id = %prediction.id,
                    outputs = prediction.output_urls().len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Prediction succeeded"
                );
                Ok(prediction)
            }
            _ => {
                let reason = prediction.error_message();
                error!(id = %prediction.id, reason = %reason, "Prediction failed");
                Err(ProviderError::PredictionFailed(reason))
            }
        }
    }

    /// Endpoint and body for creating a prediction of `model`
    fn create_request(&self, model: &str, input: Value) -> (String, CreatePrediction) {
        match model.split_once(':') {
            Some((_, version)) => (
                format!("{}/predictions", self.base_url),
                CreatePrediction { version: Some(version.to_string()), input },
            ),
            None => (
                format!("{}/models/{}/predictions", self.base_url, model),
                CreatePrediction { version: None, input },
            ),
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Prediction, ProviderError> {
        let builder = match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                ProviderError::Connection(e.to_string())
            } else {
                ProviderError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Provider returned error");
            return Err(ProviderError::Api { status: status.as_u16(), body });
        }

        Ok(response.json().await?)
    }
}
