//! Application state for the imagegate server.

use imagegate_core::AdmissionQueue;

use crate::config::ServerConfig;
use crate::provider::{ProviderError, ReplicateClient};
use crate::types::images::Operation;

/// Application state shared across all handlers
pub struct AppState {
    /// Admission queue guarding provider calls
    pub queue: AdmissionQueue,

    /// Replicate client
    pub provider: ReplicateClient,

    /// Configuration
    pub config: ServerConfig,
}

impl AppState {
    /// Create new application state around an existing queue
    pub fn new(config: ServerConfig, queue: AdmissionQueue) -> Result<Self, ProviderError> {
        Ok(Self { provider: ReplicateClient::new(&config.provider)?, queue, config })
    }

    /// Model configured for an operation
    pub fn model_for(&self, operation: Operation) -> &str {
        match operation {
            Operation::Generate => &self.config.provider.generate_model,
            Operation::Upscale => &self.config.provider.upscale_model,
            Operation::Inpaint => &self.config.provider.inpaint_model,
        }
    }
}
