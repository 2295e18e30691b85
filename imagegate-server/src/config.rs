//! Server configuration for imagegate.

use std::time::Duration;

use imagegate_core::QueueConfig;

/// Default Replicate API base URL
pub const DEFAULT_PROVIDER_URL: &str = "https://api.replicate.com/v1";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Bearer token guarding the admin endpoints.
    /// When unset every admin request is refused.
    pub admin_token: Option<String>,

    /// Image-generation provider settings
    pub provider: ProviderConfig,

    /// Admission queue limits
    pub queue: QueueConfig,

    /// Thresholds for status alerts
    pub alerts: AlertThresholds,

    /// Whether to print the banner on startup
    pub print_banner: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            admin_token: None,
            provider: ProviderConfig::default(),
            queue: QueueConfig::default(),
            alerts: AlertThresholds::default(),
            print_banner: true,
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("IMAGEGATE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            admin_token: std::env::var("IMAGEGATE_ADMIN_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            provider: ProviderConfig::from_env(),
            queue: QueueConfig::from_env(),
            alerts: AlertThresholds::default(),
            print_banner: true,
        }
    }
}

/// Settings for the Replicate client
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API base URL
    pub base_url: String,

    /// API token sent as a bearer credential
    pub api_token: Option<String>,

    /// Model used for text-to-image generation
    pub generate_model: String,

    /// Model used for upscaling
    pub upscale_model: String,

    /// Model used for inpainting
    pub inpaint_model: String,

    /// Delay between prediction status polls
    pub poll_interval: Duration,

    /// Upper bound on a single prediction, creation to terminal status
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_URL.to_string(),
            api_token: None,
            generate_model: "black-forest-labs/flux-schnell".to_string(),
            upscale_model: "nightmareai/real-esrgan".to_string(),
            inpaint_model: "black-forest-labs/flux-fill-pro".to_string(),
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(300), // 5 min for slow models
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("REPLICATE_API_URL").unwrap_or(defaults.base_url),
            api_token: std::env::var("REPLICATE_API_TOKEN").ok(),
            generate_model: std::env::var("IMAGEGATE_GENERATE_MODEL")
                .unwrap_or(defaults.generate_model),
            upscale_model: std::env::var("IMAGEGATE_UPSCALE_MODEL")
                .unwrap_or(defaults.upscale_model),
            inpaint_model: std::env::var("IMAGEGATE_INPAINT_MODEL")
                .unwrap_or(defaults.inpaint_model),
            poll_interval: defaults.poll_interval,
            timeout: std::env::var("IMAGEGATE_PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

/// Limits above which the status endpoint raises alerts
#[derive(Debug, Clone, PartialEq)]
pub struct AlertThresholds {
    /// Concurrency utilization, percent
    pub concurrency_percent: f64,

    /// Waiting list utilization, percent
    pub queue_percent: f64,

    /// Resident memory of this process, MB
    pub memory_mb: u64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self { concurrency_percent: 80.0, queue_percent: 50.0, memory_mb: 400 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert!(config.admin_token.is_none());
        assert_eq!(config.queue.max_concurrent, 100);
        assert_eq!(config.queue.max_queue_size, 500);
        assert_eq!(config.provider.base_url, "https://api.replicate.com/v1");
    }

    #[test]
    fn test_default_alert_thresholds() {
        let alerts = AlertThresholds::default();
        assert_eq!(alerts.concurrency_percent, 80.0);
        assert_eq!(alerts.queue_percent, 50.0);
        assert_eq!(alerts.memory_mb, 400);
    }
}
