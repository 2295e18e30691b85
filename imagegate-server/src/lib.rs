//! imagegate server library
//!
//! HTTP front for an image-generation provider. Every provider call goes
//! through a single [`AdmissionQueue`] owned by the process, which bounds
//! concurrent calls, queues bursts, and turns away excess load.
//!
//! This library backs both the `imagegate-server` binary and the
//! `imagegate serve` CLI command.

use axum::{
    routing::{get, post},
    Router,
};
use imagegate_core::AdmissionQueue;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod provider;
pub mod routes;
pub mod state;
pub mod types;

pub use config::{AlertThresholds, ProviderConfig, ServerConfig};
pub use state::AppState;

/// Initialize Prometheus metrics registry.
/// Should be called once before starting the server.
pub fn init_metrics() {
    if let Err(e) = metrics::register_metrics() {
        warn!("Failed to register Prometheus metrics: {}", e);
    }
}

/// Build the application router around shared state
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(routes::health))
        .route("/ready", get(routes::ready))
        .route("/live", get(routes::live))
        .route("/metrics/prometheus", get(routes::metrics_prometheus))
        // Admin endpoints
        .route("/admin/queue/status", get(routes::queue_status))
        .route("/admin/queue/reset", post(routes::reset_queue_metrics))
        // Image endpoints
        .route("/v1/images/generate", post(routes::generate))
        .route("/v1/images/upscale", post(routes::upscale))
        .route("/v1/images/inpaint", post(routes::inpaint))
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the imagegate server.
///
/// This function starts the HTTP server and blocks until it's shut down.
///
/// # Example
/// ```no_run
/// use imagegate_server::{run_server, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     run_server(ServerConfig::from_env()).await
/// }
/// ```
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    init_metrics();

    info!(
        port = config.port,
        provider_url = %config.provider.base_url,
        max_concurrent = config.queue.max_concurrent,
        max_queue_size = config.queue.max_queue_size,
        "Starting imagegate v{}",
        env!("CARGO_PKG_VERSION")
    );

    if config.admin_token.is_none() {
        warn!("IMAGEGATE_ADMIN_TOKEN is not set; admin endpoints will refuse every request");
    }
    if config.provider.api_token.is_none() {
        warn!("REPLICATE_API_TOKEN is not set; provider calls will be unauthenticated");
    }

    // One queue per process, owned here and handed to the handlers.
    let queue = AdmissionQueue::new(config.queue.clone())?;
    let state = Arc::new(AppState::new(config.clone(), queue)?);

    let app = build_router(state.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("imagegate listening on http://{}", addr);

    if config.print_banner {
        print_banner(&config);
    }

    axum::serve(listener, app).await?;

    Ok(())
}

/// Print the startup banner
fn print_banner(config: &ServerConfig) {
    let addr = format!("0.0.0.0:{}", config.port);

    println!();
    println!("==================================================");
    println!("  imagegate v{}", env!("CARGO_PKG_VERSION"));
    println!("==================================================");
    println!("  Listening on: http://{}", addr);
    println!("  Provider: {}", config.provider.base_url);
    println!();
    println!("  Admission queue:");
    println!("    Max concurrent: {}", config.queue.max_concurrent);
    println!("    Max queue: {}", config.queue.max_queue_size);
    match config.queue.queue_timeout {
        Some(timeout) => println!("    Queue timeout: {}s", timeout.as_secs()),
        None => println!("    Queue timeout: none"),
    }
    println!();
    println!("  Models:");
    println!("    Generate: {}", config.provider.generate_model);
    println!("    Upscale:  {}", config.provider.upscale_model);
    println!("    Inpaint:  {}", config.provider.inpaint_model);
    println!();
    println!("  Endpoints:");
    println!("    Images: POST /v1/images/generate, /v1/images/upscale, /v1/images/inpaint");
    println!("    Admin:  GET  /admin/queue/status, POST /admin/queue/reset");
    println!("    Health: GET  /health, /ready, /live");
    println!("    Prometheus: GET /metrics/prometheus");
    println!("==================================================");
    println!();
}
