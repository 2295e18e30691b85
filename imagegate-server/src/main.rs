//! imagegate server - admission-controlled front for image generation.
//!
//! ## Quick Start
//!
//! ```bash
//! # Start with defaults (port 8000, 100 concurrent, 500 queued)
//! REPLICATE_API_TOKEN=r8_... IMAGEGATE_ADMIN_TOKEN=secret imagegate-server
//!
//! # Tighter limits
//! IMAGEGATE_MAX_CONCURRENT=10 IMAGEGATE_MAX_QUEUE=50 imagegate-server
//!
//! # Queue status
//! curl -H "Authorization: Bearer secret" http://localhost:8000/admin/queue/status
//! ```

use imagegate_server::{run_server, ServerConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("imagegate_server=info,imagegate_core=info,tower_http=info")
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    run_server(ServerConfig::from_env()).await
}
