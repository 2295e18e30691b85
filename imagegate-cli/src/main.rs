use anyhow::Context;
use clap::{Parser, Subcommand};
use imagegate_server::monitor::StatusReport;
use imagegate_server::{run_server, ServerConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "imagegate")]
#[command(version)]
#[command(about = "imagegate - Admission-controlled image generation service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides IMAGEGATE_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Maximum concurrent provider calls (overrides IMAGEGATE_MAX_CONCURRENT)
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Maximum waiting requests (overrides IMAGEGATE_MAX_QUEUE)
        #[arg(long)]
        max_queue: Option<usize>,

        /// Do not print the startup banner
        #[arg(long)]
        no_banner: bool,
    },

    /// Show admission queue status
    Status {
        /// Server base URL
        #[arg(short, long, default_value = "http://localhost:8000")]
        url: String,

        /// Admin bearer token
        #[arg(short, long, env = "IMAGEGATE_ADMIN_TOKEN", hide_env_values = true)]
        token: String,

        /// Print the raw JSON report
        #[arg(long)]
        json: bool,
    },

    /// Reset cumulative queue metrics
    ResetMetrics {
        /// Server base URL
        #[arg(short, long, default_value = "http://localhost:8000")]
        url: String,

        /// Admin bearer token
        #[arg(short, long, env = "IMAGEGATE_ADMIN_TOKEN", hide_env_values = true)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, max_concurrent, max_queue, no_banner } => {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("imagegate_server=info,imagegate_core=info,tower_http=info")
            });
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(false))
                .with(filter)
                .init();

            let mut config = ServerConfig::from_env();
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(n) = max_concurrent {
                config.queue.max_concurrent = n;
            }
            if let Some(n) = max_queue {
                config.queue.max_queue_size = n;
            }
            config.print_banner = !no_banner;

            run_server(config).await?;
        }

        Commands::Status { url, token, json } => {
            let response = reqwest::Client::new()
                .get(admin_url(&url, "status"))
                .bearer_auth(&token)
                .send()
                .await
                .with_context(|| format!("Failed to reach imagegate at {}", url))?;

            let status = response.status();
            if !status.is_success() {
                anyhow::bail!("Status request failed: HTTP {}", status);
            }

            let report: StatusReport = response.json().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", format_report(&report));
            }
        }

        Commands::ResetMetrics { url, token } => {
            let response = reqwest::Client::new()
                .post(admin_url(&url, "reset"))
                .bearer_auth(&token)
                .send()
                .await
                .with_context(|| format!("Failed to reach imagegate at {}", url))?;

            let status = response.status();
            if !status.is_success() {
                anyhow::bail!("Reset request failed: HTTP {}", status);
            }

            println!("✅ Queue metrics reset");
        }
    }

    Ok(())
}

/// Admin endpoint URL under a server base URL
fn admin_url(base: &str, action: &str) -> String {
    format!("{}/admin/queue/{}", base.trim_end_matches('/'), action)
}

/// Human-readable status summary
fn format_report(report: &StatusReport) -> String {
    let mut out = String::new();

    out.push_str("=== Admission Queue ===\n");
    out.push_str(&format!(
        "Processing: {}/{} ({:.1}%)\n",
        report.processing, report.max_concurrent, report.utilization.concurrency_percent
    ));
    out.push_str(&format!(
        "Queued:     {}/{} ({:.1}%)\n",
        report.queued, report.max_queue_size, report.utilization.queue_percent
    ));
    out.push('\n');

    let m = &report.metrics;
    out.push_str("=== Metrics ===\n");
    out.push_str(&format!("Processed: {}\n", m.total_processed));
    out.push_str(&format!("Queued:    {}\n", m.total_queued));
    out.push_str(&format!("Rejected:  {}\n", m.total_rejected));
    out.push_str(&format!("Timed out: {}\n", m.total_timed_out));
    out.push_str(&format!("Peak processing: {}\n", m.peak_processing));
    out.push_str(&format!("Peak queued:     {}\n", m.peak_queued));
    out.push_str(&format!("Avg wait:        {:.1}ms\n", m.avg_queue_wait_ms));
    out.push_str(&format!("Avg processing:  {:.1}ms\n", m.avg_processing_ms));
    out.push('\n');

    out.push_str("=== Memory ===\n");
    out.push_str(&format!("RSS: {} MB, virtual: {} MB\n", report.memory.rss_mb, report.memory.virtual_mb));
    out.push('\n');

    if report.alerts.is_empty() {
        out.push_str("No alerts\n");
    } else {
        out.push_str("=== Alerts ===\n");
        for alert in &report.alerts {
            out.push_str(&format!("⚠️  {}\n", alert));
        }
    }

    out
}
