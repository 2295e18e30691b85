//! HTTP route handlers for imagegate.
//!
//! This module organizes all route handlers:
//! - `health`: Liveness, readiness and Prometheus endpoints
//! - `admin`: Bearer-gated queue status and metrics reset
//! - `images`: Image generation endpoints backed by the admission queue

pub mod admin;
pub mod health;
pub mod images;

// Re-export handlers for convenience
pub use admin::{queue_status, reset_queue_metrics};
pub use health::{health, live, metrics_prometheus, ready};
pub use images::{generate, inpaint, upscale};
