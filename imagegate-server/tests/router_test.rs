//! End-to-end tests for the imagegate HTTP surface
//!
//! These drive the router in-process:
//! - Admin status/reset authorization and payloads
//! - Queue saturation surfacing as 503 busy
//! - Provider failure surfacing as 502 generation failure
//! - Input validation

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use imagegate_core::{AdmissionQueue, QueueConfig};
use imagegate_server::metrics::REQUESTS_REJECTED_TOTAL;
use imagegate_server::{build_router, AppState, ProviderConfig, ServerConfig};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tower::util::ServiceExt;

const TOKEN: &str = "test-admin-token";

fn test_app(queue: QueueConfig) -> (Router, AdmissionQueue) {
    let config = ServerConfig {
        admin_token: Some(TOKEN.to_string()),
        provider: ProviderConfig {
            // Nothing listens on the discard port.
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        },
        queue: queue.clone(),
        print_banner: false,
        ..Default::default()
    };
    let queue = AdmissionQueue::new(queue).unwrap();
    let state = Arc::new(AppState::new(config, queue.clone()).unwrap());
    (build_router(state), queue)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Hold one execution slot until the returned sender fires
async fn occupy_slot(queue: &AdmissionQueue) -> oneshot::Sender<()> {
    let (release, gate) = oneshot::channel::<()>();
    let holder = queue.clone();
    tokio::spawn(async move {
        holder
            .submit(move || async move {
                let _ = gate.await;
            })
            .await
    });
    for _ in 0..1000 {
        if queue.processing() == 1 {
            return release;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("slot was never taken");
}

#[tokio::test]
async fn test_status_requires_token() {
    let (app, _queue) = test_app(QueueConfig::new(2, 2));

    let missing = app.clone().oneshot(get("/admin/queue/status", None)).await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(missing).await;
    assert!(body.get("processing").is_none());
    assert_eq!(body["error"]["type"], "unauthorized");

    let wrong = app.oneshot(get("/admin/queue/status", Some("nope"))).await.unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_status_reports_occupancy() {
    let (app, queue) = test_app(QueueConfig::new(2, 4));
    let release = occupy_slot(&queue).await;

    let response = app.oneshot(get("/admin/queue/status", Some(TOKEN))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["processing"], 1);
    assert_eq!(body["queued"], 0);
    assert_eq!(body["max_concurrent"], 2);
    assert_eq!(body["max_queue_size"], 4);
    assert_eq!(body["utilization"]["concurrency_percent"], 50.0);
    assert_eq!(body["metrics"]["peak_processing"], 1);
    assert!(body["memory"]["rss_mb"].is_u64());
    assert!(body["alerts"].is_array());
    assert!(body["timestamp"].is_string());

    release.send(()).unwrap();
}

#[tokio::test]
async fn test_status_raises_concurrency_alert() {
    let (app, queue) = test_app(QueueConfig::new(1, 4));
    let release = occupy_slot(&queue).await;

    let response = app.oneshot(get("/admin/queue/status", Some(TOKEN))).await.unwrap();
    let body = body_json(response).await;
    let alerts: Vec<String> = serde_json::from_value(body["alerts"].clone()).unwrap();
    assert!(alerts.iter().any(|a| a.starts_with("High concurrency")));

    release.send(()).unwrap();
}

#[tokio::test]
async fn test_reset_zeroes_metrics_but_not_occupancy() {
    let (app, queue) = test_app(QueueConfig::new(1, 0));
    let release = occupy_slot(&queue).await;
    assert!(queue.submit(|| async {}).await.is_err());
    assert_eq!(queue.status().metrics.total_rejected, 1);

    let unauthorized = app
        .clone()
        .oneshot(post_json("/admin/queue/reset", json!({}), None))
        .await
        .unwrap();
    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(queue.status().metrics.total_rejected, 1);

    let response = app
        .oneshot(post_json("/admin/queue/reset", json!({}), Some(TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    let status = queue.status();
    assert_eq!(status.metrics.total_rejected, 0);
    assert_eq!(status.metrics.peak_processing, 0);
    assert_eq!(status.processing, 1);

    release.send(()).unwrap();
}

#[tokio::test]
async fn test_saturated_queue_returns_busy() {
    let (app, queue) = test_app(QueueConfig::new(1, 0));
    let release = occupy_slot(&queue).await;

    let ready = app.clone().oneshot(get("/ready", None)).await.unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);

    let health = app.clone().oneshot(get("/health", None)).await.unwrap();
    let health = body_json(health).await;
    assert_eq!(health["status"], "saturated");
    assert_eq!(health["processing"], 1);
    assert_eq!(health["queued"], 0);

    let full_before = REQUESTS_REJECTED_TOTAL.with_label_values(&["queue_full"]).get();

    let response = app
        .oneshot(post_json("/v1/images/generate", json!({"prompt": "a red fox"}), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "5");

    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "busy");
    assert!(body["error"]["message"].as_str().unwrap().contains("try again"));
    assert_eq!(queue.status().metrics.total_rejected, 1);
    assert!(REQUESTS_REJECTED_TOTAL.with_label_values(&["queue_full"]).get() >= full_before + 1.0);

    release.send(()).unwrap();
}

#[tokio::test]
async fn test_provider_failure_returns_generation_failed() {
    let (app, queue) = test_app(QueueConfig::new(2, 2));

    let response = app
        .oneshot(post_json(
            "/v1/images/upscale",
            json!({"image_url": "https://cdn.example/cat.png", "scale": 4}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "generation_failed");

    let status = queue.status();
    assert_eq!(status.processing, 0);
    assert_eq!(status.metrics.total_processed, 1);
}

#[tokio::test]
async fn test_invalid_request_never_reaches_queue() {
    let (app, queue) = test_app(QueueConfig::new(2, 2));

    let response = app
        .oneshot(post_json(
            "/v1/images/inpaint",
            json!({"image_url": "ftp://x/a.png", "mask_url": "https://x/m.png", "prompt": "sky"}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["type"], "invalid_request");
    assert_eq!(queue.status().metrics.total_processed, 0);
}

#[tokio::test]
async fn test_health_endpoints() {
    let (app, _queue) = test_app(QueueConfig::new(2, 2));

    let live = app.clone().oneshot(get("/live", None)).await.unwrap();
    assert_eq!(live.status(), StatusCode::OK);

    let ready = app.clone().oneshot(get("/ready", None)).await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    let health = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let body = body_json(health).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["processing"], 0);
}

#[tokio::test]
async fn test_prometheus_exposes_queue_gauges() {
    imagegate_server::init_metrics();
    let (app, _queue) = test_app(QueueConfig::new(3, 2));

    let response = app.oneshot(get("/metrics/prometheus", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("imagegate_queue_processing"));
    assert!(text.contains("imagegate_max_concurrent_requests"));
}
