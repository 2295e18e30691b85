//! Image generation routes.
//!
//! Each handler validates its body, then submits exactly one provider call
//! to the admission queue. A full queue reads as "busy, retry"; a provider
//! failure reads as a generation failure.

use axum::{extract::State, Json};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::ServerError;
use crate::metrics::RequestTimer;
use crate::state::AppState;
use crate::types::images::{
    GenerateImageRequest, ImageResponse, InpaintImageRequest, Operation, UpscaleImageRequest,
};

/// Text-to-image generation
///
/// POST /v1/images/generate
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<ImageResponse>, ServerError> {
    request.validate()?;
    run_operation(&state, Operation::Generate, request.to_input()).await.map(Json)
}

/// Image upscaling
///
/// POST /v1/images/upscale
pub async fn upscale(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpscaleImageRequest>,
) -> Result<Json<ImageResponse>, ServerError> {
    request.validate()?;
    run_operation(&state, Operation::Upscale, request.to_input()).await.map(Json)
}

/// Masked inpainting
///
/// POST /v1/images/inpaint
pub async fn inpaint(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InpaintImageRequest>,
) -> Result<Json<ImageResponse>, ServerError> {
    request.validate()?;
    run_operation(&state, Operation::Inpaint, request.to_input()).await.map(Json)
}

async fn run_operation(
    state: &AppState,
    operation: Operation,
    input: Value,
) -> Result<ImageResponse, ServerError> {
    let id = uuid::Uuid::new_v4().to_string();
    let started = Instant::now();
    let timer = RequestTimer::new(operation.as_str());

    info!(request_id = %id, operation = operation.as_str(), "Handling image request");

    let provider = state.provider.clone();
    let model = state.model_for(operation).to_string();
    let outcome = state
        .queue
        .submit(move || async move { provider.run(&model, input).await })
        .await;

    match outcome {
        Ok(Ok(prediction)) => {
            timer.record_success();
            let elapsed_ms = started.elapsed().as_millis() as u64;
            info!(request_id = %id, prediction = %prediction.id, elapsed_ms, "Image request complete");

            Ok(ImageResponse {
                output: prediction.output_urls(),
                status: prediction.status.as_str().to_string(),
                prediction_id: prediction.id,
                id,
                operation,
                elapsed_ms,
            })
        }
        Ok(Err(e)) => {
            timer.record_failure();
            warn!(request_id = %id, error = %e, "Image request failed");
            Err(e.into())
        }
        Err(e) => {
            timer.record_rejected(e.reason());
            warn!(request_id = %id, error = %e, "Image request turned away by queue");
            Err(e.into())
        }
    }
}
