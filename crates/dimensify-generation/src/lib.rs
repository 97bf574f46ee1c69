#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

pub mod backend;
pub mod delay;
mod error;
mod http_client;
pub mod normalize;
mod orchestrator;
mod types;

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};

pub use backend::{
    GenerationBackend,
    blocking::BlockingAdapter,
    polling::{MAX_POLL_ATTEMPTS, POLL_INTERVAL, PollingAdapter},
};
pub use error::{ErrorKind, GenerationError, Result};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use types::{
    AssetRef, GenerationRequest, ImageGenerationResponse, JobHandle, JobSnapshot, JobStatus, MediaKind,
    RANDOM_SEED, VideoGenerationResponse,
};

/// Build the generation orchestrator from configuration
///
/// # Errors
///
/// Returns an error if an adapter fails to initialize
pub fn build_orchestrator(config: &dimensify_config::Config) -> anyhow::Result<Arc<Orchestrator>> {
    let orchestrator = OrchestratorBuilder::new(config)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to initialize generation orchestrator: {e}"))?;

    Ok(Arc::new(orchestrator))
}

/// Create the endpoint router for image and video generation
pub fn endpoint_router() -> Router<Arc<Orchestrator>> {
    Router::new()
        .route("/v1/images/generations", post(generate_image))
        .route("/v1/videos/generations", post(generate_video))
}

/// Handle image generation requests
async fn generate_image(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<ImageGenerationResponse>> {
    tracing::debug!(parameters = request.parameters().len(), "image generation handler called");

    let assets = orchestrator.generate_image(&request).await?;

    tracing::debug!(assets = assets.len(), "image generation complete");

    Ok(Json(ImageGenerationResponse { assets }))
}

/// Handle video generation requests
async fn generate_video(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<VideoGenerationResponse>> {
    tracing::debug!(parameters = request.parameters().len(), "video generation handler called");

    let asset = orchestrator.generate_video(&request).await?;

    tracing::debug!("video generation complete");

    Ok(Json(VideoGenerationResponse { asset }))
}
