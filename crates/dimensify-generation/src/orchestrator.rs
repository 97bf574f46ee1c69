use dimensify_config::{Config, configured_secret};

use crate::{
    backend::{GenerationBackend, blocking::BlockingAdapter, polling::PollingAdapter},
    error::{GenerationError, Result},
    types::{AssetRef, GenerationRequest, MediaKind},
};

/// Public entry point for generation requests
///
/// Picks the backend for the media kind and passes its result through
/// unchanged. No parameter validation happens here.
pub struct Orchestrator {
    image: Box<dyn GenerationBackend>,
    video: Box<dyn GenerationBackend>,
}

impl Orchestrator {
    pub fn new(image: Box<dyn GenerationBackend>, video: Box<dyn GenerationBackend>) -> Self {
        Self { image, video }
    }

    /// Backend serving the given media kind
    pub fn backend(&self, kind: MediaKind) -> &dyn GenerationBackend {
        match kind {
            MediaKind::Image => self.image.as_ref(),
            MediaKind::Video => self.video.as_ref(),
        }
    }

    /// Run a request against the backend for `kind`
    pub async fn generate(&self, kind: MediaKind, request: &GenerationRequest) -> Result<Vec<AssetRef>> {
        let backend = self.backend(kind);

        tracing::debug!(%kind, backend = backend.name(), "dispatching generation request");

        backend.run(request).await
    }

    /// Generate one or more images
    pub async fn generate_image(&self, request: &GenerationRequest) -> Result<Vec<AssetRef>> {
        self.generate(MediaKind::Image, request).await
    }

    /// Generate a single video
    pub async fn generate_video(&self, request: &GenerationRequest) -> Result<AssetRef> {
        self.generate(MediaKind::Video, request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(GenerationError::unexpected)
    }
}

/// Builder for constructing the orchestrator from configuration
pub struct OrchestratorBuilder<'a> {
    config: &'a Config,
}

impl<'a> OrchestratorBuilder<'a> {
    pub const fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Build both adapters
    ///
    /// Missing credentials do not fail the build; each call reports them.
    pub fn build(self) -> anyhow::Result<Orchestrator> {
        let image = PollingAdapter::new("replicate", &self.config.image)?;
        let video = BlockingAdapter::new("segmind", &self.config.video)?;

        if configured_secret(self.config.image.api_key.as_ref()).is_none() {
            tracing::warn!("no API token configured for the image backend");
        }
        if configured_secret(self.config.video.api_key.as_ref()).is_none() {
            tracing::warn!("no API key configured for the video backend");
        }

        tracing::debug!("generation orchestrator initialized");

        Ok(Orchestrator::new(Box::new(image), Box::new(video)))
    }
}
