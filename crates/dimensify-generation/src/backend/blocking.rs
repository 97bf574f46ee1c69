//! Single-call adapter for the video backend
//!
//! The backend answers one POST with the finished media as the raw response
//! body. There is no polling and no timeout loop here: the only bound is the
//! HTTP client's own request timeout, which is unset unless configured.

use std::time::Duration;

use async_trait::async_trait;
use axum::http;
use dimensify_config::{BlockingBackendConfig, configured_secret};
use rand::Rng;
use reqwest::{Client, header::HeaderMap};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};

use super::GenerationBackend;
use crate::{
    error::{GenerationError, Result},
    http_client::{execute, http_client, read_body},
    normalize::{TransportFailure, classify},
    types::{AssetRef, GenerationRequest},
};

/// Parameter carrying the seed on this backend
pub const SEED_PARAMETER: &str = "seed";

/// Generated seeds fall in `0..SEED_RANGE_END`
pub const SEED_RANGE_END: u64 = 1_000_000;

/// Clip length used when the caller gives none
pub const DEFAULT_DURATION: &str = "5";

/// Aspect ratio used when the caller gives none
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

const EMPTY_BODY_MESSAGE: &str = "Generation succeeded but returned no content.";

/// Adapter for a backend that returns the finished asset in one call
pub struct BlockingAdapter {
    name: String,
    client: Client,
    endpoint: String,
    media_type: String,
    api_key: Option<SecretString>,
    timeout: Option<Duration>,
}

impl BlockingAdapter {
    /// Create an adapter from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is malformed or the HTTP client
    /// cannot be built
    pub fn new(name: impl Into<String>, config: &BlockingBackendConfig) -> anyhow::Result<Self> {
        let timeout = config.timeout()?;

        Ok(Self {
            name: name.into(),
            client: http_client(timeout)?,
            endpoint: format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.model.trim_start_matches('/')
            ),
            media_type: config.media_type.clone(),
            api_key: configured_secret(config.api_key.as_ref()),
            timeout,
        })
    }

    /// Client-side bound on the generation call, if any
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn api_key(&self) -> Result<&SecretString> {
        self.api_key
            .as_ref()
            .ok_or_else(|| classify(TransportFailure::MissingCredential))
    }

    /// Caller parameters with backend defaults filled in where omitted
    fn payload(request: &GenerationRequest) -> Map<String, Value> {
        let mut payload = request.parameters().clone();

        if request.wants_random_seed(SEED_PARAMETER) {
            let seed = rand::rng().random_range(0..SEED_RANGE_END);
            payload.insert(SEED_PARAMETER.to_string(), json!(seed));
        }

        if request.is_omitted("duration") {
            payload.insert("duration".to_string(), json!(DEFAULT_DURATION));
        }

        if request.is_omitted("aspect_ratio") {
            payload.insert("aspect_ratio".to_string(), json!(DEFAULT_ASPECT_RATIO));
        }

        payload
    }

    /// Media type of the response, if it names an image or video type
    fn response_media_type(headers: &HeaderMap) -> Option<String> {
        let value = headers.get(http::header::CONTENT_TYPE)?.to_str().ok()?;
        let media_type = value.split(';').next()?.trim();

        (media_type.starts_with("video/") || media_type.starts_with("image/")).then(|| media_type.to_string())
    }

    /// Generate the asset with one blocking call
    ///
    /// The binary body is returned as a `data:` URI so it has the same shape
    /// as a URL reference.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error before any network call when no key
    /// is configured; transport failures are classified.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<AssetRef>> {
        let api_key = self.api_key()?;
        let body = Self::payload(request);

        tracing::debug!(backend = %self.name, endpoint = %self.endpoint, "sending generation request");

        let response = execute(
            self.client
                .post(&self.endpoint)
                .header("x-api-key", api_key.expose_secret())
                .json(&body),
            &self.name,
        )
        .await?;

        let media_type = Self::response_media_type(response.headers()).unwrap_or_else(|| self.media_type.clone());
        let bytes = read_body(response, &self.name).await?;

        if bytes.is_empty() {
            tracing::warn!(backend = %self.name, "generation backend returned an empty body");
            return Err(GenerationError::Backend(EMPTY_BODY_MESSAGE.to_string()));
        }

        tracing::debug!(backend = %self.name, media_type = %media_type, bytes = bytes.len(), "generation complete");

        Ok(vec![AssetRef::from_bytes(&media_type, &bytes)])
    }
}

#[async_trait]
impl GenerationBackend for BlockingAdapter {
    async fn run(&self, request: &GenerationRequest) -> Result<Vec<AssetRef>> {
        self.generate(request).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
