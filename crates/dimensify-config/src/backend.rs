use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Replicate API root used by the image backend
pub const DEFAULT_POLLING_BASE_URL: &str = "https://api.replicate.com/v1";

/// Fooocus model version submitted with every image prediction
pub const DEFAULT_MODEL_VERSION: &str =
    "konieshadow/fooocus-api:fda927242b1db6affa1ece4f54c37f19b964666bf23b0d06ae2439067cd344a4";

/// Segmind API root used by the video backend
pub const DEFAULT_BLOCKING_BASE_URL: &str = "https://api.segmind.com/v1";

/// Segmind model path for text-to-video
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2";

/// Media type tag applied when the backend does not report one
pub const DEFAULT_VIDEO_MEDIA_TYPE: &str = "video/mp4";

/// Backend that accepts a job and is polled until the job finishes
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollingBackendConfig {
    /// API token
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default = "default_polling_base_url")]
    pub base_url: String,
    /// Model version sent with each submission
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

impl Default for PollingBackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_polling_base_url(),
            model_version: default_model_version(),
        }
    }
}

/// Backend that answers a single request with the finished media bytes
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockingBackendConfig {
    /// API key
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default = "default_blocking_base_url")]
    pub base_url: String,
    /// Model path appended to the base URL
    #[serde(default = "default_video_model")]
    pub model: String,
    /// Media type used for the data URI when the response carries none
    #[serde(default = "default_media_type")]
    pub media_type: String,
    /// Client-side request timeout (e.g. "5m"); unset leaves the call unbounded
    #[serde(default)]
    pub timeout: Option<String>,
}

impl Default for BlockingBackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_blocking_base_url(),
            model: default_video_model(),
            media_type: default_media_type(),
            timeout: None,
        }
    }
}

impl BlockingBackendConfig {
    /// Parsed request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if `timeout` is not a valid duration string
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|s| duration_str::parse(s).map_err(|e| anyhow::anyhow!("invalid video.timeout '{s}': {e}")))
            .transpose()
    }
}

/// Treat an empty secret the same as an absent one
///
/// `{{ env.VAR | default("") }}` expands to an empty string when the
/// variable is unset, which must read as "not configured".
pub fn configured_secret(secret: Option<&SecretString>) -> Option<SecretString> {
    secret.filter(|s| !s.expose_secret().trim().is_empty()).cloned()
}

fn default_polling_base_url() -> String {
    DEFAULT_POLLING_BASE_URL.to_string()
}

fn default_model_version() -> String {
    DEFAULT_MODEL_VERSION.to_string()
}

fn default_blocking_base_url() -> String {
    DEFAULT_BLOCKING_BASE_URL.to_string()
}

fn default_video_model() -> String {
    DEFAULT_VIDEO_MODEL.to_string()
}

fn default_media_type() -> String {
    DEFAULT_VIDEO_MEDIA_TYPE.to_string()
}
