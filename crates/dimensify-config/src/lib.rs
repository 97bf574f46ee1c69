#![allow(clippy::must_use_candidate)]

pub mod backend;
mod env;
pub mod health;
mod loader;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use backend::*;
pub use health::*;
pub use server::*;
pub use telemetry::{LogFormat, TelemetryConfig};

/// Top-level Dimensify configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Image backend (submit-then-poll)
    #[serde(default)]
    pub image: PollingBackendConfig,
    /// Video backend (single blocking call)
    #[serde(default)]
    pub video: BlockingBackendConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
