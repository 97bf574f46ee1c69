//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use dimensify_config::{BlockingBackendConfig, Config, HealthConfig, PollingBackendConfig, ServerConfig};
use secrecy::SecretString;

use super::mock_backend::{IMAGE_TOKEN, VIDEO_KEY};

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Builder with no credentials and both backends at their defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig::default(),
                },
                ..Config::default()
            },
        }
    }

    /// Point both backends at a mock with valid credentials
    pub fn with_backends(self, base_url: &str) -> Self {
        self.with_image_backend(base_url, IMAGE_TOKEN)
            .with_video_backend(base_url, VIDEO_KEY)
    }

    pub fn with_image_backend(mut self, base_url: &str, token: &str) -> Self {
        self.config.image = PollingBackendConfig {
            api_key: Some(SecretString::from(token)),
            base_url: base_url.to_owned(),
            ..PollingBackendConfig::default()
        };
        self
    }

    pub fn with_video_backend(mut self, base_url: &str, key: &str) -> Self {
        self.config.video = BlockingBackendConfig {
            api_key: Some(SecretString::from(key)),
            base_url: base_url.to_owned(),
            ..BlockingBackendConfig::default()
        };
        self
    }

    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
