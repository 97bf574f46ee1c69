use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// Missing credentials are deliberately not checked here: they are
    /// reported per call as a configuration error.
    ///
    /// # Errors
    ///
    /// Returns an error if a base URL does not parse, a model identifier is
    /// empty, or the video timeout is malformed
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_image_backend()?;
        self.validate_video_backend()?;
        self.validate_health()?;
        Ok(())
    }

    fn validate_image_backend(&self) -> anyhow::Result<()> {
        url::Url::parse(&self.image.base_url)
            .map_err(|e| anyhow::anyhow!("invalid image.base_url '{}': {e}", self.image.base_url))?;

        if self.image.model_version.trim().is_empty() {
            anyhow::bail!("image.model_version must not be empty");
        }

        Ok(())
    }

    fn validate_video_backend(&self) -> anyhow::Result<()> {
        url::Url::parse(&self.video.base_url)
            .map_err(|e| anyhow::anyhow!("invalid video.base_url '{}': {e}", self.video.base_url))?;

        if self.video.model.trim().is_empty() {
            anyhow::bail!("video.model must not be empty");
        }

        if self.video.media_type.split_once('/').is_none() {
            anyhow::bail!("video.media_type must look like 'type/subtype', got '{}'", self.video.media_type);
        }

        self.video.timeout()?;

        Ok(())
    }

    fn validate_health(&self) -> anyhow::Result<()> {
        if self.server.health.enabled && !self.server.health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/'");
        }

        Ok(())
    }
}
