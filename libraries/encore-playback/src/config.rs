//! Configuration loading
//!
//! `PlaybackConfig::load` layers an optional TOML file under `ENCORE_*`
//! environment variables and falls back to struct defaults.

use crate::error::{PlaybackError, Result};
use crate::types::PlaybackConfig;
use std::path::Path;

impl PlaybackConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        // Override with environment variables (e.g. ENCORE_VOLUME, ENCORE_MEDIA_BASE_URL)
        builder = builder.add_source(
            config::Environment::with_prefix("ENCORE")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.volume > 100 {
            return Err(PlaybackError::Config(format!(
                "volume must be between 0 and 100, got {}",
                self.volume
            )));
        }

        if let Some(base) = &self.media_base_url {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(PlaybackError::Config(format!(
                    "media_base_url must start with http:// or https://, got {}",
                    base
                )));
            }
        }

        Ok(())
    }
}
