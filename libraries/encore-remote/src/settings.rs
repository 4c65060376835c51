//! Player settings persisted on the Encore backend.

use crate::client::{authorize, check, send};
use crate::error::{RemoteError, Result};
use crate::types::ServerConfig;
use async_trait::async_trait;
use encore_playback::{PlayerSettings, SettingsPatch, SettingsStore};
use reqwest::Client;
use tracing::debug;

/// Settings client for `GET`/`PUT /api/settings`.
#[derive(Debug, Clone)]
pub struct SettingsClient {
    http: Client,
    config: ServerConfig,
}

impl SettingsClient {
    pub(crate) fn new(http: Client, config: ServerConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/settings", self.config.url)
    }

    /// Fetch the persisted settings.
    pub async fn fetch_settings(&self) -> Result<PlayerSettings> {
        let url = self.endpoint();
        debug!(url = %url, "Fetching player settings");

        let response = check(send(authorize(self.http.get(&url), &self.config)).await?).await?;

        response.json().await.map_err(|e| {
            RemoteError::ParseError(format!("Failed to parse settings response: {}", e))
        })
    }

    /// Send a partial settings update.
    ///
    /// Only the fields present in `patch` are sent.
    pub async fn put_settings(&self, patch: &SettingsPatch) -> Result<()> {
        let url = self.endpoint();
        debug!(url = %url, ?patch, "Updating player settings");

        check(send(authorize(self.http.put(&url), &self.config).json(patch)).await?).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for SettingsClient {
    async fn load(&self) -> encore_playback::Result<PlayerSettings> {
        Ok(self.fetch_settings().await?)
    }

    async fn update(&self, patch: &SettingsPatch) -> encore_playback::Result<()> {
        Ok(self.put_settings(patch).await?)
    }
}
