//! Listening history on the Encore backend.

use crate::client::{authorize, check, send};
use crate::error::Result;
use crate::types::ServerConfig;
use async_trait::async_trait;
use encore_playback::{HistoryLog, PlayRecord};
use reqwest::Client;
use tracing::debug;

/// History client for `POST /api/history`.
#[derive(Debug, Clone)]
pub struct HistoryClient {
    http: Client,
    config: ServerConfig,
}

impl HistoryClient {
    pub(crate) fn new(http: Client, config: ServerConfig) -> Self {
        Self { http, config }
    }

    /// Append one play record.
    pub async fn post_record(&self, record: &PlayRecord) -> Result<()> {
        let url = format!("{}/api/history", self.config.url);
        debug!(
            url = %url,
            track_id = %record.track_id,
            completed = record.completed,
            "Recording play"
        );

        check(send(authorize(self.http.post(&url), &self.config).json(record)).await?).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryLog for HistoryClient {
    async fn record(&self, record: &PlayRecord) -> encore_playback::Result<()> {
        Ok(self.post_record(record).await?)
    }
}
