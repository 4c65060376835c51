//! Remote collaborators: settings store and play-history log
//!
//! The engine never calls these directly. It queues side effects that the
//! sync worker forwards to whatever implementation the host provides (the
//! HTTP clients in `encore-remote`, or the in-memory stores below).

use crate::error::Result;
use crate::types::{PlaybackConfig, RepeatMode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

/// Persisted player settings as returned by the settings store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerSettings {
    pub volume: u8,
    pub auto_play: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub theme: Option<String>,

    /// Fields the engine does not interpret (id, lastUpdated, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            volume: 70,
            auto_play: true,
            shuffle: false,
            repeat: RepeatMode::Off,
            theme: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl PlayerSettings {
    /// Overlay the persisted fields onto a configuration
    pub fn apply_to(&self, config: &mut PlaybackConfig) {
        config.volume = self.volume.min(100);
        config.autoplay = self.auto_play;
        config.shuffle = self.shuffle;
        config.repeat = self.repeat;
    }

    /// Merge a partial update into these settings
    pub fn merge(&mut self, patch: &SettingsPatch) {
        if let Some(volume) = patch.volume {
            self.volume = volume;
        }
        if let Some(auto_play) = patch.auto_play {
            self.auto_play = auto_play;
        }
        if let Some(shuffle) = patch.shuffle {
            self.shuffle = shuffle;
        }
        if let Some(repeat) = patch.repeat {
            self.repeat = repeat;
        }
    }
}

/// Partial settings update; absent fields are left untouched by the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_play: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shuffle: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatMode>,
}

impl SettingsPatch {
    pub fn volume(volume: u8) -> Self {
        Self {
            volume: Some(volume),
            ..Self::default()
        }
    }

    pub fn auto_play(enabled: bool) -> Self {
        Self {
            auto_play: Some(enabled),
            ..Self::default()
        }
    }

    pub fn shuffle(enabled: bool) -> Self {
        Self {
            shuffle: Some(enabled),
            ..Self::default()
        }
    }

    pub fn repeat(mode: RepeatMode) -> Self {
        Self {
            repeat: Some(mode),
            ..Self::default()
        }
    }
}

/// One entry of the append-only listening history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRecord {
    pub track_id: String,
    pub playlist_id: Option<String>,

    /// Seconds listened (0 for a start record)
    pub duration: f64,

    /// `true` only for natural completion
    pub completed: bool,
}

impl PlayRecord {
    pub fn started(track_id: impl Into<String>, playlist_id: Option<String>) -> Self {
        Self {
            track_id: track_id.into(),
            playlist_id,
            duration: 0.0,
            completed: false,
        }
    }

    pub fn completed(
        track_id: impl Into<String>,
        playlist_id: Option<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            playlist_id,
            duration: elapsed.as_secs_f64(),
            completed: true,
        }
    }
}

/// Remote settings store
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read the persisted settings
    async fn load(&self) -> Result<PlayerSettings>;

    /// Apply a partial update
    async fn update(&self, patch: &SettingsPatch) -> Result<()>;
}

/// Remote append-only history log
#[async_trait]
pub trait HistoryLog: Send + Sync {
    async fn record(&self, record: &PlayRecord) -> Result<()>;
}

/// Settings store kept in memory
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<PlayerSettings>,
}

impl MemorySettingsStore {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }

    pub fn current(&self) -> PlayerSettings {
        self.settings
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<PlayerSettings> {
        Ok(self.current())
    }

    async fn update(&self, patch: &SettingsPatch) -> Result<()> {
        let mut settings = self
            .settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        settings.merge(patch);
        Ok(())
    }
}

/// History log kept in memory
#[derive(Debug, Default)]
pub struct MemoryHistoryLog {
    records: Mutex<Vec<PlayRecord>>,
}

impl MemoryHistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PlayRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl HistoryLog for MemoryHistoryLog {
    async fn record(&self, record: &PlayRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }
}
