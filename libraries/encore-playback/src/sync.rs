//! Fire-and-forget persistence of settings and history
//!
//! The engine pushes [`SideEffect`]s onto an unbounded channel; sending never
//! blocks and never fails from the engine's point of view. A [`SyncWorker`]
//! task drains the channel in order and forwards each effect to the
//! collaborators. Failures are logged and dropped, they never reach the
//! player state.

use crate::collaborators::{HistoryLog, PlayRecord, PlayerSettings, SettingsPatch, SettingsStore};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Work queued for the collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    UpdateSettings(SettingsPatch),
    RecordPlay(PlayRecord),
}

/// Non-blocking handle used by the engine to queue side effects
#[derive(Debug, Clone, Default)]
pub struct SideEffectSender {
    tx: Option<mpsc::UnboundedSender<SideEffect>>,
}

impl SideEffectSender {
    /// Sender that discards everything
    pub fn detached() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, effect: SideEffect) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(err) = tx.send(effect) {
            debug!(effect = ?err.0, "Sync worker is gone, dropping side effect");
        }
    }

    pub fn update_settings(&self, patch: SettingsPatch) {
        self.send(SideEffect::UpdateSettings(patch));
    }

    pub fn record_play(&self, record: PlayRecord) {
        self.send(SideEffect::RecordPlay(record));
    }
}

/// Create a connected sender/receiver pair
pub fn side_effect_channel() -> (SideEffectSender, mpsc::UnboundedReceiver<SideEffect>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SideEffectSender { tx: Some(tx) }, rx)
}

/// Drains side effects into the collaborators
pub struct SyncWorker {
    rx: mpsc::UnboundedReceiver<SideEffect>,
    settings: Arc<dyn SettingsStore>,
    history: Arc<dyn HistoryLog>,
}

impl SyncWorker {
    pub fn new(
        rx: mpsc::UnboundedReceiver<SideEffect>,
        settings: Arc<dyn SettingsStore>,
        history: Arc<dyn HistoryLog>,
    ) -> Self {
        Self {
            rx,
            settings,
            history,
        }
    }

    /// Run until every sender has been dropped
    pub async fn run(mut self) {
        let mut processed = 0usize;
        while let Some(effect) = self.rx.recv().await {
            self.apply(effect).await;
            processed += 1;
        }
        debug!(processed, "Sync worker finished");
    }

    /// Run on the current tokio runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn apply(&self, effect: SideEffect) {
        match effect {
            SideEffect::UpdateSettings(patch) => {
                if let Err(err) = self.settings.update(&patch).await {
                    warn!(?patch, error = %err, "Failed to persist settings");
                }
            }
            SideEffect::RecordPlay(record) => {
                if let Err(err) = self.history.record(&record).await {
                    warn!(
                        track_id = %record.track_id,
                        completed = record.completed,
                        error = %err,
                        "Failed to record play"
                    );
                }
            }
        }
    }
}

/// Read the persisted settings once at startup
///
/// Falls back to defaults when the store is unreachable.
pub async fn load_settings(store: &dyn SettingsStore) -> PlayerSettings {
    match store.load().await {
        Ok(settings) => {
            info!(
                volume = settings.volume,
                shuffle = settings.shuffle,
                repeat = ?settings.repeat,
                auto_play = settings.auto_play,
                "Loaded player settings"
            );
            settings
        }
        Err(err) => {
            warn!(error = %err, "Failed to load settings, using defaults");
            PlayerSettings::default()
        }
    }
}
