//! Encore - Playback Engine
//!
//! Headless playback orchestration for the Encore music player.
//!
//! This crate provides:
//! - Play queue (append, remove, reorder, shuffle around the current track)
//! - Transport state machine over a single, replaceable audio resource
//! - Next/previous navigation with repeat (Off, One, All) and autoplay
//! - Volume control (0-100, mute toggle, linear or logarithmic gain)
//! - Audio source resolution (uploaded file vs external URL)
//! - Observer subscriptions and user-visible notices
//! - Fire-and-forget settings persistence and listening history
//!
//! # Architecture
//!
//! `encore-playback` knows nothing about any concrete audio output or HTTP
//! backend:
//! - Audio output is provided through [`AudioBackend`] / [`AudioResource`]
//! - Asynchronous progress arrives as [`AudioEvent`]s tagged with a
//!   [`LoadToken`]; events of superseded loads are dropped
//! - Settings and history go through [`SettingsStore`] / [`HistoryLog`],
//!   driven by a [`SyncWorker`] so the engine never waits on the network
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use encore_playback::{
//!     AudioBackend, AudioResource, LoadToken, PlaybackConfig, PlaybackEngine, Result, Track,
//! };
//! use std::time::Duration;
//!
//! struct NullBackend;
//! struct NullResource;
//!
//! impl AudioBackend for NullBackend {
//!     fn open(&mut self, _url: &str, _token: LoadToken) -> Result<Box<dyn AudioResource>> {
//!         Ok(Box::new(NullResource))
//!     }
//! }
//!
//! impl AudioResource for NullResource {
//!     fn play(&mut self) -> Result<()> { Ok(()) }
//!     fn pause(&mut self) {}
//!     fn seek(&mut self, _position: Duration) {}
//!     fn set_gain(&mut self, _gain: f32) {}
//!     fn release(&mut self) {}
//! }
//!
//! let mut engine = PlaybackEngine::new(PlaybackConfig::default(), Box::new(NullBackend));
//!
//! let tracks = vec![
//!     Track::new("1", "Intro").with_audio_file("/uploads/intro.mp3"),
//!     Track::new("2", "Outro").with_audio_url("https://cdn.example.com/outro.mp3"),
//! ];
//!
//! engine.play_all(tracks, 0, Some("playlist-1")).unwrap();
//! assert!(engine.is_playing());
//!
//! engine.next().unwrap();
//! assert_eq!(engine.current_track().unwrap().id, "2");
//! ```
//!
//! # Example: Persisting Settings and History
//!
//! ```rust,no_run
//! use encore_playback::{
//!     load_settings, side_effect_channel, MemoryHistoryLog, MemorySettingsStore, SyncWorker,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let settings = Arc::new(MemorySettingsStore::default());
//! let history = Arc::new(MemoryHistoryLog::new());
//!
//! let (sender, rx) = side_effect_channel();
//! SyncWorker::new(rx, settings.clone(), history.clone()).spawn();
//!
//! let persisted = load_settings(settings.as_ref()).await;
//! // engine.with_side_effects(sender).apply_settings(&persisted);
//! # let _ = (sender, persisted);
//! # }
//! ```

mod backend;
mod collaborators;
mod config;
mod engine;
mod error;
pub mod events;
mod queue;
pub mod resolver;
pub mod shuffle;
mod sync;
mod transport;
pub mod types;
mod volume;

// Public exports
pub use backend::{AudioBackend, AudioEvent, AudioEventKind, AudioResource, LoadToken};
pub use collaborators::{
    HistoryLog, MemoryHistoryLog, MemorySettingsStore, PlayRecord, PlayerSettings, SettingsPatch,
    SettingsStore,
};
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use events::{Notice, NoticeLevel, PlayerEvent, SubscriptionId};
pub use queue::Queue;
pub use sync::{load_settings, side_effect_channel, SideEffect, SideEffectSender, SyncWorker};
pub use transport::{Transport, TransportSignal};
pub use types::{
    GainCurve, PlaybackConfig, PlayerState, RepeatMode, ShuffleStrategy, Track, TransportState,
};
pub use volume::Volume;
