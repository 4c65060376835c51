//! Encore Remote Collaborators
//!
//! HTTP implementations of the playback engine's settings store and history
//! log, talking to the Encore backend.
//!
//! # Endpoints
//!
//! - **Settings**: `GET /api/settings`, `PUT /api/settings` (partial update)
//! - **History**: `POST /api/history` with `{trackId, playlistId, duration, completed}`
//!
//! # Example
//!
//! ```ignore
//! use encore_playback::{side_effect_channel, SyncWorker};
//! use encore_remote::{RemoteClient, ServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RemoteClient::new(ServerConfig::new("http://localhost:8001"))?;
//!
//!     let (sender, rx) = side_effect_channel();
//!     SyncWorker::new(rx, Arc::new(client.settings()), Arc::new(client.history())).spawn();
//!
//!     // hand `sender` to PlaybackEngine::with_side_effects
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod history;
mod settings;
mod types;

// Re-export main types
pub use client::RemoteClient;
pub use error::{RemoteError, Result};
pub use history::HistoryClient;
pub use settings::SettingsClient;
pub use types::ServerConfig;
