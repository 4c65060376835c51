//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// Every variant is advisory: the engine stays usable after returning any of them.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Track has neither an uploaded file nor an external URL
    #[error("No audio available for track {track_id}")]
    NoAudioAvailable { track_id: String },

    /// The audio resource failed to open, load or decode
    #[error("Audio resource error: {0}")]
    Resource(String),

    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Settings store or history log failure
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for PlaybackError {
    fn from(err: config::ConfigError) -> Self {
        PlaybackError::Config(err.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
