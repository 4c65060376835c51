//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Track record as served by the library backend
///
/// The engine never mutates a track apart from tagging it with the playlist
/// context it was started from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Opaque unique track identifier
    pub id: String,

    /// Display title
    pub song_name: String,

    #[serde(default)]
    pub artist: Option<String>,

    #[serde(default)]
    pub album: Option<String>,

    /// Display duration such as "3:45" (not used by the transport)
    #[serde(default)]
    pub duration: Option<String>,

    /// Uploaded file reference, rooted at the backend origin
    #[serde(default)]
    pub audio_file: Option<String>,

    /// External audio URL
    #[serde(default)]
    pub audio_url: Option<String>,

    /// Playlist the track belongs to, used as history context
    #[serde(default)]
    pub playlist_id: Option<String>,
}

impl Track {
    /// Create a track with only an id and a title
    pub fn new(id: impl Into<String>, song_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            song_name: song_name.into(),
            artist: None,
            album: None,
            duration: None,
            audio_file: None,
            audio_url: None,
            playlist_id: None,
        }
    }

    pub fn with_audio_file(mut self, path: impl Into<String>) -> Self {
        self.audio_file = Some(path.into());
        self
    }

    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_playlist(mut self, playlist_id: impl Into<String>) -> Self {
        self.playlist_id = Some(playlist_id.into());
        self
    }

    /// A track is playable iff it carries an uploaded file or an external URL
    pub fn is_playable(&self) -> bool {
        crate::resolver::resolve(self).is_some()
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop current track only
    One,

    /// Loop entire queue
    All,
}

impl RepeatMode {
    /// Next mode in the `Off -> One -> All -> Off` cycle
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::Off => "Repeat off",
            RepeatMode::One => "Repeat one",
            RepeatMode::All => "Repeat all",
        }
    }
}

/// Transport state of the single audio resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    /// No resource loaded
    #[default]
    Idle,

    /// Source assigned and playback requested, resource not yet ready
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track (or parked at the end of a track)
    Paused,

    /// Reached the natural end of the track
    Ended,

    /// Resource failed to load or decode
    Error,
}

impl TransportState {
    /// Whether the transport should be reported as playing
    ///
    /// `Loading` counts as playing because playback has been requested.
    pub fn is_playing(self) -> bool {
        matches!(self, TransportState::Playing | TransportState::Loading)
    }
}

/// How a 0-100 volume level maps to output gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GainCurve {
    /// gain = level / 100
    #[default]
    Linear,

    /// 0% = -60 dB, 100% = 0 dB
    Logarithmic,
}

/// Algorithm used when shuffle is switched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleStrategy {
    /// Extract the current entry, Fisher-Yates the rest, reinsert at the same index
    #[default]
    Uniform,

    /// Fisher-Yates over every slot, skipping any swap that touches the current entry
    PinnedSwap,
}

/// Observable snapshot of the player
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub current_track: Option<Track>,
    pub is_playing: bool,

    /// Playhead, serialized as seconds
    #[serde(with = "duration_secs")]
    pub current_time: Duration,

    #[serde(with = "duration_secs")]
    pub duration: Duration,
    pub volume: u8,
    pub is_muted: bool,
    pub shuffle: bool,
    pub repeat_mode: RepeatMode,
    pub autoplay: bool,
    pub transport: TransportState,
    pub queue: Vec<Track>,
}

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0-100, default: 70)
    pub volume: u8,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Advance to the next track on natural end (default: true)
    pub autoplay: bool,

    /// Position after which "previous" restarts the current track (default: 3s)
    #[serde(with = "duration_secs")]
    pub restart_threshold: Duration,

    /// Origin prepended to rooted uploaded-file paths
    pub media_base_url: Option<String>,

    pub gain_curve: GainCurve,

    pub shuffle_strategy: ShuffleStrategy,

    /// Fixed seed for shuffling; entropy-seeded when absent
    pub shuffle_seed: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 70,
            shuffle: false,
            repeat: RepeatMode::Off,
            autoplay: true,
            restart_threshold: Duration::from_secs(3),
            media_base_url: None,
            gain_curve: GainCurve::Linear,
            shuffle_strategy: ShuffleStrategy::Uniform,
            shuffle_seed: None,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
