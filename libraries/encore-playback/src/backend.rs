//! Platform-agnostic audio backend traits
//!
//! The host environment provides the actual media element (an HTML audio
//! element, a rodio sink, a native player...). The engine only ever holds one
//! `AudioResource` at a time and talks to it through these traits.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identifies one load request
///
/// Every call that opens a resource mints a new token. Events carrying an
/// older token belong to a superseded load and are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for LoadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Factory for audio resources
pub trait AudioBackend: Send {
    /// Start loading `url` into a new resource
    ///
    /// Must return immediately. Readiness, failures and progress are reported
    /// later through [`AudioEvent`]s tagged with `token`. Returning `Err`
    /// means the resource could not even be created.
    fn open(&mut self, url: &str, token: LoadToken) -> Result<Box<dyn AudioResource>>;
}

/// The single live media resource
pub trait AudioResource: Send {
    /// Request playback (autoplay once ready, or resume)
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Move the playhead
    fn seek(&mut self, position: Duration);

    /// Set output gain (0.0 - 1.0)
    fn set_gain(&mut self, gain: f32);

    /// Release the underlying media
    ///
    /// Called exactly once, after `pause`, before the next resource is opened.
    fn release(&mut self);
}

/// Notification from an audio resource
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEvent {
    /// Load the event belongs to
    pub token: LoadToken,
    pub kind: AudioEventKind,
}

impl AudioEvent {
    pub fn new(token: LoadToken, kind: AudioEventKind) -> Self {
        Self { token, kind }
    }
}

/// What happened on the resource
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEventKind {
    /// Resource is ready and autoplay has begun
    Ready,

    /// Resource failed to load or decode
    Error(String),

    /// Playhead moved (emitted on every tick while playing)
    TimeUpdate(Duration),

    /// Metadata became available
    DurationChanged(Duration),

    /// Natural end of media
    Ended,
}
