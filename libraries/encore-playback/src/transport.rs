//! Transport state machine
//!
//! Owns the one live audio resource and tracks its play state, playhead and
//! duration.
//!
//! ```text
//! Idle --load--> Loading --Ready--> Playing <--pause/resume--> Paused
//!                   |                  |
//!                 Error              Ended --(engine policy)--> Playing | Paused
//! ```
//!
//! Loading a new source always pauses and releases the previous resource
//! before the backend is asked for the next one, so two resources never
//! output at the same time.

use crate::backend::{AudioBackend, AudioEvent, AudioEventKind, AudioResource, LoadToken};
use crate::error::{PlaybackError, Result};
use crate::types::TransportState;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// What the engine needs to react to after an audio event
#[derive(Debug, Clone, PartialEq)]
pub enum TransportSignal {
    StateChanged(TransportState),
    Position(Duration),
    Duration(Duration),
    /// Natural end of the current resource
    Ended,
    /// Resource failed; the transport is now in `Error`
    Failed(String),
}

struct ActiveResource {
    token: LoadToken,
    resource: Box<dyn AudioResource>,
    /// Backend reported `Ready`
    ready: bool,
}

/// Wraps the single audio resource
pub struct Transport {
    backend: Box<dyn AudioBackend>,
    active: Option<ActiveResource>,
    state: TransportState,
    position: Duration,
    duration: Duration,
    last_token: LoadToken,
}

impl Transport {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            active: None,
            state: TransportState::Idle,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            last_token: LoadToken::new(0),
        }
    }

    /// Replace the current resource with a new one for `url`
    ///
    /// Returns as soon as the load has been issued; the transport is then in
    /// `Loading` until the backend reports `Ready` or `Error`.
    pub fn load(&mut self, url: &str, gain: f32) -> Result<LoadToken> {
        self.teardown();
        self.position = Duration::ZERO;
        self.duration = Duration::ZERO;

        let token = self.last_token.next();
        self.last_token = token;

        let mut resource = match self.backend.open(url, token) {
            Ok(resource) => resource,
            Err(err) => {
                warn!(%token, url, error = %err, "Failed to open audio resource");
                self.state = TransportState::Error;
                return Err(err);
            }
        };

        resource.set_gain(gain);
        if let Err(err) = resource.play() {
            warn!(%token, url, error = %err, "Audio resource rejected play request");
            resource.release();
            self.state = TransportState::Error;
            return Err(err);
        }

        debug!(%token, url, "Loading audio resource");
        self.active = Some(ActiveResource {
            token,
            resource,
            ready: false,
        });
        self.state = TransportState::Loading;
        Ok(token)
    }

    /// Pause playback (or a pending load)
    ///
    /// Returns `true` if the state changed.
    pub fn pause(&mut self) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        active.resource.pause();
        self.state = TransportState::Paused;
        true
    }

    /// Resume a paused resource from where it stopped
    ///
    /// A resource parked at its end starts over from 0. Returns `true` if the
    /// state changed.
    pub fn resume(&mut self) -> Result<bool> {
        if !matches!(self.state, TransportState::Paused | TransportState::Ended) {
            return Ok(false);
        }
        let at_end = self.is_at_end();
        let Some(active) = self.active.as_mut() else {
            return Ok(false);
        };

        if at_end || self.state == TransportState::Ended {
            active.resource.seek(Duration::ZERO);
            self.position = Duration::ZERO;
        }

        active.resource.play()?;
        self.state = if active.ready {
            TransportState::Playing
        } else {
            TransportState::Loading
        };
        Ok(true)
    }

    /// Rewind to 0 and play
    pub fn restart(&mut self) -> Result<()> {
        let active = self.active.as_mut().ok_or(PlaybackError::NoTrackLoaded)?;

        active.resource.seek(Duration::ZERO);
        active.resource.play()?;
        self.position = Duration::ZERO;
        self.state = if active.ready {
            TransportState::Playing
        } else {
            TransportState::Loading
        };
        Ok(())
    }

    /// Move the playhead without changing the play state
    ///
    /// The target is clamped to `[0, duration]` once the duration is known.
    /// Returns the position actually applied.
    pub fn seek(&mut self, position: Duration) -> Result<Duration> {
        let active = self.active.as_mut().ok_or(PlaybackError::NoTrackLoaded)?;

        let target = if self.duration > Duration::ZERO {
            position.min(self.duration)
        } else {
            position
        };

        active.resource.seek(target);
        self.position = target;
        Ok(target)
    }

    /// Stop at the end of a track without advancing
    pub fn settle(&mut self) -> bool {
        if self.active.is_none() || self.state == TransportState::Paused {
            return false;
        }
        if let Some(active) = self.active.as_mut() {
            active.resource.pause();
        }
        self.state = TransportState::Paused;
        true
    }

    /// Release the resource and return to `Idle`
    pub fn stop(&mut self) -> bool {
        let changed = self.state != TransportState::Idle;
        self.teardown();
        self.state = TransportState::Idle;
        self.position = Duration::ZERO;
        self.duration = Duration::ZERO;
        changed
    }

    pub fn set_gain(&mut self, gain: f32) {
        if let Some(active) = self.active.as_mut() {
            active.resource.set_gain(gain);
        }
    }

    /// Apply an event from the backend
    ///
    /// Events from superseded loads are ignored and yield `None`.
    pub fn handle_event(&mut self, event: AudioEvent) -> Option<TransportSignal> {
        let Some(active) = self.active.as_mut() else {
            trace!(token = %event.token, "Dropping audio event, no live resource");
            return None;
        };
        if active.token != event.token {
            trace!(
                token = %event.token,
                live = %active.token,
                "Dropping audio event from superseded load"
            );
            return None;
        }

        match event.kind {
            AudioEventKind::Ready => {
                active.ready = true;
                if self.state == TransportState::Loading {
                    self.state = TransportState::Playing;
                    Some(TransportSignal::StateChanged(TransportState::Playing))
                } else {
                    None
                }
            }
            AudioEventKind::Error(message) => {
                warn!(token = %event.token, error = %message, "Audio resource failed");
                self.teardown();
                self.state = TransportState::Error;
                Some(TransportSignal::Failed(message))
            }
            AudioEventKind::TimeUpdate(position) => {
                self.position = if self.duration > Duration::ZERO {
                    position.min(self.duration)
                } else {
                    position
                };
                Some(TransportSignal::Position(self.position))
            }
            AudioEventKind::DurationChanged(duration) => {
                self.duration = duration;
                Some(TransportSignal::Duration(duration))
            }
            AudioEventKind::Ended => {
                if self.duration > Duration::ZERO {
                    self.position = self.duration;
                }
                self.state = TransportState::Ended;
                Some(TransportSignal::Ended)
            }
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Token of the live resource, if any
    pub fn token(&self) -> Option<LoadToken> {
        self.active.as_ref().map(|a| a.token)
    }

    pub fn has_resource(&self) -> bool {
        self.active.is_some()
    }

    fn is_at_end(&self) -> bool {
        self.duration > Duration::ZERO && self.position >= self.duration
    }

    fn teardown(&mut self) {
        if let Some(mut active) = self.active.take() {
            debug!(token = %active.token, "Releasing audio resource");
            active.resource.pause();
            active.resource.release();
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("state", &self.state)
            .field("token", &self.token())
            .field("position", &self.position)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}
