//! Simulated audio output
//!
//! Stands in for a real media element: resources "play" by advancing a
//! virtual playhead on every clock tick and report readiness, progress and
//! natural end as [`AudioEvent`]s.

use encore_playback::{
    AudioBackend, AudioEvent, AudioEventKind, AudioResource, LoadToken, PlaybackError, Result,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

/// The one loaded resource, as seen by the clock
#[derive(Debug)]
struct Loaded {
    token: LoadToken,
    playing: bool,
    position: Duration,
    duration: Duration,
}

/// Shared playhead state
#[derive(Debug, Default)]
pub struct SimDeck {
    loaded: Option<Loaded>,
}

pub type SharedDeck = Arc<Mutex<SimDeck>>;

fn lock(deck: &SharedDeck) -> MutexGuard<'_, SimDeck> {
    deck.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Backend whose resources complete after a fixed length
pub struct SimulatedBackend {
    deck: SharedDeck,
    events: UnboundedSender<AudioEvent>,
    track_length: Duration,
}

impl SimulatedBackend {
    pub fn new(deck: SharedDeck, events: UnboundedSender<AudioEvent>, track_length: Duration) -> Self {
        Self {
            deck,
            events,
            track_length,
        }
    }
}

impl AudioBackend for SimulatedBackend {
    fn open(&mut self, url: &str, token: LoadToken) -> Result<Box<dyn AudioResource>> {
        if !url.starts_with("http://") && !url.starts_with("https://") && !url.starts_with('/') {
            return Err(PlaybackError::Resource(format!("unsupported source {}", url)));
        }

        lock(&self.deck).loaded = Some(Loaded {
            token,
            playing: false,
            position: Duration::ZERO,
            duration: self.track_length,
        });
        debug!(%token, url, "Simulated resource opened");

        // Metadata and readiness arrive "later", on the next loop turn
        let _ = self
            .events
            .send(AudioEvent::new(token, AudioEventKind::DurationChanged(self.track_length)));
        let _ = self.events.send(AudioEvent::new(token, AudioEventKind::Ready));

        Ok(Box::new(SimResource {
            token,
            deck: Arc::clone(&self.deck),
        }))
    }
}

struct SimResource {
    token: LoadToken,
    deck: SharedDeck,
}

impl SimResource {
    fn with_loaded(&self, f: impl FnOnce(&mut Loaded)) {
        let mut deck = lock(&self.deck);
        if let Some(loaded) = deck.loaded.as_mut().filter(|l| l.token == self.token) {
            f(loaded);
        }
    }
}

impl AudioResource for SimResource {
    fn play(&mut self) -> Result<()> {
        self.with_loaded(|l| l.playing = true);
        Ok(())
    }

    fn pause(&mut self) {
        self.with_loaded(|l| l.playing = false);
    }

    fn seek(&mut self, position: Duration) {
        self.with_loaded(|l| l.position = position.min(l.duration));
    }

    fn set_gain(&mut self, gain: f32) {
        trace!(token = %self.token, gain, "Simulated gain change");
    }

    fn release(&mut self) {
        let mut deck = lock(&self.deck);
        if deck.loaded.as_ref().is_some_and(|l| l.token == self.token) {
            deck.loaded = None;
            debug!(token = %self.token, "Simulated resource released");
        }
    }
}

/// Advances the playhead of the loaded resource
pub struct SimClock {
    deck: SharedDeck,
}

impl SimClock {
    pub fn new(deck: SharedDeck) -> Self {
        Self { deck }
    }

    /// Move time forward by `elapsed`, returning the resulting events
    pub fn tick(&self, elapsed: Duration) -> Vec<AudioEvent> {
        let mut deck = lock(&self.deck);
        let Some(loaded) = deck.loaded.as_mut().filter(|l| l.playing) else {
            return Vec::new();
        };

        loaded.position = (loaded.position + elapsed).min(loaded.duration);
        let mut events = vec![AudioEvent::new(
            loaded.token,
            AudioEventKind::TimeUpdate(loaded.position),
        )];

        if loaded.position >= loaded.duration {
            loaded.playing = false;
            events.push(AudioEvent::new(loaded.token, AudioEventKind::Ended));
        }
        events
    }
}
