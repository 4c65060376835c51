//! Player events
//!
//! Subscribers are notified on every change of the observable player state:
//! - Transport state changes (loading/playing/paused/...)
//! - Track changes
//! - Position and duration updates
//! - Volume, queue, shuffle, repeat and autoplay changes
//! - User-visible notices (advisory errors and confirmations)

use crate::types::{RepeatMode, TransportState};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::time::Duration;

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Transport state changed
    StateChanged {
        state: TransportState,
        is_playing: bool,
    },

    /// A different track became current
    TrackChanged {
        track_id: String,
        previous_track_id: Option<String>,
    },

    /// Playhead moved
    PositionChanged { position: Duration },

    /// Track duration became known
    DurationChanged { duration: Duration },

    VolumeChanged { level: u8, is_muted: bool },

    /// Tracks added/removed/reordered/shuffled
    QueueChanged { length: usize },

    ShuffleChanged { enabled: bool },

    RepeatChanged { mode: RepeatMode },

    AutoplayChanged { enabled: bool },

    /// Message meant for the user
    Notice(Notice),
}

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// User-visible, non-fatal notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&PlayerEvent) + Send>;

/// Callback list notified on every event
#[derive(Default)]
pub struct Subscribers {
    callbacks: Vec<(SubscriptionId, Callback)>,
    next_id: u64,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&PlayerEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Subscribe through a channel instead of a callback
    ///
    /// Events sent after the receiver is dropped are discarded.
    pub fn subscribe_channel(&mut self) -> (SubscriptionId, mpsc::Receiver<PlayerEvent>) {
        let (tx, rx) = mpsc::channel();
        let id = self.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        (id, rx)
    }

    /// Returns `true` if the subscription existed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(sub, _)| *sub != id);
        self.callbacks.len() != before
    }

    pub fn emit(&mut self, event: &PlayerEvent) {
        for (_, callback) in &mut self.callbacks {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn callbacks_receive_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subscribers = Subscribers::new();
        let sink = Arc::clone(&seen);
        subscribers.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        subscribers.emit(&PlayerEvent::ShuffleChanged { enabled: true });
        subscribers.emit(&PlayerEvent::QueueChanged { length: 3 });

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                PlayerEvent::ShuffleChanged { enabled: true },
                PlayerEvent::QueueChanged { length: 3 },
            ]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut subscribers = Subscribers::new();
        let (id, rx) = subscribers.subscribe_channel();

        subscribers.emit(&PlayerEvent::AutoplayChanged { enabled: false });
        assert!(subscribers.unsubscribe(id));
        subscribers.emit(&PlayerEvent::AutoplayChanged { enabled: true });

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(received, vec![PlayerEvent::AutoplayChanged { enabled: false }]);
        assert!(!subscribers.unsubscribe(id));
        assert!(subscribers.is_empty());
    }

    #[test]
    fn dropped_receiver_does_not_break_emit() {
        let mut subscribers = Subscribers::new();
        let (_, rx) = subscribers.subscribe_channel();
        drop(rx);

        subscribers.emit(&PlayerEvent::Notice(Notice::info("still fine")));
        assert_eq!(subscribers.len(), 1);
    }
}
