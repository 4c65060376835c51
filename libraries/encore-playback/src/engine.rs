//! Playback engine - core orchestration
//!
//! Coordinates queue, transport, volume, shuffle/repeat policy, subscribers
//! and the fire-and-forget side effects (settings and history).

use crate::{
    backend::{AudioBackend, AudioEvent},
    collaborators::{PlayRecord, PlayerSettings, SettingsPatch},
    error::{PlaybackError, Result},
    events::{Notice, PlayerEvent, SubscriptionId, Subscribers},
    queue::Queue,
    resolver::resolve_with_base,
    sync::SideEffectSender,
    transport::{Transport, TransportSignal},
    types::{PlaybackConfig, PlayerState, RepeatMode, Track, TransportState},
    volume::Volume,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Headless playback engine
///
/// Owns the play queue and the single audio resource (through the transport).
/// All operations are synchronous with respect to queue and state; resource
/// readiness, errors, progress and natural end arrive later through
/// [`PlaybackEngine::handle_audio_event`].
pub struct PlaybackEngine {
    config: PlaybackConfig,
    transport: Transport,
    queue: Queue,
    volume: Volume,
    shuffle: bool,
    repeat: RepeatMode,
    autoplay: bool,

    /// Track owning the transport, tagged with its playlist context
    current_track: Option<Track>,

    /// Queue slot the current track was started from
    current_index: Option<usize>,

    subscribers: Subscribers,
    side_effects: SideEffectSender,
    rng: StdRng,
}

impl PlaybackEngine {
    /// Create a new engine
    ///
    /// Side effects are discarded until [`PlaybackEngine::with_side_effects`]
    /// connects a sender.
    pub fn new(config: PlaybackConfig, backend: Box<dyn AudioBackend>) -> Self {
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            volume: Volume::new(config.volume, config.gain_curve),
            shuffle: config.shuffle,
            repeat: config.repeat,
            autoplay: config.autoplay,
            transport: Transport::new(backend),
            queue: Queue::new(),
            current_track: None,
            current_index: None,
            subscribers: Subscribers::new(),
            side_effects: SideEffectSender::detached(),
            rng,
            config,
        }
    }

    /// Route settings updates and history records to `sender`
    pub fn with_side_effects(mut self, sender: SideEffectSender) -> Self {
        self.side_effects = sender;
        self
    }

    // ===== Subscriptions =====

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&PlayerEvent) + Send + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn subscribe_channel(&mut self) -> (SubscriptionId, mpsc::Receiver<PlayerEvent>) {
        self.subscribers.subscribe_channel()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // ===== Startup =====

    /// Seed volume/shuffle/repeat/autoplay from persisted settings
    ///
    /// Nothing is written back to the settings store.
    pub fn apply_settings(&mut self, settings: &PlayerSettings) {
        self.volume.set_level(settings.volume);
        self.transport.set_gain(self.volume.gain());
        self.shuffle = settings.shuffle;
        self.repeat = settings.repeat;
        self.autoplay = settings.auto_play;

        self.emit_volume_changed();
        self.emit(PlayerEvent::ShuffleChanged {
            enabled: self.shuffle,
        });
        self.emit(PlayerEvent::RepeatChanged { mode: self.repeat });
        self.emit(PlayerEvent::AutoplayChanged {
            enabled: self.autoplay,
        });
    }

    // ===== Playback Control =====

    /// Play a track
    ///
    /// Calling this with the track that is already current toggles between
    /// playing and paused instead of restarting. Any other track replaces the
    /// current resource. `context` is the playlist the request came from and
    /// wins over the track's own playlist tag for history.
    pub fn play(&mut self, track: &Track, context: Option<&str>) -> Result<()> {
        let is_current = self
            .current_track
            .as_ref()
            .is_some_and(|current| current.id == track.id);

        if is_current && self.transport.has_resource() {
            return self.toggle_play_pause();
        }

        self.start_track(track.clone(), context.map(str::to_string), None)
    }

    /// Replace the queue with `tracks` and play the entry at `start_index`
    ///
    /// `start_index` is clamped to the last entry. An empty list is ignored.
    pub fn play_all(
        &mut self,
        tracks: Vec<Track>,
        start_index: usize,
        context: Option<&str>,
    ) -> Result<()> {
        if tracks.is_empty() {
            return Ok(());
        }

        let count = tracks.len();
        let index = start_index.min(count - 1);
        self.queue.replace(tracks);
        self.current_index = None;
        self.emit_queue_changed();
        self.notify(Notice::info(format!("Playing {} tracks", count)));

        self.start_queue_entry(index, context.map(str::to_string))
    }

    /// Replace the queue with just `track` and play it
    pub fn play_now(&mut self, track: Track, context: Option<&str>) -> Result<()> {
        self.queue.replace(vec![track]);
        self.current_index = None;
        self.emit_queue_changed();

        self.start_queue_entry(0, context.map(str::to_string))
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.transport.pause() {
            self.emit_state_changed();
        }
    }

    /// Pause when playing, otherwise resume (or reload after a failure)
    pub fn toggle_play_pause(&mut self) -> Result<()> {
        if self.transport.is_playing() {
            self.pause();
            return Ok(());
        }

        if self.transport.has_resource() {
            return match self.transport.resume() {
                Ok(changed) => {
                    if changed {
                        self.emit_state_changed();
                    }
                    Ok(())
                }
                Err(err) => {
                    self.report_failure(&err);
                    Err(err)
                }
            };
        }

        match self.current_track.clone() {
            Some(track) => {
                let context = track.playlist_id.clone();
                self.start_track(track, context, self.current_index)
            }
            None => Ok(()),
        }
    }

    /// Seek within the current track
    pub fn seek(&mut self, position: Duration) -> Result<()> {
        let applied = self.transport.seek(position)?;
        self.emit(PlayerEvent::PositionChanged { position: applied });
        Ok(())
    }

    /// Skip to next track
    ///
    /// - Empty queue: stop
    /// - Current track not queued: play the first entry
    /// - Otherwise play the following entry; at the end wrap around with
    ///   repeat-all, or stop
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            debug!("Next requested on empty queue");
            self.halt();
            return Ok(());
        }

        let target = match self.locate_current() {
            None => Some(0),
            Some(index) if index + 1 < self.queue.len() => Some(index + 1),
            Some(_) if self.repeat == RepeatMode::All => Some(0),
            Some(_) => None,
        };

        match target {
            Some(index) => self.start_queue_entry(index, None),
            None => {
                debug!("Reached end of queue");
                self.halt();
                Ok(())
            }
        }
    }

    /// Go to previous track
    ///
    /// If past the restart threshold (3s by default), restarts the current
    /// track instead of navigating. Otherwise plays the entry before the
    /// current one, or the first entry when there is none.
    pub fn previous(&mut self) -> Result<()> {
        if self.current_track.is_some()
            && self.transport.has_resource()
            && self.transport.position() > self.config.restart_threshold
        {
            return self.seek(Duration::ZERO);
        }

        if self.queue.is_empty() {
            return Ok(());
        }

        let target = match self.locate_current() {
            Some(index) if index > 0 => index - 1,
            _ => 0,
        };
        self.start_queue_entry(target, None)
    }

    /// Feed an event from the audio backend into the engine
    ///
    /// Events from superseded loads are ignored. Failures are reported to
    /// subscribers as notices; the engine stays usable.
    pub fn handle_audio_event(&mut self, event: AudioEvent) {
        let Some(signal) = self.transport.handle_event(event) else {
            return;
        };

        match signal {
            TransportSignal::StateChanged(_) => self.emit_state_changed(),
            TransportSignal::Position(position) => {
                self.emit(PlayerEvent::PositionChanged { position });
            }
            TransportSignal::Duration(duration) => {
                self.emit(PlayerEvent::DurationChanged { duration });
            }
            TransportSignal::Failed(message) => {
                warn!(
                    track_id = self.current_track.as_ref().map(|t| t.id.as_str()),
                    error = %message,
                    "Playback failed"
                );
                self.emit_state_changed();
                self.notify(Notice::error("Failed to play audio"));
            }
            TransportSignal::Ended => self.handle_track_end(),
        }
    }

    /// Release the audio resource
    ///
    /// The engine can still be used afterwards; the next `play` opens a new
    /// resource.
    pub fn dispose(&mut self) {
        let changed = self.transport.stop();
        self.current_track = None;
        self.current_index = None;
        if changed {
            self.emit_state_changed();
        }
        debug!("Playback engine disposed");
    }

    // ===== Volume =====

    /// Set volume (clamped to 0-100)
    ///
    /// A non-zero level clears mute.
    pub fn set_volume(&mut self, level: u8) {
        self.volume.set_level(level);
        self.transport.set_gain(self.volume.gain());
        self.emit_volume_changed();
        self.side_effects
            .update_settings(SettingsPatch::volume(self.volume.level()));
    }

    /// Toggle mute state
    ///
    /// The persisted volume is left alone.
    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.transport.set_gain(self.volume.gain());
        self.emit_volume_changed();
    }

    // ===== Shuffle, Repeat & Autoplay =====

    /// Flip the shuffle flag
    ///
    /// Turning shuffle on randomizes the queue once around the current track.
    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;

        if self.shuffle && self.queue.len() > 1 {
            let pinned = self.locate_current();
            self.queue
                .shuffle_at(pinned, self.config.shuffle_strategy, &mut self.rng);
            self.current_index = pinned;
            self.emit_queue_changed();
        }

        self.emit(PlayerEvent::ShuffleChanged {
            enabled: self.shuffle,
        });
        self.notify(Notice::info(if self.shuffle {
            "Shuffle enabled"
        } else {
            "Shuffle disabled"
        }));
        self.side_effects
            .update_settings(SettingsPatch::shuffle(self.shuffle));
    }

    /// Cycle repeat mode `Off -> One -> All -> Off`
    pub fn toggle_repeat(&mut self) {
        self.set_repeat(self.repeat.cycle());
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
        self.emit(PlayerEvent::RepeatChanged { mode });
        self.notify(Notice::info(mode.label()));
        self.side_effects
            .update_settings(SettingsPatch::repeat(mode));
    }

    pub fn set_autoplay(&mut self, enabled: bool) {
        self.autoplay = enabled;
        self.emit(PlayerEvent::AutoplayChanged { enabled });
        self.side_effects
            .update_settings(SettingsPatch::auto_play(enabled));
    }

    // ===== Queue Management =====

    /// Add track to end of queue
    pub fn add_to_queue(&mut self, track: Track) {
        let message = format!("Added to queue: {}", track.song_name);
        self.queue.append(track);
        self.emit_queue_changed();
        self.notify(Notice::info(message));
    }

    /// Add tracks to end of queue
    pub fn add_all_to_queue(&mut self, tracks: Vec<Track>) {
        let count = tracks.len();
        self.queue.append_all(tracks);
        self.emit_queue_changed();
        self.notify(Notice::info(format!("Added {} tracks to queue", count)));
    }

    /// Remove the first queued occurrence of a track id
    ///
    /// Playback is not affected, even when the removed entry is current.
    pub fn remove_from_queue(&mut self, track_id: &str) -> Option<Track> {
        let removed = self.queue.remove_by_id(track_id)?;
        self.current_index = None;
        self.emit_queue_changed();
        Some(removed)
    }

    /// Clear entire queue (playback continues)
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.current_index = None;
        self.emit_queue_changed();
        self.notify(Notice::info("Queue cleared"));
    }

    /// Move a queue entry; out-of-range indices are ignored
    pub fn reorder_queue(&mut self, from: usize, to: usize) -> bool {
        if !self.queue.reorder(from, to) {
            return false;
        }
        self.current_index = None;
        self.emit_queue_changed();
        true
    }

    // ===== State Queries =====

    /// Full observable state
    pub fn snapshot(&self) -> PlayerState {
        PlayerState {
            current_track: self.current_track.clone(),
            is_playing: self.transport.is_playing(),
            current_time: self.transport.position(),
            duration: self.transport.duration(),
            volume: self.volume.level(),
            is_muted: self.volume.is_muted(),
            shuffle: self.shuffle,
            repeat_mode: self.repeat,
            autoplay: self.autoplay,
            transport: self.transport.state(),
            queue: self.queue.tracks().to_vec(),
        }
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn position(&self) -> Duration {
        self.transport.position()
    }

    pub fn duration(&self) -> Duration {
        self.transport.duration()
    }

    pub fn volume(&self) -> u8 {
        self.volume.level()
    }

    /// Level currently applied to the output (0 while muted)
    pub fn effective_volume(&self) -> u8 {
        self.volume.effective_level()
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    pub fn queue(&self) -> &[Track] {
        self.queue.tracks()
    }

    /// Queue index of the current track, if it is queued
    pub fn current_queue_index(&self) -> Option<usize> {
        self.locate_current()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    // ===== Internals =====

    /// Open a resource for `track` and make it current
    fn start_track(
        &mut self,
        mut track: Track,
        context: Option<String>,
        queue_index: Option<usize>,
    ) -> Result<()> {
        let Some(url) = resolve_with_base(&track, self.config.media_base_url.as_deref()) else {
            info!(track_id = %track.id, "Track has no playable source");
            self.notify(Notice::error("No audio available for this track"));
            return Err(PlaybackError::NoAudioAvailable { track_id: track.id });
        };

        track.playlist_id = context.or_else(|| track.playlist_id.take());
        let previous_track_id = self.current_track.as_ref().map(|t| t.id.clone());
        let result = self.transport.load(&url, self.volume.gain());

        let track_id = track.id.clone();
        let playlist_id = track.playlist_id.clone();
        self.current_track = Some(track);
        self.current_index = queue_index;
        self.emit(PlayerEvent::TrackChanged {
            track_id: track_id.clone(),
            previous_track_id,
        });
        self.emit(PlayerEvent::PositionChanged {
            position: Duration::ZERO,
        });
        self.emit_state_changed();

        match result {
            Ok(token) => {
                info!(track_id = %track_id, %token, "Starting track");
                self.side_effects
                    .record_play(PlayRecord::started(track_id, playlist_id));
                Ok(())
            }
            Err(err) => {
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    fn start_queue_entry(&mut self, index: usize, context: Option<String>) -> Result<()> {
        let Some(track) = self.queue.get(index).cloned() else {
            return Ok(());
        };
        self.start_track(track, context, Some(index))
    }

    /// Where the current track sits in the queue
    ///
    /// Prefers the slot it was started from if that slot still holds it,
    /// otherwise the first occurrence of its id.
    fn locate_current(&self) -> Option<usize> {
        let current = self.current_track.as_ref()?;

        if let Some(index) = self.current_index {
            if self.queue.get(index).is_some_and(|t| t.id == current.id) {
                return Some(index);
            }
        }
        self.queue.position_of(&current.id)
    }

    /// Natural end of the current track
    fn handle_track_end(&mut self) {
        self.emit_state_changed();

        if let Some(track) = &self.current_track {
            debug!(track_id = %track.id, "Track finished");
            self.side_effects.record_play(PlayRecord::completed(
                track.id.clone(),
                track.playlist_id.clone(),
                self.transport.position(),
            ));
        }

        if self.repeat == RepeatMode::One {
            self.replay_current();
        } else if self.autoplay {
            if let Err(err) = self.next() {
                debug!(error = %err, "Autoplay could not advance");
                self.halt();
            }
        } else {
            self.halt();
        }
    }

    /// Restart the current track from 0 (repeat-one)
    fn replay_current(&mut self) {
        match self.transport.restart() {
            Ok(()) => {
                if let Some(track) = &self.current_track {
                    self.side_effects.record_play(PlayRecord::started(
                        track.id.clone(),
                        track.playlist_id.clone(),
                    ));
                }
                self.emit(PlayerEvent::PositionChanged {
                    position: Duration::ZERO,
                });
                self.emit_state_changed();
            }
            Err(err) => self.report_failure(&err),
        }
    }

    /// Settle into the not-playing state without releasing the resource
    fn halt(&mut self) {
        if self.transport.settle() {
            self.emit_state_changed();
        }
    }

    fn report_failure(&mut self, err: &PlaybackError) {
        warn!(error = %err, "Playback request failed");
        self.emit_state_changed();
        self.notify(Notice::error("Failed to play audio"));
    }

    fn notify(&mut self, notice: Notice) {
        self.emit(PlayerEvent::Notice(notice));
    }

    fn emit(&mut self, event: PlayerEvent) {
        self.subscribers.emit(&event);
    }

    fn emit_state_changed(&mut self) {
        let state = self.transport.state();
        self.emit(PlayerEvent::StateChanged {
            state,
            is_playing: state.is_playing(),
        });
    }

    fn emit_volume_changed(&mut self) {
        self.emit(PlayerEvent::VolumeChanged {
            level: self.volume.level(),
            is_muted: self.volume.is_muted(),
        });
    }

    fn emit_queue_changed(&mut self) {
        self.emit(PlayerEvent::QueueChanged {
            length: self.queue.len(),
        });
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("transport", &self.transport)
            .field("current_track", &self.current_track.as_ref().map(|t| &t.id))
            .field("queue_len", &self.queue.len())
            .field("shuffle", &self.shuffle)
            .field("repeat", &self.repeat)
            .field("autoplay", &self.autoplay)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AudioEventKind, AudioResource, LoadToken};
    use crate::sync::{side_effect_channel, SideEffect};

    struct SilentBackend;
    struct SilentResource;

    impl AudioBackend for SilentBackend {
        fn open(&mut self, _url: &str, _token: LoadToken) -> Result<Box<dyn AudioResource>> {
            Ok(Box::new(SilentResource))
        }
    }

    impl AudioResource for SilentResource {
        fn play(&mut self) -> Result<()> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn seek(&mut self, _position: Duration) {}
        fn set_gain(&mut self, _gain: f32) {}
        fn release(&mut self) {}
    }

    fn create_engine() -> PlaybackEngine {
        let config = PlaybackConfig {
            shuffle_seed: Some(7),
            ..PlaybackConfig::default()
        };
        PlaybackEngine::new(config, Box::new(SilentBackend))
    }

    fn create_test_track(id: &str) -> Track {
        Track::new(id, format!("Track {}", id)).with_audio_file(format!("/uploads/{}.mp3", id))
    }

    fn ready(engine: &mut PlaybackEngine) {
        let token = engine.transport.token().unwrap();
        engine.handle_audio_event(AudioEvent::new(token, AudioEventKind::Ready));
    }

    #[test]
    fn create_engine_with_defaults() {
        let engine = create_engine();
        let state = engine.snapshot();

        assert!(state.current_track.is_none());
        assert!(!state.is_playing);
        assert_eq!(state.volume, 70);
        assert!(!state.is_muted);
        assert!(!state.shuffle);
        assert_eq!(state.repeat_mode, RepeatMode::Off);
        assert!(state.autoplay);
        assert_eq!(state.transport, TransportState::Idle);
    }

    #[test]
    fn play_sets_current_track_and_loads() {
        let mut engine = create_engine();
        engine.play(&create_test_track("a"), None).unwrap();

        assert_eq!(engine.current_track().map(|t| t.id.as_str()), Some("a"));
        assert_eq!(engine.transport_state(), TransportState::Loading);

        ready(&mut engine);
        assert_eq!(engine.transport_state(), TransportState::Playing);
    }

    #[test]
    fn unplayable_track_is_rejected() {
        let mut engine = create_engine();
        let result = engine.play(&Track::new("x", "No Source"), None);

        assert!(matches!(
            result,
            Err(PlaybackError::NoAudioAvailable { ref track_id }) if track_id == "x"
        ));
        assert!(engine.current_track().is_none());
        assert_eq!(engine.transport_state(), TransportState::Idle);
    }

    #[test]
    fn context_wins_over_track_playlist() {
        let (sender, mut rx) = side_effect_channel();
        let mut engine = create_engine().with_side_effects(sender);

        let track = create_test_track("a").with_playlist("own");
        engine.play(&track, Some("ctx")).unwrap();

        assert_eq!(
            engine.current_track().and_then(|t| t.playlist_id.as_deref()),
            Some("ctx")
        );
        match rx.try_recv().unwrap() {
            SideEffect::RecordPlay(record) => {
                assert_eq!(record.playlist_id.as_deref(), Some("ctx"));
                assert!(!record.completed);
            }
            other => panic!("unexpected side effect {:?}", other),
        }
    }

    #[test]
    fn set_volume_persists_and_unmutes() {
        let (sender, mut rx) = side_effect_channel();
        let mut engine = create_engine().with_side_effects(sender);

        engine.toggle_mute();
        assert!(engine.is_muted());
        assert!(rx.try_recv().is_err());

        engine.set_volume(200);
        assert!(!engine.is_muted());
        assert_eq!(engine.volume(), 100);
        assert_eq!(
            rx.try_recv().unwrap(),
            SideEffect::UpdateSettings(SettingsPatch::volume(100))
        );
    }

    #[test]
    fn apply_settings_does_not_persist() {
        let (sender, mut rx) = side_effect_channel();
        let mut engine = create_engine().with_side_effects(sender);

        let settings = PlayerSettings {
            volume: 25,
            auto_play: false,
            shuffle: true,
            repeat: RepeatMode::All,
            ..PlayerSettings::default()
        };
        engine.apply_settings(&settings);

        assert_eq!(engine.volume(), 25);
        assert!(!engine.autoplay());
        assert!(engine.shuffle());
        assert_eq!(engine.repeat(), RepeatMode::All);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dispose_releases_and_resets() {
        let mut engine = create_engine();
        engine.play(&create_test_track("a"), None).unwrap();

        engine.dispose();

        assert!(engine.current_track().is_none());
        assert_eq!(engine.transport_state(), TransportState::Idle);

        engine.play(&create_test_track("b"), None).unwrap();
        assert_eq!(engine.transport_state(), TransportState::Loading);
    }
}
