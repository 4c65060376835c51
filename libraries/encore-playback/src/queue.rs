//! Play queue
//!
//! An ordered list of tracks. Insertion order matters and the same track may
//! appear more than once. Every operation is total: out-of-range input is a
//! no-op rather than an error.

use crate::shuffle::shuffle_around;
use crate::types::{ShuffleStrategy, Track};
use rand::Rng;

/// Ordered play queue
///
/// ```text
/// index  0        1        2        3
///        Track A  Track B  Track C  Track B   <- duplicates allowed
///                 ^ currently playing (by id)
/// ```
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self { tracks: Vec::new() }
    }

    /// Add track to the end of the queue
    pub fn append(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Add tracks to the end of the queue, keeping their order
    pub fn append_all(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.tracks.extend(tracks);
    }

    /// Replace the entire queue
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
    }

    /// Remove the first occurrence of a track id
    ///
    /// Only one copy is removed per call when the id appears more than once.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Track> {
        let index = self.position_of(id)?;
        Some(self.tracks.remove(index))
    }

    /// Clear entire queue
    ///
    /// Does not affect the transport.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Move the track at `from` so that it ends up at `to`
    ///
    /// Returns `false` (and leaves the queue untouched) when either index is
    /// out of range.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.tracks.len();
        if from >= len || to >= len {
            return false;
        }

        if from != to {
            let track = self.tracks.remove(from);
            self.tracks.insert(to, track);
        }
        true
    }

    /// Randomize the queue while keeping the current track in place
    ///
    /// The first occurrence of `current_id` stays at its index. With no
    /// current track (or one that is not queued) every entry may move.
    pub fn shuffle<R: Rng + ?Sized>(
        &mut self,
        current_id: Option<&str>,
        strategy: ShuffleStrategy,
        rng: &mut R,
    ) {
        let pinned = current_id.and_then(|id| self.position_of(id));
        self.shuffle_at(pinned, strategy, rng);
    }

    /// Randomize the queue keeping the entry at `pinned` in place
    pub fn shuffle_at<R: Rng + ?Sized>(
        &mut self,
        pinned: Option<usize>,
        strategy: ShuffleStrategy,
        rng: &mut R,
    ) {
        shuffle_around(&mut self.tracks, pinned, strategy, rng);
    }

    /// Index of the first occurrence of a track id
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn first(&self) -> Option<&Track> {
        self.tracks.first()
    }

    /// All tracks in queue order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_track(id: &str) -> Track {
        Track::new(id, format!("Track {}", id)).with_audio_file(format!("/uploads/{}.mp3", id))
    }

    fn queue_of(ids: &[&str]) -> Queue {
        let mut queue = Queue::new();
        queue.append_all(ids.iter().map(|id| create_test_track(id)));
        queue
    }

    fn ids(queue: &Queue) -> Vec<&str> {
        queue.tracks().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn create_empty_queue() {
        let queue = Queue::new();
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
        assert!(queue.first().is_none());
    }

    #[test]
    fn append_allows_duplicates() {
        let mut queue = Queue::new();
        queue.append(create_test_track("a"));
        queue.append(create_test_track("a"));

        assert_eq!(ids(&queue), vec!["a", "a"]);
    }

    #[test]
    fn append_all_keeps_order() {
        let queue = queue_of(&["a", "b", "c"]);
        assert_eq!(ids(&queue), vec!["a", "b", "c"]);
    }

    #[test]
    fn remove_by_id_removes_first_occurrence_only() {
        let mut queue = queue_of(&["a", "b", "a", "c"]);

        let removed = queue.remove_by_id("a");

        assert_eq!(removed.map(|t| t.id), Some("a".to_string()));
        assert_eq!(ids(&queue), vec!["b", "a", "c"]);
    }

    #[test]
    fn remove_missing_id_is_noop() {
        let mut queue = queue_of(&["a", "b"]);
        assert!(queue.remove_by_id("zzz").is_none());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn clear_queue() {
        let mut queue = queue_of(&["a", "b"]);
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn reorder_moves_forward_and_backward() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);

        assert!(queue.reorder(0, 2));
        assert_eq!(ids(&queue), vec!["b", "c", "a", "d"]);

        assert!(queue.reorder(3, 0));
        assert_eq!(ids(&queue), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn reorder_out_of_range_is_noop() {
        let mut queue = queue_of(&["a", "b"]);

        assert!(!queue.reorder(5, 0));
        assert!(!queue.reorder(0, 5));
        assert_eq!(ids(&queue), vec!["a", "b"]);
    }

    #[test]
    fn shuffle_keeps_current_track_index() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut queue = queue_of(&["a", "b", "c", "d", "e", "f", "g"]);

        queue.shuffle(Some("d"), ShuffleStrategy::PinnedSwap, &mut rng);

        assert_eq!(queue.get(3).map(|t| t.id.as_str()), Some("d"));
        assert_eq!(queue.len(), 7);
    }

    #[test]
    fn shuffle_with_unknown_current_still_shuffles() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut queue = queue_of(&["a", "b", "c", "d", "e", "f", "g", "h"]);

        queue.shuffle(Some("zzz"), ShuffleStrategy::Uniform, &mut rng);

        let mut sorted = ids(&queue);
        sorted.sort_unstable();
        assert_eq!(sorted, vec!["a", "b", "c", "d", "e", "f", "g", "h"]);
    }
}
