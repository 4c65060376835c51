//! Shuffle algorithms for queue randomization
//!
//! Both strategies keep the currently playing entry in its slot.

use crate::types::{ShuffleStrategy, Track};
use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffle a queue of tracks around an optional pinned index
///
/// The entry at `pinned` (if any and in range) keeps its position; every other
/// entry may move.
pub fn shuffle_around<R: Rng + ?Sized>(
    tracks: &mut Vec<Track>,
    pinned: Option<usize>,
    strategy: ShuffleStrategy,
    rng: &mut R,
) {
    if tracks.len() < 2 {
        return;
    }

    let pinned = pinned.filter(|&index| index < tracks.len());

    match strategy {
        ShuffleStrategy::Uniform => shuffle_uniform(tracks, pinned, rng),
        ShuffleStrategy::PinnedSwap => shuffle_pinned_swap(tracks, pinned, rng),
    }
}

/// Extract the pinned entry, Fisher-Yates the rest, reinsert it
///
/// Every permutation of the non-pinned entries is equally likely.
fn shuffle_uniform<R: Rng + ?Sized>(tracks: &mut Vec<Track>, pinned: Option<usize>, rng: &mut R) {
    match pinned {
        Some(index) => {
            let current = tracks.remove(index);
            tracks.shuffle(rng);
            tracks.insert(index, current);
        }
        None => tracks.shuffle(rng),
    }
}

/// Fisher-Yates over every slot, skipping swaps that touch the pinned slot
///
/// The pinned entry never moves, but the rest is not guaranteed to be a
/// uniform permutation.
fn shuffle_pinned_swap<R: Rng + ?Sized>(
    tracks: &mut [Track],
    pinned: Option<usize>,
    rng: &mut R,
) {
    for i in (1..tracks.len()).rev() {
        if Some(i) == pinned {
            continue;
        }
        let j = rng.gen_range(0..=i);
        if Some(j) != pinned {
            tracks.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn create_tracks(count: usize) -> Vec<Track> {
        (0..count)
            .map(|i| {
                Track::new(format!("track{}", i), format!("Track {}", i))
                    .with_audio_file(format!("/uploads/{}.mp3", i))
            })
            .collect()
    }

    fn ids(tracks: &[Track]) -> Vec<String> {
        tracks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn pinned_entry_keeps_its_slot() {
        let mut rng = StdRng::seed_from_u64(7);

        for strategy in [ShuffleStrategy::Uniform, ShuffleStrategy::PinnedSwap] {
            for pinned in 0..10 {
                let mut tracks = create_tracks(10);
                let expected = tracks[pinned].id.clone();

                shuffle_around(&mut tracks, Some(pinned), strategy, &mut rng);

                assert_eq!(tracks[pinned].id, expected);
                assert_eq!(tracks.len(), 10);
            }
        }
    }

    #[test]
    fn shuffle_preserves_all_tracks() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut tracks = create_tracks(20);
        let mut before = ids(&tracks);

        shuffle_around(&mut tracks, Some(3), ShuffleStrategy::Uniform, &mut rng);

        let mut after = ids(&tracks);
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn shuffle_without_pin_moves_tracks() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut tracks = create_tracks(30);
        let original = ids(&tracks);

        shuffle_around(&mut tracks, None, ShuffleStrategy::Uniform, &mut rng);

        assert_ne!(ids(&tracks), original);
    }

    #[test]
    fn out_of_range_pin_is_ignored() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut tracks = create_tracks(5);

        shuffle_around(&mut tracks, Some(99), ShuffleStrategy::PinnedSwap, &mut rng);

        assert_eq!(tracks.len(), 5);
    }

    #[test]
    fn single_track_is_untouched() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut tracks = create_tracks(1);

        shuffle_around(&mut tracks, Some(0), ShuffleStrategy::Uniform, &mut rng);

        assert_eq!(ids(&tracks), vec!["track0".to_string()]);
    }

    #[test]
    fn uniform_strategy_reaches_every_position() {
        // With the pin at 0, each other track should land in every other slot
        let mut rng = StdRng::seed_from_u64(99);
        let mut seen: HashMap<String, [bool; 4]> = HashMap::new();

        for _ in 0..500 {
            let mut tracks = create_tracks(4);
            shuffle_around(&mut tracks, Some(0), ShuffleStrategy::Uniform, &mut rng);
            for (index, track) in tracks.iter().enumerate() {
                seen.entry(track.id.clone()).or_default()[index] = true;
            }
        }

        for id in ["track1", "track2", "track3"] {
            let slots = seen[id];
            assert!(!slots[0], "{} landed on the pinned slot", id);
            assert!(slots[1] && slots[2] && slots[3], "{} missed a slot", id);
        }
    }
}
