//! Track source resolution
//!
//! Picks the single audio source for a track. The uploaded file wins over the
//! external URL; empty strings count as absent.

use crate::types::Track;

/// Resolve the playable source of a track
///
/// Returns `None` when the track has neither an uploaded file nor an external
/// URL. Callers must not create an audio resource in that case.
pub fn resolve(track: &Track) -> Option<String> {
    resolve_with_base(track, None)
}

/// Resolve the playable source, joining rooted uploaded-file paths onto `base`
pub fn resolve_with_base(track: &Track, base: Option<&str>) -> Option<String> {
    if let Some(file) = non_empty(track.audio_file.as_deref()) {
        return Some(join_media_path(base, file));
    }

    non_empty(track.audio_url.as_deref()).map(str::to_string)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn join_media_path(base: Option<&str>, file: &str) -> String {
    match base {
        Some(base) if file.starts_with('/') => {
            format!("{}{}", base.trim_end_matches('/'), file)
        }
        _ => file.to_string(),
    }
}
