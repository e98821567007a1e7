//! Now-playing snapshot and provider result types.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};

/// What one source reports as playing.
///
/// Snapshots are never mutated after construction; the next arbitration
/// pass produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSnapshot {
    /// Track title.
    pub track_title: String,

    /// Artist, when the source reports one.
    #[serde(default)]
    pub artist: Option<String>,

    /// Source label (e.g., "Spotify", "Safari").
    pub source_label: String,

    /// Whether the source is actively playing (as opposed to paused).
    pub is_playing: bool,

    /// Playback position in seconds.
    #[serde(default)]
    pub position_secs: Option<f64>,

    /// Track duration in seconds.
    #[serde(default)]
    pub duration_secs: Option<f64>,

    /// Artwork reference (URL or file path), if the source supplied one.
    #[serde(default)]
    pub artwork_ref: Option<String>,

    /// Wall-clock time of the fetch, in milliseconds since epoch.
    pub fetched_at_ms: i64,
}

impl MediaSnapshot {
    pub fn new(
        source_label: impl Into<String>,
        track_title: impl Into<String>,
        is_playing: bool,
    ) -> Self {
        Self {
            track_title: track_title.into(),
            artist: None,
            source_label: source_label.into(),
            is_playing,
            position_secs: None,
            duration_secs: None,
            artwork_ref: None,
            fetched_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_progress(mut self, position_secs: f64, duration_secs: f64) -> Self {
        self.position_secs = Some(position_secs);
        self.duration_secs = Some(duration_secs);
        self
    }

    pub fn with_artwork(mut self, artwork_ref: impl Into<String>) -> Self {
        self.artwork_ref = Some(artwork_ref.into());
        self
    }

    /// Stable identity used to key secondary fetches such as artwork.
    pub fn identity(&self) -> MediaIdentity {
        MediaIdentity {
            source: self.source_label.clone(),
            track: self.track_title.clone(),
        }
    }

    /// Playback progress in `0.0..=1.0`, when both position and duration are known.
    pub fn progress(&self) -> Option<f64> {
        match (self.position_secs, self.duration_secs) {
            (Some(position), Some(duration)) if duration > 0.0 => {
                Some((position / duration).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}

/// Source + track, the key for artwork resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaIdentity {
    pub source: String,
    pub track: String,
}

impl std::fmt::Display for MediaIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.track)
    }
}

/// Outcome of a single provider attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResult {
    Success(MediaSnapshot),
    /// Source reachable but nothing loaded.
    Empty,
    /// Source unavailable, permission denied, unparsable output.
    Failed(String),
    TimedOut,
}

impl ProviderResult {
    pub fn is_playing(&self) -> bool {
        matches!(self, ProviderResult::Success(s) if s.is_playing)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProviderResult::Success(s) if s.is_playing => "playing",
            ProviderResult::Success(_) => "paused",
            ProviderResult::Empty => "empty",
            ProviderResult::Failed(_) => "failed",
            ProviderResult::TimedOut => "timed_out",
        }
    }

    /// The error this result represents, if any.
    pub fn as_error(&self, provider: &str) -> Option<ProviderError> {
        match self {
            ProviderResult::Failed(reason) => Some(ProviderError::Failure {
                provider: provider.to_string(),
                reason: reason.clone(),
            }),
            ProviderResult::TimedOut => Some(ProviderError::Timeout {
                provider: provider.to_string(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_source_and_track() {
        let a = MediaSnapshot::new("Spotify", "Song", true).with_artist("Someone");
        let b = MediaSnapshot::new("Spotify", "Song", false);
        assert_eq!(a.identity(), b.identity());

        let c = MediaSnapshot::new("Music", "Song", true);
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn test_progress() {
        let s = MediaSnapshot::new("Music", "Song", true).with_progress(30.0, 120.0);
        assert_eq!(s.progress(), Some(0.25));

        let zero = MediaSnapshot::new("Music", "Song", true).with_progress(30.0, 0.0);
        assert_eq!(zero.progress(), None);

        let over = MediaSnapshot::new("Music", "Song", true).with_progress(200.0, 120.0);
        assert_eq!(over.progress(), Some(1.0));
    }

    #[test]
    fn test_result_errors() {
        assert!(ProviderResult::Empty.as_error("x").is_none());
        assert!(matches!(
            ProviderResult::TimedOut.as_error("x"),
            Some(ProviderError::Timeout { .. })
        ));
        assert_eq!(ProviderResult::Failed("nope".into()).label(), "failed");
    }

    #[test]
    fn test_snapshot_deserialize_minimal() {
        let json = r#"{"track_title": "Song", "source_label": "Music", "is_playing": true, "fetched_at_ms": 1}"#;
        let snapshot: MediaSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.artist.is_none());
        assert!(snapshot.is_playing);
    }
}
