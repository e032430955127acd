use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies a track within the corpus.
///
/// The album is part of the key: the same song title appears on re-releases
/// and each release is a distinct track.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackKey {
    pub track_name: String,
    pub album_name: String,
}

impl TrackKey {
    pub fn new(track_name: impl Into<String>, album_name: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
            album_name: album_name.into(),
        }
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.track_name, self.album_name)
    }
}

/// Raw lyrics of one track as held by the corpus store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricsRecord {
    #[serde(flatten)]
    pub key: TrackKey,
    /// Raw lyric text including structural tags such as `[Chorus]`.
    pub lyrics: Option<String>,
    #[serde(default)]
    pub is_new_era: bool,
    #[serde(default = "Utc::now")]
    pub scraped_at: DateTime<Utc>,
}

impl LyricsRecord {
    /// Returns the lyric text if it holds anything besides whitespace.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.lyrics.as_deref().filter(|text| !text.trim().is_empty())
    }
}
