//! Decides which stored lyrics need to be fetched again.
//!
//! Bridge analysis depends on section tags such as `[Bridge]`, so lyrics
//! stored without any recognizable tag are as good as missing.

use mirrorball_features::{LyricsRecord, TrackKey, text::has_content};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefetchReason {
    #[display("lyrics missing")]
    Missing,
    #[display("no section tags")]
    Untagged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefetchPolicy {
    pub require_section_tags: bool,
    /// Substrings that count as a section tag.
    pub tag_prefixes: Vec<String>,
}

impl Default for RefetchPolicy {
    fn default() -> Self {
        Self {
            require_section_tags: true,
            tag_prefixes: ["[Verse", "[Chorus", "[Bridge", "[Intro", "[Outro"]
                .map(str::to_owned)
                .to_vec(),
        }
    }
}

impl RefetchPolicy {
    /// Returns why `lyrics` must be fetched again, or `None` to keep them.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorball_corpus::refetch::{RefetchPolicy, RefetchReason};
    ///
    /// let policy = RefetchPolicy::default();
    /// assert_eq!(policy.check(Some("[Chorus]\nStay")), None);
    /// assert_eq!(policy.check(Some("Stay, stay")), Some(RefetchReason::Untagged));
    /// assert_eq!(policy.check(Some("  ")), Some(RefetchReason::Missing));
    /// ```
    #[must_use]
    pub fn check(&self, lyrics: Option<&str>) -> Option<RefetchReason> {
        let Some(lyrics) = lyrics.filter(|text| has_content(Some(*text))) else {
            return Some(RefetchReason::Missing);
        };
        let tagged = self.tag_prefixes.iter().any(|tag| lyrics.contains(tag.as_str()));
        (self.require_section_tags && !tagged).then_some(RefetchReason::Untagged)
    }

    /// Tracks whose lyrics need a re-fetch, in corpus order.
    #[must_use]
    pub fn audit<'a>(&self, records: &'a [LyricsRecord]) -> Vec<(&'a TrackKey, RefetchReason)> {
        records
            .iter()
            .filter_map(|r| self.check(r.lyrics.as_deref()).map(|reason| (&r.key, reason)))
            .collect()
    }
}
