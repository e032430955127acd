//! Sentiment dynamics between song sections.

use std::fmt;

use crate::{
    feature::BridgeFeatures,
    sentiment::SentimentAnalyzer,
    text::split_sections,
};

/// Section a structural tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionLabel {
    Verse,
    Bridge,
    Chorus,
    Other,
}

impl SectionLabel {
    /// Classifies a tag body such as `Verse 2: Artist` or `Pre-Chorus`.
    ///
    /// Checked in order verse, bridge, chorus; the first match wins.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.to_lowercase();
        if tag.contains("verse") {
            Self::Verse
        } else if tag.contains("bridge") {
            Self::Bridge
        } else if tag.contains("chorus") {
            Self::Chorus
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Verse => "verse",
            Self::Bridge => "bridge",
            Self::Chorus => "chorus",
            Self::Other => "other",
        })
    }
}

/// Verse, bridge and chorus text of one song.
///
/// Spans with the same label are joined with a space. Text before the first
/// tag and text under other tags are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub verse: String,
    pub bridge: String,
    pub chorus: String,
}

impl Sections {
    /// # Examples
    ///
    /// ```
    /// use mirrorball_features::bridge::Sections;
    ///
    /// let sections = Sections::parse("intro\n[Verse 1]\na\n[Chorus]\nb\n[Verse 2]\nc\n[Outro]\nd");
    /// assert_eq!(sections.verse, "a c");
    /// assert_eq!(sections.chorus, "b");
    /// assert!(sections.bridge.is_empty());
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut sections = Self::default();
        for span in split_sections(text) {
            let Some(tag) = span.tag else {
                continue;
            };
            let body = span.text.trim();
            if body.is_empty() {
                continue;
            }
            let target = match SectionLabel::from_tag(tag) {
                SectionLabel::Verse => &mut sections.verse,
                SectionLabel::Bridge => &mut sections.bridge,
                SectionLabel::Chorus => &mut sections.chorus,
                SectionLabel::Other => continue,
            };
            if !target.is_empty() {
                target.push(' ');
            }
            target.push_str(body);
        }
        sections
    }
}

/// Computes bridge features of raw lyrics.
///
/// A missing section scores 0, so a song without a bridge has zero bridge
/// sentiment and its shift is the negated verse sentiment.
#[must_use]
pub fn bridge_dynamics(analyzer: &SentimentAnalyzer, text: &str) -> BridgeFeatures {
    let sections = Sections::parse(text);
    let compound = |section: &str| {
        if section.is_empty() {
            0.0
        } else {
            analyzer.polarity_scores(section).compound
        }
    };
    let verse = compound(&sections.verse);
    let bridge = compound(&sections.bridge);
    let chorus = compound(&sections.chorus);

    BridgeFeatures {
        bridge_sentiment: bridge,
        bridge_sentiment_shift: bridge - verse,
        bridge_chorus_contrast: bridge - chorus,
        has_bridge: !sections.bridge.is_empty(),
        bridge_word_count: sections.bridge.split_whitespace().count(),
    }
}
