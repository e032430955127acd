//! Feature identifiers and per-family feature records.
//!
//! Every numeric feature the pipeline knows about is a [`FeatureKind`]. Its
//! [`id`](FeatureKind::id) is the column name used in every table, so a
//! feature list read from configuration maps one-to-one onto stored columns.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::track::TrackKey;

/// Closed set of numeric features.
///
/// `Energy` and `Valence` are audio-derived; every other kind is computed from
/// lyric text and counts as stylistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    SentimentCompound,
    SentimentPos,
    SentimentNeg,
    LexicalComplexity,
    WordCount,
    ReadingGrade,
    SyllableDensity,
    LexicalDiversity,
    DifficultRatio,
    BridgeSentiment,
    BridgeSentimentShift,
    BridgeChorusContrast,
    HasBridge,
    BridgeWordCount,
    Energy,
    Valence,
}

impl FeatureKind {
    pub const ALL: [Self; 16] = [
        Self::SentimentCompound,
        Self::SentimentPos,
        Self::SentimentNeg,
        Self::LexicalComplexity,
        Self::WordCount,
        Self::ReadingGrade,
        Self::SyllableDensity,
        Self::LexicalDiversity,
        Self::DifficultRatio,
        Self::BridgeSentiment,
        Self::BridgeSentimentShift,
        Self::BridgeChorusContrast,
        Self::HasBridge,
        Self::BridgeWordCount,
        Self::Energy,
        Self::Valence,
    ];

    /// Stable snake_case identifier, also used as the column name.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::SentimentCompound => "sentiment_compound",
            Self::SentimentPos => "sentiment_pos",
            Self::SentimentNeg => "sentiment_neg",
            Self::LexicalComplexity => "lexical_complexity",
            Self::WordCount => "word_count",
            Self::ReadingGrade => "reading_grade",
            Self::SyllableDensity => "syllable_density",
            Self::LexicalDiversity => "lexical_diversity",
            Self::DifficultRatio => "difficult_ratio",
            Self::BridgeSentiment => "bridge_sentiment",
            Self::BridgeSentimentShift => "bridge_sentiment_shift",
            Self::BridgeChorusContrast => "bridge_chorus_contrast",
            Self::HasBridge => "has_bridge",
            Self::BridgeWordCount => "bridge_word_count",
            Self::Energy => "energy",
            Self::Valence => "valence",
        }
    }

    /// Human-readable label for reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SentimentCompound => "Sentiment (compound)",
            Self::SentimentPos => "Sentiment (positive)",
            Self::SentimentNeg => "Sentiment (negative)",
            Self::LexicalComplexity => "Lexical complexity",
            Self::WordCount => "Word count",
            Self::ReadingGrade => "Reading grade",
            Self::SyllableDensity => "Syllable density",
            Self::LexicalDiversity => "Lexical diversity",
            Self::DifficultRatio => "Difficult-word ratio",
            Self::BridgeSentiment => "Bridge sentiment",
            Self::BridgeSentimentShift => "Bridge sentiment shift",
            Self::BridgeChorusContrast => "Bridge/chorus contrast",
            Self::HasBridge => "Has bridge",
            Self::BridgeWordCount => "Bridge word count",
            Self::Energy => "Energy",
            Self::Valence => "Valence",
        }
    }

    /// Family that produces this feature, or `None` for audio-derived labels.
    #[must_use]
    pub const fn family(self) -> Option<FeatureFamily> {
        match self {
            Self::SentimentCompound
            | Self::SentimentPos
            | Self::SentimentNeg
            | Self::LexicalComplexity
            | Self::WordCount => Some(FeatureFamily::Nlp),
            Self::ReadingGrade
            | Self::SyllableDensity
            | Self::LexicalDiversity
            | Self::DifficultRatio => Some(FeatureFamily::Readability),
            Self::BridgeSentiment
            | Self::BridgeSentimentShift
            | Self::BridgeChorusContrast
            | Self::HasBridge
            | Self::BridgeWordCount => Some(FeatureFamily::Bridge),
            Self::Energy | Self::Valence => None,
        }
    }

    #[must_use]
    pub const fn is_audio(self) -> bool {
        matches!(self, Self::Energy | Self::Valence)
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("unknown feature: {id:?}")]
pub struct UnknownFeatureError {
    pub id: String,
}

impl FromStr for FeatureKind {
    type Err = UnknownFeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| UnknownFeatureError { id: s.to_owned() })
    }
}

/// Group of features extracted together and stored in one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFamily {
    Nlp,
    Readability,
    Thematic,
    Bridge,
}

impl FeatureFamily {
    pub const ALL: [Self; 4] = [Self::Nlp, Self::Readability, Self::Thematic, Self::Bridge];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Nlp => "nlp",
            Self::Readability => "readability",
            Self::Thematic => "thematic",
            Self::Bridge => "bridge",
        }
    }

    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Nlp => "dim_nlp_features",
            Self::Readability => "dim_lexical_metrics",
            Self::Thematic => "dim_thematic_dna",
            Self::Bridge => "dim_bridge_metrics",
        }
    }

    /// Numeric features this family produces, in column order.
    ///
    /// The thematic family only produces text and returns an empty slice.
    #[must_use]
    pub const fn numeric_features(self) -> &'static [FeatureKind] {
        match self {
            Self::Nlp => &[
                FeatureKind::SentimentCompound,
                FeatureKind::SentimentPos,
                FeatureKind::SentimentNeg,
                FeatureKind::LexicalComplexity,
                FeatureKind::WordCount,
            ],
            Self::Readability => &[
                FeatureKind::ReadingGrade,
                FeatureKind::SyllableDensity,
                FeatureKind::LexicalDiversity,
                FeatureKind::DifficultRatio,
            ],
            Self::Thematic => &[],
            Self::Bridge => &[
                FeatureKind::BridgeSentiment,
                FeatureKind::BridgeSentimentShift,
                FeatureKind::BridgeChorusContrast,
                FeatureKind::HasBridge,
                FeatureKind::BridgeWordCount,
            ],
        }
    }
}

impl fmt::Display for FeatureFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NlpFeatures {
    pub sentiment_compound: f64,
    pub sentiment_pos: f64,
    pub sentiment_neg: f64,
    pub lexical_complexity: f64,
    pub word_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityFeatures {
    pub reading_grade: f64,
    pub syllable_density: f64,
    pub lexical_diversity: f64,
    pub difficult_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThematicFeatures {
    /// Comma-separated signature words, strongest first.
    pub thematic_dna: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BridgeFeatures {
    pub bridge_sentiment: f64,
    pub bridge_sentiment_shift: f64,
    pub bridge_chorus_contrast: f64,
    pub has_bridge: bool,
    pub bridge_word_count: usize,
}

/// Features of one family for one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum FamilyFeatures {
    Nlp(NlpFeatures),
    Readability(ReadabilityFeatures),
    Thematic(ThematicFeatures),
    Bridge(BridgeFeatures),
}

impl FamilyFeatures {
    #[must_use]
    pub const fn family(&self) -> FeatureFamily {
        match self {
            Self::Nlp(_) => FeatureFamily::Nlp,
            Self::Readability(_) => FeatureFamily::Readability,
            Self::Thematic(_) => FeatureFamily::Thematic,
            Self::Bridge(_) => FeatureFamily::Bridge,
        }
    }

    /// Numeric values in [`FeatureFamily::numeric_features`] order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn numeric_values(&self) -> Vec<(FeatureKind, f64)> {
        match self {
            Self::Nlp(f) => vec![
                (FeatureKind::SentimentCompound, f.sentiment_compound),
                (FeatureKind::SentimentPos, f.sentiment_pos),
                (FeatureKind::SentimentNeg, f.sentiment_neg),
                (FeatureKind::LexicalComplexity, f.lexical_complexity),
                (FeatureKind::WordCount, f.word_count as f64),
            ],
            Self::Readability(f) => vec![
                (FeatureKind::ReadingGrade, f.reading_grade),
                (FeatureKind::SyllableDensity, f.syllable_density),
                (FeatureKind::LexicalDiversity, f.lexical_diversity),
                (FeatureKind::DifficultRatio, f.difficult_ratio),
            ],
            Self::Thematic(_) => vec![],
            Self::Bridge(f) => vec![
                (FeatureKind::BridgeSentiment, f.bridge_sentiment),
                (FeatureKind::BridgeSentimentShift, f.bridge_sentiment_shift),
                (FeatureKind::BridgeChorusContrast, f.bridge_chorus_contrast),
                (FeatureKind::HasBridge, if f.has_bridge { 1.0 } else { 0.0 }),
                (FeatureKind::BridgeWordCount, f.bridge_word_count as f64),
            ],
        }
    }

    /// Rebuilds a numeric family from stored column values.
    ///
    /// Returns `None` for the thematic family or when a column is missing.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn from_numeric(
        family: FeatureFamily,
        values: &BTreeMap<FeatureKind, f64>,
    ) -> Option<Self> {
        let get = |kind| values.get(&kind).copied();
        let features = match family {
            FeatureFamily::Nlp => Self::Nlp(NlpFeatures {
                sentiment_compound: get(FeatureKind::SentimentCompound)?,
                sentiment_pos: get(FeatureKind::SentimentPos)?,
                sentiment_neg: get(FeatureKind::SentimentNeg)?,
                lexical_complexity: get(FeatureKind::LexicalComplexity)?,
                word_count: get(FeatureKind::WordCount)?.max(0.0) as usize,
            }),
            FeatureFamily::Readability => Self::Readability(ReadabilityFeatures {
                reading_grade: get(FeatureKind::ReadingGrade)?,
                syllable_density: get(FeatureKind::SyllableDensity)?,
                lexical_diversity: get(FeatureKind::LexicalDiversity)?,
                difficult_ratio: get(FeatureKind::DifficultRatio)?,
            }),
            FeatureFamily::Thematic => return None,
            FeatureFamily::Bridge => Self::Bridge(BridgeFeatures {
                bridge_sentiment: get(FeatureKind::BridgeSentiment)?,
                bridge_sentiment_shift: get(FeatureKind::BridgeSentimentShift)?,
                bridge_chorus_contrast: get(FeatureKind::BridgeChorusContrast)?,
                has_bridge: get(FeatureKind::HasBridge)? > 0.0,
                bridge_word_count: get(FeatureKind::BridgeWordCount)?.max(0.0) as usize,
            }),
        };
        Some(features)
    }

    #[must_use]
    pub fn thematic_dna(&self) -> Option<&str> {
        match self {
            Self::Thematic(f) => Some(&f.thematic_dna),
            _ => None,
        }
    }
}

/// One family's features for one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub key: TrackKey,
    pub features: FamilyFeatures,
}

impl FeatureRecord {
    #[must_use]
    pub const fn family(&self) -> FeatureFamily {
        self.features.family()
    }
}
