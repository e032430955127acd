//! Text-derived features for song lyrics.
//!
//! This crate turns the raw lyric text of a track into the numeric and textual
//! features the rest of the pipeline trains and clusters on.
//!
//! # Feature Families
//!
//! Features are grouped into families; each family is extracted independently
//! and stored as its own table ([`FeatureFamily::table_name`]):
//!
//! - **NLP** ([`nlp`]): sentiment polarity, lexical complexity and word count
//! - **Readability** ([`readability`]): reading grade, syllable density,
//!   lexical diversity and difficult-word ratio
//! - **Thematic** ([`thematic`]): the top TF-IDF "signature words" of a song,
//!   which needs corpus-wide statistics
//! - **Bridge** ([`bridge`]): sentiment dynamics between verse, chorus and bridge
//!
//! A track with empty or absent lyrics produces no record for any family.
//!
//! # Shared Components
//!
//! The sentiment analyzer and the thematic vectorizer are ordinary values built
//! once per run and passed into extraction explicitly:
//!
//! ```
//! use mirrorball_features::{
//!     extractor::TextFeatureExtractor, sentiment::SentimentAnalyzer,
//!     readability::ReadabilityAnalyzer,
//! };
//!
//! let extractor = TextFeatureExtractor::new(
//!     SentimentAnalyzer::builtin(),
//!     ReadabilityAnalyzer::builtin(),
//! );
//! let nlp = extractor.extract_nlp(Some("I love you, I love you")).unwrap();
//! assert_eq!(nlp.word_count, 6);
//! assert!(nlp.sentiment_compound > 0.0);
//! ```

pub use self::{
    feature::{FeatureFamily, FeatureKind, FeatureRecord, FamilyFeatures, UnknownFeatureError},
    track::{LyricsRecord, TrackKey},
};

pub mod bridge;
pub mod extractor;
pub mod feature;
pub mod nlp;
pub mod readability;
pub mod sentiment;
pub mod text;
pub mod thematic;
pub mod track;
