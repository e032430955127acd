//! Readability and vocabulary sophistication.
//!
//! Lyrics rarely carry sentence punctuation, so every line break is treated
//! as a sentence boundary before the Flesch-Kincaid grade is computed.
//! Without that, a whole song collapses into one very long "sentence" and
//! the grade explodes.

use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

pub use self::syllables::count_syllables;
use crate::{
    feature::ReadabilityFeatures,
    text::{normalize_token, strip_section_tags},
};

mod easy_words;
mod syllables;

/// Sentences with this many words or fewer do not count as sentences.
const MIN_SENTENCE_WORDS: usize = 2;
/// Words with at least this many syllables are candidates for "difficult".
const DIFFICULT_SYLLABLES: usize = 2;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w='‘’]+").expect("word pattern is valid"));

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("failed to read word list {}", path.display())]
pub struct WordListError {
    pub path: PathBuf,
    pub source: io::Error,
}

#[derive(Debug, Clone)]
pub struct ReadabilityAnalyzer {
    easy_words: HashSet<String>,
}

impl ReadabilityAnalyzer {
    #[must_use]
    pub fn builtin() -> Self {
        Self::with_easy_words(easy_words::EASY_WORDS.iter().copied())
    }

    /// Builds an analyzer over a custom familiar-word list.
    pub fn with_easy_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let easy_words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { easy_words }
    }

    /// Loads a whitespace-separated familiar-word list.
    pub fn load_easy_words<P>(path: P) -> Result<Self, WordListError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| WordListError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::with_easy_words(text.split_whitespace()))
    }

    #[must_use]
    pub fn is_easy(&self, word: &str) -> bool {
        self.easy_words.contains(word)
    }

    /// Computes readability features of raw lyrics.
    ///
    /// Section tags are removed first. Every ratio is 0 when no words remain.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorball_features::readability::ReadabilityAnalyzer;
    ///
    /// let analyzer = ReadabilityAnalyzer::builtin();
    /// let features = analyzer.analyze("[Verse]\nShake it off, shake it off");
    /// assert_eq!(features.lexical_diversity, 0.5);
    /// assert_eq!(analyzer.analyze("[Chorus]").syllable_density, 0.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn analyze(&self, text: &str) -> ReadabilityFeatures {
        let clean = strip_section_tags(text);
        let words = clean.split_whitespace().collect::<Vec<_>>();
        if words.is_empty() {
            return ReadabilityFeatures {
                reading_grade: 0.0,
                syllable_density: 0.0,
                lexical_diversity: 0.0,
                difficult_ratio: 0.0,
            };
        }
        let word_count = words.len() as f64;

        let syllables = words.iter().map(|w| count_syllables(w)).sum::<usize>();
        let distinct = words
            .iter()
            .map(|w| normalize_token(w))
            .collect::<HashSet<_>>()
            .len();

        ReadabilityFeatures {
            reading_grade: flesch_kincaid_grade(&clean),
            syllable_density: syllables as f64 / word_count,
            lexical_diversity: distinct as f64 / word_count,
            difficult_ratio: self.difficult_words(&clean) as f64 / word_count,
        }
    }

    /// Number of distinct difficult words in `text`.
    #[must_use]
    pub fn difficult_words(&self, text: &str) -> usize {
        let lower = text.to_lowercase();
        WORD.find_iter(&lower)
            .map(|m| m.as_str())
            .collect::<HashSet<_>>()
            .into_iter()
            .filter(|w| count_syllables(w) >= DIFFICULT_SYLLABLES && !self.is_easy(w))
            .count()
    }
}

fn lexicon_words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
}

/// Flesch-Kincaid grade level with one sentence per line, rounded to one
/// decimal.
///
/// Lines are further split on `.`, `!` and `?`; fragments of two words or
/// fewer are not counted as sentences, and at least one sentence is assumed.
///
/// # Examples
///
/// ```
/// use mirrorball_features::readability::flesch_kincaid_grade;
///
/// assert_eq!(flesch_kincaid_grade(""), 0.0);
/// assert!(flesch_kincaid_grade("the cat sat on the mat") < 0.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn flesch_kincaid_grade(text: &str) -> f64 {
    let words = lexicon_words(text).collect::<Vec<_>>();
    if words.is_empty() {
        return 0.0;
    }
    let syllables = words.iter().map(|w| count_syllables(w)).sum::<usize>();
    let sentences = text
        .lines()
        .flat_map(|line| line.split(['.', '!', '?']))
        .filter(|sentence| lexicon_words(sentence).count() > MIN_SENTENCE_WORDS)
        .count()
        .max(1);

    let words_per_sentence = words.len() as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words.len() as f64;
    let grade = 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59;
    (grade * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_after_tag_stripping_is_all_zero() {
        let features = ReadabilityAnalyzer::builtin().analyze("[Intro]\n[Chorus]\n");
        assert_eq!(features.reading_grade, 0.0);
        assert_eq!(features.syllable_density, 0.0);
        assert_eq!(features.lexical_diversity, 0.0);
        assert_eq!(features.difficult_ratio, 0.0);
    }

    #[test]
    fn test_line_breaks_are_sentence_boundaries() {
        let one_line = "we were dancing in the kitchen light we were young and free";
        let two_lines = "we were dancing in the kitchen light\nwe were young and free";
        assert!(flesch_kincaid_grade(two_lines) < flesch_kincaid_grade(one_line));
    }

    #[test]
    fn test_grade_formula() {
        // 7 words, 1 sentence, 8 syllables: 0.39*7 + 11.8*8/7 - 15.59 = 0.626
        assert_eq!(flesch_kincaid_grade("the cat sat on the mat today"), 0.6);
    }

    #[test]
    fn test_short_lines_are_not_sentences() {
        // "oh oh" adds words but no sentence
        let grade = flesch_kincaid_grade("the cat sat on the mat\noh oh");
        let expected = 0.39 * 8.0 + 11.8 - 15.59;
        assert!((grade - (expected * 10.0_f64).round() / 10.0).abs() < 1e-9);
        assert!(grade > flesch_kincaid_grade("the cat sat on the mat\noh oh oh"));
    }

    #[test]
    fn test_ratios_stay_in_unit_interval() {
        let analyzer = ReadabilityAnalyzer::builtin();
        let texts = [
            "a",
            "la la la la",
            "[Verse 1]\nExtraordinary circumstances, unconditionally\nWe remember everything",
            "Marvelous, glamorous, unforgettable!\nsaccharine mythology",
        ];
        for text in texts {
            let f = analyzer.analyze(text);
            assert!((0.0..=1.0).contains(&f.lexical_diversity), "{text}");
            assert!((0.0..=1.0).contains(&f.difficult_ratio), "{text}");
            assert!(f.syllable_density >= 0.0, "{text}");
        }
    }

    #[test]
    fn test_difficult_words_are_distinct_and_skip_easy_list() {
        let analyzer = ReadabilityAnalyzer::builtin();
        assert_eq!(analyzer.difficult_words("mythology mythology"), 1);
        assert_eq!(analyzer.difficult_words("remember beautiful yellow"), 0);
        assert_eq!(analyzer.difficult_words("cat dog"), 0);

        let custom = ReadabilityAnalyzer::with_easy_words(["mythology"]);
        assert_eq!(custom.difficult_words("mythology remember"), 1);
    }

    #[test]
    fn test_lexical_diversity_ignores_case_and_punctuation() {
        let f = ReadabilityAnalyzer::builtin().analyze("Love love, LOVE!");
        assert!((f.lexical_diversity - 1.0 / 3.0).abs() < 1e-12);
    }
}
