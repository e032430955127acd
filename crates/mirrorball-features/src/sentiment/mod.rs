//! Lexicon and rule-based sentiment scoring.
//!
//! [`SentimentAnalyzer`] implements the VADER scoring rules over a
//! [`SentimentLexicon`]:
//!
//! - each token's lexicon valence is adjusted by up to three preceding
//!   boosters or dampeners (`very`, `kinda`), with decaying weight
//! - a negation within the three preceding tokens flips and dampens it
//! - ALL-CAPS tokens are emphasized when the text mixes cased and
//!   all-caps words
//! - tokens before `but` count half, tokens after it count one and a half
//! - `!` and `?` amplify the summed valence
//!
//! The compound score is the summed valence normalized by `s / sqrt(s² + 15)`
//! into `[-1, 1]`.
//!
//! # Examples
//!
//! ```
//! use mirrorball_features::sentiment::SentimentAnalyzer;
//!
//! let analyzer = SentimentAnalyzer::builtin();
//! let happy = analyzer.polarity_scores("I love this happy song");
//! let sad = analyzer.polarity_scores("I hate this sad song");
//! assert!(happy.compound > 0.5);
//! assert!(sad.compound < -0.5);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use self::lexicon::{LexiconError, SentimentLexicon};

mod lexicon;

const C_INCR: f64 = 0.733;
const N_SCALAR: f64 = -0.74;
const NORMALIZE_ALPHA: f64 = 15.0;
const EXCLAMATION_WEIGHT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const QUESTION_WEIGHT: f64 = 0.18;
const MAX_QUESTION_AMPLIFIER: f64 = 0.96;

/// Polarity scores of one text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    /// Normalized overall polarity in `[-1, 1]`.
    pub compound: f64,
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
}

#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    lexicon: SentimentLexicon,
    boosters: HashMap<&'static str, f64>,
}

impl SentimentAnalyzer {
    #[must_use]
    pub fn new(lexicon: SentimentLexicon) -> Self {
        Self {
            lexicon,
            boosters: lexicon::BOOSTERS.iter().copied().collect(),
        }
    }

    #[must_use]
    pub fn builtin() -> Self {
        Self::new(SentimentLexicon::builtin())
    }

    #[must_use]
    pub fn lexicon(&self) -> &SentimentLexicon {
        &self.lexicon
    }

    /// Scores a text. Text with no scorable tokens scores all zeros.
    #[must_use]
    pub fn polarity_scores(&self, text: &str) -> SentimentScores {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return SentimentScores::default();
        }
        let lower = tokens.iter().map(|t| t.to_lowercase()).collect::<Vec<_>>();
        let cap_diff = is_cap_differential(&tokens);

        let mut sentiments = Vec::with_capacity(tokens.len());
        for i in 0..tokens.len() {
            let followed_by_of = lower.get(i + 1).is_some_and(|next| next == "of");
            if self.boosters.contains_key(lower[i].as_str())
                || (lower[i] == "kind" && followed_by_of)
            {
                sentiments.push(0.0);
                continue;
            }
            sentiments.push(self.token_valence(&tokens, &lower, i, cap_diff));
        }
        apply_but_shift(&lower, &mut sentiments);
        score_valence(&sentiments, text)
    }

    fn token_valence(&self, tokens: &[&str], lower: &[String], i: usize, cap_diff: bool) -> f64 {
        let Some(base) = self.lexicon.get(&lower[i]) else {
            return 0.0;
        };
        let mut valence = base;

        if lower[i] == "no"
            && lower
                .get(i + 1)
                .is_some_and(|next| self.lexicon.contains(next))
        {
            valence = 0.0;
        }
        let preceded_by_no = (i > 0 && lower[i - 1] == "no")
            || (i > 1 && lower[i - 2] == "no")
            || (i > 2 && lower[i - 3] == "no" && matches!(lower[i - 1].as_str(), "or" | "nor"));
        if preceded_by_no {
            valence = base * N_SCALAR;
        }

        if cap_diff && is_upper(tokens[i]) {
            valence += if valence > 0.0 { C_INCR } else { -C_INCR };
        }

        for start in 0..3 {
            if i <= start {
                break;
            }
            let prev = i - (start + 1);
            if self.lexicon.contains(&lower[prev]) {
                continue;
            }
            let mut scalar = self.booster_scalar(tokens[prev], &lower[prev], valence, cap_diff);
            if start == 1 {
                scalar *= 0.95;
            } else if start == 2 {
                scalar *= 0.9;
            }
            valence += scalar;
            valence = negation_check(valence, lower, start, i);
        }

        self.least_check(valence, lower, i)
    }

    fn booster_scalar(&self, token: &str, lower: &str, valence: f64, cap_diff: bool) -> f64 {
        let Some(&boost) = self.boosters.get(lower) else {
            return 0.0;
        };
        let mut scalar = if valence < 0.0 { -boost } else { boost };
        if cap_diff && is_upper(token) {
            scalar += if valence > 0.0 { C_INCR } else { -C_INCR };
        }
        scalar
    }

    fn least_check(&self, valence: f64, lower: &[String], i: usize) -> f64 {
        if i > 0 && lower[i - 1] == "least" && !self.lexicon.contains(&lower[i - 1]) {
            let qualified = i > 1 && matches!(lower[i - 2].as_str(), "at" | "very");
            if !qualified {
                return valence * N_SCALAR;
            }
        }
        valence
    }
}

/// Splits on whitespace and strips surrounding punctuation from words.
///
/// Tokens that would shrink to two characters or fewer keep their
/// punctuation so emoticons such as `:)` survive; single characters are
/// dropped.
fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|token| {
            let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
            if stripped.len() <= 2 { token } else { stripped }
        })
        .filter(|token| token.chars().count() > 1)
        .collect()
}

fn is_upper(token: &str) -> bool {
    token.chars().any(char::is_alphabetic)
        && token
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(char::is_uppercase)
}

/// True if some, but not all, tokens are ALL-CAPS.
fn is_cap_differential(tokens: &[&str]) -> bool {
    let upper = tokens.iter().filter(|t| is_upper(t)).count();
    upper > 0 && upper < tokens.len()
}

fn is_negation(token: &str) -> bool {
    lexicon::NEGATIONS.contains(&token) || token.contains("n't")
}

fn negation_check(valence: f64, lower: &[String], start: usize, i: usize) -> f64 {
    let word = |back: usize| lower[i - back].as_str();
    match start {
        0 if is_negation(word(1)) => valence * N_SCALAR,
        1 if word(2) == "never" && matches!(word(1), "so" | "this") => valence * 1.25,
        1 if word(2) == "without" && word(1) == "doubt" => valence,
        1 if is_negation(word(2)) => valence * N_SCALAR,
        2 if word(3) == "never"
            && (matches!(word(2), "so" | "this") || matches!(word(1), "so" | "this")) =>
        {
            valence * 1.25
        }
        2 if word(3) == "without" && (word(2) == "doubt" || word(1) == "doubt") => valence,
        2 if is_negation(word(3)) => valence * N_SCALAR,
        _ => valence,
    }
}

fn apply_but_shift(lower: &[String], sentiments: &mut [f64]) {
    let Some(but) = lower.iter().position(|t| t == "but") else {
        return;
    };
    for (idx, sentiment) in sentiments.iter_mut().enumerate() {
        if idx < but {
            *sentiment *= 0.5;
        } else if idx > but {
            *sentiment *= 1.5;
        }
    }
}

#[expect(clippy::cast_precision_loss)]
fn punctuation_amplifier(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
    let questions = text.matches('?').count();
    let question_amp = match questions {
        0 | 1 => 0.0,
        2..=3 => questions as f64 * QUESTION_WEIGHT,
        _ => MAX_QUESTION_AMPLIFIER,
    };
    exclamations as f64 * EXCLAMATION_WEIGHT + question_amp
}

/// Maps an unbounded valence sum into `[-1, 1]`.
fn normalize(score: f64) -> f64 {
    (score / (score * score + NORMALIZE_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[expect(clippy::cast_precision_loss)]
fn score_valence(sentiments: &[f64], text: &str) -> SentimentScores {
    let amplifier = punctuation_amplifier(text);
    let mut sum = sentiments.iter().sum::<f64>();
    if sum > 0.0 {
        sum += amplifier;
    } else if sum < 0.0 {
        sum -= amplifier;
    }
    let compound = normalize(sum);

    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    let mut neu_count = 0usize;
    for &s in sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neu_count += 1;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += amplifier;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= amplifier;
    }

    // never zero: `sentiments` is non-empty
    let total = pos_sum + neg_sum.abs() + neu_count as f64;
    SentimentScores {
        compound: round_to(compound, 4),
        pos: round_to((pos_sum / total).abs(), 3),
        neu: round_to((neu_count as f64 / total).abs(), 3),
        neg: round_to((neg_sum / total).abs(), 3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound(text: &str) -> f64 {
        SentimentAnalyzer::builtin().polarity_scores(text).compound
    }

    #[test]
    fn test_empty_text_scores_zero() {
        let scores = SentimentAnalyzer::builtin().polarity_scores("   ");
        assert_eq!(scores, SentimentScores::default());
    }

    #[test]
    fn test_neutral_text() {
        let scores = SentimentAnalyzer::builtin().polarity_scores("the table is brown");
        assert_eq!(scores.compound, 0.0);
        assert_eq!(scores.neu, 1.0);
    }

    #[test]
    fn test_single_word_compound_matches_normalization() {
        // love = 3.2 -> 3.2 / sqrt(3.2^2 + 15)
        let expected = round_to(3.2 / (3.2f64 * 3.2 + 15.0).sqrt(), 4);
        assert!((compound("we love") - expected).abs() < 1e-9);
    }

    #[test]
    fn test_negation_flips_polarity() {
        assert!(compound("this is good") > 0.0);
        assert!(compound("this is not good") < 0.0);
        assert!(compound("this isn't good") < 0.0);
    }

    #[test]
    fn test_booster_intensifies() {
        assert!(compound("this is very good") > compound("this is good"));
        assert!(compound("this is kinda good") < compound("this is good"));
    }

    #[test]
    fn test_caps_emphasis_only_with_mixed_case() {
        assert!(compound("this is GOOD") > compound("this is good"));
        assert_eq!(compound("GOOD"), compound("good"));
    }

    #[test]
    fn test_exclamation_amplifies() {
        assert!(compound("this is good!!!") > compound("this is good"));
        assert!(compound("this is bad!!!") < compound("this is bad"));
    }

    #[test]
    fn test_but_shifts_weight_to_second_clause() {
        let scores = compound("the verse is good but the chorus is terrible");
        assert!(scores < 0.0);
    }

    #[test]
    fn test_scores_stay_in_range() {
        let text = "LOVE love love happy happy joy joy wonderful!!!! amazing best";
        let scores = SentimentAnalyzer::builtin().polarity_scores(text);
        assert!(scores.compound <= 1.0 && scores.compound > 0.9);
        assert!((scores.pos + scores.neu + scores.neg - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_custom_lexicon() {
        let lexicon = SentimentLexicon::parse("mirrorball\t3.0\n").unwrap();
        let analyzer = SentimentAnalyzer::new(lexicon);
        assert!(analyzer.polarity_scores("a mirrorball").compound > 0.0);
        assert_eq!(analyzer.polarity_scores("love").compound, 0.0);
    }
}
