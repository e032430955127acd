//! Sentiment polarity and lexical complexity over raw lyric tokens.

use std::collections::HashSet;

use crate::{feature::NlpFeatures, sentiment::SentimentAnalyzer, text::whitespace_tokens};

/// Ratio of distinct lowercase tokens to all tokens, or 0 without tokens.
///
/// Tokens are whitespace-delimited and keep their punctuation, so `love`
/// and `love,` count as different tokens.
///
/// # Examples
///
/// ```
/// use mirrorball_features::nlp::lexical_complexity;
///
/// assert_eq!(lexical_complexity("Shake it off shake it off"), 0.5);
/// assert_eq!(lexical_complexity(""), 0.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn lexical_complexity(text: &str) -> f64 {
    let tokens = whitespace_tokens(text)
        .map(str::to_lowercase)
        .collect::<Vec<_>>();
    if tokens.is_empty() {
        return 0.0;
    }
    let distinct = tokens.iter().collect::<HashSet<_>>().len();
    distinct as f64 / tokens.len() as f64
}

/// Computes NLP features over the raw text, section tags included.
#[must_use]
pub fn nlp_features(analyzer: &SentimentAnalyzer, text: &str) -> NlpFeatures {
    let scores = analyzer.polarity_scores(text);
    NlpFeatures {
        sentiment_compound: scores.compound,
        sentiment_pos: scores.pos,
        sentiment_neg: scores.neg,
        lexical_complexity: lexical_complexity(text),
        word_count: whitespace_tokens(text).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_includes_tags() {
        let features = nlp_features(&SentimentAnalyzer::builtin(), "[Chorus]\nla la la");
        assert_eq!(features.word_count, 4);
        assert!((features.lexical_complexity - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_complexity_is_case_insensitive() {
        assert!((lexical_complexity("Love LOVE love") - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(lexical_complexity("every word differs"), 1.0);
    }

    #[test]
    fn test_sentiment_fields_come_from_analyzer() {
        let analyzer = SentimentAnalyzer::builtin();
        let text = "I hate this sad song";
        let features = nlp_features(&analyzer, text);
        let scores = analyzer.polarity_scores(text);
        assert_eq!(features.sentiment_compound, scores.compound);
        assert_eq!(features.sentiment_neg, scores.neg);
        assert!(features.sentiment_neg > features.sentiment_pos);
    }
}
