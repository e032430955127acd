//! Corpus-wide TF-IDF signatures.
//!
//! A [`ThematicVectorizer`] is fitted once over every lyric in the corpus and
//! then asked for the strongest terms of each song. Only terms that are rare
//! across the corpus but frequent within a song score highly, which is what
//! makes them a useful "signature".

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap, HashSet},
    sync::LazyLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::strip_section_tags;

mod stop_words;

static TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]{3,}\b").expect("term pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThematicConfig {
    /// Number of signature words per song.
    pub top_terms: usize,
    /// Vocabulary cap, keeping the most frequent terms of the corpus.
    pub max_features: usize,
    /// Names removed from lyrics before tokenizing.
    pub collaborators: Vec<String>,
    pub extra_stop_words: Vec<String>,
}

impl Default for ThematicConfig {
    fn default() -> Self {
        Self {
            top_terms: 5,
            max_features: 2000,
            collaborators: vec![],
            extra_stop_words: vec!["taylor".to_owned(), "swift".to_owned()],
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid collaborator pattern")]
pub struct ThematicError {
    pub source: regex::Error,
}

/// TF-IDF model over the lyric corpus.
///
/// # Examples
///
/// ```
/// use mirrorball_features::thematic::{ThematicConfig, ThematicVectorizer};
///
/// let corpus = [
///     "midnight rain midnight rain",
///     "golden summer light",
///     "summer rain falls",
/// ];
/// let vectorizer =
///     ThematicVectorizer::fit(&ThematicConfig::default(), corpus, ["Midnight Rain"]).unwrap();
/// assert!(!vectorizer.vocabulary().iter().any(|t| t == "midnight"));
/// assert_eq!(vectorizer.signature("golden summer light"), "golden, light, summer");
/// ```
#[derive(Debug, Clone)]
pub struct ThematicVectorizer {
    top_terms: usize,
    collaborators: Option<Regex>,
    stop_words: HashSet<String>,
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl ThematicVectorizer {
    /// Fits the vocabulary and inverse document frequencies.
    ///
    /// Every term of three or more letters in `titles` becomes a stop word, so
    /// a song's own title never ends up as its signature.
    #[expect(clippy::cast_precision_loss)]
    pub fn fit<'a, D, T>(
        config: &ThematicConfig,
        documents: D,
        titles: T,
    ) -> Result<Self, ThematicError>
    where
        D: IntoIterator<Item = &'a str>,
        T: IntoIterator<Item = &'a str>,
    {
        let collaborators = collaborator_pattern(&config.collaborators)?;

        let mut stop_words = stop_words::ENGLISH
            .iter()
            .chain(stop_words::LYRIC)
            .map(|w| (*w).to_owned())
            .collect::<HashSet<_>>();
        stop_words.extend(config.extra_stop_words.iter().map(|w| w.to_lowercase()));
        for title in titles {
            stop_words.extend(terms(&title.to_lowercase()).map(str::to_owned));
        }

        let mut partial = Self {
            top_terms: config.top_terms,
            collaborators,
            stop_words,
            vocabulary: vec![],
            index: HashMap::new(),
            idf: vec![],
        };

        let mut term_freq = HashMap::<String, usize>::new();
        let mut doc_freq = HashMap::<String, usize>::new();
        let mut n_docs = 0usize;
        for doc in documents {
            n_docs += 1;
            let counts = partial.term_counts(doc);
            for (term, count) in counts {
                *term_freq.entry(term.clone()).or_default() += count;
                *doc_freq.entry(term).or_default() += 1;
            }
        }

        let mut by_freq = term_freq.into_iter().collect::<Vec<_>>();
        by_freq.sort_by(|(a_term, a), (b_term, b)| b.cmp(a).then_with(|| a_term.cmp(b_term)));
        by_freq.truncate(config.max_features);
        let mut vocabulary = by_freq.into_iter().map(|(term, _)| term).collect::<Vec<_>>();
        vocabulary.sort();

        let n = n_docs as f64;
        partial.idf = vocabulary
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        partial.index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
        partial.vocabulary = vocabulary;

        tracing::debug!(
            documents = n_docs,
            vocabulary = partial.vocabulary.len(),
            "fitted thematic vectorizer"
        );
        Ok(partial)
    }

    /// Terms in column order.
    #[must_use]
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    #[must_use]
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.index.get(term).map(|&i| self.idf[i])
    }

    /// L2-normalized TF-IDF weights of one text, keyed by column index.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn weights(&self, text: &str) -> BTreeMap<usize, f64> {
        let mut weights = self
            .term_counts(text)
            .into_iter()
            .filter_map(|(term, count)| {
                let column = *self.index.get(&term)?;
                Some((column, count as f64 * self.idf[column]))
            })
            .collect::<BTreeMap<_, _>>();
        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for w in weights.values_mut() {
                *w /= norm;
            }
        }
        weights
    }

    /// Strongest terms of `text`, joined with `", "`.
    ///
    /// Ties keep column (alphabetical) order. Returns an empty string when
    /// no vocabulary term occurs.
    #[must_use]
    pub fn signature(&self, text: &str) -> String {
        let mut ranked = self
            .weights(text)
            .into_iter()
            .filter(|(_, w)| *w > 0.0)
            .collect::<Vec<_>>();
        // stable sort, so equal weights stay in column order
        ranked.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
        ranked
            .into_iter()
            .take(self.top_terms)
            .map(|(column, _)| self.vocabulary[column].as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn term_counts(&self, text: &str) -> HashMap<String, usize> {
        let mut clean = strip_section_tags(text);
        if let Some(pattern) = &self.collaborators {
            clean = pattern.replace_all(&clean, " ").into_owned();
        }
        let lower = clean.to_lowercase();
        let mut counts = HashMap::new();
        for term in terms(&lower).filter(|t| !self.stop_words.contains(*t)) {
            *counts.entry(term.to_owned()).or_default() += 1;
        }
        counts
    }
}

fn terms(text: &str) -> impl Iterator<Item = &str> {
    TERM.find_iter(text).map(|m| m.as_str())
}

fn collaborator_pattern(names: &[String]) -> Result<Option<Regex>, ThematicError> {
    let alternatives = names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>();
    if alternatives.is_empty() {
        return Ok(None);
    }
    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|source| ThematicError { source })
}
