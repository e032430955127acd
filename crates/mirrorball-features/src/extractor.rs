//! Per-track and corpus-wide feature extraction.

use std::collections::BTreeMap;

use crate::{
    bridge::bridge_dynamics,
    feature::{
        BridgeFeatures, FamilyFeatures, FeatureFamily, FeatureRecord, NlpFeatures,
        ReadabilityFeatures, ThematicFeatures,
    },
    nlp::nlp_features,
    readability::ReadabilityAnalyzer,
    sentiment::SentimentAnalyzer,
    text::has_content,
    thematic::{ThematicConfig, ThematicError, ThematicVectorizer},
    track::LyricsRecord,
};

/// Extracts every feature family from lyric text.
///
/// Each `extract_*` method returns `None` for absent or blank lyrics.
#[derive(Debug, Clone)]
pub struct TextFeatureExtractor {
    sentiment: SentimentAnalyzer,
    readability: ReadabilityAnalyzer,
}

/// Feature records of a whole corpus, grouped by family.
#[derive(Debug, Clone, Default)]
pub struct CorpusFeatures {
    pub records: BTreeMap<FeatureFamily, Vec<FeatureRecord>>,
    /// Tracks skipped because their lyrics were absent or blank.
    pub omitted: usize,
}

impl CorpusFeatures {
    #[must_use]
    pub fn family(&self, family: FeatureFamily) -> &[FeatureRecord] {
        self.records.get(&family).map_or(&[], Vec::as_slice)
    }

    /// All records, family by family.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureRecord> {
        self.records.values().flatten()
    }
}

impl TextFeatureExtractor {
    #[must_use]
    pub fn new(sentiment: SentimentAnalyzer, readability: ReadabilityAnalyzer) -> Self {
        Self {
            sentiment,
            readability,
        }
    }

    #[must_use]
    pub fn sentiment(&self) -> &SentimentAnalyzer {
        &self.sentiment
    }

    #[must_use]
    pub fn extract_nlp(&self, text: Option<&str>) -> Option<NlpFeatures> {
        content(text).map(|text| nlp_features(&self.sentiment, text))
    }

    #[must_use]
    pub fn extract_readability(&self, text: Option<&str>) -> Option<ReadabilityFeatures> {
        content(text).map(|text| self.readability.analyze(text))
    }

    #[must_use]
    pub fn extract_bridge(&self, text: Option<&str>) -> Option<BridgeFeatures> {
        content(text).map(|text| bridge_dynamics(&self.sentiment, text))
    }

    #[must_use]
    pub fn extract_thematic(
        &self,
        vectorizer: &ThematicVectorizer,
        text: Option<&str>,
    ) -> Option<ThematicFeatures> {
        content(text).map(|text| ThematicFeatures {
            thematic_dna: vectorizer.signature(text),
        })
    }

    /// Fits the thematic vectorizer on every lyric of the corpus.
    ///
    /// Missing lyrics count as empty documents. Track and album names of every
    /// record become stop words.
    pub fn fit_thematic(
        config: &ThematicConfig,
        records: &[LyricsRecord],
    ) -> Result<ThematicVectorizer, ThematicError> {
        let documents = records.iter().map(|r| r.lyrics.as_deref().unwrap_or(""));
        let titles = records
            .iter()
            .flat_map(|r| [r.key.track_name.as_str(), r.key.album_name.as_str()]);
        ThematicVectorizer::fit(config, documents, titles)
    }

    /// Extracts all four families of one track.
    #[must_use]
    pub fn extract_track(
        &self,
        vectorizer: &ThematicVectorizer,
        text: Option<&str>,
    ) -> Option<[FamilyFeatures; 4]> {
        let text = content(text)?;
        Some([
            FamilyFeatures::Nlp(nlp_features(&self.sentiment, text)),
            FamilyFeatures::Readability(self.readability.analyze(text)),
            FamilyFeatures::Thematic(ThematicFeatures {
                thematic_dna: vectorizer.signature(text),
            }),
            FamilyFeatures::Bridge(bridge_dynamics(&self.sentiment, text)),
        ])
    }

    /// Extracts every family for every track of the corpus.
    pub fn extract_corpus(
        &self,
        vectorizer: &ThematicVectorizer,
        records: &[LyricsRecord],
    ) -> CorpusFeatures {
        let mut corpus = CorpusFeatures::default();
        for record in records {
            let Some(families) = self.extract_track(vectorizer, record.lyrics.as_deref()) else {
                tracing::debug!(track = %record.key, "skipping track without lyrics");
                corpus.omitted += 1;
                continue;
            };
            for features in families {
                corpus
                    .records
                    .entry(features.family())
                    .or_default()
                    .push(FeatureRecord {
                        key: record.key.clone(),
                        features,
                    });
            }
        }

        let extracted = records.len() - corpus.omitted;
        if corpus.omitted > 0 {
            tracing::warn!(
                omitted = corpus.omitted,
                "{} tracks have no lyrics and produce no features",
                corpus.omitted
            );
        }
        tracing::info!(tracks = records.len(), extracted, "extracted text features");
        corpus
    }
}

fn content(text: Option<&str>) -> Option<&str> {
    text.filter(|t| has_content(Some(*t)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackKey;

    fn extractor() -> TextFeatureExtractor {
        TextFeatureExtractor::new(SentimentAnalyzer::builtin(), ReadabilityAnalyzer::builtin())
    }

    fn record(track: &str, lyrics: Option<&str>) -> LyricsRecord {
        LyricsRecord {
            key: TrackKey::new(track, "Folklore"),
            lyrics: lyrics.map(str::to_owned),
            is_new_era: true,
            scraped_at: chrono::DateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_blank_text_produces_no_record() {
        let extractor = extractor();
        for text in [None, Some(""), Some("  \n ")] {
            assert!(extractor.extract_nlp(text).is_none());
            assert!(extractor.extract_readability(text).is_none());
            assert!(extractor.extract_bridge(text).is_none());
        }
    }

    #[test]
    fn test_corpus_counts_omissions() {
        let records = [
            record(
                "Exile",
                Some("[Verse]\nI can see you standing, honey\n[Bridge]\nSo step right out"),
            ),
            record("Seven", None),
            record("Peace", Some("   ")),
        ];
        let extractor = extractor();
        let vectorizer =
            TextFeatureExtractor::fit_thematic(&ThematicConfig::default(), &records).unwrap();
        let corpus = extractor.extract_corpus(&vectorizer, &records);
        assert_eq!(corpus.omitted, 2);
        for family in FeatureFamily::ALL {
            assert_eq!(corpus.family(family).len(), 1, "{family}");
        }
        assert_eq!(corpus.iter().count(), 4);
    }

    #[test]
    fn test_missing_lyrics_count_as_documents() {
        let records = [
            record("Exile", Some("cardigan honey")),
            record("Seven", None),
            record("Peace", Some("")),
            record("Hoax", Some("honey")),
        ];
        let vectorizer =
            TextFeatureExtractor::fit_thematic(&ThematicConfig::default(), &records).unwrap();
        let idf = vectorizer.idf("cardigan").unwrap();
        assert!((idf - ((1.0 + 4.0) / (1.0 + 1.0_f64)).ln() - 1.0).abs() < 1e-12);
        let idf = vectorizer.idf("honey").unwrap();
        assert!((idf - ((1.0 + 4.0) / (1.0 + 2.0_f64)).ln() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_titles_are_excluded_from_signatures() {
        let records = [
            record("Exile", Some("exile exile standing honey")),
            record("Betty", Some("betty cardigan standing")),
        ];
        let vectorizer =
            TextFeatureExtractor::fit_thematic(&ThematicConfig::default(), &records).unwrap();
        let thematic = extractor()
            .extract_thematic(&vectorizer, records[0].text())
            .unwrap();
        assert_eq!(thematic.thematic_dna, "honey, standing");
    }
}
