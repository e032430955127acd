//! The four pipeline stages, each reading its inputs from the corpus store
//! and replacing its output tables.

use std::collections::BTreeMap;

use anyhow::Context;
use mirrorball_analysis::{
    Target,
    builder::{BuildReport, TableBuilder},
};
use mirrorball_corpus::{CorpusStore, ResultRow};
use mirrorball_features::{
    FeatureFamily,
    extractor::TextFeatureExtractor,
    readability::ReadabilityAnalyzer,
    sentiment::{SentimentAnalyzer, SentimentLexicon},
};
use mirrorball_latent::{ClusterSummary, LatentSpaceEngine};
use mirrorball_training::reconstructor::{LabelReconstructor, TargetReport};
use serde::Serialize;
use tracing::{error, info};

use crate::config::PipelineConfig;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ExtractReport {
    pub tracks: usize,
    pub omitted: usize,
    pub records: BTreeMap<FeatureFamily, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReconstructReport {
    pub targets: BTreeMap<Target, TargetReport>,
    /// Targets whose model could not be fitted, with the reason.
    pub failures: BTreeMap<Target, String>,
    pub predictions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AnalyzeReport {
    pub tracks: usize,
    pub k: usize,
    pub inertia: f64,
    pub clusters: ClusterSummary,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RunReport {
    pub extract: ExtractReport,
    pub build: BuildReport,
    pub reconstruct: ReconstructReport,
    pub analyze: Option<AnalyzeReport>,
}

fn build_extractor(config: &PipelineConfig) -> anyhow::Result<TextFeatureExtractor> {
    let sentiment = match &config.sentiment_lexicon {
        Some(path) => SentimentAnalyzer::new(
            SentimentLexicon::load(path)
                .with_context(|| format!("Failed to load sentiment lexicon: {}", path.display()))?,
        ),
        None => SentimentAnalyzer::builtin(),
    };
    let readability = match &config.easy_words {
        Some(path) => ReadabilityAnalyzer::load_easy_words(path)
            .with_context(|| format!("Failed to load easy-word list: {}", path.display()))?,
        None => ReadabilityAnalyzer::builtin(),
    };
    Ok(TextFeatureExtractor::new(sentiment, readability))
}

pub(crate) fn extract(
    store: &mut CorpusStore,
    config: &PipelineConfig,
) -> anyhow::Result<ExtractReport> {
    let extractor = build_extractor(config)?;
    let lyrics = store.load_lyrics().context("Failed to load lyrics corpus")?;
    let vectorizer = TextFeatureExtractor::fit_thematic(&config.thematic, &lyrics)
        .context("Failed to fit thematic vectorizer")?;
    let corpus = extractor.extract_corpus(&vectorizer, &lyrics);

    let mut records = BTreeMap::new();
    for family in FeatureFamily::ALL {
        let written = store
            .replace_features(family, corpus.family(family))
            .with_context(|| format!("Failed to write {} features", family.id()))?;
        records.insert(family, written);
    }
    Ok(ExtractReport {
        tracks: lyrics.len(),
        omitted: corpus.omitted,
        records,
    })
}

pub(crate) fn build_table(
    store: &mut CorpusStore,
    config: &PipelineConfig,
) -> anyhow::Result<BuildReport> {
    let lyrics = store.load_lyrics().context("Failed to load lyrics corpus")?;
    let labels = store.load_labels().context("Failed to load ground-truth labels")?;
    let mut features = Vec::new();
    for family in FeatureFamily::ALL {
        features.extend(
            store
                .load_features(family)
                .with_context(|| format!("Failed to load {} features", family.id()))?,
        );
    }

    let builder = TableBuilder::new(config.title_aliases.clone());
    let (table, report) = builder.build(&lyrics, &features, &labels)?;
    store
        .replace_unified(&table)
        .context("Failed to write unified table")?;
    info!(
        total = report.total,
        labeled = ?report.labeled,
        with_family = ?report.with_family,
        "built unified table"
    );
    Ok(report)
}

pub(crate) fn reconstruct(
    store: &mut CorpusStore,
    config: &PipelineConfig,
) -> anyhow::Result<ReconstructReport> {
    let mut table = store.load_unified().context("Failed to load unified table")?;
    let reconstruction =
        LabelReconstructor::new(config.reconstruction.clone()).reconstruct(&mut table)?;

    store
        .replace_unified(&table)
        .context("Failed to write reconstructed table")?;
    store
        .replace_predictions(&reconstruction.predictions)
        .context("Failed to write predictions")?;

    let mut targets = BTreeMap::new();
    let mut failures = BTreeMap::new();
    for (target, result) in reconstruction.results {
        match result {
            Ok(report) => {
                info!(
                    %target,
                    labeled = report.labeled,
                    predicted = report.unlabeled,
                    validation_mse = ?report.validation_mse,
                    "reconstructed target"
                );
                targets.insert(target, report);
            }
            Err(err) => {
                let err = anyhow::Error::new(err);
                error!(%target, "{err:#}");
                failures.insert(target, format!("{err:#}"));
            }
        }
    }
    Ok(ReconstructReport {
        targets,
        failures,
        predictions: reconstruction.predictions.len(),
    })
}

pub(crate) fn analyze(
    store: &mut CorpusStore,
    config: &PipelineConfig,
) -> anyhow::Result<AnalyzeReport> {
    let table = store.load_unified().context("Failed to load unified table")?;
    let analysis = LatentSpaceEngine::new(config.latent.clone()).analyze(&table)?;
    let results = ResultRow::join(&table, &analysis);
    store
        .replace_results(&results)
        .context("Failed to write result table")?;
    Ok(AnalyzeReport {
        tracks: results.len(),
        k: analysis.k,
        inertia: analysis.inertia,
        clusters: analysis.summary(),
    })
}

/// Runs every stage in order. Clustering is skipped when a target could not
/// be reconstructed; the caller decides how to fail.
pub(crate) fn run(store: &mut CorpusStore, config: &PipelineConfig) -> anyhow::Result<RunReport> {
    let extract = extract(store, config)?;
    let build = build_table(store, config)?;
    let reconstruct = reconstruct(store, config)?;
    let analyze = if reconstruct.failures.is_empty() {
        Some(analyze(store, config)?)
    } else {
        None
    };
    Ok(RunReport {
        extract,
        build,
        reconstruct,
        analyze,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mirrorball_analysis::GroundTruthLabel;
    use mirrorball_corpus::schema::PREDICTIONS_TABLE;
    use mirrorball_features::{FeatureKind, LyricsRecord, TrackKey};

    use super::*;

    const MIRRORBALL: &str = "[Verse 1]\nI want you to know\nI'm a mirrorball\nI'll show you every version of yourself tonight\n\
        [Chorus]\nI can change everything about me to fit in\n\
        [Bridge]\nAnd when you're not here\nI'm still on my tallest tiptoes, spinning in my highest heels, love";
    const SEVEN: &str = "[Verse 1]\nPlease picture me in the trees\nI hit my peak at seven\n\
        [Chorus]\nAnd I've been meaning to tell you\nI think your house is haunted\n\
        [Bridge]\nSweet tea in the summer, cross your heart, won't tell no other";
    const EPIPHANY: &str = "[Verse 1]\nKeep your helmet, keep your life, son\nJust a flesh wound\n\
        [Chorus]\nWith you I serve, with you I fall down\nWatch you breathe in, watch you breathing out";

    fn lyrics(name: &str, text: &str) -> LyricsRecord {
        LyricsRecord {
            key: TrackKey::new(name, "Folklore"),
            lyrics: Some(text.to_owned()),
            is_new_era: false,
            scraped_at: Utc::now(),
        }
    }

    fn label(name: &str, energy: f64, valence: f64) -> GroundTruthLabel {
        GroundTruthLabel {
            track_name: name.to_owned(),
            album_name: Some("Folklore".to_owned()),
            energy: Some(energy),
            valence: Some(valence),
        }
    }

    fn seeded_store() -> CorpusStore {
        let mut store = CorpusStore::open_in_memory().unwrap();
        store
            .append_lyrics(&[
                lyrics("mirrorball", MIRRORBALL),
                lyrics("seven", SEVEN),
                lyrics("epiphany", EPIPHANY),
            ])
            .unwrap();
        store
            .replace_labels(&[label("mirrorball", 0.5, 0.3), label("seven", 0.8, 0.6)])
            .unwrap();
        store
    }

    fn config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.reconstruction.search = None;
        config.latent.embedding.n_epochs = Some(50);
        config
    }

    #[test]
    fn test_runs_end_to_end() {
        let mut store = seeded_store();
        let report = run(&mut store, &config()).unwrap();

        assert_eq!(report.extract.tracks, 3);
        assert_eq!(report.extract.omitted, 0);
        assert!(report.extract.records.values().all(|&n| n == 3));
        assert_eq!(report.build.total, 3);
        assert_eq!(report.build.labeled[&Target::Energy], 2);
        assert!(report.reconstruct.failures.is_empty());
        assert_eq!(report.reconstruct.predictions, 2);

        let table = store.load_unified().unwrap();
        assert!(table.rows.iter().all(|row| row.is_fully_labeled()));
        let epiphany = &table.rows[2];
        assert!(epiphany.energy.is_predicted());
        assert!(epiphany.valence.is_predicted());
        let energy = epiphany.energy.value().unwrap();
        let valence = epiphany.valence.value().unwrap();
        assert!((0.5..=0.8).contains(&energy), "{energy}");
        assert!((0.3..=0.6).contains(&valence), "{valence}");
        assert!(table.rows[0].energy.is_observed());
        assert_eq!(store.row_count(PREDICTIONS_TABLE).unwrap(), 2);

        let analyze = report.analyze.unwrap();
        assert_eq!(analyze.tracks, 3);
        assert_eq!(analyze.k, 3);
        let results = store.load_results().unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.cluster_id < 5));
        assert!(results[2].energy_predicted && results[2].valence_predicted);
        assert!(!results[0].energy_predicted);
        assert_eq!(results[0].attributions.len(), 6);
        assert!(results[0].features.contains_key(&FeatureKind::ReadingGrade));
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let mut store = seeded_store();
        run(&mut store, &config()).unwrap();
        let first = store.load_results().unwrap();
        run(&mut store, &config()).unwrap();
        assert_eq!(store.load_results().unwrap(), first);
    }

    #[test]
    fn test_zero_variance_target_skips_clustering() {
        let mut store = seeded_store();
        store
            .replace_labels(&[label("mirrorball", 0.5, 0.4), label("seven", 0.8, 0.4)])
            .unwrap();
        let report = run(&mut store, &config()).unwrap();
        assert!(report.reconstruct.failures.contains_key(&Target::Valence));
        assert!(report.reconstruct.targets.contains_key(&Target::Energy));
        assert!(report.analyze.is_none());
        assert!(!store.has_table("mirrorball_ml_final").unwrap());
    }

    #[test]
    fn test_missing_labels_is_fatal() {
        let mut store = CorpusStore::open_in_memory().unwrap();
        store.append_lyrics(&[lyrics("seven", SEVEN)]).unwrap();
        extract(&mut store, &config()).unwrap();
        assert!(build_table(&mut store, &config()).is_err());
    }

    #[test]
    fn test_no_labeled_rows_is_fatal() {
        let mut store = seeded_store();
        store.replace_labels(&[]).unwrap();
        assert!(run(&mut store, &config()).is_err());
    }
}
