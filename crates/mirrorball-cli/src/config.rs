use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use mirrorball_corpus::{refetch::RefetchPolicy, schema::PIPELINE_TABLES};
use mirrorball_features::thematic::ThematicConfig;
use mirrorball_latent::LatentConfig;
use mirrorball_training::reconstructor::ReconstructorConfig;
use serde::{Deserialize, Serialize};

const DEFAULT_SEED: u64 = 42;

/// Settings for every pipeline stage, read from an optional TOML file.
///
/// The top-level `seed` is copied into every seeded stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PipelineConfig {
    pub database: PathBuf,
    pub seed: u64,
    /// VADER-format lexicon replacing the built-in one.
    pub sentiment_lexicon: Option<PathBuf>,
    /// One easy word per line, replacing the built-in list.
    pub easy_words: Option<PathBuf>,
    pub thematic: ThematicConfig,
    /// Track-name suffixes stripped before label matching.
    pub title_aliases: Vec<String>,
    pub reconstruction: ReconstructorConfig,
    pub latent: LatentConfig,
    pub refetch: RefetchPolicy,
    /// Tables `cleanup` leaves in place.
    pub keep_tables: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("mirrorball.db"),
            seed: DEFAULT_SEED,
            sentiment_lexicon: None,
            easy_words: None,
            thematic: ThematicConfig::default(),
            title_aliases: vec!["(Taylor's Version)".to_owned()],
            reconstruction: ReconstructorConfig::default(),
            latent: LatentConfig::default(),
            refetch: RefetchPolicy::default(),
            keep_tables: PIPELINE_TABLES.map(str::to_owned).to_vec(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                let config = Self::parse(&text)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
                tracing::info!(path = %path.display(), "loaded configuration");
                config
            }
            None => Self::default(),
        };
        Ok(config)
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(text)?;
        let seed = config.seed;
        Ok(config.with_seed(seed))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.reconstruction.seed = seed;
        self.latent.seed = seed;
        self
    }

    /// Applies command-line overrides.
    pub fn with_overrides(mut self, database: Option<PathBuf>, seed: Option<u64>) -> Self {
        if let Some(database) = database {
            self.database = database;
        }
        match seed {
            Some(seed) => self.with_seed(seed),
            None => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use mirrorball_features::FeatureKind;

    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(PipelineConfig::parse("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_nested_sections_override_defaults() {
        let config = PipelineConfig::parse(
            r#"
            seed = 7
            title_aliases = []

            [reconstruction]
            features = ["reading_grade", "word_count"]
            search = { trials = 5 }

            [latent.kmeans]
            k = 3

            [latent.attribution]
            disambiguation_ratio = 0.5
            "#,
        )
        .unwrap();
        assert!(config.title_aliases.is_empty());
        assert_eq!(
            config.reconstruction.features,
            [FeatureKind::ReadingGrade, FeatureKind::WordCount]
        );
        let search = config.reconstruction.search.unwrap();
        assert_eq!(search.trials, 5);
        assert_eq!(search.max_depth, (3, 7));
        assert_eq!(config.latent.kmeans.k, 3);
        assert_eq!(config.latent.kmeans.restarts, 10);
        assert!((config.latent.attribution.disambiguation_ratio - 0.5).abs() < 1e-12);
        assert_eq!(config.reconstruction.seed, 7);
        assert_eq!(config.latent.seed, 7);
    }

    #[test]
    fn test_loads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirrorball.toml");
        fs::write(
            &path,
            "database = \"corpus.db\"\n[refetch]\nrequire_section_tags = false\n",
        )
        .unwrap();
        let config = PipelineConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.database, Path::new("corpus.db"));
        assert!(!config.refetch.require_section_tags);
        assert_eq!(config.refetch.tag_prefixes.len(), 5);
        assert!(PipelineConfig::load(Some(dir.path().join("absent.toml").as_path())).is_err());
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(PipelineConfig::parse("sead = 1").is_err());
    }

    #[test]
    fn test_command_line_overrides() {
        let config = PipelineConfig::default().with_overrides(Some("other.db".into()), Some(9));
        assert_eq!(config.database, Path::new("other.db"));
        assert_eq!(config.latent.seed, 9);
        assert_eq!(config.reconstruction.seed, 9);
    }
}
