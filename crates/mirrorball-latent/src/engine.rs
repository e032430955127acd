//! The latent-space stage: standardize, cluster, embed, explain.

use std::collections::BTreeMap;

use mirrorball_analysis::{Target, UnifiedTable};
use mirrorball_features::{FeatureKind, TrackKey};
use mirrorball_stats::standardize::{StandardScaler, StandardizeError};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::{
    attribution::{AttributionConfig, Background, ClusterExplainer, top_driver},
    embedding::{EmbeddingConfig, embed},
    kmeans::{KMeans, KMeansConfig, KMeansError},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatentConfig {
    pub features: Vec<FeatureKind>,
    pub kmeans: KMeansConfig,
    pub embedding: EmbeddingConfig,
    pub attribution: AttributionConfig,
    pub seed: u64,
}

impl Default for LatentConfig {
    fn default() -> Self {
        Self {
            features: vec![
                FeatureKind::Energy,
                FeatureKind::Valence,
                FeatureKind::ReadingGrade,
                FeatureKind::SyllableDensity,
                FeatureKind::LexicalDiversity,
                FeatureKind::BridgeSentimentShift,
            ],
            kmeans: KMeansConfig::default(),
            embedding: EmbeddingConfig::default(),
            attribution: AttributionConfig::default(),
            seed: 42,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LatentError {
    #[display("the unified table is empty")]
    EmptyTable,
    #[display("no clustering features configured")]
    NoFeatures,
    #[display("clustering feature {feature} is listed twice")]
    DuplicateFeature { feature: FeatureKind },
    #[display("{track} has no {target} value; run label reconstruction first")]
    UnlabeledRow { track: TrackKey, target: Target },
    #[display("failed to standardize features")]
    Standardize { source: StandardizeError },
    #[display("failed to cluster")]
    KMeans { source: KMeansError },
    #[display("failed to build the attribution background")]
    Background { source: KMeansError },
}

/// Where one track landed in the latent space and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    #[serde(flatten)]
    pub key: TrackKey,
    pub cluster_id: usize,
    pub x: f64,
    pub y: f64,
    /// Disambiguated driver; see [`top_driver`].
    pub top_driver: FeatureKind,
    pub naive_top_driver: FeatureKind,
    pub attributions: BTreeMap<FeatureKind, f64>,
}

/// Result of [`LatentSpaceEngine::analyze`], aligned with the table rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentAnalysis {
    pub features: Vec<FeatureKind>,
    /// Effective number of clusters.
    pub k: usize,
    pub inertia: f64,
    pub assignments: Vec<ClusterAssignment>,
}

impl LatentAnalysis {
    #[must_use]
    pub fn summary(&self) -> ClusterSummary {
        ClusterSummary::new(
            self.assignments
                .iter()
                .map(|a| (a.cluster_id, a.top_driver)),
        )
    }
}

/// Per-cluster sizes and top-driver counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub sizes: BTreeMap<usize, usize>,
    pub top_drivers: BTreeMap<usize, BTreeMap<FeatureKind, usize>>,
}

impl ClusterSummary {
    /// Counts `(cluster id, top driver)` pairs.
    #[must_use]
    pub fn new<I>(assignments: I) -> Self
    where
        I: IntoIterator<Item = (usize, FeatureKind)>,
    {
        let mut summary = Self::default();
        for (cluster_id, driver) in assignments {
            *summary.sizes.entry(cluster_id).or_default() += 1;
            *summary
                .top_drivers
                .entry(cluster_id)
                .or_default()
                .entry(driver)
                .or_default() += 1;
        }
        summary
    }
}

#[derive(Debug, Clone, Default)]
pub struct LatentSpaceEngine {
    config: LatentConfig,
}

impl LatentSpaceEngine {
    #[must_use]
    pub fn new(config: LatentConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &LatentConfig {
        &self.config
    }

    /// Clusters and embeds every row of a fully labeled table.
    ///
    /// # Errors
    ///
    /// Fails if the table is empty, any row still has an absent target, the
    /// feature list is empty or repeats a feature, or clustering fails.
    pub fn analyze(&self, table: &UnifiedTable) -> Result<LatentAnalysis, LatentError> {
        let features = &self.config.features;
        self.validate(table)?;

        let raw = table.full_matrix(features);
        let scaler =
            StandardScaler::fit(&raw).map_err(|source| LatentError::Standardize { source })?;
        let data = scaler.transform(&raw);

        let model = KMeans::fit(&self.config.kmeans, &data, self.config.seed)
            .map_err(|source| LatentError::KMeans { source })?;
        tracing::info!(
            rows = data.len(),
            k = model.k(),
            inertia = model.inertia(),
            "clustered tracks"
        );

        let points = embed(&self.config.embedding, &data, self.config.seed);

        let mut rng = Pcg64Mcg::seed_from_u64(self.config.seed);
        let background = Background::build(self.config.attribution.background, &data, &mut rng)
            .map_err(|source| LatentError::Background { source })?;
        let explainer = ClusterExplainer::new(&model, &background);
        tracing::debug!(background = background.len(), "explaining cluster assignments");

        let mut assignments = Vec::with_capacity(data.len());
        for ((row, point), (standardized, &cluster_id)) in table
            .rows
            .iter()
            .zip(&points)
            .zip(data.iter().zip(model.assignments()))
        {
            let phi = explainer.explain(standardized, &self.config.attribution, &mut rng);
            let driver = top_driver(features, &phi, self.config.attribution.disambiguation_ratio)
                .ok_or(LatentError::NoFeatures)?;
            if driver.naive != driver.reported {
                tracing::debug!(
                    track = %row.key,
                    naive = %driver.naive,
                    reported = %driver.reported,
                    "stylistic driver preferred over audio driver"
                );
            }
            assignments.push(ClusterAssignment {
                key: row.key.clone(),
                cluster_id,
                x: point[0],
                y: point[1],
                top_driver: driver.reported,
                naive_top_driver: driver.naive,
                attributions: features.iter().copied().zip(phi).collect(),
            });
        }

        Ok(LatentAnalysis {
            features: features.clone(),
            k: model.k(),
            inertia: model.inertia(),
            assignments,
        })
    }

    fn validate(&self, table: &UnifiedTable) -> Result<(), LatentError> {
        if table.is_empty() {
            return Err(LatentError::EmptyTable);
        }
        let features = &self.config.features;
        if features.is_empty() {
            return Err(LatentError::NoFeatures);
        }
        for (i, &feature) in features.iter().enumerate() {
            if features[..i].contains(&feature) {
                return Err(LatentError::DuplicateFeature { feature });
            }
        }
        if let Some((row, target)) = table.first_unlabeled() {
            return Err(LatentError::UnlabeledRow {
                track: row.key.clone(),
                target,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mirrorball_analysis::{TargetValue, UnifiedRow};

    use crate::attribution::BackgroundKind;

    use super::*;

    fn row(i: usize, energy: f64, valence: f64, grade: f64) -> UnifiedRow {
        let mut row = UnifiedRow::new(TrackKey::new(format!("track {i}"), "album"), false);
        row.energy = TargetValue::Observed(energy);
        row.valence = TargetValue::Predicted(valence);
        row.features.insert(FeatureKind::ReadingGrade, grade);
        row.features.insert(FeatureKind::SyllableDensity, 1.2);
        row.features.insert(FeatureKind::LexicalDiversity, 0.5);
        row
    }

    fn grouped_table() -> UnifiedTable {
        let centers = [(0.1, 0.1, 2.0), (0.9, 0.9, 2.0), (0.5, 0.5, 12.0)];
        let rows = (0..24)
            .map(|i| {
                let (e, v, g) = centers[i % 3];
                let jitter = f64::from(u8::try_from(i).unwrap()) * 0.001;
                row(i, e + jitter, v - jitter, g + jitter)
            })
            .collect();
        UnifiedTable { rows }
    }

    fn engine(k: usize) -> LatentSpaceEngine {
        let mut config = LatentConfig::default();
        config.kmeans.k = k;
        config.embedding.n_epochs = Some(50);
        LatentSpaceEngine::new(config)
    }

    #[test]
    fn test_assigns_every_row() {
        let table = grouped_table();
        let analysis = engine(3).analyze(&table).unwrap();
        assert_eq!(analysis.assignments.len(), table.len());
        assert_eq!(analysis.k, 3);
        for (assignment, row) in analysis.assignments.iter().zip(&table.rows) {
            assert_eq!(assignment.key, row.key);
            assert!(assignment.cluster_id < 3);
            assert!(assignment.x.is_finite() && assignment.y.is_finite());
            assert_eq!(assignment.attributions.len(), 6);
        }
        // rows of the same group share a cluster
        for (i, a) in analysis.assignments.iter().enumerate() {
            let b = &analysis.assignments[i % 3];
            assert_eq!(a.cluster_id, b.cluster_id);
        }
    }

    #[test]
    fn test_background_failure_is_reported_as_such() {
        let mut latent = engine(3);
        latent.config.attribution.background = BackgroundKind::Summary { k: 0 };
        let err = latent.analyze(&grouped_table()).unwrap_err();
        assert!(matches!(
            err,
            LatentError::Background {
                source: KMeansError::ZeroClusters
            }
        ));
    }

    #[test]
    fn test_is_deterministic() {
        let table = grouped_table();
        let a = engine(5).analyze(&table).unwrap();
        let b = engine(5).analyze(&table).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reported_driver_follows_disambiguation() {
        let analysis = engine(3).analyze(&grouped_table()).unwrap();
        for assignment in &analysis.assignments {
            let phi = analysis
                .features
                .iter()
                .map(|f| assignment.attributions[f])
                .collect::<Vec<_>>();
            let driver = top_driver(&analysis.features, &phi, 0.7).unwrap();
            assert_eq!(driver.reported, assignment.top_driver);
            assert_eq!(driver.naive, assignment.naive_top_driver);
        }
    }

    #[test]
    fn test_fewer_rows_than_clusters() {
        let table = UnifiedTable {
            rows: vec![row(0, 0.1, 0.2, 3.0), row(1, 0.8, 0.7, 9.0)],
        };
        let analysis = engine(5).analyze(&table).unwrap();
        assert_eq!(analysis.k, 2);
        assert_ne!(
            analysis.assignments[0].cluster_id,
            analysis.assignments[1].cluster_id
        );
    }

    #[test]
    fn test_rejects_unlabeled_rows() {
        let mut table = grouped_table();
        table.rows[4].valence = TargetValue::Absent;
        let err = engine(5).analyze(&table).unwrap_err();
        assert!(matches!(
            err,
            LatentError::UnlabeledRow {
                target: Target::Valence,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_feature_lists() {
        let table = grouped_table();
        let mut config = LatentConfig {
            features: vec![],
            ..LatentConfig::default()
        };
        let err = LatentSpaceEngine::new(config.clone()).analyze(&table).unwrap_err();
        assert!(matches!(err, LatentError::NoFeatures));

        config.features = vec![FeatureKind::Energy, FeatureKind::Energy];
        let err = LatentSpaceEngine::new(config).analyze(&table).unwrap_err();
        assert!(matches!(err, LatentError::DuplicateFeature { .. }));

        let err = engine(5).analyze(&UnifiedTable::default()).unwrap_err();
        assert!(matches!(err, LatentError::EmptyTable));
    }

    #[test]
    fn test_summary_counts_clusters() {
        let analysis = engine(3).analyze(&grouped_table()).unwrap();
        let summary = analysis.summary();
        assert_eq!(summary.sizes.values().sum::<usize>(), 24);
        assert!(summary.sizes.values().all(|&n| n == 8));
        for (cluster, drivers) in &summary.top_drivers {
            assert_eq!(drivers.values().sum::<usize>(), summary.sizes[cluster]);
        }
    }
}
