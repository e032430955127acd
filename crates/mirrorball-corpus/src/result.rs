//! Rows of the final result table.

use std::collections::{BTreeMap, HashMap};

use mirrorball_analysis::{Target, UnifiedTable};
use mirrorball_features::{FeatureKind, TrackKey};
use mirrorball_latent::{ClusterSummary, LatentAnalysis};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One track on the latent map, with its inputs and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(flatten)]
    pub key: TrackKey,
    pub is_new_era: bool,
    pub cluster_id: usize,
    pub x: f64,
    pub y: f64,
    pub top_driver: FeatureKind,
    pub naive_top_driver: FeatureKind,
    /// Unstandardized values of the clustering features.
    pub features: BTreeMap<FeatureKind, f64>,
    pub attributions: BTreeMap<FeatureKind, f64>,
    pub thematic_dna: Option<String>,
    pub energy_predicted: bool,
    pub valence_predicted: bool,
}

impl ResultRow {
    /// Pairs each analyzed track with its unified row.
    ///
    /// Tracks missing from either side are skipped with a warning.
    #[must_use]
    pub fn join(table: &UnifiedTable, analysis: &LatentAnalysis) -> Vec<Self> {
        let rows = table
            .rows
            .iter()
            .map(|row| (&row.key, row))
            .collect::<HashMap<_, _>>();
        analysis
            .assignments
            .iter()
            .filter_map(|assignment| {
                let Some(row) = rows.get(&assignment.key) else {
                    warn!(track = %assignment.key, "analyzed track missing from the unified table");
                    return None;
                };
                Some(Self {
                    key: assignment.key.clone(),
                    is_new_era: row.is_new_era,
                    cluster_id: assignment.cluster_id,
                    x: assignment.x,
                    y: assignment.y,
                    top_driver: assignment.top_driver,
                    naive_top_driver: assignment.naive_top_driver,
                    features: analysis
                        .features
                        .iter()
                        .filter_map(|&kind| row.value(kind).map(|v| (kind, v)))
                        .collect(),
                    attributions: assignment.attributions.clone(),
                    thematic_dna: row.thematic_dna.clone(),
                    energy_predicted: row.target(Target::Energy).is_predicted(),
                    valence_predicted: row.target(Target::Valence).is_predicted(),
                })
            })
            .collect()
    }

    #[must_use]
    pub const fn is_predicted(&self, target: Target) -> bool {
        match target {
            Target::Energy => self.energy_predicted,
            Target::Valence => self.valence_predicted,
        }
    }
}

#[must_use]
pub fn cluster_summary(rows: &[ResultRow]) -> ClusterSummary {
    ClusterSummary::new(rows.iter().map(|r| (r.cluster_id, r.top_driver)))
}
