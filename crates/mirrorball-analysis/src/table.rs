//! The unified per-track table consumed by training and clustering.

use std::collections::BTreeMap;

use mirrorball_features::{FeatureKind, TrackKey};
use serde::{Deserialize, Serialize};

use crate::target::{Target, TargetValue};

/// One track with every feature that was extracted for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRow {
    #[serde(flatten)]
    pub key: TrackKey,
    pub is_new_era: bool,
    /// Stylistic features; families without a record are missing here.
    pub features: BTreeMap<FeatureKind, f64>,
    pub thematic_dna: Option<String>,
    pub energy: TargetValue,
    pub valence: TargetValue,
}

impl UnifiedRow {
    #[must_use]
    pub fn new(key: TrackKey, is_new_era: bool) -> Self {
        Self {
            key,
            is_new_era,
            features: BTreeMap::new(),
            thematic_dna: None,
            energy: TargetValue::Absent,
            valence: TargetValue::Absent,
        }
    }

    #[must_use]
    pub const fn target(&self, target: Target) -> TargetValue {
        match target {
            Target::Energy => self.energy,
            Target::Valence => self.valence,
        }
    }

    pub const fn target_mut(&mut self, target: Target) -> &mut TargetValue {
        match target {
            Target::Energy => &mut self.energy,
            Target::Valence => &mut self.valence,
        }
    }

    /// Value of any feature, targets included.
    #[must_use]
    pub fn value(&self, kind: FeatureKind) -> Option<f64> {
        match Target::from_feature(kind) {
            Some(target) => self.target(target).value(),
            None => self.features.get(&kind).copied(),
        }
    }

    /// Feature values in `kinds` order, with missing values imputed as 0.
    #[must_use]
    pub fn vector(&self, kinds: &[FeatureKind]) -> Vec<f64> {
        kinds
            .iter()
            .map(|&kind| self.value(kind).unwrap_or(0.0))
            .collect()
    }

    /// True if neither target is absent.
    #[must_use]
    pub fn is_fully_labeled(&self) -> bool {
        Target::ALL.into_iter().all(|t| !self.target(t).is_absent())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnifiedTable {
    pub rows: Vec<UnifiedRow>,
}

impl UnifiedTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row indices whose `target` is observed or predicted.
    #[must_use]
    pub fn labeled_indices(&self, target: Target) -> Vec<usize> {
        self.indices_where(|row| !row.target(target).is_absent())
    }

    #[must_use]
    pub fn unlabeled_indices(&self, target: Target) -> Vec<usize> {
        self.indices_where(|row| row.target(target).is_absent())
    }

    fn indices_where(&self, pred: impl Fn(&UnifiedRow) -> bool) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| pred(row))
            .map(|(i, _)| i)
            .collect()
    }

    /// Feature matrix of the selected rows, missing values imputed as 0.
    #[must_use]
    pub fn matrix(&self, indices: &[usize], kinds: &[FeatureKind]) -> Vec<Vec<f64>> {
        indices.iter().map(|&i| self.rows[i].vector(kinds)).collect()
    }

    /// Feature matrix of every row.
    #[must_use]
    pub fn full_matrix(&self, kinds: &[FeatureKind]) -> Vec<Vec<f64>> {
        self.rows.iter().map(|row| row.vector(kinds)).collect()
    }

    /// First row whose `target` is absent, if any.
    #[must_use]
    pub fn first_unlabeled(&self) -> Option<(&UnifiedRow, Target)> {
        self.rows.iter().find_map(|row| {
            Target::ALL
                .into_iter()
                .find(|&t| row.target(t).is_absent())
                .map(|t| (row, t))
        })
    }
}
