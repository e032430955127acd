//! Fills missing target values with gradient-boosted predictions.

use std::collections::BTreeMap;

use mirrorball_analysis::{Target, TargetValue, UnifiedTable};
use mirrorball_features::{FeatureKind, TrackKey};
use mirrorball_stats::{
    descriptive::DescriptiveStats,
    regression::{mean_absolute_error, mean_squared_error},
};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::{
    gbdt::{FitError, GbdtParams, GradientBoostedTrees},
    search::{SearchData, SearchSpace, TrialResult, random_search},
    split::ValidationSplit,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructorConfig {
    pub features: Vec<FeatureKind>,
    pub targets: Vec<Target>,
    /// Parameters used when the search is disabled or cannot run.
    pub params: GbdtParams,
    /// `None` disables the hyperparameter search.
    pub search: Option<SearchSpace>,
    pub validation_fraction: f64,
    pub seed: u64,
}

impl Default for ReconstructorConfig {
    fn default() -> Self {
        Self {
            features: vec![
                FeatureKind::ReadingGrade,
                FeatureKind::SyllableDensity,
                FeatureKind::LexicalDiversity,
                FeatureKind::BridgeSentimentShift,
            ],
            targets: Target::ALL.to_vec(),
            params: GbdtParams::default(),
            search: Some(SearchSpace::default()),
            validation_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Errors that stop the whole reconstruction.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ReconstructError {
    #[display("no input features configured")]
    NoFeatures,
    #[display("feature {feature} is a reconstruction target and would leak the label")]
    TargetLeakage { feature: FeatureKind },
    #[display("no labeled rows for target {target}")]
    NoLabeledRows { target: Target },
}

/// Errors confined to one target.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TargetError {
    #[display("target {target} has zero variance across labeled rows")]
    ZeroVariance { target: Target },
    #[display("failed to fit model for target {target}")]
    Fit { target: Target, source: FitError },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetReport {
    pub target: Target,
    pub labeled: usize,
    pub unlabeled: usize,
    pub params: GbdtParams,
    /// Absent when fewer than two rows are labeled.
    pub validation_mse: Option<f64>,
    pub validation_mae: Option<f64>,
    pub trials: Vec<TrialResult>,
}

/// A reconstructed target value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(flatten)]
    pub key: TrackKey,
    pub target: Target,
    pub value: f64,
}

#[derive(Debug, Default)]
pub struct Reconstruction {
    pub results: BTreeMap<Target, Result<TargetReport, TargetError>>,
    pub predictions: Vec<Prediction>,
}

impl Reconstruction {
    /// Targets whose model could not be fitted.
    pub fn failures(&self) -> impl Iterator<Item = &TargetError> {
        self.results.values().filter_map(|r| r.as_ref().err())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Trains one model per target and predicts the rows missing it.
#[derive(Debug, Clone, Default)]
pub struct LabelReconstructor {
    config: ReconstructorConfig,
}

impl LabelReconstructor {
    #[must_use]
    pub fn new(config: ReconstructorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ReconstructorConfig {
        &self.config
    }

    /// Predicts every absent target value of `table` in place.
    ///
    /// Predicted values are marked [`TargetValue::Predicted`]; observed
    /// values are never touched. Labeled and unlabeled rows are determined
    /// for every target before any prediction is written.
    pub fn reconstruct(
        &self,
        table: &mut UnifiedTable,
    ) -> Result<Reconstruction, ReconstructError> {
        let features = &self.config.features;
        if features.is_empty() {
            return Err(ReconstructError::NoFeatures);
        }
        if let Some(&feature) = features.iter().find(|f| f.is_audio()) {
            return Err(ReconstructError::TargetLeakage { feature });
        }

        let partitions = self
            .config
            .targets
            .iter()
            .map(|&target| {
                let labeled = table.labeled_indices(target);
                if labeled.is_empty() {
                    return Err(ReconstructError::NoLabeledRows { target });
                }
                Ok((target, labeled, table.unlabeled_indices(target)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut outcome = Reconstruction::default();
        for (target, labeled, unlabeled) in partitions {
            let result = self.fit_target(table, target, &labeled, &unlabeled);
            let result = result.map(|(report, values)| {
                for (&i, value) in unlabeled.iter().zip(values) {
                    let row = &mut table.rows[i];
                    *row.target_mut(target) = TargetValue::Predicted(value);
                    outcome.predictions.push(Prediction {
                        key: row.key.clone(),
                        target,
                        value,
                    });
                }
                report
            });
            match &result {
                Ok(report) => tracing::info!(
                    %target,
                    labeled = report.labeled,
                    predicted = report.unlabeled,
                    validation_mse = report.validation_mse,
                    "reconstructed target"
                ),
                Err(err) => tracing::error!(%target, "{err}"),
            }
            outcome.results.insert(target, result);
        }
        Ok(outcome)
    }

    /// Fits one target and returns its report and the unlabeled predictions.
    fn fit_target(
        &self,
        table: &UnifiedTable,
        target: Target,
        labeled: &[usize],
        unlabeled: &[usize],
    ) -> Result<(TargetReport, Vec<f64>), TargetError> {
        let features = &self.config.features;
        let x = table.matrix(labeled, features);
        let y = labeled
            .iter()
            .filter_map(|&i| table.rows[i].target(target).value())
            .collect::<Vec<_>>();
        if DescriptiveStats::new(y.iter().copied()).is_none_or(|s| s.is_constant()) {
            return Err(TargetError::ZeroVariance { target });
        }
        let fit_err = |source| TargetError::Fit { target, source };

        let split = ValidationSplit::new(
            labeled.len(),
            self.config.validation_fraction,
            self.config.seed,
        );
        let pick_x = |idx: &[usize]| idx.iter().map(|&i| x[i].clone()).collect::<Vec<_>>();
        let pick_y = |idx: &[usize]| idx.iter().map(|&i| y[i]).collect::<Vec<_>>();
        let (train_x, train_y) = (pick_x(&split.train), pick_y(&split.train));
        let (validation_x, validation_y) = (pick_x(&split.validation), pick_y(&split.validation));

        let mut params = self.config.params;
        let mut trials = vec![];
        if let Some(space) = &self.config.search {
            let data = SearchData {
                train_x: &train_x,
                train_y: &train_y,
                validation_x: &validation_x,
                validation_y: &validation_y,
            };
            if let Some(outcome) =
                random_search(space, &params, data, self.config.seed).map_err(fit_err)?
            {
                params = outcome.best;
                trials = outcome.trials;
            }
        }

        let (validation_mse, validation_mae) = if split.has_validation() {
            let model = self.fit(&params, &train_x, &train_y).map_err(fit_err)?;
            let predicted = model.predict_all(&validation_x);
            (
                mean_squared_error(&validation_y, &predicted),
                mean_absolute_error(&validation_y, &predicted),
            )
        } else {
            (None, None)
        };

        let model = self.fit(&params, &x, &y).map_err(fit_err)?;
        let predictions = model.predict_all(&table.matrix(unlabeled, features));

        let report = TargetReport {
            target,
            labeled: labeled.len(),
            unlabeled: unlabeled.len(),
            params,
            validation_mse,
            validation_mae,
            trials,
        };
        Ok((report, predictions))
    }

    fn fit(
        &self,
        params: &GbdtParams,
        x: &[Vec<f64>],
        y: &[f64],
    ) -> Result<GradientBoostedTrees, FitError> {
        GradientBoostedTrees::fit(params, x, y, &mut Pcg64Mcg::seed_from_u64(self.config.seed))
    }
}

#[cfg(test)]
mod tests {
    use mirrorball_analysis::UnifiedRow;

    use super::*;

    fn table(labels: &[(Option<f64>, Option<f64>)]) -> UnifiedTable {
        let rows = labels
            .iter()
            .enumerate()
            .map(|(i, &(energy, valence))| {
                let mut row =
                    UnifiedRow::new(TrackKey::new(format!("track {i}"), "Midnights"), true);
                #[expect(clippy::cast_precision_loss)]
                let x = i as f64;
                row.features.insert(FeatureKind::ReadingGrade, x);
                row.features.insert(FeatureKind::LexicalDiversity, (x * 0.37).sin());
                row.energy = energy.into();
                row.valence = valence.into();
                row
            })
            .collect();
        UnifiedTable { rows }
    }

    fn quick_config() -> ReconstructorConfig {
        ReconstructorConfig {
            search: Some(SearchSpace {
                trials: 4,
                n_estimators: (10, 30),
                ..SearchSpace::default()
            }),
            ..ReconstructorConfig::default()
        }
    }

    #[test]
    fn test_observed_kept_and_unlabeled_predicted() {
        let labels = (0..25)
            .map(|i| {
                let v = f64::from(i % 7) / 7.0;
                if i % 5 == 0 { (None, None) } else { (Some(v), Some(1.0 - v)) }
            })
            .collect::<Vec<_>>();
        let mut table = table(&labels);
        let before = table.clone();

        let outcome = LabelReconstructor::new(quick_config()).reconstruct(&mut table).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.predictions.len(), 10);

        for target in Target::ALL {
            let observed = table.rows.iter().filter(|r| r.target(target).is_observed()).count();
            let predicted = table.rows.iter().filter(|r| r.target(target).is_predicted()).count();
            assert_eq!((observed, predicted), (20, 5));
            let report = outcome.results[&target].as_ref().unwrap();
            assert_eq!((report.labeled, report.unlabeled), (20, 5));
            assert_eq!(report.trials.len(), 4);
            assert!(report.validation_mse.is_some());
        }
        for (a, b) in before.rows.iter().zip(&table.rows) {
            if a.energy.is_observed() {
                assert_eq!(a.energy, b.energy);
            }
        }
    }

    #[test]
    fn test_reconstruction_is_deterministic() {
        let labels = (0..15)
            .map(|i| {
                let v = f64::from(i) / 15.0;
                if i < 3 { (None, None) } else { (Some(v), Some(v * v)) }
            })
            .collect::<Vec<_>>();
        let mut a = table(&labels);
        let mut b = table(&labels);
        let reconstructor = LabelReconstructor::new(quick_config());
        reconstructor.reconstruct(&mut a).unwrap();
        reconstructor.reconstruct(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_variance_fails_only_that_target() {
        let labels = [
            (Some(0.5), Some(0.1)),
            (Some(0.5), Some(0.4)),
            (Some(0.5), Some(0.9)),
            (None, None),
        ];
        let mut table = table(&labels);
        let outcome = LabelReconstructor::new(quick_config()).reconstruct(&mut table).unwrap();
        assert!(matches!(
            outcome.results[&Target::Energy],
            Err(TargetError::ZeroVariance { .. })
        ));
        assert!(outcome.results[&Target::Valence].is_ok());
        assert!(!outcome.is_complete());
        assert!(table.rows[3].energy.is_absent());
        assert!(table.rows[3].valence.is_predicted());
    }

    #[test]
    fn test_no_labeled_rows_is_fatal() {
        let mut table = table(&[(None, Some(0.2)), (None, Some(0.3))]);
        let result = LabelReconstructor::new(quick_config()).reconstruct(&mut table);
        assert!(matches!(
            result,
            Err(ReconstructError::NoLabeledRows {
                target: Target::Energy
            })
        ));
        assert!(table.rows.iter().all(|r| r.valence.is_observed()));
    }

    #[test]
    fn test_target_feature_rejected() {
        let config = ReconstructorConfig {
            features: vec![FeatureKind::ReadingGrade, FeatureKind::Valence],
            ..ReconstructorConfig::default()
        };
        let mut table = table(&[(Some(0.1), Some(0.2))]);
        assert!(matches!(
            LabelReconstructor::new(config).reconstruct(&mut table),
            Err(ReconstructError::TargetLeakage {
                feature: FeatureKind::Valence
            })
        ));
    }

    #[test]
    fn test_single_labeled_row_has_no_validation() {
        let labels = [(Some(0.1), Some(0.2)), (None, None)];
        let mut table = table(&labels);
        let config = ReconstructorConfig {
            targets: vec![Target::Energy],
            ..quick_config()
        };
        // a single value has zero variance
        let outcome = LabelReconstructor::new(config).reconstruct(&mut table).unwrap();
        assert!(matches!(
            outcome.results[&Target::Energy],
            Err(TargetError::ZeroVariance { .. })
        ));
    }

    #[test]
    fn test_two_labeled_rows() {
        let labels = [(Some(0.5), Some(0.3)), (Some(0.8), Some(0.6)), (None, None)];
        let mut table = table(&labels);
        let outcome = LabelReconstructor::new(quick_config()).reconstruct(&mut table).unwrap();
        for target in Target::ALL {
            let report = outcome.results[&target].as_ref().unwrap();
            assert!(report.validation_mse.is_some());
            assert!(table.rows[2].target(target).is_predicted());
        }
    }

    #[test]
    fn test_nothing_to_predict() {
        let mut table = table(&[(Some(0.1), Some(0.2)), (Some(0.4), Some(0.9))]);
        let outcome = LabelReconstructor::new(quick_config()).reconstruct(&mut table).unwrap();
        assert!(outcome.predictions.is_empty());
        assert_eq!(outcome.results.len(), 2);
    }
}
