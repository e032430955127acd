//! Seeded random hyperparameter search.
//!
//! All trial parameters are drawn up front from one seeded generator and each
//! trial fits with its own seeded generator, so the chosen parameters do not
//! depend on how trials are scheduled across threads.

use std::thread;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use mirrorball_stats::regression::mean_squared_error;

use crate::gbdt::{FitError, GbdtParams, GradientBoostedTrees};

/// Ranges sampled by the search.
///
/// Bounds are inclusive and must be ordered low to high.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSpace {
    pub trials: usize,
    pub n_estimators: (usize, usize),
    pub max_depth: (usize, usize),
    /// Sampled log-uniformly.
    pub learning_rate: (f64, f64),
    pub subsample: (f64, f64),
    pub colsample: (f64, f64),
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            trials: 30,
            n_estimators: (50, 200),
            max_depth: (3, 7),
            learning_rate: (0.01, 0.1),
            subsample: (0.6, 1.0),
            colsample: (0.6, 1.0),
        }
    }
}

impl SearchSpace {
    /// Draws `trials` parameter sets, other fields taken from `base`.
    pub fn draw<R>(&self, base: &GbdtParams, rng: &mut R) -> Vec<GbdtParams>
    where
        R: Rng + ?Sized,
    {
        (0..self.trials)
            .map(|_| {
                let (lr_lo, lr_hi) = self.learning_rate;
                GbdtParams {
                    n_estimators: rng.random_range(self.n_estimators.0..=self.n_estimators.1),
                    max_depth: rng.random_range(self.max_depth.0..=self.max_depth.1),
                    learning_rate: rng.random_range(lr_lo.ln()..=lr_hi.ln()).exp(),
                    subsample: rng.random_range(self.subsample.0..=self.subsample.1),
                    colsample: rng.random_range(self.colsample.0..=self.colsample.1),
                    ..*base
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub index: usize,
    pub params: GbdtParams,
    pub validation_mse: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub best: GbdtParams,
    pub best_mse: f64,
    pub trials: Vec<TrialResult>,
}

/// Training and validation data of one search.
#[derive(Debug, Clone, Copy)]
pub struct SearchData<'a> {
    pub train_x: &'a [Vec<f64>],
    pub train_y: &'a [f64],
    pub validation_x: &'a [Vec<f64>],
    pub validation_y: &'a [f64],
}

/// Fits every trial and keeps the one with the lowest validation MSE.
///
/// Trials run in parallel on scoped threads. Ties go to the lower trial
/// index. Returns `Ok(None)` when the space has no trials or there is no
/// validation data.
pub fn random_search(
    space: &SearchSpace,
    base: &GbdtParams,
    data: SearchData<'_>,
    seed: u64,
) -> Result<Option<SearchOutcome>, FitError> {
    if space.trials == 0 || data.validation_x.is_empty() {
        return Ok(None);
    }
    let candidates = space.draw(base, &mut Pcg64Mcg::seed_from_u64(seed));

    let mut results = vec![None; candidates.len()];
    thread::scope(|s| {
        for (params, slot) in candidates.iter().zip(&mut results) {
            s.spawn(move || {
                *slot = Some(evaluate(params, data, seed));
            });
        }
    });

    let mut trials = Vec::with_capacity(candidates.len());
    for (index, (params, result)) in candidates.into_iter().zip(results).enumerate() {
        let Some(result) = result else {
            continue;
        };
        trials.push(TrialResult {
            index,
            params,
            validation_mse: result?,
        });
    }

    let Some(best) = trials
        .iter()
        .filter(|t| t.validation_mse.is_finite())
        .reduce(|best, t| if t.validation_mse < best.validation_mse { t } else { best })
    else {
        return Ok(None);
    };
    let (best, best_mse) = (best.params, best.validation_mse);
    tracing::debug!(trials = trials.len(), best_mse, "random search finished");
    Ok(Some(SearchOutcome {
        best,
        best_mse,
        trials,
    }))
}

fn evaluate(params: &GbdtParams, data: SearchData<'_>, seed: u64) -> Result<f64, FitError> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let model = GradientBoostedTrees::fit(params, data.train_x, data.train_y, &mut rng)?;
    let predicted = model.predict_all(data.validation_x);
    Ok(mean_squared_error(data.validation_y, &predicted).unwrap_or(f64::INFINITY))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x = (0..30).map(|i| vec![f64::from(i)]).collect::<Vec<_>>();
        let y = (0..30).map(|i| f64::from(i % 5) / 5.0).collect();
        (x, y)
    }

    #[test]
    fn test_draws_stay_in_range() {
        let space = SearchSpace::default();
        let draws = space.draw(&GbdtParams::default(), &mut Pcg64Mcg::seed_from_u64(1));
        assert_eq!(draws.len(), 30);
        for p in draws {
            assert!((50..=200).contains(&p.n_estimators));
            assert!((3..=7).contains(&p.max_depth));
            assert!(p.learning_rate >= 0.01 - 1e-12 && p.learning_rate <= 0.1 + 1e-12);
            assert!((0.6..=1.0).contains(&p.subsample));
            assert!((0.6..=1.0).contains(&p.colsample));
            assert_eq!(p.lambda, 1.0);
        }
    }

    #[test]
    fn test_search_is_deterministic() {
        let (x, y) = data();
        let data = SearchData {
            train_x: &x[..24],
            train_y: &y[..24],
            validation_x: &x[24..],
            validation_y: &y[24..],
        };
        let space = SearchSpace {
            trials: 6,
            n_estimators: (5, 20),
            ..SearchSpace::default()
        };
        let a = random_search(&space, &GbdtParams::default(), data, 42).unwrap().unwrap();
        let b = random_search(&space, &GbdtParams::default(), data, 42).unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.trials.len(), 6);
        let min = a
            .trials
            .iter()
            .map(|t| t.validation_mse)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(a.best_mse, min);
    }

    #[test]
    fn test_no_validation_data_skips_search() {
        let (x, y) = data();
        let data = SearchData {
            train_x: &x,
            train_y: &y,
            validation_x: &[],
            validation_y: &[],
        };
        let outcome = random_search(&SearchSpace::default(), &GbdtParams::default(), data, 42);
        assert!(outcome.unwrap().is_none());
    }
}
