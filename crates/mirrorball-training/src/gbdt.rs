//! Gradient-boosted regression trees.
//!
//! Trees are grown on the squared-error gradient with exact greedy split
//! search and L2-regularized leaf weights:
//!
//! - leaf weight: `-G / (H + λ)`
//! - split gain: `G_L² / (H_L + λ) + G_R² / (H_R + λ) - G² / (H + λ)`
//!
//! where `G` and `H` are the sums of gradients and hessians of the rows in a
//! node. For squared error every hessian is 1, so `H` is the row count.
//!
//! Each tree sees a random subset of rows (`subsample`) and of feature
//! columns (`colsample`), drawn from the caller's random number generator, so
//! a fixed seed gives a reproducible model.

use rand::{Rng, seq::index};
use serde::{Deserialize, Serialize};

/// Gains at or below this are treated as no improvement.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbdtParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// Fraction of rows each tree is grown on.
    pub subsample: f64,
    /// Fraction of feature columns each tree may split on.
    pub colsample: f64,
    /// L2 regularization of leaf weights.
    pub lambda: f64,
    /// Minimum hessian sum (row count) of a child node.
    pub min_child_weight: f64,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 5,
            learning_rate: 0.05,
            subsample: 1.0,
            colsample: 1.0,
            lambda: 1.0,
            min_child_weight: 1.0,
        }
    }
}

impl GbdtParams {
    fn validate(&self) -> Result<(), FitError> {
        let in_unit = |v: f64| v > 0.0 && v <= 1.0;
        let reason = if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            "learning_rate must be positive"
        } else if !in_unit(self.subsample) {
            "subsample must be in (0, 1]"
        } else if !in_unit(self.colsample) {
            "colsample must be in (0, 1]"
        } else if self.lambda.is_nan() || self.lambda < 0.0 {
            "lambda must be non-negative"
        } else {
            return Ok(());
        };
        Err(FitError::InvalidParams { reason })
    }
}

#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
pub enum FitError {
    #[display("no training rows")]
    EmptyTrainingSet,
    #[display("{rows} feature rows but {targets} target values")]
    LengthMismatch { rows: usize, targets: usize },
    #[display("row {row} has {found} features, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[display("invalid parameters: {reason}")]
    InvalidParams { reason: &'static str },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One regression tree; rows with `x[feature] < threshold` go left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => idx = if row[feature] < threshold { left } else { right },
            }
        }
    }

    /// Number of leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

/// A fitted ensemble.
///
/// # Examples
///
/// ```
/// use mirrorball_training::gbdt::{GbdtParams, GradientBoostedTrees};
/// use rand::SeedableRng;
/// use rand_pcg::Pcg64Mcg;
///
/// let x = (0..20).map(|i| vec![f64::from(i)]).collect::<Vec<_>>();
/// let y = (0..20).map(|i| if i < 10 { 0.0 } else { 1.0 }).collect::<Vec<_>>();
/// let params = GbdtParams { n_estimators: 200, learning_rate: 0.1, ..GbdtParams::default() };
/// let model = GradientBoostedTrees::fit(&params, &x, &y, &mut Pcg64Mcg::seed_from_u64(42)).unwrap();
/// assert!(model.predict(&[2.0]) < 0.1);
/// assert!(model.predict(&[17.0]) > 0.9);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    base_score: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    /// Fits an ensemble on `x` (one row per sample) against `y`.
    ///
    /// The base score is the mean of `y`.
    #[expect(clippy::cast_precision_loss)]
    pub fn fit<R>(
        params: &GbdtParams,
        x: &[Vec<f64>],
        y: &[f64],
        rng: &mut R,
    ) -> Result<Self, FitError>
    where
        R: Rng + ?Sized,
    {
        params.validate()?;
        if x.is_empty() {
            return Err(FitError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(FitError::LengthMismatch {
                rows: x.len(),
                targets: y.len(),
            });
        }
        let n_features = x[0].len();
        if let Some((row, r)) = x.iter().enumerate().find(|(_, r)| r.len() != n_features) {
            return Err(FitError::RaggedRow {
                row,
                found: r.len(),
                expected: n_features,
            });
        }

        let n = x.len();
        let base_score = y.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![base_score; n];
        let mut gradients = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            for ((g, p), t) in gradients.iter_mut().zip(&predictions).zip(y) {
                *g = p - t;
            }
            let rows = sample_sorted(rng, n, params.subsample);
            let features = sample_sorted(rng, n_features, params.colsample);

            let mut builder = TreeBuilder {
                x,
                gradients: &gradients,
                features: &features,
                params,
                nodes: vec![],
            };
            builder.grow(rows, 0);
            let tree = RegressionTree {
                nodes: builder.nodes,
            };

            for (p, row) in predictions.iter_mut().zip(x) {
                *p += tree.predict(row);
            }
            trees.push(tree);
        }

        Ok(Self {
            base_score,
            n_features,
            trees,
        })
    }

    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        debug_assert_eq!(row.len(), self.n_features);
        self.base_score + self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    #[must_use]
    pub fn predict_all(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    #[must_use]
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    #[must_use]
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

/// Sorted random subset of `0..n` with `round(fraction * n)` elements, at
/// least one.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn sample_sorted<R>(rng: &mut R, n: usize, fraction: f64) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    let count = ((fraction * n as f64).round() as usize).clamp(1, n.max(1));
    if count >= n {
        return (0..n).collect();
    }
    let mut picked = index::sample(rng, n, count).into_vec();
    picked.sort_unstable();
    picked
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    gradients: &'a [f64],
    features: &'a [usize],
    params: &'a GbdtParams,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Grows the subtree over `rows` and returns its node index.
    #[expect(clippy::cast_precision_loss)]
    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let g = rows.iter().map(|&i| self.gradients[i]).sum::<f64>();
        let h = rows.len() as f64;
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: -g / (h + self.params.lambda) * self.params.learning_rate,
        });

        if depth >= self.params.max_depth || rows.len() < 2 {
            return idx;
        }
        let Some(split) = self.best_split(&rows, g) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<_>, Vec<_>) = rows
            .into_iter()
            .partition(|&i| self.x[i][split.feature] < split.threshold);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    #[expect(clippy::cast_precision_loss)]
    fn best_split(&self, rows: &[usize], g: f64) -> Option<SplitCandidate> {
        let lambda = self.params.lambda;
        let h = rows.len() as f64;
        let parent_score = g * g / (h + lambda);

        let mut best: Option<SplitCandidate> = None;
        let mut sorted = rows.to_vec();
        for &feature in self.features {
            sorted.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut gl = 0.0;
            for k in 0..sorted.len() - 1 {
                gl += self.gradients[sorted[k]];
                let current = self.x[sorted[k]][feature];
                let next = self.x[sorted[k + 1]][feature];
                if next <= current {
                    continue;
                }
                let hl = (k + 1) as f64;
                let hr = h - hl;
                if hl < self.params.min_child_weight || hr < self.params.min_child_weight {
                    continue;
                }
                let gr = g - gl;
                let gain = gl * gl / (hl + lambda) + gr * gr / (hr + lambda) - parent_score;
                if gain > best.as_ref().map_or(MIN_GAIN, |b| b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (current + next) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}
