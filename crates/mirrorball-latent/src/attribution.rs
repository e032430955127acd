//! Additive feature attributions of cluster membership.
//!
//! The explained function is "the clustering assigns this row to cluster
//! `c`". Features outside a coalition are filled in from background rows, so
//! the value of a coalition is the weighted share of background rows that
//! still land in `c` once the coalition's features are copied from the
//! explained row. Shapley values of that game are the attributions: they sum
//! to the value of the full coalition (1) minus the background share.
//!
//! Up to [`AttributionConfig::exact_max_features`] features every coalition
//! is enumerated. Above that, attributions are estimated from seeded random
//! feature orderings.

use mirrorball_features::FeatureKind;
use rand::{Rng, seq::SliceRandom, seq::index};
use serde::{Deserialize, Serialize};

use crate::kmeans::{KMeans, KMeansConfig, KMeansError};

/// Upper bound on exhaustive enumeration regardless of configuration.
const MAX_EXACT_FEATURES: usize = 20;
const RATIO_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackgroundKind {
    /// Random rows of the data, equally weighted.
    Sample { size: usize },
    /// k-means centroids of the data, weighted by cluster size.
    Summary { k: usize },
}

impl Default for BackgroundKind {
    fn default() -> Self {
        Self::Sample { size: 50 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    pub background: BackgroundKind,
    pub exact_max_features: usize,
    /// Orderings drawn when there are too many features to enumerate.
    pub permutations: usize,
    /// An audio top driver yields to the strongest stylistic feature when
    /// that feature reaches this fraction of its magnitude.
    pub disambiguation_ratio: f64,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            background: BackgroundKind::default(),
            exact_max_features: 12,
            permutations: 256,
            disambiguation_ratio: 0.7,
        }
    }
}

/// Weighted reference rows standing in for "feature unknown".
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    rows: Vec<Vec<f64>>,
    weights: Vec<f64>,
}

impl Background {
    pub fn build<R>(
        kind: BackgroundKind,
        data: &[Vec<f64>],
        rng: &mut R,
    ) -> Result<Self, KMeansError>
    where
        R: Rng + ?Sized,
    {
        match kind {
            BackgroundKind::Sample { size } => Ok(Self::sample(data, size, rng)),
            BackgroundKind::Summary { k } => Self::summarize(data, k, rng.random()),
        }
    }

    /// Up to `size` distinct rows of `data`, chosen at random.
    #[expect(clippy::cast_precision_loss)]
    pub fn sample<R>(data: &[Vec<f64>], size: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let rows = if size >= data.len() {
            data.to_vec()
        } else {
            let mut picked = index::sample(rng, data.len(), size).into_vec();
            picked.sort_unstable();
            picked.into_iter().map(|i| data[i].clone()).collect()
        };
        let weights = vec![1.0 / rows.len().max(1) as f64; rows.len()];
        Self { rows, weights }
    }

    /// Centroids of a `k`-cluster k-means fit, weighted by cluster size.
    #[expect(clippy::cast_precision_loss)]
    pub fn summarize(data: &[Vec<f64>], k: usize, seed: u64) -> Result<Self, KMeansError> {
        let config = KMeansConfig {
            k,
            ..KMeansConfig::default()
        };
        let model = KMeans::fit(&config, data, seed)?;
        let n = data.len() as f64;
        let (rows, weights) = model
            .centroids()
            .iter()
            .zip(model.cluster_sizes())
            .filter(|(_, size)| *size > 0)
            .map(|(c, size)| (c.clone(), size as f64 / n))
            .unzip();
        Ok(Self { rows, weights })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Explains the cluster assignments of a fitted [`KMeans`] model.
#[derive(Debug, Clone, Copy)]
pub struct ClusterExplainer<'a> {
    model: &'a KMeans,
    background: &'a Background,
}

impl<'a> ClusterExplainer<'a> {
    #[must_use]
    pub fn new(model: &'a KMeans, background: &'a Background) -> Self {
        Self { model, background }
    }

    /// Weighted share of background rows assigned to `cluster` once the
    /// features in `coalition` are taken from `row`.
    #[must_use]
    pub fn coalition_value(&self, row: &[f64], coalition: &[bool], cluster: usize) -> f64 {
        let mut mixed = vec![0.0; row.len()];
        self.background
            .rows
            .iter()
            .zip(&self.background.weights)
            .filter(|(reference, _)| {
                for (j, slot) in mixed.iter_mut().enumerate() {
                    *slot = if coalition[j] { row[j] } else { reference[j] };
                }
                self.model.predict(&mixed) == cluster
            })
            .map(|(_, w)| w)
            .sum()
    }

    /// Attributions of `row`'s membership in its assigned cluster, in
    /// feature order.
    pub fn explain<R>(&self, row: &[f64], config: &AttributionConfig, rng: &mut R) -> Vec<f64>
    where
        R: Rng + ?Sized,
    {
        let cluster = self.model.predict(row);
        if row.len() <= config.exact_max_features.min(MAX_EXACT_FEATURES) {
            self.exact(row, cluster)
        } else {
            self.sampled(row, cluster, config.permutations.max(1), rng)
        }
    }

    /// Shapley values by enumerating every coalition.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn exact(&self, row: &[f64], cluster: usize) -> Vec<f64> {
        let m = row.len();
        if m == 0 {
            return vec![];
        }
        let values = (0..1usize << m)
            .map(|mask| {
                let coalition = (0..m).map(|j| mask & (1 << j) != 0).collect::<Vec<_>>();
                self.coalition_value(row, &coalition, cluster)
            })
            .collect::<Vec<_>>();

        // weight of a coalition of size s: s! (m - s - 1)! / m!
        let mut weights = vec![0.0; m];
        let mut choose = 1.0;
        for (s, w) in weights.iter_mut().enumerate() {
            *w = 1.0 / (m as f64 * choose);
            choose = choose * (m - 1 - s) as f64 / (s + 1) as f64;
        }

        (0..m)
            .map(|i| {
                let bit = 1 << i;
                (0..1usize << m)
                    .filter(|mask| mask & bit == 0)
                    .map(|mask| {
                        weights[mask.count_ones() as usize] * (values[mask | bit] - values[mask])
                    })
                    .sum()
            })
            .collect()
    }

    /// Shapley values estimated from random feature orderings.
    #[expect(clippy::cast_precision_loss)]
    pub fn sampled<R>(
        &self,
        row: &[f64],
        cluster: usize,
        permutations: usize,
        rng: &mut R,
    ) -> Vec<f64>
    where
        R: Rng + ?Sized,
    {
        let m = row.len();
        let mut phi = vec![0.0; m];
        let mut order = (0..m).collect::<Vec<_>>();
        let empty = self.coalition_value(row, &vec![false; m], cluster);
        for _ in 0..permutations {
            order.shuffle(rng);
            let mut coalition = vec![false; m];
            let mut previous = empty;
            for &j in &order {
                coalition[j] = true;
                let value = self.coalition_value(row, &coalition, cluster);
                phi[j] += value - previous;
                previous = value;
            }
        }
        for p in &mut phi {
            *p /= permutations as f64;
        }
        phi
    }
}

/// Feature with the largest attribution, before and after disambiguation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopDriver {
    pub naive: FeatureKind,
    pub reported: FeatureKind,
}

/// Picks the top driver from attributions aligned with `features`.
///
/// The naive driver has the largest absolute attribution, ties going to the
/// earlier feature. If it is audio-derived and the strongest stylistic
/// feature reaches `ratio` times its magnitude (inclusive), the stylistic
/// feature is reported instead.
///
/// # Examples
///
/// ```
/// use mirrorball_features::FeatureKind;
/// use mirrorball_latent::attribution::top_driver;
///
/// let features = [FeatureKind::Energy, FeatureKind::ReadingGrade];
/// let driver = top_driver(&features, &[0.5, -0.35], 0.7).unwrap();
/// assert_eq!(driver.naive, FeatureKind::Energy);
/// assert_eq!(driver.reported, FeatureKind::ReadingGrade);
///
/// let driver = top_driver(&features, &[0.5, 0.3], 0.7).unwrap();
/// assert_eq!(driver.reported, FeatureKind::Energy);
/// ```
#[must_use]
pub fn top_driver(features: &[FeatureKind], attributions: &[f64], ratio: f64) -> Option<TopDriver> {
    let strongest = |audio: Option<bool>| {
        features
            .iter()
            .zip(attributions)
            .filter(|(kind, _)| audio.is_none_or(|a| kind.is_audio() == a))
            .fold(None, |best: Option<(FeatureKind, f64)>, (&kind, &phi)| match best {
                Some((_, b)) if phi.abs() <= b => best,
                _ => Some((kind, phi.abs())),
            })
    };

    let (naive, naive_abs) = strongest(None)?;
    let mut reported = naive;
    if naive.is_audio()
        && let Some((stylistic, stylistic_abs)) = strongest(Some(false))
        && stylistic_abs >= ratio * naive_abs - RATIO_EPSILON
    {
        reported = stylistic;
    }
    Some(TopDriver { naive, reported })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    use super::*;

    fn fitted() -> (Vec<Vec<f64>>, KMeans) {
        let data = (0..30)
            .map(|i| {
                let side = if i < 15 { -3.0 } else { 3.0 };
                let t = f64::from(i % 15) * 0.05;
                vec![side + t, t, -t]
            })
            .collect::<Vec<_>>();
        let config = KMeansConfig {
            k: 2,
            ..KMeansConfig::default()
        };
        let model = KMeans::fit(&config, &data, 42).unwrap();
        (data, model)
    }

    #[test]
    fn test_exact_attributions_are_efficient() {
        let (data, model) = fitted();
        let background = Background::sample(&data, 50, &mut Pcg64Mcg::seed_from_u64(1));
        let explainer = ClusterExplainer::new(&model, &background);
        for row in &data {
            let cluster = model.predict(row);
            let phi = explainer.exact(row, cluster);
            let base = explainer.coalition_value(row, &[false; 3], cluster);
            let total = phi.iter().sum::<f64>();
            assert!((total - (1.0 - base)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_separating_feature_dominates() {
        let (data, model) = fitted();
        let background = Background::sample(&data, 50, &mut Pcg64Mcg::seed_from_u64(1));
        let explainer = ClusterExplainer::new(&model, &background);
        let phi = explainer.exact(&data[0], model.predict(&data[0]));
        assert!(phi[0] > phi[1].abs());
        assert!(phi[0] > phi[2].abs());
    }

    #[test]
    fn test_sampled_matches_exact() {
        let (data, model) = fitted();
        let background = Background::sample(&data, 50, &mut Pcg64Mcg::seed_from_u64(1));
        let explainer = ClusterExplainer::new(&model, &background);
        let row = &data[20];
        let cluster = model.predict(row);
        let exact = explainer.exact(row, cluster);
        let sampled = explainer.sampled(row, cluster, 2000, &mut Pcg64Mcg::seed_from_u64(9));
        for (e, s) in exact.iter().zip(&sampled) {
            assert!((e - s).abs() < 0.05, "{exact:?} vs {sampled:?}");
        }
        let base = explainer.coalition_value(row, &[false; 3], cluster);
        assert!((sampled.iter().sum::<f64>() - (1.0 - base)).abs() < 1e-9);
    }

    #[test]
    fn test_summary_background_weights_sum_to_one() {
        let (data, _) = fitted();
        let background = Background::summarize(&data, 10, 42).unwrap();
        assert!(background.len() <= 10);
        assert!((background.weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_background_caps_size() {
        let (data, _) = fitted();
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        assert_eq!(Background::sample(&data, 10, &mut rng).len(), 10);
        assert_eq!(Background::sample(&data, 50, &mut rng).len(), 30);
    }

    #[test]
    fn test_disambiguation_threshold_is_inclusive() {
        let features = [FeatureKind::Valence, FeatureKind::LexicalDiversity];
        let at = top_driver(&features, &[1.0, 0.7], 0.7).unwrap();
        assert_eq!(at.reported, FeatureKind::LexicalDiversity);
        let below = top_driver(&features, &[1.0, 0.69], 0.7).unwrap();
        assert_eq!(below.reported, FeatureKind::Valence);
        assert_eq!(below.naive, FeatureKind::Valence);
    }

    #[test]
    fn test_ties_go_to_earlier_feature() {
        let features = [
            FeatureKind::ReadingGrade,
            FeatureKind::Energy,
            FeatureKind::SyllableDensity,
        ];
        let driver = top_driver(&features, &[-0.4, 0.4, 0.4], 0.7).unwrap();
        assert_eq!(driver.naive, FeatureKind::ReadingGrade);
        assert_eq!(driver.reported, FeatureKind::ReadingGrade);
    }

    #[test]
    fn test_audio_only_features_keep_audio_driver() {
        let features = [FeatureKind::Energy, FeatureKind::Valence];
        let driver = top_driver(&features, &[0.1, 0.9], 0.7).unwrap();
        assert_eq!(driver.reported, FeatureKind::Valence);
        assert!(top_driver(&[], &[], 0.7).is_none());
    }
}
