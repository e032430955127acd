//! Seeded k-means clustering.
//!
//! Centroids are seeded with k-means++ and refined with Lloyd iterations.
//! The whole procedure is restarted several times from one seeded generator
//! and the run with the lowest inertia is kept.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::distance::squared_euclidean;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    pub k: usize,
    pub restarts: usize,
    pub max_iterations: usize,
    /// Convergence threshold on the total squared centroid movement, relative
    /// to the mean per-column variance of the data.
    pub tolerance: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 5,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
pub enum KMeansError {
    #[display("cannot cluster an empty dataset")]
    Empty,
    #[display("k must be at least 1")]
    ZeroClusters,
}

/// A fitted clustering.
///
/// # Examples
///
/// ```
/// use mirrorball_latent::kmeans::{KMeans, KMeansConfig};
///
/// let data = vec![vec![0.0], vec![0.1], vec![10.0], vec![10.1]];
/// let config = KMeansConfig { k: 2, ..KMeansConfig::default() };
/// let model = KMeans::fit(&config, &data, 42).unwrap();
/// assert_eq!(model.assignments()[0], model.assignments()[1]);
/// assert_ne!(model.assignments()[0], model.assignments()[2]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeans {
    centroids: Vec<Vec<f64>>,
    assignments: Vec<usize>,
    inertia: f64,
}

impl KMeans {
    /// Clusters `data` into `min(k, n)` clusters.
    pub fn fit(config: &KMeansConfig, data: &[Vec<f64>], seed: u64) -> Result<Self, KMeansError> {
        if data.is_empty() {
            return Err(KMeansError::Empty);
        }
        if config.k == 0 {
            return Err(KMeansError::ZeroClusters);
        }
        let k = config.k.min(data.len());
        if k < config.k {
            tracing::warn!(
                requested = config.k,
                rows = data.len(),
                "fewer rows than clusters; using {k} clusters"
            );
        }
        let tolerance = config.tolerance * mean_variance(data);

        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let mut restart = || {
            let centroids = plus_plus_init(data, k, &mut rng);
            lloyd(data, centroids, config.max_iterations, tolerance)
        };
        let mut best = restart();
        for _ in 1..config.restarts {
            let run = restart();
            if run.inertia < best.inertia {
                best = run;
            }
        }
        tracing::debug!(k, inertia = best.inertia, "fitted k-means");
        Ok(best)
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    #[must_use]
    pub fn centroids(&self) -> &[Vec<f64>] {
        &self.centroids
    }

    /// Cluster of each input row.
    #[must_use]
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// Sum of squared distances of rows to their centroid.
    #[must_use]
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Nearest centroid of `row`; ties go to the lower cluster id.
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> usize {
        nearest(&self.centroids, row).0
    }

    /// Number of rows assigned to each cluster.
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &c in &self.assignments {
            sizes[c] += 1;
        }
        sizes
    }
}

fn nearest(centroids: &[Vec<f64>], row: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_euclidean(c, row);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

#[expect(clippy::cast_precision_loss)]
fn mean_variance(data: &[Vec<f64>]) -> f64 {
    let n = data.len() as f64;
    let width = data[0].len();
    if width == 0 {
        return 0.0;
    }
    let total = (0..width)
        .map(|j| {
            let mean = data.iter().map(|r| r[j]).sum::<f64>() / n;
            data.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n
        })
        .sum::<f64>();
    total / width as f64
}

/// Picks `k` initial centroids, each new one with probability proportional
/// to its squared distance from the closest centroid chosen so far.
fn plus_plus_init<R>(data: &[Vec<f64>], k: usize, rng: &mut R) -> Vec<Vec<f64>>
where
    R: Rng + ?Sized,
{
    let mut centroids = vec![data[rng.random_range(0..data.len())].clone()];
    let mut closest = data
        .iter()
        .map(|row| squared_euclidean(row, &centroids[0]))
        .collect::<Vec<_>>();

    while centroids.len() < k {
        let total = closest.iter().sum::<f64>();
        let pick = if total > 0.0 {
            let mut target = rng.random_range(0.0..total);
            closest
                .iter()
                .position(|&d| {
                    target -= d;
                    target < 0.0
                })
                .unwrap_or(data.len() - 1)
        } else {
            // every row coincides with a centroid
            rng.random_range(0..data.len())
        };
        let centroid = data[pick].clone();
        for (d, row) in closest.iter_mut().zip(data) {
            *d = d.min(squared_euclidean(row, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

#[expect(clippy::cast_precision_loss)]
fn lloyd(
    data: &[Vec<f64>],
    mut centroids: Vec<Vec<f64>>,
    max_iterations: usize,
    tolerance: f64,
) -> KMeans {
    let width = data[0].len();
    let mut assignments = vec![0; data.len()];
    for _ in 0..max_iterations {
        for (a, row) in assignments.iter_mut().zip(data) {
            *a = nearest(&centroids, row).0;
        }

        let mut sums = vec![vec![0.0; width]; centroids.len()];
        let mut counts = vec![0usize; centroids.len()];
        for (&a, row) in assignments.iter().zip(data) {
            counts[a] += 1;
            for (s, v) in sums[a].iter_mut().zip(row) {
                *s += v;
            }
        }

        let mut shift = 0.0;
        for ((centroid, sum), &count) in centroids.iter_mut().zip(sums).zip(&counts) {
            // an empty cluster keeps its centroid
            if count == 0 {
                continue;
            }
            let updated = sum.into_iter().map(|s| s / count as f64).collect::<Vec<_>>();
            shift += squared_euclidean(centroid, &updated);
            *centroid = updated;
        }
        if shift <= tolerance {
            break;
        }
    }

    let mut inertia = 0.0;
    for (a, row) in assignments.iter_mut().zip(data) {
        let (cluster, d) = nearest(&centroids, row);
        *a = cluster;
        inertia += d;
    }
    KMeans {
        centroids,
        assignments,
        inertia,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f64>> {
        let centers = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)];
        centers
            .iter()
            .flat_map(|&(cx, cy)| {
                (0..10).map(move |i| {
                    let o = f64::from(i) * 0.1;
                    vec![cx + o, cy - o]
                })
            })
            .collect()
    }

    #[test]
    fn test_recovers_separated_blobs() {
        let config = KMeansConfig {
            k: 3,
            ..KMeansConfig::default()
        };
        let model = KMeans::fit(&config, &blobs(), 42).unwrap();
        let a = model.assignments();
        for blob in a.chunks(10) {
            assert!(blob.iter().all(|&c| c == blob[0]));
        }
        assert_ne!(a[0], a[10]);
        assert_ne!(a[0], a[20]);
        assert_ne!(a[10], a[20]);
        assert_eq!(model.cluster_sizes(), [10, 10, 10]);
    }

    #[test]
    fn test_deterministic_per_seed() {
        let config = KMeansConfig::default();
        let a = KMeans::fit(&config, &blobs(), 7).unwrap();
        let b = KMeans::fit(&config, &blobs(), 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fewer_rows_than_clusters() {
        let data = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let model = KMeans::fit(&KMeansConfig::default(), &data, 42).unwrap();
        assert_eq!(model.k(), 3);
        let mut ids = model.assignments().to_vec();
        ids.sort_unstable();
        assert_eq!(ids, [0, 1, 2]);
        assert!(model.inertia().abs() < 1e-12);
    }

    #[test]
    fn test_identical_rows() {
        let data = vec![vec![1.0]; 6];
        let model = KMeans::fit(&KMeansConfig::default(), &data, 42).unwrap();
        assert_eq!(model.k(), 5);
        assert!(model.assignments().iter().all(|&c| c < 5));
        assert_eq!(model.inertia(), 0.0);
    }

    #[test]
    fn test_predict_matches_assignments() {
        let data = blobs();
        let model = KMeans::fit(&KMeansConfig::default(), &data, 3).unwrap();
        for (row, &c) in data.iter().zip(model.assignments()) {
            assert_eq!(model.predict(row), c);
        }
    }

    #[test]
    fn test_empty_is_error() {
        assert!(matches!(
            KMeans::fit(&KMeansConfig::default(), &[], 42),
            Err(KMeansError::Empty)
        ));
    }
}
