//! Two-dimensional neighbourhood-preserving embedding.
//!
//! A UMAP-style layout used only for visualization:
//!
//! 1. exact k-nearest-neighbour graph in the input space
//! 2. per-point smooth kNN distances turn edges into membership strengths,
//!    combined by fuzzy union (`a + b - a·b`)
//! 3. a 2-D layout initialized from the first two principal components
//! 4. stochastic gradient descent on the fuzzy cross-entropy, with
//!    negative sampling, pulls neighbours together and pushes random pairs
//!    apart
//!
//! The low-dimensional similarity curve `1 / (1 + a·d^(2b))` is fitted from
//! `min_dist` and `spread`.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::distance::{euclidean, squared_euclidean};

const SMOOTH_K_TOLERANCE: f64 = 1e-5;
const SMOOTH_K_ITERATIONS: usize = 64;
const MIN_K_DIST_SCALE: f64 = 1e-3;
const INIT_EXTENT: f64 = 10.0;
const INIT_JITTER: f64 = 1e-4;
const GRADIENT_CLIP: f64 = 4.0;
const REPULSION_EPSILON: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub n_neighbors: usize,
    pub min_dist: f64,
    pub spread: f64,
    /// Defaults to 500 for up to 10 000 points and 200 above.
    pub n_epochs: Option<usize>,
    pub negative_sample_rate: usize,
    pub learning_rate: f64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            min_dist: 0.1,
            spread: 1.0,
            n_epochs: None,
            negative_sample_rate: 5,
            learning_rate: 1.0,
        }
    }
}

/// Embeds each row of `data` into the plane.
///
/// `n_neighbors` is clamped to `n - 1`. A single row lands on the origin.
///
/// # Examples
///
/// ```
/// use mirrorball_latent::embedding::{EmbeddingConfig, embed};
///
/// let data = (0..12).map(|i| vec![f64::from(i), f64::from(i % 3)]).collect::<Vec<_>>();
/// let points = embed(&EmbeddingConfig::default(), &data, 42);
/// assert_eq!(points.len(), 12);
/// assert!(points.iter().all(|p| p[0].is_finite() && p[1].is_finite()));
/// ```
#[must_use]
pub fn embed(config: &EmbeddingConfig, data: &[Vec<f64>], seed: u64) -> Vec<[f64; 2]> {
    let n = data.len();
    if n <= 1 {
        return vec![[0.0, 0.0]; n];
    }
    let k = config.n_neighbors.clamp(1, n - 1);
    let n_epochs = config
        .n_epochs
        .unwrap_or(if n <= 10_000 { 500 } else { 200 })
        .max(1);
    let (a, b) = fit_curve(config.min_dist, config.spread);

    let knn = nearest_neighbors(data, k);
    let graph = fuzzy_graph(&knn);
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let mut layout = pca_init(data, &mut rng);

    let optimizer = LayoutOptimizer {
        a,
        b,
        n_epochs,
        negative_sample_rate: config.negative_sample_rate,
        learning_rate: config.learning_rate,
    };
    optimizer.run(&mut layout, &graph, &mut rng);
    tracing::debug!(points = n, neighbors = k, edges = graph.len(), "computed embedding");
    layout
}

/// Fits `a` and `b` of `1 / (1 + a·x^(2b))` by least squares to the curve
/// that is 1 below `min_dist` and decays as `exp(-(x - min_dist) / spread)`
/// beyond it.
#[must_use]
pub fn fit_curve(min_dist: f64, spread: f64) -> (f64, f64) {
    const SAMPLES: usize = 300;
    const PATTERN: [(f64, f64); 8] = [
        (1.0, 0.0),
        (-1.0, 0.0),
        (0.0, 1.0),
        (0.0, -1.0),
        (1.0, 1.0),
        (-1.0, -1.0),
        (1.0, -1.0),
        (-1.0, 1.0),
    ];
    #[expect(clippy::cast_precision_loss)]
    let xs = (0..SAMPLES)
        .map(|i| 3.0 * spread * i as f64 / (SAMPLES - 1) as f64)
        .collect::<Vec<_>>();
    let targets = xs
        .iter()
        .map(|&x| if x < min_dist { 1.0 } else { (-(x - min_dist) / spread).exp() })
        .collect::<Vec<_>>();
    let loss = |a: f64, b: f64| {
        xs.iter()
            .zip(&targets)
            .map(|(&x, &t)| (1.0 / (1.0 + a * x.powf(2.0 * b)) - t).powi(2))
            .sum::<f64>()
    };

    // pattern search over (a, b)
    let (mut a, mut b) = (1.0, 1.0);
    let (mut step_a, mut step_b) = (0.5, 0.25);
    let mut best = loss(a, b);
    while step_a > 1e-7 || step_b > 1e-7 {
        let mut improved = false;
        for (da, db) in PATTERN {
            let (ca, cb) = (a + da * step_a, b + db * step_b);
            if ca <= 0.0 || cb <= 0.0 {
                continue;
            }
            let l = loss(ca, cb);
            if l < best {
                (a, b, best) = (ca, cb, l);
                improved = true;
            }
        }
        if !improved {
            step_a /= 2.0;
            step_b /= 2.0;
        }
    }
    (a, b)
}

/// The `k` nearest other rows of every row, closest first, ties by index.
fn nearest_neighbors(data: &[Vec<f64>], k: usize) -> Vec<Vec<(usize, f64)>> {
    data.iter()
        .enumerate()
        .map(|(i, row)| {
            let mut dists = data
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, other)| (j, euclidean(row, other)))
                .collect::<Vec<_>>();
            dists.sort_by(|(ja, da), (jb, db)| da.total_cmp(db).then(ja.cmp(jb)));
            dists.truncate(k);
            dists
        })
        .collect()
}

/// Distance to the nearest neighbour (`rho`) and the bandwidth (`sigma`)
/// at which a point's membership strengths sum to `log2(k)`.
#[expect(clippy::cast_precision_loss)]
fn smooth_knn(neighbors: &[(usize, f64)], mean_distance: f64) -> (f64, f64) {
    let target = (neighbors.len() as f64).log2();
    let rho = neighbors
        .iter()
        .map(|&(_, d)| d)
        .find(|&d| d > 0.0)
        .unwrap_or(0.0);

    let (mut lo, mut hi, mut sigma) = (0.0, f64::INFINITY, 1.0);
    for _ in 0..SMOOTH_K_ITERATIONS {
        let psum = neighbors
            .iter()
            .map(|&(_, d)| (-(d - rho).max(0.0) / sigma).exp())
            .sum::<f64>();
        if (psum - target).abs() < SMOOTH_K_TOLERANCE {
            break;
        }
        if psum > target {
            hi = sigma;
            sigma = (lo + hi) / 2.0;
        } else {
            lo = sigma;
            sigma = if hi.is_finite() { (lo + hi) / 2.0 } else { sigma * 2.0 };
        }
    }

    let local_mean = neighbors.iter().map(|&(_, d)| d).sum::<f64>() / neighbors.len() as f64;
    let floor = if rho > 0.0 { local_mean } else { mean_distance };
    (rho, sigma.max(MIN_K_DIST_SCALE * floor))
}

/// Symmetric membership graph as directed edge list; both directions of
/// every edge are present.
#[expect(clippy::cast_precision_loss)]
fn fuzzy_graph(knn: &[Vec<(usize, f64)>]) -> Vec<(usize, usize, f64)> {
    let all = knn.iter().flatten().map(|&(_, d)| d).collect::<Vec<_>>();
    let mean_distance = all.iter().sum::<f64>() / all.len().max(1) as f64;

    let mut directed = BTreeMap::<(usize, usize), f64>::new();
    for (i, neighbors) in knn.iter().enumerate() {
        let (rho, sigma) = smooth_knn(neighbors, mean_distance);
        for &(j, d) in neighbors {
            let w = if d - rho <= 0.0 {
                1.0
            } else {
                (-(d - rho) / sigma).exp()
            };
            directed.insert((i, j), w);
        }
    }

    let mut edges = vec![];
    for (&(i, j), &w_ij) in &directed {
        let w_ji = directed.get(&(j, i)).copied().unwrap_or(0.0);
        let w = w_ij + w_ji - w_ij * w_ji;
        if w > 0.0 {
            edges.push((i, j, w));
            if !directed.contains_key(&(j, i)) {
                edges.push((j, i, w));
            }
        }
    }
    edges.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
    edges
}

/// Projection on the first two principal components, scaled so the largest
/// coordinate is 10, plus a tiny jitter that separates coincident points.
#[expect(clippy::cast_precision_loss)]
fn pca_init<R>(data: &[Vec<f64>], rng: &mut R) -> Vec<[f64; 2]>
where
    R: Rng + ?Sized,
{
    let n = data.len() as f64;
    let width = data[0].len();
    let means = (0..width)
        .map(|j| data.iter().map(|r| r[j]).sum::<f64>() / n)
        .collect::<Vec<_>>();
    let centered = data
        .iter()
        .map(|r| r.iter().zip(&means).map(|(v, m)| v - m).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let mut covariance = vec![vec![0.0; width]; width];
    for row in &centered {
        for (p, &vp) in row.iter().enumerate() {
            for (q, &vq) in row.iter().enumerate() {
                covariance[p][q] += vp * vq / n;
            }
        }
    }

    let mut components: Vec<Vec<f64>> = vec![];
    for c in 0..2 {
        components.push(leading_eigenvector(&covariance, &components, c));
    }

    let mut layout = centered
        .iter()
        .map(|row| {
            let project = |comp: &[f64]| row.iter().zip(comp).map(|(v, w)| v * w).sum::<f64>();
            [project(&components[0]), project(&components[1])]
        })
        .collect::<Vec<_>>();

    let extent = layout
        .iter()
        .flat_map(|p| p.iter().map(|v| v.abs()))
        .fold(0.0, f64::max);
    let scale = if extent > 0.0 { INIT_EXTENT / extent } else { 1.0 };
    for point in &mut layout {
        for v in point {
            *v = *v * scale + INIT_JITTER * rng.sample::<f64, _>(StandardNormal);
        }
    }
    layout
}

/// Power iteration, orthogonal to the components already found.
///
/// Returns a zero vector when the remaining variance is zero.
#[expect(clippy::cast_precision_loss)]
fn leading_eigenvector(matrix: &[Vec<f64>], found: &[Vec<f64>], salt: usize) -> Vec<f64> {
    let width = matrix.len();
    let mut v = (0..width)
        .map(|j| 1.0 + ((j + salt) % 7) as f64 * 0.1)
        .collect::<Vec<_>>();
    for _ in 0..200 {
        let mut w = matrix
            .iter()
            .map(|row| row.iter().zip(&v).map(|(m, x)| m * x).sum::<f64>())
            .collect::<Vec<_>>();
        for prev in found {
            let dot = w.iter().zip(prev).map(|(a, b)| a * b).sum::<f64>();
            for (x, p) in w.iter_mut().zip(prev) {
                *x -= dot * p;
            }
        }
        let norm = w.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm < 1e-12 {
            return vec![0.0; width];
        }
        v = w.into_iter().map(|x| x / norm).collect();
    }
    v
}

struct LayoutOptimizer {
    a: f64,
    b: f64,
    n_epochs: usize,
    negative_sample_rate: usize,
    learning_rate: f64,
}

impl LayoutOptimizer {
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn run<R>(&self, layout: &mut [[f64; 2]], graph: &[(usize, usize, f64)], rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let max_weight = graph.iter().map(|e| e.2).fold(0.0, f64::max);
        if max_weight <= 0.0 {
            return;
        }
        let edges = graph
            .iter()
            .filter(|e| e.2 >= max_weight / self.n_epochs as f64)
            .collect::<Vec<_>>();
        let epochs_per_sample = edges.iter().map(|e| max_weight / e.2).collect::<Vec<_>>();
        let negative_rate = self.negative_sample_rate.max(1) as f64;
        let epochs_per_negative = epochs_per_sample
            .iter()
            .map(|e| e / negative_rate)
            .collect::<Vec<_>>();
        let mut next_sample = epochs_per_sample.clone();
        let mut next_negative = epochs_per_negative.clone();
        let n = layout.len();

        for epoch in 0..self.n_epochs {
            let now = epoch as f64;
            let alpha = self.learning_rate * (1.0 - now / self.n_epochs as f64);
            for (e, &&(i, j, _)) in edges.iter().enumerate() {
                if next_sample[e] > now {
                    continue;
                }
                let d2 = squared_euclidean(&layout[i], &layout[j]);
                let coeff = if d2 > 0.0 {
                    -2.0 * self.a * self.b * d2.powf(self.b - 1.0)
                        / (self.a * d2.powf(self.b) + 1.0)
                } else {
                    0.0
                };
                for dim in 0..2 {
                    let grad = (coeff * (layout[i][dim] - layout[j][dim]))
                        .clamp(-GRADIENT_CLIP, GRADIENT_CLIP);
                    layout[i][dim] += grad * alpha;
                    layout[j][dim] -= grad * alpha;
                }
                next_sample[e] += epochs_per_sample[e];

                let negatives =
                    ((now - next_negative[e]) / epochs_per_negative[e]).max(0.0) as usize;
                for _ in 0..negatives {
                    let other = rng.random_range(0..n);
                    if other == i {
                        continue;
                    }
                    self.repel(layout, i, other, alpha);
                }
                next_negative[e] += negatives as f64 * epochs_per_negative[e];
            }
        }
    }

    fn repel(&self, layout: &mut [[f64; 2]], i: usize, other: usize, alpha: f64) {
        let d2 = squared_euclidean(&layout[i], &layout[other]);
        let coeff = if d2 > 0.0 {
            2.0 * self.b / ((REPULSION_EPSILON + d2) * (self.a * d2.powf(self.b) + 1.0))
        } else {
            0.0
        };
        for dim in 0..2 {
            let grad = if coeff > 0.0 {
                (coeff * (layout[i][dim] - layout[other][dim])).clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
            } else {
                GRADIENT_CLIP
            };
            layout[i][dim] += grad * alpha;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<Vec<f64>> {
        (0..20)
            .map(|i| {
                let offset = if i < 10 { 0.0 } else { 20.0 };
                let t = f64::from(i % 10) * 0.1;
                vec![offset + t, offset - t, t * t]
            })
            .collect()
    }

    fn centroid(points: &[[f64; 2]]) -> [f64; 2] {
        #[expect(clippy::cast_precision_loss)]
        let n = points.len() as f64;
        [
            points.iter().map(|p| p[0]).sum::<f64>() / n,
            points.iter().map(|p| p[1]).sum::<f64>() / n,
        ]
    }

    #[test]
    fn test_curve_parameters_for_default_min_dist() {
        let (a, b) = fit_curve(0.1, 1.0);
        assert!((a - 1.577).abs() < 0.05, "a = {a}");
        assert!((b - 0.895).abs() < 0.02, "b = {b}");
    }

    #[test]
    fn test_separated_clusters_stay_separated() {
        let points = embed(&EmbeddingConfig::default(), &two_blobs(), 42);
        let (left, right) = points.split_at(10);
        let (cl, cr) = (centroid(left), centroid(right));
        let between = euclidean(&cl, &cr);
        let spread = left
            .iter()
            .map(|p| euclidean(p, &cl))
            .chain(right.iter().map(|p| euclidean(p, &cr)))
            .fold(0.0, f64::max);
        assert!(between > spread, "between {between}, spread {spread}");
    }

    #[test]
    fn test_deterministic_per_seed() {
        let config = EmbeddingConfig {
            n_epochs: Some(50),
            ..EmbeddingConfig::default()
        };
        assert_eq!(embed(&config, &two_blobs(), 1), embed(&config, &two_blobs(), 1));
    }

    #[test]
    fn test_tiny_inputs() {
        let config = EmbeddingConfig::default();
        assert!(embed(&config, &[], 42).is_empty());
        assert_eq!(embed(&config, &[vec![3.0, 1.0]], 42), [[0.0, 0.0]]);
        let pair = embed(&config, &[vec![0.0], vec![1.0]], 42);
        assert_eq!(pair.len(), 2);
        assert!(pair.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_identical_rows_are_finite() {
        let points = embed(&EmbeddingConfig::default(), &vec![vec![1.0, 1.0]; 5], 42);
        assert!(points.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_fuzzy_graph_is_symmetric() {
        let knn = nearest_neighbors(&two_blobs(), 3);
        let graph = fuzzy_graph(&knn);
        let weights = graph
            .iter()
            .map(|&(i, j, w)| ((i, j), w))
            .collect::<BTreeMap<_, _>>();
        for (&(i, j), &w) in &weights {
            assert_eq!(weights.get(&(j, i)), Some(&w));
            assert!(w > 0.0 && w <= 1.0);
        }
    }
}
