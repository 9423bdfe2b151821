//! K-means clustering of feature rows.
//!
//! Lloyd iterations from k-means++ seeds, repeated `n_init` times with the
//! best (lowest inertia) run kept. All randomness comes from one seeded
//! [`StdRng`], so a fixed seed gives identical labels.

use super::distance::squared_euclidean;
use crate::error::{RegimeError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

/// K-means configuration.
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,
    /// Maximum Lloyd iterations per run
    pub max_iter: usize,
    /// Number of independently seeded runs
    pub n_init: usize,
    /// Random seed for initialization
    pub seed: u64,
    /// Convergence tolerance on total centroid movement
    pub tolerance: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iter: 300,
            n_init: 10,
            seed: 42,
            tolerance: 1e-4,
        }
    }
}

impl KMeansConfig {
    /// Set number of clusters.
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set maximum iterations.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set number of initializations.
    pub fn n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    /// Set random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// A fitted k-means model.
#[derive(Debug, Clone)]
pub struct KMeans {
    /// Cluster assignments for each training row (0-indexed)
    pub labels: Vec<usize>,
    /// Cluster centroids
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to the nearest centroid
    pub inertia: f64,
    /// Number of iterations performed by the kept run
    pub n_iter: usize,
}

impl KMeans {
    /// Fit k-means on row-major data.
    pub fn fit(rows: &[Vec<f64>], config: &KMeansConfig) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(RegimeError::EmptyData);
        }
        if config.k == 0 {
            return Err(RegimeError::InvalidParameter(
                "number of clusters must be positive".to_string(),
            ));
        }
        if config.k > n {
            return Err(RegimeError::InsufficientData {
                needed: config.k,
                got: n,
            });
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut best: Option<KMeans> = None;

        for run in 0..config.n_init.max(1) {
            let centroids = initialize_centroids(rows, config.k, &mut rng);
            let candidate = lloyd(rows, centroids, config);
            trace!(run, inertia = candidate.inertia, n_iter = candidate.n_iter, "k-means run");

            if best.as_ref().map_or(true, |b| candidate.inertia < b.inertia) {
                best = Some(candidate);
            }
        }

        let model = best.ok_or_else(|| {
            RegimeError::ComputationError("k-means produced no run".to_string())
        })?;
        debug!(
            k = config.k,
            rows = n,
            inertia = model.inertia,
            n_iter = model.n_iter,
            "k-means fitted"
        );
        Ok(model)
    }

    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Assign each row to its nearest centroid.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<usize> {
        rows.iter()
            .map(|row| nearest_centroid(row, &self.centroids).0)
            .collect()
    }

    /// Get indices of training rows in a specific cluster.
    pub fn cluster_members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == cluster)
            .map(|(i, _)| i)
            .collect()
    }

    /// Get the size of each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// One Lloyd run from the given starting centroids.
fn lloyd(rows: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, config: &KMeansConfig) -> KMeans {
    let mut labels = vec![0; rows.len()];
    let mut n_iter = 0;

    for iter in 0..config.max_iter {
        n_iter = iter + 1;

        for (i, row) in rows.iter().enumerate() {
            labels[i] = nearest_centroid(row, &centroids).0;
        }

        let updated = update_centroids(rows, &labels, &centroids);
        let shift: f64 = centroids
            .iter()
            .zip(updated.iter())
            .map(|(old, new)| squared_euclidean(old, new))
            .sum();
        centroids = updated;

        if shift <= config.tolerance {
            break;
        }
    }

    // Final assignment against the converged centroids
    let mut inertia = 0.0;
    for (i, row) in rows.iter().enumerate() {
        let (nearest, dist) = nearest_centroid(row, &centroids);
        labels[i] = nearest;
        inertia += dist;
    }

    KMeans {
        labels,
        centroids,
        inertia,
        n_iter,
    }
}

/// Initialize centroids using k-means++ (D^2 weighting).
fn initialize_centroids(rows: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = rows.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(rows[rng.gen_range(0..n)].clone());

    let mut closest: Vec<f64> = rows
        .iter()
        .map(|r| squared_euclidean(r, &centroids[0]))
        .collect();

    for _ in 1..k {
        let total: f64 = closest.iter().sum();

        let selected = if total > 0.0 {
            let threshold = rng.gen::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = n - 1;
            for (i, &d) in closest.iter().enumerate() {
                cumsum += d;
                if cumsum >= threshold && d > 0.0 {
                    selected = i;
                    break;
                }
            }
            selected
        } else {
            // Every row coincides with a centroid already
            rng.gen_range(0..n)
        };

        let centroid = rows[selected].clone();
        for (d, row) in closest.iter_mut().zip(rows.iter()) {
            *d = d.min(squared_euclidean(row, &centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

/// Nearest centroid index and squared distance.
fn nearest_centroid(row: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut min_dist = f64::INFINITY;
    let mut nearest = 0;

    for (i, centroid) in centroids.iter().enumerate() {
        let dist = squared_euclidean(row, centroid);
        if dist < min_dist {
            min_dist = dist;
            nearest = i;
        }
    }

    (nearest, min_dist)
}

/// Mean of each cluster's members; an empty cluster keeps its centroid.
fn update_centroids(rows: &[Vec<f64>], labels: &[usize], previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let d = previous.first().map_or(0, |c| c.len());
    let mut sums = vec![vec![0.0; d]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (row, &label) in rows.iter().zip(labels.iter()) {
        counts[label] += 1;
        for (s, &x) in sums[label].iter_mut().zip(row.iter()) {
            *s += x;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous.iter())
        .map(|((sum, count), prev)| {
            if count == 0 {
                prev.clone()
            } else {
                sum.into_iter().map(|s| s / count as f64).collect()
            }
        })
        .collect()
}

/// Elbow method helper: inertia for each k in `1..=max_k`.
pub fn elbow_inertias(rows: &[Vec<f64>], max_k: usize, seed: u64) -> Result<Vec<f64>> {
    (1..=max_k.min(rows.len()))
        .map(|k| {
            let config = KMeansConfig::default().k(k).seed(seed);
            KMeans::fit(rows, &config).map(|m| m.inertia)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn generate_cluster_data() -> Vec<Vec<f64>> {
        vec![
            // Cluster 1: low values
            vec![1.0, 2.0],
            vec![1.5, 2.5],
            vec![1.2, 2.2],
            // Cluster 2: high values
            vec![10.0, 11.0],
            vec![10.5, 11.5],
            vec![10.2, 11.2],
        ]
    }

    #[test]
    fn kmeans_finds_clusters() {
        let data = generate_cluster_data();
        let config = KMeansConfig::default().k(2);
        let model = KMeans::fit(&data, &config).unwrap();

        assert_eq!(model.labels.len(), 6);
        assert_eq!(model.centroids.len(), 2);

        assert_eq!(model.labels[0], model.labels[1]);
        assert_eq!(model.labels[1], model.labels[2]);
        assert_eq!(model.labels[3], model.labels[4]);
        assert_eq!(model.labels[4], model.labels[5]);
        assert_ne!(model.labels[0], model.labels[3]);
    }

    #[test]
    fn kmeans_single_cluster() {
        let data = vec![vec![1.0, 2.0, 3.0], vec![1.1, 2.1, 3.1], vec![0.9, 1.9, 2.9]];
        let model = KMeans::fit(&data, &KMeansConfig::default().k(1)).unwrap();

        assert!(model.labels.iter().all(|&l| l == 0));
        assert_relative_eq!(model.centroids[0][0], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn kmeans_k_equals_n() {
        let data = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let model = KMeans::fit(&data, &KMeansConfig::default().k(3)).unwrap();

        assert_eq!(model.centroids.len(), 3);
        assert_relative_eq!(model.inertia, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn kmeans_invalid_k() {
        let data = generate_cluster_data();
        assert!(matches!(
            KMeans::fit(&data, &KMeansConfig::default().k(0)),
            Err(RegimeError::InvalidParameter(_))
        ));
        assert_eq!(
            KMeans::fit(&data, &KMeansConfig::default().k(7)).unwrap_err(),
            RegimeError::InsufficientData { needed: 7, got: 6 }
        );
        assert_eq!(
            KMeans::fit(&[], &KMeansConfig::default()).unwrap_err(),
            RegimeError::EmptyData
        );
    }

    #[test]
    fn kmeans_is_deterministic_for_seed() {
        let data: Vec<Vec<f64>> = (0..60)
            .map(|i| vec![((i * 13) % 17) as f64, ((i * 7) % 11) as f64])
            .collect();
        let config = KMeansConfig::default().k(4).seed(42);
        let a = KMeans::fit(&data, &config).unwrap();
        let b = KMeans::fit(&data, &config).unwrap();
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.inertia.to_bits(), b.inertia.to_bits());
    }

    #[test]
    fn predict_uses_nearest_centroid() {
        let data = generate_cluster_data();
        let model = KMeans::fit(&data, &KMeansConfig::default().k(2)).unwrap();
        let predicted = model.predict(&[vec![0.0, 1.0], vec![12.0, 12.0]]);
        assert_eq!(predicted[0], model.labels[0]);
        assert_eq!(predicted[1], model.labels[3]);
        assert_eq!(model.predict(&data), model.labels);
    }

    #[test]
    fn cluster_sizes_basic() {
        let data = generate_cluster_data();
        let model = KMeans::fit(&data, &KMeansConfig::default().k(2)).unwrap();

        let sizes = model.cluster_sizes();
        assert_eq!(sizes, vec![3, 3]);
        assert_eq!(
            model.cluster_members(0).len() + model.cluster_members(1).len(),
            6
        );
    }

    #[test]
    fn elbow_inertias_decreasing() {
        let data = generate_cluster_data();
        let inertias = elbow_inertias(&data, 4, 42).unwrap();

        assert_eq!(inertias.len(), 4);
        for i in 1..inertias.len() {
            assert!(inertias[i] <= inertias[i - 1] + 1e-6);
        }
    }

    #[test]
    fn config_builder() {
        let config = KMeansConfig::default().k(5).max_iter(50).n_init(0).seed(123);

        assert_eq!(config.k, 5);
        assert_eq!(config.max_iter, 50);
        assert_eq!(config.n_init, 1);
        assert_eq!(config.seed, 123);
    }
}
