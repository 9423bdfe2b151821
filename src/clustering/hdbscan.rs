//! HDBSCAN density clustering.
//!
//! The pipeline:
//! 1. core distance of each point (distance to its `min_samples`-th nearest
//!    point, the point itself included);
//! 2. minimum spanning tree of the mutual reachability graph
//!    `max(core(a), core(b), d(a, b))` via Prim's algorithm;
//! 3. single linkage dendrogram from the sorted tree edges;
//! 4. condensed tree keeping only splits where both sides have at least
//!    `min_cluster_size` points;
//! 5. excess-of-mass selection of the most stable clusters.
//!
//! Points that do not belong to a selected cluster are labelled
//! [`NOISE_LABEL`]. The root cluster is never selected, so uniformly dense
//! data yields only noise rather than one big cluster.
//!
//! Memory and time are quadratic in the number of rows.

use super::distance::pairwise_distances;
use crate::core::NOISE_LABEL;
use crate::error::{RegimeError, Result};
use tracing::debug;

/// HDBSCAN configuration.
#[derive(Debug, Clone)]
pub struct HdbscanConfig {
    /// Smallest group of points considered a cluster
    pub min_cluster_size: usize,
    /// Neighbourhood size for core distances; defaults to `min_cluster_size`
    pub min_samples: Option<usize>,
}

impl Default for HdbscanConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 30,
            min_samples: None,
        }
    }
}

impl HdbscanConfig {
    /// Set minimum cluster size.
    pub fn min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    /// Set the core distance neighbourhood size.
    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = Some(min_samples);
        self
    }

    fn effective_min_samples(&self) -> usize {
        self.min_samples.unwrap_or(self.min_cluster_size)
    }
}

/// Result of an HDBSCAN run.
#[derive(Debug, Clone)]
pub struct Hdbscan {
    /// Cluster label per row, `-1` for noise
    pub labels: Vec<i64>,
    /// Excess-of-mass stability of each selected cluster, by label
    pub stabilities: Vec<f64>,
    /// Core distance per row
    pub core_distances: Vec<f64>,
}

impl Hdbscan {
    /// Cluster row-major data.
    pub fn fit(rows: &[Vec<f64>], config: &HdbscanConfig) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(RegimeError::EmptyData);
        }
        if config.min_cluster_size < 2 {
            return Err(RegimeError::InvalidParameter(format!(
                "min_cluster_size must be at least 2, got {}",
                config.min_cluster_size
            )));
        }
        let min_samples = config.effective_min_samples();
        if min_samples == 0 {
            return Err(RegimeError::InvalidParameter(
                "min_samples must be positive".to_string(),
            ));
        }

        let distances = pairwise_distances(rows);
        let core_distances = core_distances(&distances, min_samples);

        if n == 1 {
            return Ok(Self {
                labels: vec![NOISE_LABEL],
                stabilities: Vec::new(),
                core_distances,
            });
        }

        let mut edges = mutual_reachability_mst(&distances, &core_distances);
        edges.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));
        let dendrogram = Dendrogram::single_linkage(n, &edges);
        let tree = CondensedTree::build(&dendrogram, config.min_cluster_size);
        let selected = tree.select_eom();
        let (labels, stabilities) = tree.label_points(n, &selected);

        let result = Self {
            labels,
            stabilities,
            core_distances,
        };
        debug!(
            rows = n,
            min_cluster_size = config.min_cluster_size,
            min_samples,
            n_clusters = result.n_clusters(),
            noise = result.noise_count(),
            "hdbscan fitted"
        );
        Ok(result)
    }

    /// Number of clusters found (noise excluded).
    pub fn n_clusters(&self) -> usize {
        self.stabilities.len()
    }

    /// Number of rows labelled as noise.
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE_LABEL).count()
    }
}

/// Distance to the `min_samples`-th nearest point, the point itself included.
fn core_distances(distances: &[Vec<f64>], min_samples: usize) -> Vec<f64> {
    let k = min_samples.min(distances.len());
    distances
        .iter()
        .map(|row| {
            let mut sorted = row.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            sorted[k - 1]
        })
        .collect()
}

/// Prim's algorithm on the dense mutual reachability graph.
fn mutual_reachability_mst(distances: &[Vec<f64>], core: &[f64]) -> Vec<(usize, usize, f64)> {
    let n = distances.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n - 1);

    let mut current = 0;
    in_tree[0] = true;

    for _ in 1..n {
        for v in 0..n {
            if in_tree[v] {
                continue;
            }
            let reach = distances[current][v].max(core[current]).max(core[v]);
            if reach < best[v] {
                best[v] = reach;
                from[v] = current;
            }
        }

        let mut next = None;
        for v in 0..n {
            if !in_tree[v] && next.map_or(true, |u: usize| best[v] < best[u]) {
                next = Some(v);
            }
        }
        let Some(v) = next else { break };

        in_tree[v] = true;
        edges.push((from[v], v, best[v]));
        current = v;
    }

    edges
}

/// Binary merge tree: leaves `0..n`, internal nodes `n..2n-1`.
struct Dendrogram {
    n_points: usize,
    children: Vec<(usize, usize)>,
    heights: Vec<f64>,
    sizes: Vec<usize>,
}

impl Dendrogram {
    fn single_linkage(n: usize, sorted_edges: &[(usize, usize, f64)]) -> Self {
        let total = 2 * n - 1;
        let mut parent: Vec<usize> = (0..total).collect();
        let mut sizes = vec![1usize; total];
        let mut children = Vec::with_capacity(n - 1);
        let mut heights = Vec::with_capacity(n - 1);

        for (i, &(a, b, weight)) in sorted_edges.iter().enumerate() {
            let node = n + i;
            let ra = find(&mut parent, a);
            let rb = find(&mut parent, b);
            parent[ra] = node;
            parent[rb] = node;
            sizes[node] = sizes[ra] + sizes[rb];
            children.push((ra, rb));
            heights.push(weight);
        }

        Self {
            n_points: n,
            children,
            heights,
            sizes,
        }
    }

    fn root(&self) -> usize {
        self.n_points + self.children.len() - 1
    }

    fn is_leaf(&self, node: usize) -> bool {
        node < self.n_points
    }

    fn leaves(&self, node: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if self.is_leaf(current) {
                out.push(current);
            } else {
                let (left, right) = self.children[current - self.n_points];
                stack.push(left);
                stack.push(right);
            }
        }
        out
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    let mut root = x;
    while parent[root] != root {
        root = parent[root];
    }
    while parent[x] != root {
        let next = parent[x];
        parent[x] = root;
        x = next;
    }
    root
}

/// Entry of the condensed tree: a point or a child cluster leaving `parent`
/// at density level `lambda`.
#[derive(Debug, Clone, Copy)]
enum Child {
    Point(usize),
    Cluster(usize),
}

#[derive(Debug, Clone, Copy)]
struct CondensedEdge {
    parent: usize,
    child: Child,
    lambda: f64,
    size: usize,
}

/// Condensed cluster tree; cluster 0 is the root and children always have
/// larger ids than their parents.
struct CondensedTree {
    edges: Vec<CondensedEdge>,
    births: Vec<f64>,
    parents: Vec<Option<usize>>,
}

impl CondensedTree {
    fn build(dendrogram: &Dendrogram, min_cluster_size: usize) -> Self {
        let mut tree = Self {
            edges: Vec::new(),
            births: vec![0.0],
            parents: vec![None],
        };
        let mut stack = vec![(dendrogram.root(), 0usize)];

        while let Some((node, cluster)) = stack.pop() {
            let index = node - dendrogram.n_points;
            let (left, right) = dendrogram.children[index];
            let height = dendrogram.heights[index];
            let lambda = if height > 0.0 {
                1.0 / height
            } else {
                f64::INFINITY
            };

            let left_big = dendrogram.sizes[left] >= min_cluster_size;
            let right_big = dendrogram.sizes[right] >= min_cluster_size;

            match (left_big, right_big) {
                (true, true) => {
                    for child in [left, right] {
                        let id = tree.births.len();
                        tree.births.push(lambda);
                        tree.parents.push(Some(cluster));
                        tree.edges.push(CondensedEdge {
                            parent: cluster,
                            child: Child::Cluster(id),
                            lambda,
                            size: dendrogram.sizes[child],
                        });
                        stack.push((child, id));
                    }
                }
                (true, false) => {
                    tree.fall_out(dendrogram, right, cluster, lambda);
                    stack.push((left, cluster));
                }
                (false, true) => {
                    tree.fall_out(dendrogram, left, cluster, lambda);
                    stack.push((right, cluster));
                }
                (false, false) => {
                    tree.fall_out(dendrogram, left, cluster, lambda);
                    tree.fall_out(dendrogram, right, cluster, lambda);
                }
            }
        }

        tree
    }

    fn fall_out(&mut self, dendrogram: &Dendrogram, node: usize, cluster: usize, lambda: f64) {
        for point in dendrogram.leaves(node) {
            self.edges.push(CondensedEdge {
                parent: cluster,
                child: Child::Point(point),
                lambda,
                size: 1,
            });
        }
    }

    fn n_clusters(&self) -> usize {
        self.births.len()
    }

    fn stabilities(&self) -> Vec<f64> {
        let mut stability = vec![0.0; self.n_clusters()];
        for edge in &self.edges {
            let birth = self.births[edge.parent];
            if edge.lambda > birth {
                stability[edge.parent] += (edge.lambda - birth) * edge.size as f64;
            }
        }
        stability
    }

    fn child_clusters(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.n_clusters()];
        for edge in &self.edges {
            if let Child::Cluster(id) = edge.child {
                children[edge.parent].push(id);
            }
        }
        children
    }

    /// Excess-of-mass selection over every non-root cluster.
    fn select_eom(&self) -> Vec<bool> {
        let mut stability = self.stabilities();
        let children = self.child_clusters();
        let mut selected = vec![false; self.n_clusters()];

        for cluster in (1..self.n_clusters()).rev() {
            let subtree: f64 = children[cluster].iter().map(|&c| stability[c]).sum();
            if children[cluster].is_empty() || stability[cluster] >= subtree {
                selected[cluster] = true;
                let mut stack = children[cluster].clone();
                while let Some(descendant) = stack.pop() {
                    selected[descendant] = false;
                    stack.extend(children[descendant].iter().copied());
                }
            } else {
                stability[cluster] = subtree;
            }
        }

        selected
    }

    /// Label points by their nearest selected ancestor cluster.
    fn label_points(&self, n_points: usize, selected: &[bool]) -> (Vec<i64>, Vec<f64>) {
        let raw_stability = self.stabilities();
        let mut label_of = vec![NOISE_LABEL; self.n_clusters()];
        let mut stabilities = Vec::new();
        for (cluster, &is_selected) in selected.iter().enumerate() {
            if is_selected {
                label_of[cluster] = stabilities.len() as i64;
                stabilities.push(raw_stability[cluster]);
            }
        }

        let mut labels = vec![NOISE_LABEL; n_points];
        for edge in &self.edges {
            let Child::Point(point) = edge.child else {
                continue;
            };
            let mut cluster = Some(edge.parent);
            while let Some(c) = cluster {
                if selected[c] {
                    labels[point] = label_of[c];
                    break;
                }
                cluster = self.parents[c];
            }
        }

        (labels, stabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn blobs_with_outlier() -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(3);
        let mut rows = Vec::new();
        for center in [0.0, 20.0] {
            for _ in 0..40 {
                rows.push(vec![center + rng.gen::<f64>(), center + rng.gen::<f64>()]);
            }
        }
        rows.push(vec![100.0, -100.0]);
        rows
    }

    #[test]
    fn separates_blobs_and_flags_outlier() {
        let data = blobs_with_outlier();
        let config = HdbscanConfig::default().min_cluster_size(10);
        let result = Hdbscan::fit(&data, &config).unwrap();

        assert_eq!(result.n_clusters(), 2);
        let a = result.labels[0];
        let b = result.labels[40];
        assert!(a >= 0 && b >= 0);
        assert_ne!(a, b);
        assert!(result.labels[..40].iter().all(|&l| l == a));
        assert!(result.labels[40..80].iter().all(|&l| l == b));
        assert_eq!(result.labels[80], NOISE_LABEL);
        assert_eq!(result.noise_count(), 1);
        assert!(result.stabilities.iter().all(|&s| s > 0.0));
    }

    #[test]
    fn too_few_points_is_all_noise() {
        let data: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
        let result = Hdbscan::fit(&data, &HdbscanConfig::default()).unwrap();
        assert!(result.labels.iter().all(|&l| l == NOISE_LABEL));
        assert_eq!(result.n_clusters(), 0);
    }

    #[test]
    fn single_point_is_noise() {
        let result = Hdbscan::fit(&[vec![1.0, 2.0]], &HdbscanConfig::default()).unwrap();
        assert_eq!(result.labels, vec![NOISE_LABEL]);
    }

    #[test]
    fn core_distance_counts_the_point_itself() {
        let rows = vec![vec![0.0], vec![1.0], vec![3.0]];
        let distances = pairwise_distances(&rows);
        let core = core_distances(&distances, 2);
        assert_relative_eq!(core[0], 1.0);
        assert_relative_eq!(core[1], 1.0);
        assert_relative_eq!(core[2], 2.0);

        // min_samples larger than the data clamps to the farthest point
        let core = core_distances(&distances, 10);
        assert_relative_eq!(core[0], 3.0);
    }

    #[test]
    fn mst_spans_all_points() {
        let rows = vec![vec![0.0], vec![1.0], vec![3.0], vec![7.0]];
        let distances = pairwise_distances(&rows);
        let core = core_distances(&distances, 1);
        let edges = mutual_reachability_mst(&distances, &core);

        assert_eq!(edges.len(), 3);
        let total: f64 = edges.iter().map(|e| e.2).sum();
        assert_relative_eq!(total, 7.0, epsilon = 1e-12);
    }

    #[test]
    fn invalid_configuration() {
        let data = blobs_with_outlier();
        assert!(matches!(
            Hdbscan::fit(&data, &HdbscanConfig::default().min_cluster_size(1)),
            Err(RegimeError::InvalidParameter(_))
        ));
        assert!(matches!(
            Hdbscan::fit(&data, &HdbscanConfig::default().min_cluster_size(5).min_samples(0)),
            Err(RegimeError::InvalidParameter(_))
        ));
        assert_eq!(
            Hdbscan::fit(&[], &HdbscanConfig::default()).unwrap_err(),
            RegimeError::EmptyData
        );
    }

    #[test]
    fn deterministic() {
        let data = blobs_with_outlier();
        let config = HdbscanConfig::default().min_cluster_size(8).min_samples(4);
        let a = Hdbscan::fit(&data, &config).unwrap();
        let b = Hdbscan::fit(&data, &config).unwrap();
        assert_eq!(a.labels, b.labels);
    }
}
