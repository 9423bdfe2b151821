//! Distance measures between feature rows.

/// Squared Euclidean distance; infinite for rows of different length.
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }

    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Euclidean distance between two rows.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Full pairwise Euclidean distance matrix.
pub fn pairwise_distances(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = rows.len();
    let mut distances = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean_distance(&rows[i], &rows[j]);
            distances[i][j] = d;
            distances[j][i] = d;
        }
    }

    distances
}
