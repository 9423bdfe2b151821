//! Small dense linear algebra helpers on `Vec<Vec<f64>>` matrices.
//!
//! Sized for feature matrices with a handful of columns; nothing here is
//! blocked or vectorized.

/// Cholesky decomposition `A = L @ L'` of a symmetric positive definite matrix.
///
/// Returns the lower triangular factor, or `None` if `A` is not positive definite.
pub fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        if a[i].len() != n {
            return None;
        }
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(l)
}

/// Forward substitution: solve `L @ y = b` for lower triangular `L`.
pub fn solve_lower(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }
    y
}

/// Log-determinant of `L @ L'` given its Cholesky factor.
pub fn cholesky_log_det(l: &[Vec<f64>]) -> f64 {
    2.0 * (0..l.len()).map(|i| l[i][i].ln()).sum::<f64>()
}

/// Eigendecomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns `(eigenvalues, eigenvectors)` sorted by descending eigenvalue;
/// `eigenvectors[k]` is the unit eigenvector for `eigenvalues[k]`.
pub fn symmetric_eigen(matrix: &[Vec<f64>]) -> (Vec<f64>, Vec<Vec<f64>>) {
    let (a, v, _) = jacobi_rotate(matrix);
    let n = a.len();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&x, &y| {
        a[y][y]
            .partial_cmp(&a[x][x])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let eigenvalues = order.iter().map(|&k| a[k][k]).collect();
    let eigenvectors = order
        .iter()
        .map(|&k| (0..n).map(|row| v[row][k]).collect())
        .collect();

    (eigenvalues, eigenvectors)
}

/// Cyclic Jacobi sweeps over a copy of `matrix`.
///
/// Returns the rotated matrix, the accumulated rotations and the number of
/// sweeps run. Sweeping stops once the squared off-diagonal mass falls below
/// `1e-22` of the squared Frobenius norm, so the stop is scale-free.
fn jacobi_rotate(matrix: &[Vec<f64>]) -> (Vec<Vec<f64>>, Vec<Vec<f64>>, usize) {
    const MAX_SWEEPS: usize = 100;

    let n = matrix.len();
    let mut a: Vec<Vec<f64>> = matrix.to_vec();
    let mut v = identity(n);
    let frobenius: f64 = a.iter().flatten().map(|x| x * x).sum();

    let mut sweeps = 0;
    while sweeps < MAX_SWEEPS {
        let off_diagonal: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off_diagonal <= 1e-22 * frobenius {
            break;
        }
        sweeps += 1;

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() < 1e-300 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let t = if theta == 0.0 { 1.0 } else { t };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[k][p];
                    let vkq = v[k][q];
                    v[k][p] = c * vkp - s * vkq;
                    v[k][q] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a, v, sweeps)
}

fn identity(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}
