//! End-to-end tests: price series -> rolling features -> regimes.

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regime_features::clustering::{apply_gmm, apply_hdbscan, apply_kmeans, GMM_LABEL};
use regime_features::core::{FeatureMatrix, MissingValuePolicy, Series, NOISE_LABEL};
use regime_features::features::{
    average_true_range, parkinson_volatility, realized_volatility, rolling_kurtosis,
    rolling_permutation_entropy, rolling_sample_entropy, rolling_shannon_entropy, rolling_skew,
    z_score,
};
use regime_features::reduction::reduce_dimensionality;
use regime_features::RegimeError;

fn index(n: usize) -> Vec<DateTime<Utc>> {
    let base = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    (0..n).map(|i| base + Duration::days(i as i64)).collect()
}

/// Synthetic OHLC bars: a calm half followed by a turbulent half.
struct Bars {
    close: Series,
    high: Series,
    low: Series,
    returns: Series,
}

fn synthetic_bars(n: usize) -> Bars {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut close = Vec::with_capacity(n);
    let mut high = Vec::with_capacity(n);
    let mut low = Vec::with_capacity(n);
    let mut returns = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let scale = if i < n / 2 { 0.002 } else { 0.03 };
        let r = scale * (rng.gen::<f64>() - 0.5);
        price *= 1.0 + r;
        let spread = price * scale * (0.5 + rng.gen::<f64>());
        close.push(price);
        high.push(price + spread);
        low.push(price - spread);
        returns.push(if i == 0 { f64::NAN } else { r });
    }

    let idx = index(n);
    Bars {
        close: Series::new(idx.clone(), close).unwrap().with_name("close"),
        high: Series::new(idx.clone(), high).unwrap().with_name("high"),
        low: Series::new(idx.clone(), low).unwrap().with_name("low"),
        returns: Series::new(idx, returns).unwrap().with_name("returns"),
    }
}

fn feature_matrix(bars: &Bars) -> FeatureMatrix {
    let window = 21;
    let features = vec![
        realized_volatility(&bars.returns, window).unwrap(),
        parkinson_volatility(&bars.high, &bars.low, window).unwrap(),
        average_true_range(&bars.high, &bars.low, &bars.close, window).unwrap(),
        z_score(&bars.close, window).unwrap(),
        rolling_skew(&bars.returns, window).unwrap(),
        rolling_kurtosis(&bars.returns, window).unwrap(),
        rolling_shannon_entropy(&bars.returns, window, 10).unwrap(),
        rolling_permutation_entropy(&bars.returns, window, 3).unwrap(),
    ];
    FeatureMatrix::from_series(&features)
        .unwrap()
        .sanitized(MissingValuePolicy::Drop)
        .unwrap()
}

#[test]
fn features_build_a_clean_matrix() {
    let bars = synthetic_bars(200);
    let matrix = feature_matrix(&bars);

    assert_eq!(matrix.ncols(), 8);
    // The first return is NaN, so every return-based window starts one bar later
    assert_eq!(matrix.nrows(), 200 - 21);
    assert!(!matrix.has_missing_values());
    assert_eq!(matrix.index()[0], bars.close.index()[21]);
    assert!(matrix.column("realized_volatility").is_ok());
    assert!(matches!(
        matrix.column("missing"),
        Err(RegimeError::ColumnNotFound(_))
    ));
}

#[test]
fn kmeans_recovers_volatility_regimes() {
    let bars = synthetic_bars(200);
    let matrix = feature_matrix(&bars);
    let (labels, model) = apply_kmeans(&matrix, 3).unwrap();

    assert_eq!(labels.len(), matrix.nrows());
    assert!(labels.n_clusters() <= 3);
    assert_eq!(labels.noise_count(), 0);

    // Rows deep in the calm and turbulent halves land in different regimes
    let first = labels.labels()[10];
    let last = labels.labels()[labels.len() - 1];
    assert_ne!(first, last);

    let again = model.predict(&matrix).unwrap();
    assert_eq!(again.labels(), labels.labels());
}

#[test]
fn clustering_is_reproducible() {
    let bars = synthetic_bars(160);
    let matrix = feature_matrix(&bars);

    let (a, _) = apply_kmeans(&matrix, 3).unwrap();
    let (b, _) = apply_kmeans(&matrix, 3).unwrap();
    assert_eq!(a.labels(), b.labels());

    let (a, _) = apply_gmm(&matrix, 2).unwrap();
    let (b, _) = apply_gmm(&matrix, 2).unwrap();
    assert_eq!(a.labels(), b.labels());
}

#[test]
fn gmm_probabilities_sum_to_one() {
    let bars = synthetic_bars(160);
    let matrix = feature_matrix(&bars);
    let (labels, fitted) = apply_gmm(&matrix, 2).unwrap();

    assert_eq!(labels.name(), GMM_LABEL);
    let scaled = fitted.scaler().transform(&matrix.rows()).unwrap();
    for row in fitted.model().predict_proba(&scaled).unwrap() {
        assert_relative_eq!(row.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn hdbscan_marks_isolated_rows_as_noise() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut rows = Vec::new();
    for center in [0.0, 10.0] {
        for _ in 0..35 {
            rows.push(vec![center + rng.gen::<f64>(), center + rng.gen::<f64>()]);
        }
    }
    rows.push(vec![60.0, -60.0]);
    let matrix =
        FeatureMatrix::from_rows(index(rows.len()), vec!["a".into(), "b".into()], &rows).unwrap();

    let (labels, _) = apply_hdbscan(&matrix, 10).unwrap();
    assert_eq!(labels.n_clusters(), 2);
    assert_eq!(labels.labels()[70], NOISE_LABEL);
    assert_ne!(labels.labels()[0], labels.labels()[35]);

    let series = labels.to_series().unwrap();
    assert_eq!(series.name(), Some("regime_hdbscan"));
    assert_eq!(series.values()[70], -1.0);
}

#[test]
fn pca_reduces_to_named_components() {
    let bars = synthetic_bars(120);
    let matrix = feature_matrix(&bars);

    let reduced = reduce_dimensionality(&matrix, "pca", 2).unwrap();
    assert_eq!(reduced.nrows(), matrix.nrows());
    assert_eq!(reduced.column_names(), &["PC1".to_string(), "PC2".to_string()]);
    assert_eq!(reduced.index(), matrix.index());

    assert_eq!(
        reduce_dimensionality(&matrix, "umap", 2).unwrap_err(),
        RegimeError::UnsupportedOption {
            option: "method".to_string(),
            value: "umap".to_string()
        }
    );
}

#[test]
fn sample_entropy_distinguishes_regular_from_noisy() {
    let n = 120;
    let regular: Vec<f64> = (0..n).map(|i| ((i % 4) as f64)).collect();
    let mut rng = StdRng::seed_from_u64(9);
    let noisy: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();

    let regular = rolling_sample_entropy(&Series::new(index(n), regular).unwrap(), 50, 2, 0.5)
        .unwrap();
    let noisy =
        rolling_sample_entropy(&Series::new(index(n), noisy).unwrap(), 50, 2, 0.5).unwrap();

    let last_regular = regular.values()[n - 1];
    let last_noisy = noisy.values()[n - 1];
    assert!(last_regular.is_finite());
    assert!(last_noisy.is_finite());
    assert!(last_regular < last_noisy);
}
