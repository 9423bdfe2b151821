//! Regime labelling: standardize a feature matrix, cluster it, and return
//! labels aligned to the matrix index together with the fitted model.

use super::gmm::{GaussianMixture, GmmConfig};
use super::hdbscan::{Hdbscan, HdbscanConfig};
use super::kmeans::{KMeans, KMeansConfig};
use crate::core::{FeatureMatrix, RegimeLabels};
use crate::error::{RegimeError, Result};
use crate::transform::scale::StandardScaler;
use tracing::debug;

/// Label column produced by [`apply_kmeans`].
pub const KMEANS_LABEL: &str = "regime_kmeans";
/// Label column produced by [`apply_gmm`].
pub const GMM_LABEL: &str = "regime_gmm";
/// Label column produced by [`apply_hdbscan`].
pub const HDBSCAN_LABEL: &str = "regime_hdbscan";

/// A clustering model that can label standardized rows it was not fitted on.
pub trait RegimePredictor {
    /// Label each standardized row.
    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>>;
}

impl RegimePredictor for KMeans {
    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>> {
        let expected = self.centroids.first().map_or(0, |c| c.len());
        if let Some(row) = rows.iter().find(|r| r.len() != expected) {
            return Err(RegimeError::DimensionMismatch {
                expected,
                got: row.len(),
            });
        }
        Ok(self.predict(rows).into_iter().map(|l| l as i64).collect())
    }
}

impl RegimePredictor for GaussianMixture {
    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>> {
        Ok(self.predict(rows)?.into_iter().map(|l| l as i64).collect())
    }
}

/// Fitted scaler paired with the clustering model trained on its output.
#[derive(Debug, Clone)]
pub struct FittedRegimeModel<M> {
    scaler: StandardScaler,
    model: M,
    label_name: &'static str,
}

impl<M> FittedRegimeModel<M> {
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Name given to label sequences produced by this model.
    pub fn label_name(&self) -> &str {
        self.label_name
    }

    pub fn into_parts(self) -> (StandardScaler, M) {
        (self.scaler, self.model)
    }
}

impl<M: RegimePredictor> FittedRegimeModel<M> {
    /// Label new feature rows with the stored scaler and model.
    ///
    /// The matrix must carry the same number of columns, in the same order,
    /// as the one the model was fitted on.
    pub fn predict(&self, features: &FeatureMatrix) -> Result<RegimeLabels> {
        features.ensure_model_ready()?;
        let scaled = self.scaler.transform(&features.rows())?;
        let labels = self.model.predict_rows(&scaled)?;
        Ok(RegimeLabels::new(
            features.index().to_vec(),
            self.label_name,
            labels,
        ))
    }
}

/// Validate and standardize the matrix shared by every clustering entry point.
fn standardize(features: &FeatureMatrix) -> Result<(StandardScaler, Vec<Vec<f64>>)> {
    features.ensure_model_ready()?;
    StandardScaler::fit_transform(&features.rows())
}

/// K-means regimes with `n_clusters` clusters and the default seed.
pub fn apply_kmeans(
    features: &FeatureMatrix,
    n_clusters: usize,
) -> Result<(RegimeLabels, FittedRegimeModel<KMeans>)> {
    apply_kmeans_with(features, &KMeansConfig::default().k(n_clusters))
}

/// K-means regimes with a full configuration.
pub fn apply_kmeans_with(
    features: &FeatureMatrix,
    config: &KMeansConfig,
) -> Result<(RegimeLabels, FittedRegimeModel<KMeans>)> {
    let (scaler, scaled) = standardize(features)?;
    let model = KMeans::fit(&scaled, config)?;
    let labels = model.labels.iter().map(|&l| l as i64).collect();

    debug!(rows = features.nrows(), k = config.k, "k-means regimes assigned");
    Ok((
        RegimeLabels::new(features.index().to_vec(), KMEANS_LABEL, labels),
        FittedRegimeModel {
            scaler,
            model,
            label_name: KMEANS_LABEL,
        },
    ))
}

/// Gaussian mixture regimes with `n_components` components.
pub fn apply_gmm(
    features: &FeatureMatrix,
    n_components: usize,
) -> Result<(RegimeLabels, FittedRegimeModel<GaussianMixture>)> {
    apply_gmm_with(features, &GmmConfig::default().n_components(n_components))
}

/// Gaussian mixture regimes with a full configuration.
pub fn apply_gmm_with(
    features: &FeatureMatrix,
    config: &GmmConfig,
) -> Result<(RegimeLabels, FittedRegimeModel<GaussianMixture>)> {
    let (scaler, scaled) = standardize(features)?;
    let model = GaussianMixture::fit(&scaled, config)?;
    let labels = model.predict_rows(&scaled)?;

    debug!(
        rows = features.nrows(),
        n_components = config.n_components,
        converged = model.converged(),
        "gaussian mixture regimes assigned"
    );
    Ok((
        RegimeLabels::new(features.index().to_vec(), GMM_LABEL, labels),
        FittedRegimeModel {
            scaler,
            model,
            label_name: GMM_LABEL,
        },
    ))
}

/// HDBSCAN regimes; rows outside every dense region are labelled `-1`.
pub fn apply_hdbscan(
    features: &FeatureMatrix,
    min_cluster_size: usize,
) -> Result<(RegimeLabels, FittedRegimeModel<Hdbscan>)> {
    apply_hdbscan_with(
        features,
        &HdbscanConfig::default().min_cluster_size(min_cluster_size),
    )
}

/// HDBSCAN regimes with a full configuration.
pub fn apply_hdbscan_with(
    features: &FeatureMatrix,
    config: &HdbscanConfig,
) -> Result<(RegimeLabels, FittedRegimeModel<Hdbscan>)> {
    let (scaler, scaled) = standardize(features)?;
    let model = Hdbscan::fit(&scaled, config)?;

    Ok((
        RegimeLabels::new(features.index().to_vec(), HDBSCAN_LABEL, model.labels.clone()),
        FittedRegimeModel {
            scaler,
            model,
            label_name: HDBSCAN_LABEL,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NOISE_LABEL;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn index(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::hours(i as i64)).collect()
    }

    /// Two regimes on very different scales per column.
    fn regime_matrix() -> FeatureMatrix {
        let mut rows = Vec::new();
        for i in 0..30 {
            let jitter = (i % 5) as f64 * 0.01;
            rows.push(vec![0.01 + jitter * 0.01, 100.0 + jitter]);
        }
        for i in 0..30 {
            let jitter = (i % 5) as f64 * 0.01;
            rows.push(vec![0.05 + jitter * 0.01, 300.0 + jitter]);
        }
        FeatureMatrix::from_rows(
            index(60),
            vec!["volatility".to_string(), "level".to_string()],
            &rows,
        )
        .unwrap()
    }

    #[test]
    fn kmeans_labels_align_with_index() {
        let features = regime_matrix();
        let (labels, fitted) = apply_kmeans(&features, 2).unwrap();

        assert_eq!(labels.name(), KMEANS_LABEL);
        assert_eq!(labels.index(), features.index());
        assert_eq!(labels.n_clusters(), 2);
        assert!(labels.labels()[..30].iter().all(|&l| l == labels.labels()[0]));
        assert!(labels.labels()[30..].iter().all(|&l| l == labels.labels()[30]));
        assert_eq!(fitted.scaler().n_features(), 2);
    }

    #[test]
    fn kmeans_at_most_k_labels() {
        let features = regime_matrix();
        let (labels, _) = apply_kmeans(&features, 3).unwrap();
        assert_eq!(labels.len(), 60);
        assert!(labels.n_clusters() <= 3);
        assert_eq!(labels.noise_count(), 0);
    }

    #[test]
    fn fitted_model_labels_new_rows() {
        let features = regime_matrix();
        let (labels, fitted) = apply_kmeans(&features, 2).unwrap();

        let fresh = FeatureMatrix::from_rows(
            index(2),
            vec!["volatility".to_string(), "level".to_string()],
            &[vec![0.011, 101.0], vec![0.049, 299.0]],
        )
        .unwrap();
        let predicted = fitted.predict(&fresh).unwrap();
        assert_eq!(predicted.labels()[0], labels.labels()[0]);
        assert_eq!(predicted.labels()[1], labels.labels()[30]);
    }

    #[test]
    fn fitted_model_rejects_wrong_width() {
        let (_, fitted) = apply_kmeans(&regime_matrix(), 2).unwrap();
        let narrow = FeatureMatrix::from_rows(index(1), vec!["a".to_string()], &[vec![1.0]])
            .unwrap();
        assert!(matches!(
            fitted.predict(&narrow),
            Err(RegimeError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn gmm_regimes() {
        let features = regime_matrix();
        let (labels, fitted) = apply_gmm(&features, 2).unwrap();

        assert_eq!(labels.name(), GMM_LABEL);
        assert_eq!(labels.n_clusters(), 2);
        assert_ne!(labels.labels()[0], labels.labels()[59]);
        assert_eq!(fitted.predict(&features).unwrap().labels(), labels.labels());
    }

    #[test]
    fn hdbscan_regimes() {
        let features = regime_matrix();
        let (labels, fitted) = apply_hdbscan(&features, 10).unwrap();

        assert_eq!(labels.name(), HDBSCAN_LABEL);
        assert_eq!(labels.len(), 60);
        assert_eq!(fitted.label_name(), HDBSCAN_LABEL);
        assert!(labels
            .labels()
            .iter()
            .all(|&l| l == NOISE_LABEL || (0..labels.n_clusters() as i64).contains(&l)));
    }

    #[test]
    fn same_seed_same_labels() {
        let features = regime_matrix();
        let (a, _) = apply_kmeans(&features, 3).unwrap();
        let (b, _) = apply_kmeans(&features, 3).unwrap();
        assert_eq!(a.labels(), b.labels());

        let (a, _) = apply_gmm(&features, 3).unwrap();
        let (b, _) = apply_gmm(&features, 3).unwrap();
        assert_eq!(a.labels(), b.labels());
    }

    #[test]
    fn rejects_missing_values() {
        let features = FeatureMatrix::from_rows(
            index(3),
            vec!["x".to_string()],
            &[vec![1.0], vec![f64::NAN], vec![2.0]],
        )
        .unwrap();
        assert_eq!(
            apply_kmeans(&features, 2).unwrap_err(),
            RegimeError::MissingValues
        );
        assert_eq!(
            apply_hdbscan(&features.drop_missing(), 2).unwrap().0.len(),
            2
        );
    }

    #[test]
    fn rejects_invalid_cluster_counts() {
        let features = regime_matrix();
        assert!(matches!(
            apply_kmeans(&features, 0),
            Err(RegimeError::InvalidParameter(_))
        ));
        assert!(matches!(
            apply_hdbscan(&features, 1),
            Err(RegimeError::InvalidParameter(_))
        ));
    }
}
