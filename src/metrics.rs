use crate::cluster::{DbscanResult, NOISE};
use crate::error::{ClusterError, Result};
use crate::Labels;
use ndarray::{Array1, Array2};
use std::fmt;

/// Counts reported after a clustering run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterSummary {
    pub n_clusters: usize,
    pub n_noise: usize,
    pub n_core: usize,
    pub n_border: usize,
    /// Size of each cluster, indexed by cluster id.
    pub cluster_sizes: Vec<usize>,
}

impl ClusterSummary {
    pub fn from_result(result: &DbscanResult) -> Self {
        let n_clusters = result.n_clusters();
        let mut cluster_sizes = vec![0; n_clusters];
        for &label in result.labels.iter().filter(|&&l| l != NOISE) {
            cluster_sizes[label as usize] += 1;
        }

        Self {
            n_clusters,
            n_noise: result.n_noise(),
            n_core: result.n_core(),
            n_border: result.n_border(),
            cluster_sizes,
        }
    }

    pub fn n_samples(&self) -> usize {
        self.n_core + self.n_border + self.n_noise
    }
}

impl fmt::Display for ClusterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "clusters={}, noise={}/{} (core={}, border={}), sizes={:?}",
            self.n_clusters,
            self.n_noise,
            self.n_samples(),
            self.n_core,
            self.n_border,
            self.cluster_sizes
        )
    }
}

/// Fraction of points labelled noise. Zero for an empty labelling.
pub fn noise_ratio(labels: &Labels) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    labels.iter().filter(|&&l| l == NOISE).count() as f64 / labels.len() as f64
}

/// Class counts per label.
///
/// Row 0 counts the noise points, row `k + 1` counts cluster `k`; column `c`
/// counts points whose target is `c`.
pub fn contingency(
    labels: &Labels,
    targets: &Array1<usize>,
    n_classes: usize,
) -> Result<Array2<usize>> {
    if labels.len() != targets.len() {
        return Err(ClusterError::invalid_input(format!(
            "labels ({}) and targets ({}) must have the same length",
            labels.len(),
            targets.len()
        )));
    }
    if let Some(&bad) = labels.iter().find(|&&l| l < NOISE) {
        return Err(ClusterError::invalid_input(format!(
            "label {} is neither noise ({}) nor a cluster id",
            bad, NOISE
        )));
    }
    if let Some(&bad) = targets.iter().find(|&&t| t >= n_classes) {
        return Err(ClusterError::invalid_input(format!(
            "target {} out of range for {} classes",
            bad, n_classes
        )));
    }

    let n_clusters = labels.iter().copied().max().map_or(0, |m| (m + 1).max(0) as usize);
    let mut table = Array2::zeros((n_clusters + 1, n_classes));
    for (&label, &target) in labels.iter().zip(targets.iter()) {
        let row = if label == NOISE { 0 } else { label as usize + 1 };
        table[[row, target]] += 1;
    }
    Ok(table)
}
