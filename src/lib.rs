//! Density-based spatial clustering (DBSCAN) on `ndarray` point sets.
//!
//! Points are the rows of a [`Matrix`]. The [`distance`] module turns them
//! into a dissimilarity matrix, [`cluster`] labels them, and [`dataset`] and
//! [`metrics`] supply and summarize the data around a run.

pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod cluster;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod metrics;

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;
/// Per-point cluster labels, `-1` for noise.
pub type Labels = Array1<isize>;

pub use cluster::{
    dbscan, dbscan_precomputed, dbscan_with, DbscanParams, DbscanResult, PointType, DBSCAN, NOISE,
};
pub use dataset::Dataset;
pub use distance::{DistanceSource, Metric};
pub use error::{ClusterError, Result};
pub use metrics::ClusterSummary;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_types_work() {
        let labels = Labels::from_elem(3, NOISE);
        let mat = Matrix::zeros((3, 4));
        assert_eq!(labels.len(), 3);
        assert_eq!(mat.shape(), &[3, 4]);
    }
}
