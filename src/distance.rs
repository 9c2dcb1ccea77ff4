//! Pairwise dissimilarity matrices.
//!
//! The clustering engine never measures distances itself; it asks this
//! module for an N×N matrix, either under one of the built-in [`Metric`]s
//! or under a caller supplied distance function.
//!
//! ```rust
//! use densecluster::distance::{pairwise_distances, Metric};
//! use ndarray::array;
//!
//! let x = array![[0.0, 0.0], [3.0, 4.0]];
//! let dist = pairwise_distances(&x, Metric::Euclidean).unwrap();
//! assert_eq!(dist[[0, 1]], 5.0);
//! ```

use crate::error::{ClusterError, Result};
use crate::Matrix;
use log::debug;
use ndarray::{ArrayView1, ArrayView2};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Signature of a user supplied distance between two points.
pub type DistanceFn<'a> = dyn Fn(ArrayView1<f64>, ArrayView1<f64>) -> f64 + Send + Sync + 'a;

/// Built-in distance metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Metric {
    /// `sqrt(sum((a_k - b_k)^2))`
    #[default]
    Euclidean,
    /// `sum(|a_k - b_k|)`
    Manhattan,
    /// `max(|a_k - b_k|)`
    Chebyshev,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Euclidean, Metric::Manhattan, Metric::Chebyshev];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
            Metric::Chebyshev => "chebyshev",
        }
    }

    /// Distance between two points, which must have the same length.
    pub fn distance(&self, a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> Result<f64> {
        if a.len() != b.len() {
            return Err(ClusterError::invalid_input(format!(
                "dimension mismatch: {} vs {} features",
                a.len(),
                b.len()
            )));
        }
        Ok(self.pair_distance(a, b))
    }

    fn pair_distance(&self, a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
        let diffs = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs());
        match self {
            Metric::Euclidean => {
                // Scale by the largest difference so far-apart points do not overflow.
                let scale = diffs.clone().fold(0.0, f64::max);
                if scale == 0.0 || !scale.is_finite() {
                    return scale;
                }
                scale * diffs.map(|d| (d / scale).powi(2)).sum::<f64>().sqrt()
            }
            Metric::Manhattan => diffs.sum(),
            Metric::Chebyshev => diffs.fold(0.0, f64::max),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" => Ok(Metric::Euclidean),
            "manhattan" => Ok(Metric::Manhattan),
            "chebyshev" => Ok(Metric::Chebyshev),
            _ => Err(ClusterError::invalid_input(format!(
                "metric '{}' is not supported. Must be 'euclidean', 'manhattan' or 'chebyshev'",
                s
            ))),
        }
    }
}

/// Where the dissimilarities come from: a built-in metric or a custom function.
#[derive(Clone, Copy)]
pub enum DistanceSource<'a> {
    Metric(Metric),
    Custom(&'a DistanceFn<'a>),
}

impl fmt::Debug for DistanceSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceSource::Metric(metric) => f.debug_tuple("Metric").field(metric).finish(),
            DistanceSource::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<Metric> for DistanceSource<'_> {
    fn from(metric: Metric) -> Self {
        DistanceSource::Metric(metric)
    }
}

/// Builds a point matrix from row vectors, rejecting ragged input.
pub fn points_from_rows(rows: &[Vec<f64>]) -> Result<Matrix> {
    let n_features = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_features) {
        return Err(ClusterError::invalid_input(format!(
            "points must be 2-dimensional (samples x features): \
             row {} has {} features, expected {}",
            i,
            row.len(),
            n_features
        )));
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Matrix::from_shape_vec((rows.len(), n_features), flat)
        .map_err(|e| ClusterError::invalid_input(e.to_string()))
}

fn check_points(x: &ArrayView2<f64>) -> Result<()> {
    if x.nrows() > 0 && x.ncols() == 0 {
        return Err(ClusterError::invalid_input(
            "points must have at least one feature",
        ));
    }
    if let Some(((i, k), v)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(ClusterError::invalid_input(format!(
            "point {} has a non-finite value {} in feature {}",
            i, v, k
        )));
    }
    Ok(())
}

/// N×N distance matrix under a built-in metric.
pub fn pairwise_distances(x: &Matrix, metric: Metric) -> Result<Matrix> {
    compute_distance_matrix(x.view(), DistanceSource::Metric(metric), false)
}

/// N×N distance matrix under a custom function, evaluated once per unordered pair.
pub fn custom_pairwise_distances<F>(x: &Matrix, metric_fn: F) -> Result<Matrix>
where
    F: Fn(ArrayView1<f64>, ArrayView1<f64>) -> f64 + Send + Sync,
{
    compute_distance_matrix(x.view(), DistanceSource::Custom(&metric_fn), false)
}

/// Computes the symmetric, zero-diagonal distance matrix of `x`.
///
/// With `parallel` set (and the `parallel` feature enabled) the rows of the
/// upper triangle are computed on the rayon pool. The output is identical
/// either way.
pub fn compute_distance_matrix(
    x: ArrayView2<f64>,
    source: DistanceSource<'_>,
    parallel: bool,
) -> Result<Matrix> {
    check_points(&x)?;
    let n = x.nrows();
    debug!(
        "Computing {}x{} distance matrix ({:?}, {} features, parallel={})",
        n,
        n,
        source,
        x.ncols(),
        parallel
    );

    let dist = match source {
        DistanceSource::Metric(metric) => {
            symmetric_matrix(n, parallel, |i, j| metric.pair_distance(&x.row(i), &x.row(j)))
        }
        DistanceSource::Custom(metric_fn) => {
            symmetric_matrix(n, parallel, |i, j| metric_fn(x.row(i), x.row(j)))
        }
    };
    Ok(dist)
}

/// Checks that a precomputed matrix is a square, symmetric dissimilarity
/// matrix with a zero diagonal.
///
/// Entries may be `+inf` (never neighbors) but not negative or NaN.
pub fn validate_distance_matrix(dist: &Matrix) -> Result<()> {
    if dist.nrows() != dist.ncols() {
        return Err(ClusterError::invalid_input(format!(
            "distance matrix must be square, got {}x{}",
            dist.nrows(),
            dist.ncols()
        )));
    }
    if let Some(((i, j), d)) = dist.indexed_iter().find(|(_, d)| d.is_nan() || **d < 0.0) {
        return Err(ClusterError::invalid_input(format!(
            "distance between {} and {} must be non-negative, got {}",
            i, j, d
        )));
    }
    if let Some(i) = (0..dist.nrows()).find(|&i| dist[[i, i]] != 0.0) {
        return Err(ClusterError::invalid_input(format!(
            "distance of point {} to itself must be 0, got {}",
            i,
            dist[[i, i]]
        )));
    }
    if let Some(((i, j), d)) = dist.indexed_iter().find(|&((i, j), d)| *d != dist[[j, i]]) {
        return Err(ClusterError::invalid_input(format!(
            "distance matrix must be symmetric: d[{}][{}]={} but d[{}][{}]={}",
            i,
            j,
            d,
            j,
            i,
            dist[[j, i]]
        )));
    }
    Ok(())
}

fn symmetric_matrix<F>(n: usize, parallel: bool, pair: F) -> Matrix
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    let upper = upper_triangle(n, parallel, &pair);

    let mut dist = Matrix::zeros((n, n));
    for (i, row) in upper.into_iter().enumerate() {
        for (offset, d) in row.into_iter().enumerate() {
            let j = i + 1 + offset;
            dist[[i, j]] = d;
            dist[[j, i]] = d;
        }
    }
    dist
}

fn upper_row<F>(i: usize, n: usize, pair: &F) -> Vec<f64>
where
    F: Fn(usize, usize) -> f64,
{
    ((i + 1)..n).map(|j| pair(i, j)).collect()
}

#[cfg(feature = "parallel")]
fn upper_triangle<F>(n: usize, parallel: bool, pair: &F) -> Vec<Vec<f64>>
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    if parallel {
        (0..n).into_par_iter().map(|i| upper_row(i, n, pair)).collect()
    } else {
        (0..n).map(|i| upper_row(i, n, pair)).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn upper_triangle<F>(n: usize, _parallel: bool, pair: &F) -> Vec<Vec<f64>>
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    (0..n).map(|i| upper_row(i, n, pair)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_metric_values() {
        let x = array![[0.0, 0.0], [3.0, -4.0]];

        let euclidean = pairwise_distances(&x, Metric::Euclidean).unwrap();
        let manhattan = pairwise_distances(&x, Metric::Manhattan).unwrap();
        let chebyshev = pairwise_distances(&x, Metric::Chebyshev).unwrap();

        assert!((euclidean[[0, 1]] - 5.0).abs() < 1e-12);
        assert!((manhattan[[0, 1]] - 7.0).abs() < 1e-12);
        assert!((chebyshev[[0, 1]] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_zero_diagonal() {
        let x = array![[0.0, 1.0, 2.0], [1.5, -2.0, 0.3], [4.0, 4.0, 4.0], [0.1, 0.2, 0.3]];

        for metric in Metric::ALL {
            let dist = pairwise_distances(&x, metric).unwrap();
            assert_eq!(dist.shape(), &[4, 4]);
            for i in 0..4 {
                assert_eq!(dist[[i, i]], 0.0);
                for j in 0..4 {
                    assert_eq!(dist[[i, j]], dist[[j, i]]);
                    assert!(dist[[i, j]] >= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("euclidean".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert_eq!("Manhattan".parse::<Metric>().unwrap(), Metric::Manhattan);
        assert_eq!("CHEBYSHEV".parse::<Metric>().unwrap(), Metric::Chebyshev);

        let err = "cosine".parse::<Metric>().unwrap_err();
        assert!(matches!(err, ClusterError::InvalidInput(_)));
    }

    #[test]
    fn test_custom_distance_called_once_per_pair() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let x = array![[0.0], [1.0], [3.0], [6.0]];
        let calls = AtomicUsize::new(0);
        let dist = custom_pairwise_distances(&x, |a, b| {
            calls.fetch_add(1, Ordering::Relaxed);
            (a[0] - b[0]).abs() * 2.0
        })
        .unwrap();

        // 4 choose 2
        assert_eq!(calls.load(Ordering::Relaxed), 6);
        assert_eq!(dist[[0, 3]], 12.0);
        assert_eq!(dist[[3, 0]], 12.0);
        assert_eq!(dist[[2, 2]], 0.0);
    }

    #[test]
    fn test_points_from_rows() {
        let x = points_from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(x, array![[1.0, 2.0], [3.0, 4.0]]);

        let err = points_from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, ClusterError::InvalidInput(_)));

        let empty = points_from_rows(&[]).unwrap();
        assert_eq!(empty.nrows(), 0);
    }

    #[test]
    fn test_rejects_malformed_points() {
        let no_features = Matrix::zeros((3, 0));
        assert!(pairwise_distances(&no_features, Metric::Euclidean).is_err());

        let nan = array![[0.0, f64::NAN], [1.0, 1.0]];
        assert!(pairwise_distances(&nan, Metric::Euclidean).is_err());
    }

    #[test]
    fn test_empty_points() {
        let x = Matrix::zeros((0, 2));
        let dist = pairwise_distances(&x, Metric::Manhattan).unwrap();
        assert_eq!(dist.shape(), &[0, 0]);
    }

    #[test]
    fn test_validate_distance_matrix() {
        assert!(validate_distance_matrix(&array![[0.0, 1.0], [1.0, 0.0]]).is_ok());
        let inf = f64::INFINITY;
        assert!(validate_distance_matrix(&array![[0.0, inf], [inf, 0.0]]).is_ok());
        assert!(validate_distance_matrix(&Matrix::zeros((2, 3))).is_err());
        assert!(validate_distance_matrix(&array![[0.0, -1.0], [-1.0, 0.0]]).is_err());
        assert!(validate_distance_matrix(&array![[0.0, f64::NAN], [f64::NAN, 0.0]]).is_err());
    }

    #[test]
    fn test_validate_rejects_nonzero_diagonal() {
        let err = validate_distance_matrix(&array![[2.0, 0.1], [0.1, 2.0]]).unwrap_err();
        assert!(matches!(err, ClusterError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_rejects_asymmetric() {
        let err = validate_distance_matrix(&array![[0.0, 0.1], [9.0, 0.0]]).unwrap_err();
        assert!(matches!(err, ClusterError::InvalidInput(_)));
    }

    #[test]
    fn test_single_pair_dimension_mismatch() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0, 100.0];
        for metric in Metric::ALL {
            let err = metric.distance(&a.view(), &b.view()).unwrap_err();
            assert!(matches!(err, ClusterError::InvalidInput(_)));
        }

        let c = array![3.0, 4.0];
        assert_eq!(Metric::Euclidean.distance(&a.view(), &c.view()).unwrap(), 5.0);
    }

    #[test]
    fn test_euclidean_does_not_overflow() {
        let a = array![0.0, 0.0];
        let b = array![1e200, 1e200];
        let d = Metric::Euclidean.distance(&a.view(), &b.view()).unwrap();
        assert!(d.is_finite());
        assert!((d / 1e200 - 2f64.sqrt()).abs() < 1e-12);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let x = Matrix::from_shape_fn((40, 3), |(i, k)| ((i * 7 + k * 3) % 11) as f64 * 0.37);
        for metric in Metric::ALL {
            let seq = compute_distance_matrix(x.view(), metric.into(), false).unwrap();
            let par = compute_distance_matrix(x.view(), metric.into(), true).unwrap();
            assert_eq!(seq, par);
        }
    }
}
