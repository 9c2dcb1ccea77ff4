//! Density-based clustering.
//!
//! This module provides DBSCAN in two shapes:
//! - `dbscan` / `dbscan_with` / `dbscan_precomputed`: pure functions returning a `DbscanResult`
//! - `DBSCAN`: an estimator with `fit` / `fit_predict`, matching the rest of the crate
//!
//! # Examples
//!
//! ## Estimator
//! ```rust
//! use densecluster::{DBSCAN, Metric, PointType};
//! use ndarray::array;
//!
//! let x = array![
//!     [1.0, 1.0],
//!     [1.2, 1.1],
//!     [1.1, 1.2],
//!     [8.0, 8.0],
//!     [8.1, 8.1],
//!     [8.2, 7.9],
//!     [15.0, 1.0] // Outlier
//! ];
//!
//! let mut dbscan = DBSCAN::new(1.0, 2).metric(Metric::Manhattan);
//! let labels = dbscan.fit_predict(&x).unwrap();
//!
//! assert_eq!(dbscan.get_n_clusters(), Some(2));
//! assert_eq!(dbscan.get_n_noise_points(), Some(1));
//! assert_eq!(labels[6], -1);
//! assert_eq!(dbscan.point_types().unwrap()[6], PointType::Noise);
//! ```
//!
//! ## Function
//! ```rust
//! use densecluster::{dbscan, DbscanParams, Metric};
//! use ndarray::array;
//!
//! let x = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
//! let params = DbscanParams::new(1.0, 2).metric(Metric::Chebyshev);
//! let result = dbscan(&x, &params).unwrap();
//!
//! assert_eq!(result.n_clusters(), 1);
//! assert_eq!(result.n_core(), 4);
//! ```

mod dbscan;

pub use dbscan::{
    dbscan, dbscan_precomputed, dbscan_with, DbscanParams, DbscanResult, PointType, DBSCAN, NOISE,
};
