use crate::distance::points_from_rows;
use crate::error::{ClusterError, Result};
use crate::Matrix;
use ndarray::{Array1, Axis};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f64::consts::PI;

pub mod iris;

pub use iris::load_iris;

/// A point set plus optional ground truth, used only for reporting.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub features: Matrix,
    pub targets: Option<Array1<usize>>,
    pub feature_names: Option<Vec<String>>,
    pub target_names: Option<Vec<String>>,
}

impl Dataset {
    pub fn new(features: Matrix, targets: Option<Array1<usize>>) -> Result<Self> {
        if let Some(targets) = &targets {
            if features.nrows() != targets.len() {
                return Err(ClusterError::invalid_input(format!(
                    "numbers of samples in features ({}) and targets ({}) must match",
                    features.nrows(),
                    targets.len()
                )));
            }
        }

        Ok(Self {
            features,
            targets,
            feature_names: None,
            target_names: None,
        })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        Self::new(points_from_rows(rows)?, None)
    }

    pub fn with_feature_names<S: Into<String>>(mut self, names: Vec<S>) -> Result<Self> {
        if names.len() != self.n_features() {
            return Err(ClusterError::invalid_input(format!(
                "got {} feature names for {} features",
                names.len(),
                self.n_features()
            )));
        }
        self.feature_names = Some(names.into_iter().map(Into::into).collect());
        Ok(self)
    }

    pub fn with_target_names<S: Into<String>>(mut self, names: Vec<S>) -> Self {
        self.target_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn n_classes(&self) -> usize {
        match (&self.target_names, &self.targets) {
            (Some(names), _) => names.len(),
            (None, Some(targets)) => targets.iter().max().map_or(0, |&m| m + 1),
            (None, None) => 0,
        }
    }

    /// Keeps only the given feature columns, in the given order.
    pub fn select_features(&self, columns: &[usize]) -> Result<Self> {
        if let Some(&bad) = columns.iter().find(|&&c| c >= self.n_features()) {
            return Err(ClusterError::invalid_input(format!(
                "feature index {} out of range for {} features",
                bad,
                self.n_features()
            )));
        }

        Ok(Self {
            features: self.features.select(Axis(1), columns),
            targets: self.targets.clone(),
            feature_names: self
                .feature_names
                .as_ref()
                .map(|names| columns.iter().map(|&c| names[c].clone()).collect()),
            target_names: self.target_names.clone(),
        })
    }
}

fn check_generator_args(n_samples: usize, noise: f64) -> Result<()> {
    if n_samples == 0 {
        return Err(ClusterError::invalid_parameter("n_samples", "must be > 0, got 0"));
    }
    if !noise.is_finite() || noise < 0.0 {
        return Err(ClusterError::invalid_parameter(
            "noise",
            format!("must be >= 0, got {}", noise),
        ));
    }
    Ok(())
}

fn add_gaussian_noise(features: &mut Matrix, std_dev: f64, rng: &mut StdRng) -> Result<()> {
    if std_dev == 0.0 {
        return Ok(());
    }
    let normal = Normal::new(0.0, std_dev)
        .map_err(|e| ClusterError::invalid_parameter("noise", e.to_string()))?;
    *features += &Matrix::random_using(features.raw_dim(), normal, rng);
    Ok(())
}

fn half_circle(n: usize) -> impl Iterator<Item = f64> {
    // n evenly spaced angles over [0, pi], both ends included
    (0..n).map(move |i| if n > 1 { PI * i as f64 / (n - 1) as f64 } else { 0.0 })
}

/// Two interleaving half circles. The first `n_samples / 2` points are the
/// upper moon (target 0), the rest the lower moon (target 1).
pub fn make_moons(n_samples: usize, noise: f64, seed: u64) -> Result<Dataset> {
    check_generator_args(n_samples, noise)?;
    let n_outer = n_samples / 2;
    let n_inner = n_samples - n_outer;

    let outer = half_circle(n_outer).map(|t| [t.cos(), t.sin()]);
    let inner = half_circle(n_inner).map(|t| [1.0 - t.cos(), 0.5 - t.sin()]);
    let flat: Vec<f64> = outer.chain(inner).flatten().collect();

    let mut features = Matrix::from_shape_vec((n_samples, 2), flat)
        .map_err(|e| ClusterError::invalid_input(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed);
    add_gaussian_noise(&mut features, noise, &mut rng)?;

    let targets = Array1::from_shape_fn(n_samples, |i| usize::from(i >= n_outer));
    Ok(Dataset::new(features, Some(targets))?
        .with_feature_names(vec!["x1", "x2"])?
        .with_target_names(vec!["moon_0", "moon_1"]))
}

/// A large circle containing a smaller one scaled by `factor`. Target 0 is
/// the outer circle.
pub fn make_circles(n_samples: usize, noise: f64, factor: f64, seed: u64) -> Result<Dataset> {
    check_generator_args(n_samples, noise)?;
    if !(factor > 0.0 && factor < 1.0) {
        return Err(ClusterError::invalid_parameter(
            "factor",
            format!("must be in (0, 1), got {}", factor),
        ));
    }
    let n_outer = n_samples / 2;
    let n_inner = n_samples - n_outer;

    let ring = |n: usize, radius: f64| {
        (0..n).map(move |i| {
            let t = 2.0 * PI * i as f64 / n as f64;
            [radius * t.cos(), radius * t.sin()]
        })
    };
    let flat: Vec<f64> = ring(n_outer, 1.0).chain(ring(n_inner, factor)).flatten().collect();

    let mut features = Matrix::from_shape_vec((n_samples, 2), flat)
        .map_err(|e| ClusterError::invalid_input(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed);
    add_gaussian_noise(&mut features, noise, &mut rng)?;

    let targets = Array1::from_shape_fn(n_samples, |i| usize::from(i >= n_outer));
    Ok(Dataset::new(features, Some(targets))?
        .with_feature_names(vec!["x1", "x2"])?
        .with_target_names(vec!["circle_outer", "circle_inner"]))
}

/// Isotropic Gaussian blobs, `n_per_center` points around each row of `centers`.
pub fn make_blobs(
    centers: &Matrix,
    n_per_center: usize,
    cluster_std: f64,
    seed: u64,
) -> Result<Dataset> {
    check_generator_args(centers.nrows() * n_per_center, cluster_std)?;

    let rows: Vec<usize> = (0..centers.nrows())
        .flat_map(|c| std::iter::repeat_n(c, n_per_center))
        .collect();
    let mut features = centers.select(Axis(0), &rows);
    let mut rng = StdRng::seed_from_u64(seed);
    add_gaussian_noise(&mut features, cluster_std, &mut rng)?;

    let targets = Array1::from_vec(rows);
    Dataset::new(features, Some(targets))
}
