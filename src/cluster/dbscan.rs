use crate::distance::{
    compute_distance_matrix, validate_distance_matrix, DistanceFn, DistanceSource, Metric,
};
use crate::error::{ClusterError, Result};
use crate::{Labels, Matrix};
use log::{debug, info, trace};
use ndarray::{Array1, ArrayView1, ArrayView2};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Label of a point that belongs to no cluster.
pub const NOISE: isize = -1;

/// Role of a point after clustering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PointType {
    /// Has at least `min_samples` points within `eps`.
    Core,
    /// Not core, but inside the neighborhood of a core point.
    Border,
    /// Reached by no cluster.
    Noise,
}

impl PointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointType::Core => "core",
            PointType::Border => "border",
            PointType::Noise => "noise",
        }
    }
}

impl fmt::Display for PointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Parameters of a single DBSCAN run.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DbscanParams {
    /// Neighborhood radius. Points at distance `<= eps` are neighbors.
    pub eps: f64,
    /// Neighbor count a point needs to be core.
    pub min_samples: usize,
    /// Ignored when a custom distance function is supplied.
    pub metric: Metric,
    /// Whether a point counts itself towards `min_samples`.
    pub include_self: bool,
}

impl Default for DbscanParams {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_samples: 5,
            metric: Metric::Euclidean,
            include_self: true,
        }
    }
}

impl DbscanParams {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self {
            eps,
            min_samples,
            ..Self::default()
        }
    }

    pub fn metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn include_self(mut self, include_self: bool) -> Self {
        self.include_self = include_self;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(ClusterError::invalid_parameter(
                "eps",
                format!("must be a finite value > 0, got {}", self.eps),
            ));
        }
        if self.min_samples < 1 {
            return Err(ClusterError::invalid_parameter(
                "min_samples",
                format!("must be >= 1, got {}", self.min_samples),
            ));
        }
        Ok(())
    }
}

/// Labels and point classifications produced by one run.
#[derive(Clone, Debug, PartialEq)]
pub struct DbscanResult {
    /// `NOISE` or a cluster id in `0..n_clusters`, numbered in discovery order.
    pub labels: Labels,
    pub point_types: Array1<PointType>,
    /// Core flag of every point, fixed before expansion.
    pub core_flags: Array1<bool>,
}

impl DbscanResult {
    fn empty() -> Self {
        Self {
            labels: Labels::zeros(0),
            point_types: Array1::from_vec(Vec::new()),
            core_flags: Array1::from_elem(0, false),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_clusters(&self) -> usize {
        self.labels
            .iter()
            .copied()
            .max()
            .map_or(0, |max| (max + 1).max(0) as usize)
    }

    pub fn n_noise(&self) -> usize {
        self.count(PointType::Noise)
    }

    pub fn n_core(&self) -> usize {
        self.count(PointType::Core)
    }

    pub fn n_border(&self) -> usize {
        self.count(PointType::Border)
    }

    fn count(&self, point_type: PointType) -> usize {
        self.point_types.iter().filter(|&&t| t == point_type).count()
    }

    pub fn core_sample_indices(&self) -> Vec<usize> {
        self.core_flags
            .iter()
            .enumerate()
            .filter(|&(_, &core)| core)
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of the points labelled `cluster_id`, in ascending order.
    pub fn cluster_members(&self, cluster_id: isize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label == cluster_id)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Clusters the rows of `x` under `params.metric`.
pub fn dbscan(x: &Matrix, params: &DbscanParams) -> Result<DbscanResult> {
    dbscan_with(x.view(), params, DistanceSource::Metric(params.metric), false)
}

/// Clusters the rows of `x` with distances taken from `source`.
pub fn dbscan_with(
    x: ArrayView2<f64>,
    params: &DbscanParams,
    source: DistanceSource<'_>,
    parallel: bool,
) -> Result<DbscanResult> {
    params.validate()?;
    if x.nrows() == 0 {
        return Ok(DbscanResult::empty());
    }

    let dist = compute_distance_matrix(x, source, parallel)?;
    if let DistanceSource::Custom(_) = source {
        validate_distance_matrix(&dist)?;
    }
    Ok(run(&dist, params))
}

/// Clusters from an already computed N×N dissimilarity matrix.
pub fn dbscan_precomputed(dist: &Matrix, params: &DbscanParams) -> Result<DbscanResult> {
    params.validate()?;
    validate_distance_matrix(dist)?;
    Ok(run(dist, params))
}

fn run(dist: &Matrix, params: &DbscanParams) -> DbscanResult {
    let neighbors = neighborhoods(dist, params.eps, params.include_self);
    let core_flags: Array1<bool> = neighbors
        .iter()
        .map(|nb| nb.len() >= params.min_samples)
        .collect();

    debug!(
        "{} points, {} core (eps={}, min_samples={}, include_self={}), mean neighborhood {:.2}",
        neighbors.len(),
        core_flags.iter().filter(|&&c| c).count(),
        params.eps,
        params.min_samples,
        params.include_self,
        neighbors.iter().map(Vec::len).sum::<usize>() as f64 / neighbors.len().max(1) as f64
    );

    let labels = expand_clusters(&neighbors, &core_flags, Worklist::Stack);
    let point_types = classify(&labels, &core_flags);
    let result = DbscanResult {
        labels,
        point_types,
        core_flags,
    };

    info!(
        "DBSCAN found {} clusters ({} core, {} border, {} noise)",
        result.n_clusters(),
        result.n_core(),
        result.n_border(),
        result.n_noise()
    );
    result
}

/// `neighbors[i]` holds every `j` with `dist[i][j] <= eps`, ascending.
fn neighborhoods(dist: &Matrix, eps: f64, include_self: bool) -> Vec<Vec<usize>> {
    dist.outer_iter()
        .enumerate()
        .map(|(i, row)| {
            row.iter()
                .enumerate()
                .filter(|&(j, &d)| d <= eps && (include_self || j != i))
                .map(|(j, _)| j)
                .collect()
        })
        .collect()
}

/// Pop order of the expansion worklist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Worklist {
    Stack,
    #[cfg_attr(not(test), allow(dead_code))]
    Queue,
}

/// Assigns cluster ids by scanning points in index order and growing each
/// cluster from its first core point.
///
/// Only core points push their neighborhoods, and a label only ever moves
/// from `NOISE` to a cluster id, so membership does not depend on `order`.
fn expand_clusters(
    neighbors: &[Vec<usize>],
    core_flags: &Array1<bool>,
    order: Worklist,
) -> Labels {
    let n = neighbors.len();
    let mut labels = Labels::from_elem(n, NOISE);
    let mut visited = vec![false; n];
    let mut cluster_id: isize = 0;

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        // Non-core points stay noise until some cluster reaches them.
        if !core_flags[i] {
            continue;
        }

        trace!("Opening cluster {} at point {}", cluster_id, i);
        labels[i] = cluster_id;
        let mut worklist: VecDeque<usize> = neighbors[i].iter().copied().collect();

        loop {
            let next = match order {
                Worklist::Stack => worklist.pop_back(),
                Worklist::Queue => worklist.pop_front(),
            };
            let Some(j) = next else {
                break;
            };

            if !visited[j] {
                visited[j] = true;
                if core_flags[j] {
                    worklist.extend(neighbors[j].iter().copied());
                }
            }
            if labels[j] == NOISE {
                labels[j] = cluster_id;
            }
        }

        cluster_id += 1;
    }

    labels
}

/// Final classification, derived only from labels and core flags.
fn classify(labels: &Labels, core_flags: &Array1<bool>) -> Array1<PointType> {
    labels
        .iter()
        .zip(core_flags.iter())
        .map(|(&label, &core)| match (label, core) {
            (NOISE, _) => PointType::Noise,
            (_, true) => PointType::Core,
            (_, false) => PointType::Border,
        })
        .collect()
}

/// DBSCAN estimator with the usual `fit` / `fit_predict` interface.
///
/// ```rust
/// use densecluster::{DBSCAN, Metric};
/// use ndarray::array;
///
/// let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [10.0, 10.0]];
/// let mut dbscan = DBSCAN::new(1.5, 2).metric(Metric::Euclidean);
/// let labels = dbscan.fit_predict(&x).unwrap();
/// assert_eq!(labels.to_vec(), vec![0, 0, 0, -1]);
/// ```
#[derive(Clone)]
pub struct DBSCAN {
    params: DbscanParams,
    distance_fn: Option<Arc<DistanceFn<'static>>>,
    parallel: bool,
    result: Option<DbscanResult>,
}

impl fmt::Debug for DBSCAN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DBSCAN")
            .field("params", &self.params)
            .field("custom_distance", &self.distance_fn.is_some())
            .field("parallel", &self.parallel)
            .field("fitted", &self.result.is_some())
            .finish()
    }
}

impl DBSCAN {
    /// Parameters are checked by `fit`, before any distance is computed.
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self::from_params(DbscanParams::new(eps, min_samples))
    }

    pub fn from_params(params: DbscanParams) -> Self {
        Self {
            params,
            distance_fn: None,
            parallel: true,
            result: None,
        }
    }

    pub fn metric(mut self, metric: Metric) -> Self {
        self.params.metric = metric;
        self
    }

    pub fn include_self(mut self, include_self: bool) -> Self {
        self.params.include_self = include_self;
        self
    }

    /// Replaces the metric with a custom distance function.
    pub fn distance_fn<F>(mut self, distance_fn: F) -> Self
    where
        F: Fn(ArrayView1<f64>, ArrayView1<f64>) -> f64 + Send + Sync + 'static,
    {
        self.distance_fn = Some(Arc::new(distance_fn));
        self
    }

    /// Compute the distance matrix on the rayon pool (needs the `parallel` feature).
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn params(&self) -> &DbscanParams {
        &self.params
    }

    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        let source = match &self.distance_fn {
            Some(distance_fn) => DistanceSource::Custom(distance_fn.as_ref()),
            None => DistanceSource::Metric(self.params.metric),
        };
        let result = dbscan_with(x.view(), &self.params, source, self.parallel)?;
        self.result = Some(result);
        Ok(())
    }

    pub fn fit_predict(&mut self, x: &Matrix) -> Result<Labels> {
        self.fit(x)?;
        Ok(self.result()?.labels.clone())
    }

    pub fn fit_precomputed(&mut self, dist: &Matrix) -> Result<()> {
        let result = dbscan_precomputed(dist, &self.params)?;
        self.result = Some(result);
        Ok(())
    }

    pub fn result(&self) -> Result<&DbscanResult> {
        self.result.as_ref().ok_or(ClusterError::NotFitted("DBSCAN"))
    }

    pub fn labels(&self) -> Option<&Labels> {
        self.result.as_ref().map(|r| &r.labels)
    }

    pub fn point_types(&self) -> Option<&Array1<PointType>> {
        self.result.as_ref().map(|r| &r.point_types)
    }

    pub fn core_sample_indices(&self) -> Option<Vec<usize>> {
        self.result.as_ref().map(DbscanResult::core_sample_indices)
    }

    pub fn get_n_clusters(&self) -> Option<usize> {
        self.result.as_ref().map(DbscanResult::n_clusters)
    }

    pub fn get_n_noise_points(&self) -> Option<usize> {
        self.result.as_ref().map(DbscanResult::n_noise)
    }

    pub fn is_core_sample(&self, sample_idx: usize) -> Option<bool> {
        self.result
            .as_ref()
            .and_then(|r| r.core_flags.get(sample_idx).copied())
    }
}
