use approx::assert_abs_diff_eq;
use densecluster::dataset::make_moons;
use densecluster::distance::{custom_pairwise_distances, pairwise_distances};
use densecluster::{
    dbscan, dbscan_precomputed, ClusterError, DbscanParams, DbscanResult, Matrix, Metric,
    PointType, DBSCAN, NOISE,
};
use ndarray::array;

fn square_with_outlier() -> Matrix {
    array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [10.0, 10.0]]
}

/// Checks the structural guarantees every result must satisfy.
fn assert_consistent(x: &Matrix, params: &DbscanParams, result: &DbscanResult) {
    let dist = pairwise_distances(x, params.metric).unwrap();
    let n = x.nrows();
    let neighbors = |i: usize| {
        (0..n)
            .filter(|&j| dist[[i, j]] <= params.eps && (params.include_self || i != j))
            .collect::<Vec<_>>()
    };

    for i in 0..n {
        let nb = neighbors(i);
        assert_eq!(result.core_flags[i], nb.len() >= params.min_samples, "core flag of {}", i);

        let expected = match (result.labels[i], result.core_flags[i]) {
            (NOISE, _) => PointType::Noise,
            (_, true) => PointType::Core,
            (_, false) => PointType::Border,
        };
        assert_eq!(result.point_types[i], expected, "type of {}", i);

        if result.core_flags[i] {
            for &j in &nb {
                assert_ne!(result.labels[j], NOISE, "{} is a neighbor of core {}", j, i);
                if result.core_flags[j] {
                    assert_eq!(result.labels[i], result.labels[j]);
                }
            }
        }

        if result.point_types[i] == PointType::Border {
            let anchored = (0..n).any(|j| {
                result.core_flags[j]
                    && result.labels[j] == result.labels[i]
                    && neighbors(j).contains(&i)
            });
            assert!(anchored, "border point {} has no core neighbor in its cluster", i);
        }
    }

    // cluster ids are 0..K-1, each opened by a core point
    for k in 0..result.n_clusters() as isize {
        let members = result.cluster_members(k);
        assert!(members.iter().any(|&i| result.core_flags[i]));
    }
}

#[test]
fn scenario_square_and_outlier() {
    let x = square_with_outlier();
    let params = DbscanParams::new(1.5, 2);
    let result = dbscan(&x, &params).unwrap();

    assert_eq!(result.labels.to_vec(), vec![0, 0, 0, NOISE]);
    assert_eq!(
        result.point_types.to_vec(),
        vec![PointType::Core, PointType::Core, PointType::Core, PointType::Noise]
    );
    assert_consistent(&x, &params, &result);
}

#[test]
fn scenario_threshold_too_high() {
    let x = square_with_outlier();
    let params = DbscanParams::new(1.5, 4);
    let result = dbscan(&x, &params).unwrap();

    assert_eq!(result.labels.to_vec(), vec![NOISE; 4]);
    assert_eq!(result.n_clusters(), 0);
    assert_eq!(result.n_noise(), 4);
}

#[test]
fn scenario_chain() {
    let x = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
    let params = DbscanParams::new(1.0, 2);
    let result = dbscan(&x, &params).unwrap();

    assert_eq!(result.labels.to_vec(), vec![0, 0, 0, 0]);
    assert_eq!(result.n_core(), 4);
    assert_eq!(result.n_border(), 0);

    // Endpoints have only two neighbors, so a threshold of 3 makes them border.
    let params = DbscanParams::new(1.0, 3);
    let result = dbscan(&x, &params).unwrap();
    assert_eq!(result.labels.to_vec(), vec![0, 0, 0, 0]);
    assert_eq!(
        result.point_types.to_vec(),
        vec![PointType::Border, PointType::Core, PointType::Core, PointType::Border]
    );
    assert_consistent(&x, &params, &result);
}

#[test]
fn metric_changes_core_status() {
    let x = array![[0.0, 0.0], [0.8, 0.8]];

    let euclidean = dbscan(&x, &DbscanParams::new(1.0, 2).metric(Metric::Euclidean)).unwrap();
    let chebyshev = dbscan(&x, &DbscanParams::new(1.0, 2).metric(Metric::Chebyshev)).unwrap();

    assert_eq!(euclidean.point_types[0], PointType::Noise);
    assert_eq!(chebyshev.point_types[0], PointType::Core);
}

#[test]
fn empty_input() {
    let x = Matrix::zeros((0, 2));
    let result = dbscan(&x, &DbscanParams::new(0.5, 3)).unwrap();
    assert!(result.is_empty());
    assert!(result.point_types.is_empty());
}

#[test]
fn single_point_is_its_own_cluster() {
    let x = array![[4.0, 2.0]];
    let result = dbscan(&x, &DbscanParams::new(0.5, 1)).unwrap();

    assert_eq!(result.labels.to_vec(), vec![0]);
    assert_eq!(result.point_types[0], PointType::Core);

    let excluded = dbscan(&x, &DbscanParams::new(0.5, 1).include_self(false)).unwrap();
    assert_eq!(excluded.labels.to_vec(), vec![NOISE]);
}

#[test]
fn repeated_runs_are_identical() {
    let moons = make_moons(300, 0.08, 11).unwrap();
    let params = DbscanParams::new(0.15, 5);

    let first = dbscan(&moons.features, &params).unwrap();
    let second = dbscan(&moons.features, &params).unwrap();
    assert_eq!(first, second);
}

#[test]
fn noisy_moons_are_consistent_for_every_metric() {
    let moons = make_moons(300, 0.08, 3).unwrap();
    for metric in Metric::ALL {
        for include_self in [true, false] {
            let params = DbscanParams::new(0.15, 5).metric(metric).include_self(include_self);
            let result = dbscan(&moons.features, &params).unwrap();
            assert_consistent(&moons.features, &params, &result);
        }
    }
}

#[test]
fn clean_moons_recover_targets() {
    let moons = make_moons(200, 0.0, 0).unwrap();
    let result = dbscan(&moons.features, &DbscanParams::new(0.1, 3)).unwrap();

    let targets: Vec<isize> = moons.targets.unwrap().iter().map(|&t| t as isize).collect();
    assert_eq!(result.labels.to_vec(), targets);
    assert_eq!(result.n_noise(), 0);
}

#[test]
fn parallel_and_sequential_agree() {
    let moons = make_moons(250, 0.1, 5).unwrap();

    let mut sequential = DBSCAN::new(0.2, 4).parallel(false);
    let mut parallel = DBSCAN::new(0.2, 4).parallel(true);
    sequential.fit(&moons.features).unwrap();
    parallel.fit(&moons.features).unwrap();

    assert_eq!(sequential.result().unwrap(), parallel.result().unwrap());
}

#[test]
fn precomputed_matches_points() {
    let moons = make_moons(120, 0.05, 9).unwrap();
    let params = DbscanParams::new(0.2, 4).metric(Metric::Manhattan);

    let dist = pairwise_distances(&moons.features, Metric::Manhattan).unwrap();
    assert_eq!(
        dbscan_precomputed(&dist, &params).unwrap(),
        dbscan(&moons.features, &params).unwrap()
    );
}

#[test]
fn custom_distance_replaces_metric() {
    let x = square_with_outlier();
    let euclid = |a: ndarray::ArrayView1<f64>, b: ndarray::ArrayView1<f64>| {
        a.iter().zip(b.iter()).map(|(p, q)| (p - q).powi(2)).sum::<f64>().sqrt()
    };

    let custom = custom_pairwise_distances(&x, euclid).unwrap();
    let builtin = pairwise_distances(&x, Metric::Euclidean).unwrap();
    for (c, b) in custom.iter().zip(builtin.iter()) {
        assert_abs_diff_eq!(*c, *b, epsilon = 1e-12);
    }
    assert_abs_diff_eq!(custom[[0, 3]], 200f64.sqrt(), epsilon = 1e-12);

    // Metric is ignored once a distance function is set.
    let mut dbscan = DBSCAN::new(1.5, 2).metric(Metric::Chebyshev).distance_fn(euclid);
    dbscan.fit(&x).unwrap();
    assert_eq!(dbscan.labels().unwrap().to_vec(), vec![0, 0, 0, NOISE]);
}

#[test]
fn negative_custom_distance_is_rejected() {
    let x = square_with_outlier();
    let mut dbscan = DBSCAN::new(1.5, 2).distance_fn(|a, b| a[0] - b[0]);
    assert!(matches!(dbscan.fit(&x), Err(ClusterError::InvalidInput(_))));
}

#[test]
fn parameter_errors() {
    let x = square_with_outlier();
    assert!(matches!(
        dbscan(&x, &DbscanParams::new(0.0, 2)),
        Err(ClusterError::InvalidParameter { name: "eps", .. })
    ));
    assert!(matches!(
        dbscan(&x, &DbscanParams::new(1.0, 0)),
        Err(ClusterError::InvalidParameter { name: "min_samples", .. })
    ));
    assert!(matches!("minkowski".parse::<Metric>(), Err(ClusterError::InvalidInput(_))));
}
