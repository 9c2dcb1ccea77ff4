use densecluster::dataset::{load_iris, make_circles, make_moons, Dataset};
use densecluster::metrics::{contingency, ClusterSummary};
use densecluster::{dbscan, DbscanParams, Metric};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== DBSCAN: core / border / noise ===\n");

    let moons = make_moons(600, 0.06, 42)?;
    run_grid(
        "Two Moons",
        &moons,
        &[
            (Metric::Euclidean, 0.18, 6),
            (Metric::Manhattan, 0.25, 6),
            (Metric::Chebyshev, 0.12, 6),
        ],
    )?;

    let circles = make_circles(700, 0.05, 0.5, 42)?;
    run_grid(
        "Two Circles",
        &circles,
        &[
            (Metric::Euclidean, 0.18, 6),
            (Metric::Manhattan, 0.25, 6),
            (Metric::Chebyshev, 0.10, 6),
        ],
    )?;

    let iris = load_iris()?;
    let petals = iris.select_features(&[2, 3])?;
    run_grid(
        "Iris (petal length, petal width)",
        &petals,
        &[
            (Metric::Euclidean, 0.35, 5),
            (Metric::Euclidean, 0.45, 5),
            (Metric::Euclidean, 0.55, 5),
            (Metric::Euclidean, 0.60, 5),
        ],
    )?;

    let iris_3d = iris.select_features(&[0, 2, 3])?;
    let params = DbscanParams::new(0.55, 5);
    run_grid(
        "Iris (sepal length, petal length, petal width)",
        &iris_3d,
        &[(Metric::Euclidean, params.eps, params.min_samples)],
    )?;

    println!("=== Iris: species per cluster ===");
    print_contingency(&iris_3d, &params)?;

    Ok(())
}

fn run_grid(
    name: &str,
    data: &Dataset,
    configs: &[(Metric, f64, usize)],
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{} ({} samples, {} features)", name, data.n_samples(), data.n_features());
    for &(metric, eps, min_samples) in configs {
        let params = DbscanParams::new(eps, min_samples).metric(metric);
        let result = dbscan(&data.features, &params)?;
        println!(
            "  metric={:<9} eps={:<5} min_samples={} -> {}",
            metric,
            eps,
            min_samples,
            ClusterSummary::from_result(&result)
        );
    }
    println!();
    Ok(())
}

fn print_contingency(
    data: &Dataset,
    params: &DbscanParams,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = dbscan(&data.features, params)?;
    let Some(targets) = &data.targets else {
        return Ok(());
    };
    let table = contingency(&result.labels, targets, data.n_classes())?;
    let names = class_names(data);

    for (row, counts) in table.outer_iter().enumerate() {
        let label = if row == 0 {
            "Noise (-1)".to_string()
        } else {
            format!("Cluster {}", row - 1)
        };
        let cells: Vec<String> = names
            .iter()
            .zip(counts.iter())
            .map(|(name, count)| format!("{}={}", name, count))
            .collect();
        println!("  {}: {} | total={}", label, cells.join(", "), counts.sum());
    }
    Ok(())
}

fn class_names(data: &Dataset) -> Vec<String> {
    data.target_names
        .clone()
        .unwrap_or_else(|| (0..data.n_classes()).map(|c| format!("class_{}", c)).collect())
}

