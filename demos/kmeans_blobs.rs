mod commons;
use clap::Parser;
use cluster_shift_rs::synthetic::{gaussian_cluster, generate_blobs};
use cluster_shift_rs::*;
use commons::*;
use faer::Mat;
use std::time::Instant;
use thousands::*;

fn main() {
    init_logging();
    let cli = Cli::parse();

    let params = KMeansParams::new(cli.n_clusters)
        .expect("n_clusters needs to be at least 2")
        .with_seed(cli.seed);
    let mut renderer = SummaryRenderer {
        metric: cli.metric,
    };

    // separated clusters
    let (data, _): (Mat<f64>, _) =
        generate_blobs(&separated_centres(), cli.n_points, cli.std, cli.seed);
    println!(
        "Separated blobs: {} points, {} blobs.",
        data.nrows().separate_with_underscores(),
        separated_centres().len()
    );

    let mut kmeans = KMeans::new(params.clone());
    let start = Instant::now();
    let report = kmeans.fit(data.as_ref()).expect("k-means fit failed");
    println!(
        "Fitted in {:.2} ms ({} iterations, converged: {}).",
        start.elapsed().as_secs_f64() * 1000.0,
        report.n_iter,
        report.converged
    );
    kmeans.show(&mut renderer).expect("model is fitted");

    // one merged blob
    let data: Mat<f64> = gaussian_cluster(
        cli.n_points * separated_centres().len(),
        &[1.5, 0.5],
        cli.std * 5.0,
        cli.seed + 1,
    );
    println!(
        "Merged blob: {} points.",
        data.nrows().separate_with_underscores()
    );

    let mut kmeans = KMeans::new(params);
    let start = Instant::now();
    let report = kmeans.fit(data.as_ref()).expect("k-means fit failed");
    println!(
        "Fitted in {:.2} ms ({} iterations, converged: {}).",
        start.elapsed().as_secs_f64() * 1000.0,
        report.n_iter,
        report.converged
    );
    kmeans.show(&mut renderer).expect("model is fitted");
}
