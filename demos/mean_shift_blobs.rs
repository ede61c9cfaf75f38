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

    let params = MeanShiftParams::new()
        .with_window_size(cli.window_size)
        .expect("window_size needs to be non-negative");
    let mut renderer = SummaryRenderer {
        metric: cli.metric,
    };

    // merged blob
    let data: Mat<f64> = gaussian_cluster(cli.n_points, &[1.5, 0.5], cli.std * 5.0, cli.seed);
    println!(
        "Merged blob: {} points, window size {}.",
        data.nrows().separate_with_underscores(),
        cli.window_size
    );

    let mut mean_shift = MeanShift::new(params.clone());
    let start = Instant::now();
    let report = mean_shift.fit(data.as_ref()).expect("mean shift fit failed");
    println!(
        "Fitted in {:.2} ms ({} passes, converged: {}).",
        start.elapsed().as_secs_f64() * 1000.0,
        report.n_iter,
        report.converged
    );
    mean_shift.show(&mut renderer).expect("model is fitted");

    // separated clusters
    let (data, _): (Mat<f64>, _) =
        generate_blobs(&separated_centres(), cli.n_points, cli.std, cli.seed + 1);
    println!(
        "Separated blobs: {} points, {} blobs.",
        data.nrows().separate_with_underscores(),
        separated_centres().len()
    );

    let mut mean_shift = MeanShift::new(params);
    let start = Instant::now();
    let report = mean_shift.fit(data.as_ref()).expect("mean shift fit failed");
    println!(
        "Fitted in {:.2} ms ({} passes, converged: {}).",
        start.elapsed().as_secs_f64() * 1000.0,
        report.n_iter,
        report.converged
    );
    mean_shift.show(&mut renderer).expect("model is fitted");
}
