#![allow(dead_code)]

use clap::{Parser, ValueEnum};
use cluster_shift_rs::utils::{euclidean_distance, manhattan_distance, ClusterFloat};
use cluster_shift_rs::ClusterRenderer;
use thousands::*;
use tracing_subscriber::EnvFilter;

////////////
// Consts //
////////////

pub const DEFAULT_N_POINTS: usize = 512;
pub const DEFAULT_STD: f64 = 0.1;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_N_CLUSTERS: usize = 5;
pub const DEFAULT_WINDOW_SIZE: f64 = 0.15;

////////////
// Parser //
////////////

/// Parsing structure
///
/// ### Fields
///
/// * `n_points` - Number of points per blob
/// * `std` - Standard deviation of every blob
/// * `seed` - Random seed for reproducibility
/// * `n_clusters` - Number of k-means clusters
/// * `window_size` - Mean-shift kernel bandwidth
/// * `metric` - Metric for the spread summary
#[derive(Parser)]
pub struct Cli {
    #[arg(long, default_value_t = DEFAULT_N_POINTS)]
    pub n_points: usize,

    #[arg(long, default_value_t = DEFAULT_STD)]
    pub std: f64,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    #[arg(long, default_value_t = DEFAULT_N_CLUSTERS)]
    pub n_clusters: usize,

    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: f64,

    #[arg(long, value_enum, default_value_t = SpreadMetric::Euclidean)]
    pub metric: SpreadMetric,
}

/// Metric of the per-cluster spread column
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SpreadMetric {
    Euclidean,
    Manhattan,
}

impl SpreadMetric {
    fn distance<T: ClusterFloat>(self, a: &[T], b: &[T]) -> T {
        match self {
            SpreadMetric::Euclidean => euclidean_distance(a, b),
            SpreadMetric::Manhattan => manhattan_distance(a, b),
        }
    }
}

/// Install a `tracing` subscriber honouring `RUST_LOG` (defaults to `info`)
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Centres of the "separated clusters" scenario: five blobs along the x-axis
pub fn separated_centres() -> Vec<Vec<f64>> {
    [0.5, 1.0, 1.5, 2.0, 2.5]
        .iter()
        .map(|&cx| vec![cx, 0.5])
        .collect()
}

//////////////
// Renderer //
//////////////

/// Renderer that prints a text summary instead of drawing
///
/// ### Fields
///
/// * `metric` - Metric used for the mean distance of points to their centre
pub struct SummaryRenderer {
    pub metric: SpreadMetric,
}

impl<T> ClusterRenderer<T> for SummaryRenderer
where
    T: ClusterFloat,
{
    fn render(&mut self, clusters: &[Vec<&[T]>], centres: &[&[T]], title: &str) {
        let total: usize = clusters.iter().map(|c| c.len()).sum();

        println!("-----------------------------");
        println!(
            "{}: {} clusters, {} points.",
            title,
            centres.len(),
            total.separate_with_underscores()
        );
        println!("-----------------------------");
        println!(
            "{:>8} {:>10} {:>24} {:>12}",
            "Cluster", "Points", "Centre", "Spread"
        );

        for (c, (points, centre)) in clusters.iter().zip(centres.iter()).enumerate() {
            let spread = if points.is_empty() {
                0.0
            } else {
                points
                    .iter()
                    .map(|p| self.metric.distance(p, centre).to_f64().unwrap_or(f64::NAN))
                    .sum::<f64>()
                    / points.len() as f64
            };
            let centre_str = centre
                .iter()
                .map(|v| format!("{:.3}", v.to_f64().unwrap_or(f64::NAN)))
                .collect::<Vec<_>>()
                .join(", ");

            println!(
                "{:>8} {:>10} {:>24} {:>12.4}",
                c,
                points.len().separate_with_underscores(),
                format!("({})", centre_str),
                spread
            );
        }
        println!("-----------------------------");
    }
}
