#![allow(clippy::needless_range_loop)] // I want these loops!

pub mod dataset;
pub mod errors;
pub mod fit_state;
pub mod k_means;
pub mod mean_shift;
pub mod observer;
pub mod params;
pub mod render;
pub mod synthetic;
pub mod utils;

use faer::MatRef;

pub use crate::dataset::Dataset;
pub use crate::errors::{ClusterError, Result};
pub use crate::fit_state::FitReport;
pub use crate::k_means::KMeans;
pub use crate::mean_shift::MeanShift;
pub use crate::observer::{FitEvent, FitObserver, NoopObserver, RecordingObserver, TracingObserver};
pub use crate::params::{KMeansInit, KMeansParams, MeanShiftParams};
pub use crate::render::{ClusterModel, ClusterRenderer};
pub use crate::utils::ClusterFloat;

/////////////
// k-means //
/////////////

/// Fit k-means on a data matrix
///
/// ### Params
///
/// * `mat` - The data matrix. Rows represent the samples, columns represent
///   the features.
/// * `n_clusters` - Number of clusters. Needs to be `>= 2`.
/// * `distance_threshold` - Centroid displacement under which the iterations
///   stop. Floored to `1e-6`. Defaults to `1e-4`.
/// * `max_iters` - Maximum number of iterations. Defaults to `300`.
/// * `seed` - Random seed for the initial centres
///
/// ### Returns
///
/// The fitted `KMeans` engine
pub fn fit_kmeans<T>(
    mat: MatRef<T>,
    n_clusters: usize,
    distance_threshold: Option<f64>,
    max_iters: Option<usize>,
    seed: u64,
) -> Result<KMeans<T>>
where
    T: ClusterFloat,
{
    let mut params = KMeansParams::new(n_clusters)?.with_seed(seed);
    if let Some(threshold) = distance_threshold {
        params = params.with_distance_threshold(threshold);
    }
    if let Some(max_iters) = max_iters {
        params = params.with_max_iters(max_iters)?;
    }

    let mut kmeans = KMeans::new(params);
    kmeans.fit(mat)?;
    Ok(kmeans)
}

////////////////
// Mean shift //
////////////////

/// Fit mean shift on a data matrix
///
/// ### Params
///
/// * `mat` - The data matrix. Rows represent the samples, columns represent
///   the features.
/// * `window_size` - Kernel bandwidth and membership radius. Defaults to
///   `0.15`.
/// * `distance_threshold` - Point displacement at which a point freezes.
///   Floored to `1e-6`. Defaults to `1e-3`.
/// * `max_iters` - Maximum number of shift passes. Defaults to `1000`.
///
/// ### Returns
///
/// The fitted `MeanShift` engine
pub fn fit_mean_shift<T>(
    mat: MatRef<T>,
    window_size: Option<f64>,
    distance_threshold: Option<f64>,
    max_iters: Option<usize>,
) -> Result<MeanShift<T>>
where
    T: ClusterFloat,
{
    let mut params = MeanShiftParams::new();
    if let Some(window_size) = window_size {
        params = params.with_window_size(window_size)?;
    }
    if let Some(threshold) = distance_threshold {
        params = params.with_distance_threshold(threshold);
    }
    if let Some(max_iters) = max_iters {
        params = params.with_max_iters(max_iters)?;
    }

    let mut mean_shift = MeanShift::new(params);
    mean_shift.fit(mat)?;
    Ok(mean_shift)
}

///////////
// Tests //
///////////
