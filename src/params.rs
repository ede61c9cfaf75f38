use crate::errors::*;

////////////
// Consts //
////////////

/// Smallest distance threshold either engine accepts. Lower values are
/// floored to this.
pub const MIN_DISTANCE_THRESHOLD: f64 = 1e-6;

/// Default k-means centroid displacement threshold
pub const DEFAULT_KMEANS_THRESHOLD: f64 = 1e-4;

/// Default k-means iteration cap
pub const DEFAULT_KMEANS_MAX_ITERS: usize = 300;

/// Default mean-shift point displacement threshold
pub const DEFAULT_MEAN_SHIFT_THRESHOLD: f64 = 1e-3;

/// Default mean-shift kernel bandwidth
pub const DEFAULT_WINDOW_SIZE: f64 = 0.15;

/// Default mean-shift pass cap
pub const DEFAULT_MEAN_SHIFT_MAX_ITERS: usize = 1000;

/// Default seed for the random initial centres
pub const DEFAULT_SEED: u64 = 42;

/// Floor a distance threshold
///
/// NaN is floored as well, so this never fails.
///
/// ### Params
///
/// * `value` - Requested threshold
///
/// ### Returns
///
/// `max(value, MIN_DISTANCE_THRESHOLD)`
#[inline]
pub fn clamp_threshold(value: f64) -> f64 {
    value.max(MIN_DISTANCE_THRESHOLD)
}

fn check_max_iters(max_iters: usize) -> Result<usize> {
    if max_iters == 0 {
        return Err(ClusterError::InvalidMaxIters);
    }
    Ok(max_iters)
}

/////////////
// k-means //
/////////////

/// How the initial k-means centroids are chosen
#[derive(Clone, Debug, PartialEq, Default)]
pub enum KMeansInit {
    /// `n_clusters` distinct samples drawn uniformly without replacement
    #[default]
    Random,
    /// These exact sample indices, in this order
    Indices(Vec<usize>),
}

/// Validated k-means configuration
///
/// ### Fields
///
/// * `n_clusters` - Number of clusters, at least two
/// * `distance_threshold` - Centroid displacement (Euclidean) under which
///   the iterations stop. Never below `MIN_DISTANCE_THRESHOLD`.
/// * `max_iters` - Maximum number of assign + update iterations
/// * `seed` - Seed for the random initial centres
/// * `init` - Initialisation strategy
#[derive(Clone, Debug, PartialEq)]
pub struct KMeansParams {
    n_clusters: usize,
    distance_threshold: f64,
    max_iters: usize,
    seed: u64,
    init: KMeansInit,
}

impl KMeansParams {
    /// Generate new k-means parameters with defaults for everything but the
    /// number of clusters
    ///
    /// ### Params
    ///
    /// * `n_clusters` - Number of clusters. Needs to be `>= 2`.
    ///
    /// ### Returns
    ///
    /// The parameters or `InvalidClusterCount`
    pub fn new(n_clusters: usize) -> Result<Self> {
        Ok(Self {
            n_clusters: Self::check_n_clusters(n_clusters)?,
            distance_threshold: DEFAULT_KMEANS_THRESHOLD,
            max_iters: DEFAULT_KMEANS_MAX_ITERS,
            seed: DEFAULT_SEED,
            init: KMeansInit::Random,
        })
    }

    fn check_n_clusters(n_clusters: usize) -> Result<usize> {
        if n_clusters < 2 {
            return Err(ClusterError::InvalidClusterCount(n_clusters));
        }
        Ok(n_clusters)
    }

    /// Set the distance threshold (floored, never rejected)
    pub fn with_distance_threshold(mut self, distance_threshold: f64) -> Self {
        self.distance_threshold = clamp_threshold(distance_threshold);
        self
    }

    /// Set the iteration cap
    pub fn with_max_iters(mut self, max_iters: usize) -> Result<Self> {
        self.max_iters = check_max_iters(max_iters)?;
        Ok(self)
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the initialisation strategy
    ///
    /// Explicit indices are checked against the data at fit time.
    pub fn with_init(mut self, init: KMeansInit) -> Self {
        self.init = init;
        self
    }

    /// Change the number of clusters in place
    ///
    /// On error the previous value is kept.
    pub fn set_n_clusters(&mut self, n_clusters: usize) -> Result<()> {
        self.n_clusters = Self::check_n_clusters(n_clusters)?;
        Ok(())
    }

    /// Change the distance threshold in place (floored)
    pub fn set_distance_threshold(&mut self, distance_threshold: f64) {
        self.distance_threshold = clamp_threshold(distance_threshold);
    }

    /// Change the iteration cap in place
    ///
    /// On error the previous value is kept.
    pub fn set_max_iters(&mut self, max_iters: usize) -> Result<()> {
        self.max_iters = check_max_iters(max_iters)?;
        Ok(())
    }

    /// Returns the number of clusters
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Returns the distance threshold
    pub fn distance_threshold(&self) -> f64 {
        self.distance_threshold
    }

    /// Returns the iteration cap
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the seed
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the initialisation strategy
    pub fn init(&self) -> &KMeansInit {
        &self.init
    }
}

////////////////
// Mean shift //
////////////////

/// Validated mean-shift configuration
///
/// ### Fields
///
/// * `window_size` - Kernel bandwidth and cluster membership radius
/// * `distance_threshold` - Point displacement (Manhattan) at or under which
///   a point freezes. Never below `MIN_DISTANCE_THRESHOLD`.
/// * `max_iters` - Maximum number of shift passes over the active points
#[derive(Clone, Debug, PartialEq)]
pub struct MeanShiftParams {
    window_size: f64,
    distance_threshold: f64,
    max_iters: usize,
}

impl Default for MeanShiftParams {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            distance_threshold: DEFAULT_MEAN_SHIFT_THRESHOLD,
            max_iters: DEFAULT_MEAN_SHIFT_MAX_ITERS,
        }
    }
}

impl MeanShiftParams {
    /// Generate new mean-shift parameters with the defaults
    pub fn new() -> Self {
        Self::default()
    }

    fn check_window_size(window_size: f64) -> Result<f64> {
        if window_size.is_nan() || window_size < 0.0 {
            return Err(ClusterError::InvalidWindowSize(window_size));
        }
        Ok(window_size)
    }

    /// Set the window size
    pub fn with_window_size(mut self, window_size: f64) -> Result<Self> {
        self.window_size = Self::check_window_size(window_size)?;
        Ok(self)
    }

    /// Set the distance threshold (floored, never rejected)
    pub fn with_distance_threshold(mut self, distance_threshold: f64) -> Self {
        self.distance_threshold = clamp_threshold(distance_threshold);
        self
    }

    /// Set the pass cap
    pub fn with_max_iters(mut self, max_iters: usize) -> Result<Self> {
        self.max_iters = check_max_iters(max_iters)?;
        Ok(self)
    }

    /// Change the window size in place
    ///
    /// On error the previous value is kept.
    pub fn set_window_size(&mut self, window_size: f64) -> Result<()> {
        self.window_size = Self::check_window_size(window_size)?;
        Ok(())
    }

    /// Change the distance threshold in place (floored)
    pub fn set_distance_threshold(&mut self, distance_threshold: f64) {
        self.distance_threshold = clamp_threshold(distance_threshold);
    }

    /// Change the pass cap in place
    ///
    /// On error the previous value is kept.
    pub fn set_max_iters(&mut self, max_iters: usize) -> Result<()> {
        self.max_iters = check_max_iters(max_iters)?;
        Ok(())
    }

    /// Returns the window size
    pub fn window_size(&self) -> f64 {
        self.window_size
    }

    /// Returns the distance threshold
    pub fn distance_threshold(&self) -> f64 {
        self.distance_threshold
    }

    /// Returns the pass cap
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }
}

///////////
// Tests //
///////////
