use thiserror::Error;

/// Errors returned by the clustering engines
///
/// Configuration and shape problems are reported before any computation
/// happens and never leave an engine in a half-updated state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// `n_clusters` below two
    #[error("n_clusters must be at least 2, got {0}")]
    InvalidClusterCount(usize),

    /// Negative or NaN window size
    #[error("window_size must be a non-negative number, got {0}")]
    InvalidWindowSize(f64),

    /// Iteration cap of zero
    #[error("max_iters must be at least 1")]
    InvalidMaxIters,

    /// Dataset without samples or without features
    #[error("dataset must have at least one sample and one feature, got {n_samples} x {n_features}")]
    EmptyDataset { n_samples: usize, n_features: usize },

    /// Row with a different length than the first one
    #[error("row {row} has {found} features, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// NaN or infinite entry in the dataset
    #[error("non-finite value at row {row}, column {col}")]
    NonFiniteValue { row: usize, col: usize },

    /// More clusters requested than there are samples
    #[error("cannot pick {n_clusters} distinct initial centres from {n_samples} samples")]
    TooFewSamples { n_clusters: usize, n_samples: usize },

    /// Explicit initial centres that are out of range, duplicated or of the
    /// wrong count
    #[error("invalid initial centres: {0}")]
    InvalidInitialCentres(String),

    /// Results queried before `fit()`
    #[error("model has not been fitted yet, call fit() first")]
    NotFitted,
}

/// Result alias for the crate
pub type Result<T> = std::result::Result<T, ClusterError>;
