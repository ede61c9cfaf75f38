use crate::errors::*;

/// Outcome of one `fit()` call
///
/// ### Fields
///
/// * `n_iter` - Number of iterations (k-means) or shift passes (mean shift)
///   that were run
/// * `converged` - `false` if the iteration cap stopped the fit; the results
///   are then a best effort
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitReport {
    pub n_iter: usize,
    pub converged: bool,
}

/// Two-state lifecycle of an engine
#[derive(Clone, Debug, Default)]
pub enum FitState<F> {
    /// No successful `fit()` yet
    #[default]
    Unfitted,
    /// Results of the latest successful `fit()`
    Fitted(F),
}

impl<F> FitState<F> {
    /// Returns the fitted results
    ///
    /// ### Returns
    ///
    /// The results or `NotFitted`
    #[inline]
    pub fn fitted(&self) -> Result<&F> {
        match self {
            FitState::Fitted(fit) => Ok(fit),
            FitState::Unfitted => Err(ClusterError::NotFitted),
        }
    }

    /// Returns `true` once a fit succeeded
    #[inline]
    pub fn is_fitted(&self) -> bool {
        matches!(self, FitState::Fitted(_))
    }
}
