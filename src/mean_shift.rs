use faer::MatRef;
use rayon::prelude::*;
use std::sync::Arc;

use crate::dataset::*;
use crate::errors::*;
use crate::fit_state::*;
use crate::observer::*;
use crate::params::*;
use crate::render::*;
use crate::utils::*;

/////////////
// Helpers //
/////////////

/// Kernel-weighted mean of the whole dataset around one position
///
/// Weights are Gaussian in the Euclidean distance between each sample and
/// `position`.
///
/// ### Params
///
/// * `data` - All samples (flattened)
/// * `dim` - Embedding dimensions
/// * `position` - Current position of the shifted point
/// * `bandwidth` - Kernel bandwidth
/// * `out` - Receives the new position
///
/// ### Returns
///
/// `false` if the total weight was zero (or the bandwidth is zero); `out`
/// then holds the unchanged position.
fn shift_point<T>(data: &[T], dim: usize, position: &[T], bandwidth: T, out: &mut [T]) -> bool
where
    T: ClusterFloat,
{
    if bandwidth <= T::zero() {
        out.copy_from_slice(position);
        return false;
    }

    for v in out.iter_mut() {
        *v = T::zero();
    }
    let mut total = T::zero();

    for sample in data.chunks_exact(dim) {
        let w = gaussian_kernel(euclidean_distance(sample, position), bandwidth);
        if w == T::zero() {
            continue;
        }
        // running weighted mean, stays finite where a weighted sum would overflow
        total = total + w;
        let r = w / total;
        for d in 0..dim {
            out[d] = out[d] * (T::one() - r) + sample[d] * r;
        }
    }

    if total > T::zero() {
        true
    } else {
        out.copy_from_slice(position);
        false
    }
}

/// Clusters that grow as points freeze
///
/// ### Fields
///
/// * `dim` - Embedding dimensions
/// * `window` - Membership radius (Manhattan)
/// * `centres` - Cluster centres (flattened), append-only
/// * `clusters` - Point indices per cluster
/// * `labels` - Cluster per point, valid where `frozen` is set
/// * `frozen` - Whether a point was assigned already
struct ModeRegistry<T> {
    dim: usize,
    window: T,
    centres: Vec<T>,
    clusters: Vec<Vec<usize>>,
    labels: Vec<usize>,
    frozen: Vec<bool>,
}

impl<T> ModeRegistry<T>
where
    T: ClusterFloat,
{
    fn new(n: usize, dim: usize, window: T) -> Self {
        Self {
            dim,
            window,
            centres: Vec::new(),
            clusters: Vec::new(),
            labels: vec![0; n],
            frozen: vec![false; n],
        }
    }

    /// Freeze a point at `position`
    ///
    /// Joins the Manhattan-nearest centre (lowest index on ties) if it lies
    /// strictly within the window, otherwise opens a new cluster there.
    ///
    /// ### Returns
    ///
    /// The index of the new cluster, if one was opened
    fn freeze(&mut self, point: usize, position: &[T]) -> Option<usize> {
        self.frozen[point] = true;

        match nearest_centre(position, &self.centres, self.dim) {
            Some((c, dist)) if dist < self.window => {
                self.clusters[c].push(point);
                self.labels[point] = c;
                None
            }
            _ => {
                let c = self.clusters.len();
                self.centres.extend_from_slice(position);
                self.clusters.push(vec![point]);
                self.labels[point] = c;
                Some(c)
            }
        }
    }

    #[inline]
    fn is_frozen(&self, point: usize) -> bool {
        self.frozen[point]
    }
}

////////////
// Engine //
////////////

/// Results of a successful mean-shift fit
///
/// ### Fields
///
/// * `data` - The data the model was fitted on
/// * `shifted` - Final position of every point (flattened)
/// * `centres` - Discovered cluster centres (flattened)
/// * `clusters` - Point indices per cluster, in freeze order
/// * `labels` - Cluster per point
/// * `report` - Pass count and convergence flag
#[derive(Clone, Debug)]
pub struct MeanShiftFit<T> {
    data: Dataset<T>,
    shifted: Vec<T>,
    centres: Vec<T>,
    clusters: Vec<Vec<usize>>,
    labels: Vec<usize>,
    report: FitReport,
}

/// Mean-shift clustering engine
///
/// Every point climbs the Gaussian kernel density of the original data
/// until its step drops to the distance threshold. It then freezes and
/// joins the nearest existing centre within `window_size`, or becomes a new
/// centre. The number of clusters is an outcome, not an input: small
/// windows split modes, large windows merge them.
///
/// ### Fields
///
/// * `params` - Validated configuration
/// * `observer` - Receives pass and degeneracy events
/// * `state` - Unfitted or the results of the latest fit
pub struct MeanShift<T> {
    params: MeanShiftParams,
    observer: Arc<dyn FitObserver>,
    state: FitState<MeanShiftFit<T>>,
}

impl<T> MeanShift<T>
where
    T: ClusterFloat,
{
    /// Generate a new, unfitted mean-shift engine that logs via `tracing`
    ///
    /// ### Params
    ///
    /// * `params` - The configuration
    ///
    /// ### Returns
    ///
    /// The engine
    pub fn new(params: MeanShiftParams) -> Self {
        Self::with_observer(params, Arc::new(TracingObserver))
    }

    /// Generate a new, unfitted mean-shift engine with a custom observer
    ///
    /// ### Params
    ///
    /// * `params` - The configuration
    /// * `observer` - Receives the fit events
    ///
    /// ### Returns
    ///
    /// The engine
    pub fn with_observer(params: MeanShiftParams, observer: Arc<dyn FitObserver>) -> Self {
        Self {
            params,
            observer,
            state: FitState::Unfitted,
        }
    }

    /// Change the window size; keeps the old value on error
    pub fn set_window_size(&mut self, window_size: f64) -> Result<()> {
        self.params.set_window_size(window_size)
    }

    /// Change the distance threshold (floored to `MIN_DISTANCE_THRESHOLD`)
    pub fn set_distance_threshold(&mut self, distance_threshold: f64) {
        self.params.set_distance_threshold(distance_threshold);
    }

    /// Change the pass cap; keeps the old value on error
    pub fn set_max_iters(&mut self, max_iters: usize) -> Result<()> {
        self.params.set_max_iters(max_iters)
    }

    /// Returns the configuration
    pub fn params(&self) -> &MeanShiftParams {
        &self.params
    }

    /// Returns the window size
    pub fn window_size(&self) -> f64 {
        self.params.window_size()
    }

    /// Returns the distance threshold
    pub fn distance_threshold(&self) -> f64 {
        self.params.distance_threshold()
    }

    /// Fit the model on a samples x features matrix
    ///
    /// ### Params
    ///
    /// * `data` - Samples x features
    ///
    /// ### Returns
    ///
    /// The fit report or a validation error. On error the previous state is
    /// left untouched.
    pub fn fit(&mut self, data: MatRef<T>) -> Result<FitReport> {
        let data = Dataset::from_mat(data)?;
        self.fit_dataset(data)
    }

    /// Fit the model on an already validated dataset
    ///
    /// ### Workflow
    ///
    /// 1. Copies all points into the shifted working buffer
    /// 2. For every active point computes the kernel-weighted mean of the
    ///    original data (in parallel, the shifts are independent)
    /// 3. In index order: moves the point, and freezes it if its Manhattan
    ///    step is within `distance_threshold`
    /// 4. Repeats until all points are frozen; after `max_iters` passes the
    ///    remaining points are frozen where they stand
    ///
    /// ### Params
    ///
    /// * `data` - The dataset
    ///
    /// ### Returns
    ///
    /// The fit report
    pub fn fit_dataset(&mut self, data: Dataset<T>) -> Result<FitReport> {
        let n = data.n_samples();
        let dim = data.n_features();
        let bandwidth: T = float_from_f64(self.params.window_size());
        let threshold: T = float_from_f64(self.params.distance_threshold());
        let max_iters = self.params.max_iters();

        let mut shifted = data.vectors_flat().to_vec();
        let mut next = vec![T::zero(); n * dim];
        let mut active: Vec<usize> = (0..n).collect();
        let mut registry = ModeRegistry::new(n, dim, bandwidth);
        let mut n_iter = 0;

        while !active.is_empty() && n_iter < max_iters {
            n_iter += 1;

            let buf = &mut next[..active.len() * dim];
            let weighted: Vec<bool> = buf
                .par_chunks_mut(dim)
                .zip(active.par_iter())
                .map(|(out, &i)| {
                    shift_point(
                        data.vectors_flat(),
                        dim,
                        &shifted[i * dim..(i + 1) * dim],
                        bandwidth,
                        out,
                    )
                })
                .collect();

            let mut max_shift = T::zero();
            for (slot, &i) in active.iter().enumerate() {
                if !weighted[slot] {
                    self.observer.on_event(&FitEvent::ZeroKernelWeight {
                        iter: n_iter,
                        point: i,
                    });
                }

                let new_pos = &buf[slot * dim..(slot + 1) * dim];
                let pos = &mut shifted[i * dim..(i + 1) * dim];
                let step = manhattan_distance(new_pos, pos);
                pos.copy_from_slice(new_pos);
                if step > max_shift {
                    max_shift = step;
                }

                if step <= threshold {
                    if let Some(cluster) = registry.freeze(i, new_pos) {
                        self.observer
                            .on_event(&FitEvent::ClusterCreated { cluster, point: i });
                    }
                }
            }

            active.retain(|&i| !registry.is_frozen(i));

            self.observer.on_event(&FitEvent::IterationComplete {
                iter: n_iter,
                max_shift: max_shift.to_f64().unwrap_or(f64::NAN),
                active: active.len(),
            });
        }

        let converged = active.is_empty();
        if converged {
            self.observer.on_event(&FitEvent::Converged { n_iter });
        } else {
            self.observer.on_event(&FitEvent::NotConverged {
                n_iter,
                remaining: active.len(),
            });
            for &i in &active {
                if let Some(cluster) = registry.freeze(i, &shifted[i * dim..(i + 1) * dim]) {
                    self.observer
                        .on_event(&FitEvent::ClusterCreated { cluster, point: i });
                }
            }
        }

        let report = FitReport { n_iter, converged };
        let ModeRegistry {
            centres,
            clusters,
            labels,
            ..
        } = registry;

        self.state = FitState::Fitted(MeanShiftFit {
            data,
            shifted,
            centres,
            clusters,
            labels,
            report,
        });

        Ok(report)
    }

    /// Returns `true` once a fit succeeded
    pub fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }

    /// Returns the report of the latest fit
    pub fn fit_report(&self) -> Result<FitReport> {
        Ok(self.state.fitted()?.report)
    }

    /// Returns the number of discovered clusters
    pub fn n_clusters(&self) -> Result<usize> {
        Ok(self.state.fitted()?.clusters.len())
    }

    /// Returns the number of samples of the fitted data
    pub fn n_samples(&self) -> Result<usize> {
        Ok(self.state.fitted()?.data.n_samples())
    }

    /// Returns the number of features of the fitted data
    pub fn n_features(&self) -> Result<usize> {
        Ok(self.state.fitted()?.data.n_features())
    }

    /// Returns the cluster of every sample
    pub fn labels(&self) -> Result<&[usize]> {
        Ok(&self.state.fitted()?.labels)
    }

    /// Returns the sample indices of every cluster, in freeze order
    pub fn cluster_indices(&self) -> Result<&[Vec<usize>]> {
        Ok(&self.state.fitted()?.clusters)
    }

    /// Returns the final (frozen) position of every sample
    pub fn shifted_points(&self) -> Result<Vec<&[T]>> {
        let fit = self.state.fitted()?;
        Ok(rows(&fit.shifted, fit.data.n_features()))
    }
}

impl<T> ClusterModel<T> for MeanShift<T>
where
    T: ClusterFloat,
{
    const TITLE: &'static str = "Mean shift clustering";

    fn clusters(&self) -> Result<Vec<Vec<&[T]>>> {
        let fit = self.state.fitted()?;
        Ok(fit
            .clusters
            .iter()
            .map(|members| fit.data.gather(members))
            .collect())
    }

    fn cluster_centers(&self) -> Result<Vec<&[T]>> {
        let fit = self.state.fitted()?;
        Ok(rows(&fit.centres, fit.data.n_features()))
    }
}

///////////
// Tests //
///////////
