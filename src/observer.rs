use std::sync::{Arc, Mutex};

/// Something noteworthy that happened during a fit
///
/// Numeric degeneracies are recovered inside the engines; they are reported
/// here so that callers and tests can see them.
#[derive(Clone, Debug, PartialEq)]
pub enum FitEvent {
    /// One k-means assign + update iteration or one mean-shift pass finished
    IterationComplete {
        iter: usize,
        max_shift: f64,
        active: usize,
    },
    /// A k-means cluster received no points; its previous centroid was kept
    EmptyCluster { iter: usize, cluster: usize },
    /// A mean-shift point had zero total kernel weight; its position was kept
    ZeroKernelWeight { iter: usize, point: usize },
    /// Mean shift opened a new cluster at a frozen point
    ClusterCreated { cluster: usize, point: usize },
    /// The fit met its threshold
    Converged { n_iter: usize },
    /// The iteration cap was hit before the threshold was met
    NotConverged { n_iter: usize, remaining: usize },
}

/// Observability collaborator injected into the engines
pub trait FitObserver: Send + Sync {
    /// Receive one event
    ///
    /// ### Params
    ///
    /// * `event` - The event
    fn on_event(&self, event: &FitEvent);
}

/// Default observer: forwards events to `tracing`
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl FitObserver for TracingObserver {
    fn on_event(&self, event: &FitEvent) {
        match *event {
            FitEvent::IterationComplete {
                iter,
                max_shift,
                active,
            } => {
                tracing::debug!(iter, max_shift, active, "iteration complete");
            }
            FitEvent::EmptyCluster { iter, cluster } => {
                tracing::warn!(iter, cluster, "empty cluster, keeping previous centroid");
            }
            FitEvent::ZeroKernelWeight { iter, point } => {
                tracing::warn!(iter, point, "zero total kernel weight, keeping position");
            }
            FitEvent::ClusterCreated { cluster, point } => {
                tracing::trace!(cluster, point, "new cluster");
            }
            FitEvent::Converged { n_iter } => {
                tracing::info!(n_iter, "converged");
            }
            FitEvent::NotConverged { n_iter, remaining } => {
                tracing::warn!(n_iter, remaining, "iteration cap reached before convergence");
            }
        }
    }
}

/// Observer that drops every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl FitObserver for NoopObserver {
    fn on_event(&self, _event: &FitEvent) {}
}

/// Observer that keeps every event in memory
///
/// Clones share the same buffer, so one handle can be given to an engine
/// and the other inspected afterwards.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<FitEvent>>>,
}

impl RecordingObserver {
    /// Generate a new, empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all events seen so far
    pub fn events(&self) -> Vec<FitEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Drop all recorded events
    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl FitObserver for RecordingObserver {
    fn on_event(&self, event: &FitEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

///////////
// Tests //
///////////
