use faer::MatRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use crate::dataset::*;
use crate::errors::*;
use crate::fit_state::*;
use crate::observer::*;
use crate::params::*;
use crate::render::*;
use crate::utils::k_means::*;
use crate::utils::*;

/// Results of a successful k-means fit
///
/// ### Fields
///
/// * `data` - The data the model was fitted on
/// * `centroids` - Final centroids (n_clusters * dim elements)
/// * `labels` - Cluster per sample
/// * `clusters` - Sample indices per cluster; a partition of all samples
/// * `report` - Iteration count and convergence flag
#[derive(Clone, Debug)]
pub struct KMeansFit<T> {
    data: Dataset<T>,
    centroids: Vec<T>,
    labels: Vec<usize>,
    clusters: Vec<Vec<usize>>,
    report: FitReport,
}

/// K-means clustering engine
///
/// Lloyd's algorithm with Manhattan assignment (ties to the lowest centroid
/// index), mean updates and a Euclidean convergence test on the centroid
/// displacement. Initial centroids are distinct samples.
///
/// ### Fields
///
/// * `params` - Validated configuration
/// * `observer` - Receives iteration and degeneracy events
/// * `state` - Unfitted or the results of the latest fit
pub struct KMeans<T> {
    params: KMeansParams,
    observer: Arc<dyn FitObserver>,
    state: FitState<KMeansFit<T>>,
}

impl<T> KMeans<T>
where
    T: ClusterFloat,
{
    /// Generate a new, unfitted k-means engine that logs via `tracing`
    ///
    /// ### Params
    ///
    /// * `params` - The configuration
    ///
    /// ### Returns
    ///
    /// The engine
    pub fn new(params: KMeansParams) -> Self {
        Self::with_observer(params, Arc::new(TracingObserver))
    }

    /// Generate a new, unfitted k-means engine with a custom observer
    ///
    /// ### Params
    ///
    /// * `params` - The configuration
    /// * `observer` - Receives the fit events
    ///
    /// ### Returns
    ///
    /// The engine
    pub fn with_observer(params: KMeansParams, observer: Arc<dyn FitObserver>) -> Self {
        Self {
            params,
            observer,
            state: FitState::Unfitted,
        }
    }

    /////////////
    // Setters //
    /////////////

    /// Change the number of clusters; keeps the old value on error
    pub fn set_n_clusters(&mut self, n_clusters: usize) -> Result<()> {
        self.params.set_n_clusters(n_clusters)
    }

    /// Change the distance threshold (floored to `MIN_DISTANCE_THRESHOLD`)
    pub fn set_distance_threshold(&mut self, distance_threshold: f64) {
        self.params.set_distance_threshold(distance_threshold);
    }

    /// Change the iteration cap; keeps the old value on error
    pub fn set_max_iters(&mut self, max_iters: usize) -> Result<()> {
        self.params.set_max_iters(max_iters)
    }

    /// Returns the configuration
    pub fn params(&self) -> &KMeansParams {
        &self.params
    }

    /// Returns the configured number of clusters
    pub fn n_clusters(&self) -> usize {
        self.params.n_clusters()
    }

    /// Returns the distance threshold
    pub fn distance_threshold(&self) -> f64 {
        self.params.distance_threshold()
    }

    /////////
    // Fit //
    /////////

    /// Fit the model on a samples x features matrix
    ///
    /// Initial centres are drawn with a `StdRng` seeded from the configured
    /// seed.
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

    /// Fit the model with a caller supplied source of randomness
    ///
    /// ### Params
    ///
    /// * `data` - Samples x features
    /// * `rng` - Used for drawing the initial centres
    ///
    /// ### Returns
    ///
    /// The fit report or a validation error
    pub fn fit_with_rng<R>(&mut self, data: MatRef<T>, rng: &mut R) -> Result<FitReport>
    where
        R: Rng + ?Sized,
    {
        let data = Dataset::from_mat(data)?;
        self.fit_dataset_with_rng(data, rng)
    }

    /// Fit the model on an already validated dataset
    ///
    /// ### Params
    ///
    /// * `data` - The dataset
    ///
    /// ### Returns
    ///
    /// The fit report or a validation error
    pub fn fit_dataset(&mut self, data: Dataset<T>) -> Result<FitReport> {
        let mut rng = StdRng::seed_from_u64(self.params.seed());
        self.fit_dataset_with_rng(data, &mut rng)
    }

    /// Fit the model on an already validated dataset with a caller supplied
    /// source of randomness
    ///
    /// ### Workflow
    ///
    /// 1. Checks that enough samples exist and picks the initial centres
    /// 2. Assigns every sample to its Manhattan-nearest centroid
    /// 3. Moves every centroid to the mean of its samples (empty clusters keep
    ///    their centroid)
    /// 4. Stops once no centroid moved `distance_threshold` or more, or the
    ///    iteration cap is reached
    ///
    /// ### Params
    ///
    /// * `data` - The dataset
    /// * `rng` - Used for drawing the initial centres
    ///
    /// ### Returns
    ///
    /// The fit report or a validation error
    pub fn fit_dataset_with_rng<R>(&mut self, data: Dataset<T>, rng: &mut R) -> Result<FitReport>
    where
        R: Rng + ?Sized,
    {
        let k = self.params.n_clusters();
        let n = data.n_samples();
        let dim = data.n_features();

        // 1. Initial centres
        if k > n {
            return Err(ClusterError::TooFewSamples {
                n_clusters: k,
                n_samples: n,
            });
        }
        let initial = match self.params.init() {
            KMeansInit::Random => random_unique_indices(n, k, rng),
            KMeansInit::Indices(indices) => {
                validate_initial_indices(indices, n, k)?;
                indices.clone()
            }
        };
        let mut centroids = gather_centroids(data.vectors_flat(), dim, &initial);

        let threshold: T = float_from_f64(self.params.distance_threshold());
        let max_iters = self.params.max_iters();

        let mut previous = centroids.clone();
        let mut labels = vec![0usize; n];
        let mut clusters: Vec<Vec<usize>> = Vec::with_capacity(k);
        let mut n_iter = 0;
        let mut remaining = k;

        // 2. - 4. Lloyd iterations
        for iter in 1..=max_iters {
            assign_all_parallel(data.vectors_flat(), dim, &centroids, &mut labels);
            build_cluster_lists(&labels, k, &mut clusters);

            previous.copy_from_slice(&centroids);
            let empty = update_centroids(data.vectors_flat(), dim, &clusters, &mut centroids);
            for cluster in empty {
                self.observer
                    .on_event(&FitEvent::EmptyCluster { iter, cluster });
            }

            let (moving, max_shift) = moving_centroids(&previous, &centroids, dim, threshold);
            self.observer.on_event(&FitEvent::IterationComplete {
                iter,
                max_shift: max_shift.to_f64().unwrap_or(f64::NAN),
                active: moving,
            });

            n_iter = iter;
            remaining = moving;
            if moving == 0 {
                break;
            }
        }

        let converged = remaining == 0;
        if converged {
            self.observer.on_event(&FitEvent::Converged { n_iter });
        } else {
            self.observer
                .on_event(&FitEvent::NotConverged { n_iter, remaining });
        }

        let report = FitReport { n_iter, converged };
        self.state = FitState::Fitted(KMeansFit {
            data,
            centroids,
            labels,
            clusters,
            report,
        });

        Ok(report)
    }

    /////////////
    // Results //
    /////////////

    /// Returns `true` once a fit succeeded
    pub fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }

    /// Returns the report of the latest fit
    pub fn fit_report(&self) -> Result<FitReport> {
        Ok(self.state.fitted()?.report)
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

    /// Returns the sample indices of every cluster
    pub fn cluster_indices(&self) -> Result<&[Vec<usize>]> {
        Ok(&self.state.fitted()?.clusters)
    }

    /// Returns the centroids, flattened
    pub fn centroids_flat(&self) -> Result<&[T]> {
        Ok(&self.state.fitted()?.centroids)
    }
}

impl<T> ClusterModel<T> for KMeans<T>
where
    T: ClusterFloat,
{
    const TITLE: &'static str = "K-means clustering";

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
        Ok(rows(&fit.centroids, fit.data.n_features()))
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::generate_blobs;
    use approx::assert_relative_eq;
    use faer::Mat;

    fn collinear() -> Dataset<f64> {
        Dataset::from_rows(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]).unwrap()
    }

    fn quiet(params: KMeansParams) -> (KMeans<f64>, RecordingObserver) {
        let recorder = RecordingObserver::new();
        let engine = KMeans::with_observer(params, Arc::new(recorder.clone()));
        (engine, recorder)
    }

    fn assert_partition(clusters: &[Vec<usize>], n: usize) {
        let mut seen = vec![0usize; n];
        for members in clusters {
            for &idx in members {
                seen[idx] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    struct RecordingRenderer {
        calls: Vec<(usize, usize, String)>,
    }

    impl ClusterRenderer<f64> for RecordingRenderer {
        fn render(&mut self, clusters: &[Vec<&[f64]>], centres: &[&[f64]], title: &str) {
            let n_points = clusters.iter().map(|c| c.len()).sum();
            self.calls.push((centres.len(), n_points, title.to_string()));
        }
    }

    #[test]
    fn test_kmeans_two_blobs() {
        let centres = vec![vec![0.0, 0.0], vec![10.0, 10.0]];
        let (data, truth): (Mat<f64>, _) = generate_blobs(&centres, 500, 1.0, 42);

        let (mut kmeans, _) = quiet(KMeansParams::new(2).unwrap());
        let report = kmeans.fit(data.as_ref()).unwrap();
        assert!(report.converged);

        let clusters = kmeans.cluster_indices().unwrap();
        assert_partition(clusters, 1000);

        for members in clusters {
            let from_first = members.iter().filter(|&&i| truth[i] == 0).count();
            let majority = from_first.max(members.len() - from_first);
            assert!(majority as f64 > 0.95 * members.len() as f64);
        }

        let found = kmeans.cluster_centers().unwrap();
        for expected in &centres {
            let closest = found
                .iter()
                .map(|c| euclidean_distance(c, expected))
                .fold(f64::INFINITY, f64::min);
            assert!(closest < 0.5, "no centroid near {:?}", expected);
        }
    }

    #[test]
    fn test_kmeans_tie_break_lowest_index() {
        let params = KMeansParams::new(2)
            .unwrap()
            .with_init(KMeansInit::Indices(vec![0, 2]));
        let (mut kmeans, _) = quiet(params);
        kmeans.fit_dataset(collinear()).unwrap();

        assert_eq!(kmeans.labels().unwrap(), &[0, 0, 1]);
        assert_eq!(kmeans.cluster_indices().unwrap(), &[vec![0, 1], vec![2]]);

        let centres = kmeans.cluster_centers().unwrap();
        assert_relative_eq!(centres[0][0], 0.5);
        assert_relative_eq!(centres[1][0], 2.0);
    }

    #[test]
    fn test_kmeans_tie_break_with_swapped_init() {
        let params = KMeansParams::new(2)
            .unwrap()
            .with_init(KMeansInit::Indices(vec![2, 0]));
        let (mut kmeans, _) = quiet(params);
        kmeans.fit_dataset(collinear()).unwrap();

        // centre 0 sits at (2, 0) now, so the middle point joins it
        assert_eq!(kmeans.labels().unwrap(), &[1, 0, 0]);
    }

    #[test]
    fn test_kmeans_centroid_consistency() {
        let centres = vec![vec![0.0, 0.0, 0.0], vec![4.0, 0.0, 1.0], vec![0.0, 5.0, 2.0]];
        let (data, _): (Mat<f64>, _) = generate_blobs(&centres, 120, 1.5, 7);

        let (mut kmeans, _) = quiet(KMeansParams::new(3).unwrap().with_seed(11));
        kmeans.fit(data.as_ref()).unwrap();

        let clusters = kmeans.clusters().unwrap();
        let found = kmeans.cluster_centers().unwrap();
        assert_partition(kmeans.cluster_indices().unwrap(), 360);

        for (points, centre) in clusters.iter().zip(found.iter()) {
            assert!(!points.is_empty());
            for d in 0..3 {
                let mean = points.iter().map(|p| p[d]).sum::<f64>() / points.len() as f64;
                assert_relative_eq!(centre[d], mean, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_kmeans_partition_many_clusters() {
        let (data, _): (Mat<f32>, _) =
            generate_blobs(&[vec![0.0, 0.0], vec![3.0, 3.0]], 100, 2.0, 5);

        let recorder = RecordingObserver::new();
        let mut kmeans: KMeans<f32> =
            KMeans::with_observer(KMeansParams::new(7).unwrap(), Arc::new(recorder));
        kmeans.fit(data.as_ref()).unwrap();

        let clusters = kmeans.cluster_indices().unwrap();
        assert_eq!(clusters.len(), 7);
        assert_partition(clusters, 200);
        assert_eq!(kmeans.labels().unwrap().len(), 200);
        assert!(kmeans
            .centroids_flat()
            .unwrap()
            .iter()
            .all(|v| v.is_finite()));
    }

    #[test]
    fn test_kmeans_empty_cluster_keeps_centroid() {
        let data = Dataset::from_rows(&[[0.0, 0.0], [0.0, 0.0], [5.0, 5.0]]).unwrap();
        let params = KMeansParams::new(2)
            .unwrap()
            .with_init(KMeansInit::Indices(vec![0, 1]));
        let (mut kmeans, recorder) = quiet(params);

        let report = kmeans.fit_dataset(data).unwrap();
        assert!(report.converged);

        assert!(recorder
            .events()
            .contains(&FitEvent::EmptyCluster { iter: 1, cluster: 1 }));
        assert!(kmeans.centroids_flat().unwrap().iter().all(|v| v.is_finite()));
        assert_eq!(kmeans.cluster_indices().unwrap(), &[vec![2], vec![0, 1]]);
    }

    #[test]
    fn test_kmeans_iteration_cap_reports_non_convergence() {
        let params = KMeansParams::new(2)
            .unwrap()
            .with_init(KMeansInit::Indices(vec![0, 2]))
            .with_max_iters(1)
            .unwrap();
        let (mut kmeans, recorder) = quiet(params);

        let report = kmeans.fit_dataset(collinear()).unwrap();
        assert_eq!(
            report,
            FitReport {
                n_iter: 1,
                converged: false
            }
        );
        assert!(recorder.events().contains(&FitEvent::NotConverged {
            n_iter: 1,
            remaining: 1
        }));
        // best effort result is still available
        assert_partition(kmeans.cluster_indices().unwrap(), 3);
    }

    #[test]
    fn test_kmeans_converged_event() {
        let params = KMeansParams::new(2)
            .unwrap()
            .with_init(KMeansInit::Indices(vec![0, 2]));
        let (mut kmeans, recorder) = quiet(params);
        let report = kmeans.fit_dataset(collinear()).unwrap();

        assert!(report.converged);
        assert_eq!(
            recorder.events().last(),
            Some(&FitEvent::Converged {
                n_iter: report.n_iter
            })
        );
    }

    #[test]
    fn test_kmeans_large_values_stay_finite() {
        let data = Dataset::from_rows(&[[3e38_f32], [3e38], [-3e38]]).unwrap();
        let params = KMeansParams::new(2)
            .unwrap()
            .with_init(KMeansInit::Indices(vec![0, 2]));
        let mut kmeans: KMeans<f32> = KMeans::with_observer(params, Arc::new(NoopObserver));

        let report = kmeans.fit_dataset(data).unwrap();

        assert!(report.converged);
        assert_eq!(kmeans.labels().unwrap(), &[0, 0, 1]);
        let centroids = kmeans.centroids_flat().unwrap();
        assert!(centroids.iter().all(|v| v.is_finite()));
        assert_relative_eq!(centroids[0], 3e38, max_relative = 1e-6);
        assert_relative_eq!(centroids[1], -3e38, max_relative = 1e-6);
    }

    #[test]
    fn test_kmeans_not_fitted() {
        let kmeans: KMeans<f64> = KMeans::new(KMeansParams::new(2).unwrap());

        assert!(!kmeans.is_fitted());
        assert_eq!(kmeans.labels().unwrap_err(), ClusterError::NotFitted);
        assert_eq!(kmeans.n_samples().unwrap_err(), ClusterError::NotFitted);
        assert_eq!(kmeans.n_features().unwrap_err(), ClusterError::NotFitted);
        assert!(kmeans.clusters().is_err());
        assert!(kmeans.cluster_centers().is_err());
        assert!(kmeans.fit_report().is_err());
    }

    #[test]
    fn test_kmeans_too_few_samples() {
        let (mut kmeans, _) = quiet(KMeansParams::new(4).unwrap());
        assert_eq!(
            kmeans.fit_dataset(collinear()).unwrap_err(),
            ClusterError::TooFewSamples {
                n_clusters: 4,
                n_samples: 3
            }
        );
        assert!(!kmeans.is_fitted());
    }

    #[test]
    fn test_kmeans_invalid_initial_indices() {
        for indices in [vec![0], vec![0, 0], vec![0, 3]] {
            let params = KMeansParams::new(2)
                .unwrap()
                .with_init(KMeansInit::Indices(indices));
            let (mut kmeans, _) = quiet(params);
            assert!(matches!(
                kmeans.fit_dataset(collinear()),
                Err(ClusterError::InvalidInitialCentres(_))
            ));
        }
    }

    #[test]
    fn test_kmeans_rejects_bad_data() {
        let (mut kmeans, _) = quiet(KMeansParams::new(2).unwrap());

        let mut data = Mat::<f64>::zeros(3, 2);
        data[(1, 0)] = f64::NAN;
        assert!(matches!(
            kmeans.fit(data.as_ref()),
            Err(ClusterError::NonFiniteValue { row: 1, col: 0 })
        ));

        let empty = Mat::<f64>::zeros(0, 2);
        assert!(matches!(
            kmeans.fit(empty.as_ref()),
            Err(ClusterError::EmptyDataset { .. })
        ));
        assert!(!kmeans.is_fitted());
    }

    #[test]
    fn test_kmeans_seed_reproducible() {
        let (data, _): (Mat<f64>, _) =
            generate_blobs(&[vec![0.0, 0.0], vec![2.0, 2.0]], 150, 1.0, 3);

        let (mut a, _) = quiet(KMeansParams::new(4).unwrap().with_seed(9));
        let (mut b, _) = quiet(KMeansParams::new(4).unwrap().with_seed(9));
        a.fit(data.as_ref()).unwrap();
        b.fit(data.as_ref()).unwrap();

        assert_eq!(a.labels().unwrap(), b.labels().unwrap());
        assert_eq!(a.centroids_flat().unwrap(), b.centroids_flat().unwrap());

        let (mut c, _) = quiet(KMeansParams::new(4).unwrap());
        c.fit_with_rng(data.as_ref(), &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(a.labels().unwrap(), c.labels().unwrap());
    }

    #[test]
    fn test_kmeans_refit_replaces_state() {
        let (mut kmeans, _) = quiet(KMeansParams::new(2).unwrap());
        kmeans.fit_dataset(collinear()).unwrap();
        assert_eq!(kmeans.n_samples().unwrap(), 3);

        let (data, _): (Mat<f64>, _) = generate_blobs(&[vec![0.0, 0.0, 0.0]], 40, 1.0, 1);
        kmeans.fit(data.as_ref()).unwrap();
        assert_eq!(kmeans.n_samples().unwrap(), 40);
        assert_eq!(kmeans.n_features().unwrap(), 3);
        assert_partition(kmeans.cluster_indices().unwrap(), 40);

        // a failing fit keeps the previous results
        kmeans.set_n_clusters(41).unwrap();
        assert!(kmeans.fit(data.as_ref()).is_err());
        assert_eq!(kmeans.n_samples().unwrap(), 40);
        assert_eq!(kmeans.cluster_indices().unwrap().len(), 2);
    }

    #[test]
    fn test_kmeans_setters() {
        let mut kmeans: KMeans<f64> = KMeans::new(KMeansParams::new(3).unwrap());

        assert!(kmeans.set_n_clusters(1).is_err());
        assert!(kmeans.set_n_clusters(0).is_err());
        assert_eq!(kmeans.n_clusters(), 3);

        kmeans.set_distance_threshold(1e-12);
        assert_eq!(kmeans.distance_threshold(), 1e-6);

        assert!(kmeans.set_max_iters(0).is_err());
        assert_eq!(kmeans.params().max_iters(), DEFAULT_KMEANS_MAX_ITERS);
    }

    #[test]
    fn test_kmeans_show() {
        let params = KMeansParams::new(2)
            .unwrap()
            .with_init(KMeansInit::Indices(vec![0, 2]));
        let (mut kmeans, _) = quiet(params);

        let mut renderer = RecordingRenderer { calls: Vec::new() };
        assert_eq!(
            kmeans.show(&mut renderer).unwrap_err(),
            ClusterError::NotFitted
        );

        kmeans.fit_dataset(collinear()).unwrap();
        kmeans.show(&mut renderer).unwrap();
        assert_eq!(
            renderer.calls,
            vec![(2, 3, "K-means clustering".to_string())]
        );
    }
}
