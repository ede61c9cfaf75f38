use faer::traits::ComplexField;
use faer::Mat;
use num_traits::{Float, FromPrimitive};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Generate one isotropic Gaussian blob
///
/// ### Params
///
/// * `n_points` - Number of samples
/// * `centre` - Centre of the blob; its length is the dimensionality
/// * `std` - Standard deviation in every dimension
/// * `seed` - Random seed for reproducibility
///
/// ### Returns
///
/// Matrix of shape (n_points, centre.len())
pub fn gaussian_cluster<T>(n_points: usize, centre: &[f64], std: f64, seed: u64) -> Mat<T>
where
    T: Float + FromPrimitive + ComplexField,
{
    let (data, _) = generate_blobs(&[centre.to_vec()], n_points, std, seed);
    data
}

/// Generate several isotropic Gaussian blobs stacked on top of each other
///
/// Samples of blob 0 come first, then blob 1 and so forth, mirroring a
/// vertical stack of individual clusters.
///
/// ### Params
///
/// * `centres` - One centre per blob. All need the same length.
/// * `n_per_blob` - Number of samples per blob
/// * `std` - Standard deviation within each blob
/// * `seed` - Random seed for reproducibility
///
/// ### Returns
///
/// Tuple of `(data, blob label per sample)`
///
/// ### Panics
///
/// If the centres differ in length
pub fn generate_blobs<T>(
    centres: &[Vec<f64>],
    n_per_blob: usize,
    std: f64,
    seed: u64,
) -> (Mat<T>, Vec<usize>)
where
    T: Float + FromPrimitive + ComplexField,
{
    let dim = centres.first().map(|c| c.len()).unwrap_or(0);
    assert!(
        centres.iter().all(|c| c.len() == dim),
        "All centres need to have the same dimensionality"
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let n_samples = centres.len() * n_per_blob;
    let mut data = Mat::<T>::zeros(n_samples, dim);
    let mut labels = Vec::with_capacity(n_samples);

    for (blob_idx, centre) in centres.iter().enumerate() {
        for p in 0..n_per_blob {
            let i = blob_idx * n_per_blob + p;
            for j in 0..dim {
                let noise: f64 = rng.sample(StandardNormal);
                data[(i, j)] = T::from_f64(centre[j] + noise * std).unwrap_or_else(T::zero);
            }
            labels.push(blob_idx);
        }
    }

    (data, labels)
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_cluster_shape_and_mean() {
        let data: Mat<f64> = gaussian_cluster(2000, &[3.0, -1.0], 0.5, 7);

        assert_eq!(data.nrows(), 2000);
        assert_eq!(data.ncols(), 2);

        let mean_x: f64 = (0..2000).map(|i| data[(i, 0)]).sum::<f64>() / 2000.0;
        let mean_y: f64 = (0..2000).map(|i| data[(i, 1)]).sum::<f64>() / 2000.0;
        assert!((mean_x - 3.0).abs() < 0.1);
        assert!((mean_y + 1.0).abs() < 0.1);
    }

    #[test]
    fn test_generate_blobs_labels() {
        let centres = vec![vec![0.0, 0.0], vec![10.0, 10.0], vec![-5.0, 5.0]];
        let (data, labels): (Mat<f32>, _) = generate_blobs(&centres, 4, 0.1, 1);

        assert_eq!(data.nrows(), 12);
        assert_eq!(labels, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn test_generate_blobs_reproducible() {
        let centres = vec![vec![1.0, 2.0, 3.0]];
        let (a, _): (Mat<f64>, _) = generate_blobs(&centres, 50, 1.0, 99);
        let (b, _): (Mat<f64>, _) = generate_blobs(&centres, 50, 1.0, 99);

        for i in 0..50 {
            for j in 0..3 {
                assert_eq!(a[(i, j)], b[(i, j)]);
            }
        }
    }

    #[test]
    #[should_panic(expected = "same dimensionality")]
    fn test_generate_blobs_mixed_lengths_panics() {
        let centres = vec![vec![0.0, 0.0], vec![1.0]];
        let _: (Mat<f64>, _) = generate_blobs(&centres, 3, 0.1, 1);
    }
}
