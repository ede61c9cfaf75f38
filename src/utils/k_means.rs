use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::errors::*;
use crate::utils::dist::*;
use crate::utils::traits::*;

////////////////////////
// k-means clustering //
////////////////////////

////////////////////
// Initialisation //
////////////////////

/// Pick distinct sample indices uniformly at random
///
/// Partial Fisher-Yates shuffle over the index range, so no index can be
/// drawn twice and only `k` swaps are needed.
///
/// ### Params
///
/// * `n` - Number of samples
/// * `k` - Number of indices to draw (`k <= n`)
/// * `rng` - Source of randomness
///
/// ### Returns
///
/// `k` distinct indices in draw order
pub fn random_unique_indices<R>(n: usize, k: usize, rng: &mut R) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    let mut indices: Vec<usize> = (0..n).collect();
    let (picked, _) = indices.partial_shuffle(rng, k);
    picked.to_vec()
}

/// Check user supplied initial centre indices
///
/// ### Params
///
/// * `indices` - The indices
/// * `n` - Number of samples
/// * `k` - Number of clusters
///
/// ### Returns
///
/// `InvalidInitialCentres` if the count is wrong, an index is out of range
/// or an index is repeated.
pub fn validate_initial_indices(indices: &[usize], n: usize, k: usize) -> Result<()> {
    if indices.len() != k {
        return Err(ClusterError::InvalidInitialCentres(format!(
            "expected {} indices, got {}",
            k,
            indices.len()
        )));
    }

    let mut seen = FxHashSet::default();
    for &idx in indices {
        if idx >= n {
            return Err(ClusterError::InvalidInitialCentres(format!(
                "index {} out of bounds for {} samples",
                idx, n
            )));
        }
        if !seen.insert(idx) {
            return Err(ClusterError::InvalidInitialCentres(format!(
                "index {} used more than once",
                idx
            )));
        }
    }

    Ok(())
}

/// Copy the selected samples into a flat centroid buffer
///
/// ### Params
///
/// * `data` - Samples (flattened)
/// * `dim` - Embedding dimensions
/// * `indices` - Samples to copy
///
/// ### Returns
///
/// Centroids (indices.len() * dim elements)
pub fn gather_centroids<T>(data: &[T], dim: usize, indices: &[usize]) -> Vec<T>
where
    T: ClusterFloat,
{
    let mut centroids = Vec::with_capacity(indices.len() * dim);
    for &idx in indices {
        centroids.extend_from_slice(&data[idx * dim..(idx + 1) * dim]);
    }
    centroids
}

/////////////////////
// Lloyd iteration //
/////////////////////

/// Assign all vectors to their Manhattan-nearest centroid in parallel
///
/// Ties go to the lowest centroid index. Each point is handled
/// independently, so the result does not depend on the thread schedule.
///
/// ### Params
///
/// * `data` - Vectors to assign (flattened)
/// * `dim` - Embedding dimensions
/// * `centroids` - Current centroids (flattened)
/// * `labels` - Output buffer, one slot per vector
pub fn assign_all_parallel<T>(data: &[T], dim: usize, centroids: &[T], labels: &mut [usize])
where
    T: ClusterFloat,
{
    labels.par_iter_mut().enumerate().for_each(|(i, label)| {
        let vec = &data[i * dim..(i + 1) * dim];
        *label = nearest_centre(vec, centroids, dim)
            .map(|(c, _)| c)
            .unwrap_or(0);
    });
}

/// Rebuild the per-cluster index lists from the labels
///
/// The lists are cleared and refilled, so their allocations survive from one
/// iteration to the next.
///
/// ### Params
///
/// * `labels` - Cluster per vector
/// * `k` - Number of clusters
/// * `lists` - Index buffers, resized to `k`
pub fn build_cluster_lists(labels: &[usize], k: usize, lists: &mut Vec<Vec<usize>>) {
    lists.resize_with(k, Vec::new);
    for list in lists.iter_mut() {
        list.clear();
    }
    for (vec_idx, &cluster) in labels.iter().enumerate() {
        lists[cluster].push(vec_idx);
    }
}

/// Move each centroid to the mean of its assigned vectors
///
/// Clusters without vectors keep their previous centroid so that no NaN can
/// enter the centroid buffer.
///
/// ### Params
///
/// * `data` - Vectors (flattened)
/// * `dim` - Embedding dimensions
/// * `lists` - Vector indices per cluster
/// * `centroids` - Centroids, updated in place
///
/// ### Returns
///
/// Indices of the clusters that were empty
pub fn update_centroids<T>(
    data: &[T],
    dim: usize,
    lists: &[Vec<usize>],
    centroids: &mut [T],
) -> Vec<usize>
where
    T: ClusterFloat,
{
    centroids
        .par_chunks_mut(dim)
        .zip(lists.par_iter())
        .for_each(|(cent, members)| {
            if members.is_empty() {
                return;
            }
            for v in cent.iter_mut() {
                *v = T::zero();
            }
            // running mean, stays finite where a plain sum would overflow
            for (seen, &idx) in members.iter().enumerate() {
                let vec = &data[idx * dim..(idx + 1) * dim];
                let r = T::one() / float_from_f64::<T>((seen + 1) as f64);
                for d in 0..dim {
                    cent[d] = cent[d] * (T::one() - r) + vec[d] * r;
                }
            }
        });

    lists
        .iter()
        .enumerate()
        .filter(|(_, members)| members.is_empty())
        .map(|(c, _)| c)
        .collect()
}

/// Count centroids that moved at least `threshold` (Euclidean)
///
/// A non-finite displacement counts as moving.
///
/// ### Params
///
/// * `previous` - Centroids before the update (flattened)
/// * `current` - Centroids after the update (flattened)
/// * `dim` - Embedding dimensions
/// * `threshold` - Convergence threshold
///
/// ### Returns
///
/// Tuple of `(number of moving centroids, largest displacement)`
pub fn moving_centroids<T>(previous: &[T], current: &[T], dim: usize, threshold: T) -> (usize, T)
where
    T: ClusterFloat,
{
    previous
        .chunks_exact(dim)
        .zip(current.chunks_exact(dim))
        .map(|(a, b)| euclidean_distance(a, b))
        .fold((0, T::zero()), |(moving, max_shift), d| {
            let moving = if d < threshold { moving } else { moving + 1 };
            let max_shift = if d > max_shift { d } else { max_shift };
            (moving, max_shift)
        })
}

///////////
// Tests //
///////////
