use num_traits::Float;

///////////////
// Distances //
///////////////

/// Euclidean distance between two arbitrary vectors
///
/// Unlike the squared variants used for pure ranking, this returns the actual
/// L2 norm of `a - b`, as the result is compared against user thresholds.
///
/// ### Params
///
/// * `a` - Slice of vector one
/// * `b` - Slice of vector two
///
/// ### Returns
///
/// The Euclidean distance
#[inline(always)]
pub fn euclidean_distance<T>(a: &[T], b: &[T]) -> T
where
    T: Float,
{
    assert!(a.len() == b.len(), "Vectors a and b need to have same len!");

    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let diff = x - y;
            diff * diff
        })
        .fold(T::zero(), |acc, x| acc + x)
        .sqrt()
}

/// Manhattan distance between two arbitrary vectors
///
/// ### Params
///
/// * `a` - Slice of vector one
/// * `b` - Slice of vector two
///
/// ### Returns
///
/// Sum of the absolute componentwise differences
#[inline(always)]
pub fn manhattan_distance<T>(a: &[T], b: &[T]) -> T
where
    T: Float,
{
    assert!(a.len() == b.len(), "Vectors a and b need to have same len!");

    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y).abs())
        .fold(T::zero(), |acc, x| acc + x)
}

////////////
// Kernel //
////////////

/// Gaussian kernel weight
///
/// `exp(-0.5 * (distance / bandwidth)^2)`. The caller is responsible for
/// never passing a zero bandwidth.
///
/// ### Params
///
/// * `distance` - Distance between the two points
/// * `bandwidth` - Kernel bandwidth
///
/// ### Returns
///
/// The kernel weight in `[0, 1]`
#[inline(always)]
pub fn gaussian_kernel<T>(distance: T, bandwidth: T) -> T
where
    T: Float,
{
    let half = T::from(0.5).unwrap_or_else(T::zero);
    let scaled = distance / bandwidth;
    (-(half * scaled * scaled)).exp()
}

/////////////
// Centres //
/////////////

/// Find the Manhattan-nearest centre for a point
///
/// Ties are broken in favour of the lowest centre index, as only a strictly
/// smaller distance replaces the current best.
///
/// ### Params
///
/// * `point` - Query point
/// * `centres` - Centres (flattened)
/// * `dim` - Dimensionality of point and centres
///
/// ### Returns
///
/// `Some((centre_index, distance))` or `None` if there are no centres
#[inline]
pub fn nearest_centre<T>(point: &[T], centres: &[T], dim: usize) -> Option<(usize, T)>
where
    T: Float,
{
    let mut best: Option<(usize, T)> = None;

    for (c, cent) in centres.chunks_exact(dim).enumerate() {
        let dist = manhattan_distance(point, cent);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((c, dist)),
        }
    }

    best
}

///////////
// Tests //
///////////
