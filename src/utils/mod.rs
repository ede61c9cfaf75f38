pub mod dist;
pub mod k_means;
pub mod traits;

pub use dist::*;
pub use traits::*;

/////////////
// Helpers //
/////////////

/// Split a flat buffer into per-row slices
///
/// ### Params
///
/// * `flat` - Flattened vectors
/// * `dim` - Dimensionality
///
/// ### Returns
///
/// One slice per vector
pub fn rows<T>(flat: &[T], dim: usize) -> Vec<&[T]> {
    flat.chunks_exact(dim).collect()
}

///////////
// Tests //
///////////
