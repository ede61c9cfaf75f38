use num_traits::{Float, FromPrimitive, ToPrimitive};
use std::fmt::Debug;
use std::iter::Sum;

/// Trait for floating-point types the clustering engines work on. Has all of
/// the common floating-point operations and traits.
pub trait ClusterFloat:
    Float + FromPrimitive + ToPrimitive + Send + Sync + Sum + Debug + 'static
{
}

impl<T> ClusterFloat for T where
    T: Float + FromPrimitive + ToPrimitive + Send + Sync + Sum + Debug + 'static
{
}

/// Convert a configuration value into the working float type
///
/// ### Params
///
/// * `value` - The `f64` to convert
///
/// ### Returns
///
/// The value as `T`. Values that cannot be represented become infinity.
#[inline]
pub fn float_from_f64<T: ClusterFloat>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::infinity)
}
