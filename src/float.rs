use rustfft::{num_traits, FftNum};

pub trait Float: FftNum + num_traits::Float + num_traits::FloatConst {}

impl<T: FftNum + num_traits::Float + num_traits::FloatConst> Float for T {}

/// Converts an `f64` constant into `T`.
#[inline]
pub fn lit<T: Float>(x: f64) -> T {
    <T as num_traits::NumCast>::from(x).unwrap_or_else(T::nan)
}

/// Converts an index or length into `T`.
#[inline]
pub fn from_usize<T: Float>(n: usize) -> T {
    <T as num_traits::NumCast>::from(n).unwrap_or_else(T::nan)
}

/// Converts back to an index, saturating at zero for negative or NaN input.
#[inline]
pub fn to_index<T: Float>(x: T) -> usize {
    x.to_usize().unwrap_or(0)
}
