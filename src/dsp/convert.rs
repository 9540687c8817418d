//! Scalar conversion helpers shared by the DSP modules

use num_traits::Float;

/// Convert linear amplitude to decibels
///
/// Non-positive amplitudes map to negative infinity.
#[inline]
pub fn linear_to_db<T: Float>(linear: T) -> T {
    if linear > T::zero() {
        T::from(20.0).unwrap_or_else(T::one) * linear.log10()
    } else {
        T::neg_infinity()
    }
}

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear<T: Float>(db: T) -> T {
    let twenty = T::from(20.0).unwrap_or_else(T::one);
    let ten = T::from(10.0).unwrap_or_else(T::one);
    ten.powf(db / twenty)
}

/// One step of an exponential step response: `(1 - alpha) * target + alpha * current`
#[inline]
pub fn step_response<T: Float>(target: T, current: T, alpha: T) -> T {
    (T::one() - alpha) * target + alpha * current
}
