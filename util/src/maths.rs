//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit a value to the inclusive range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

/// Returns true if `value` lies inside the inclusive band `[band.0, band.1]`.
pub fn is_within<T>(value: T, band: (T, T)) -> bool
where
    T: Float
{
    value >= band.0 && value <= band.1
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp_and_within() {
        assert_eq!(clamp(120f64, 0f64, 100f64), 100f64);
        assert_eq!(clamp(-3f64, 0f64, 100f64), 0f64);
        assert_eq!(clamp(42f64, 0f64, 100f64), 42f64);

        assert!(is_within(28f64, (28f64, 38f64)));
        assert!(is_within(38f64, (28f64, 38f64)));
        assert!(!is_within(38.01f64, (28f64, 38f64)));
    }

    #[test]
    fn test_rem_euclid() {
        const TAU: f64 = std::f64::consts::TAU;

        assert_eq!(rem_euclid(7f64, 4f64), 3f64);
        assert_eq!(rem_euclid(-1f64, 4f64), 3f64);
        assert!((rem_euclid(-1f64, TAU) - (TAU - 1f64)).abs() < 1e-12);
    }
}
