//! Floating point comparisons built on the `approx` crate.
//!
//! The simulator uses these to check population conservation; tests use them
//! through the [`assert_almost_eq!`](crate::assert_almost_eq) and
//! [`assert_relatively_eq!`](crate::assert_relatively_eq) macros.

use approx::{AbsDiffEq, RelativeEq};

/// Relative tolerance used for the conservation check on trajectories.
pub const CONSERVATION_TOLERANCE: f64 = 1e-6;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Compares if two floats are close relative to the larger magnitude. Two zeros are equal.
#[must_use]
pub fn relatively_eq(a: f64, b: f64, max_relative: f64) -> bool {
    a.relative_eq(&b, f64::EPSILON, max_relative)
}

/// `|a - b| / max(|a|, |b|)`, or zero when both are zero.
#[must_use]
pub fn relative_difference(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        0.0
    } else {
        (a - b).abs() / scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_almost_eq, assert_relatively_eq};

    #[test]
    fn almost_eq_within_tolerance() {
        assert!(almost_eq(1.0, 1.0 + 0.5e-11, 1e-10));
        assert!(!almost_eq(1.0, 1.0 + 2e-10, 1e-10));
    }

    #[test]
    fn almost_eq_infinities() {
        assert!(almost_eq(f64::INFINITY, f64::INFINITY, 1e-10));
        assert!(!almost_eq(f64::INFINITY, f64::NEG_INFINITY, 1e-10));
    }

    #[test]
    fn relative_comparisons_scale_with_magnitude() {
        // A difference of 1 person in a population of ten million.
        assert!(relatively_eq(11_455_519.0, 11_455_520.0, 1e-6));
        assert!(!relatively_eq(10.0, 11.0, 1e-6));
        assert!(relatively_eq(0.0, 0.0, 1e-12));
        assert_almost_eq!(relative_difference(100.0, 99.0), 0.01, 1e-15);
        assert_eq!(relative_difference(0.0, 0.0), 0.0);
    }

    #[test]
    fn assert_relatively_eq_macro_passes() {
        assert_relatively_eq!(1e7, 1e7 + 1.0, 1e-6);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn assert_almost_eq_macro_panics() {
        assert_almost_eq!(1.0, 1.001, 1e-4);
    }
}
