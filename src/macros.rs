/// Asserts that two `f64` values differ by less than an absolute tolerance.
#[macro_export]
macro_rules! assert_almost_eq {
    ($a:expr, $b:expr, $prec:expr $(,)?) => {
        if !$crate::numeric::almost_eq($a, $b, $prec) {
            panic!(
                "assertion failed: `abs(left - right) < {:e}`, (left: `{}`, right: `{}`)",
                $prec, $a, $b
            );
        }
    };
}

/// Asserts that two `f64` values agree to within a relative tolerance, measured
/// against the larger of the two magnitudes.
#[macro_export]
macro_rules! assert_relatively_eq {
    ($a:expr, $b:expr, $rel:expr $(,)?) => {
        if !$crate::numeric::relatively_eq($a, $b, $rel) {
            panic!(
                "assertion failed: `abs(left - right) <= {:e} * max(|left|, |right|)`, (left: `{}`, right: `{}`)",
                $rel, $a, $b
            );
        }
    };
}
