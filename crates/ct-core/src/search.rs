//! Bracketed scalar searches.
//!
//! Every iterative solve in the engine (shaft speed, choked inlet pressure,
//! recirculation amounts, maximum rate) is a 1-D search over a known
//! bracket, so plain bisection with a hard iteration cap
//! is used throughout. Non-convergence is reported, not raised: callers get
//! the best estimate after the cap and decide themselves whether the residual
//! is acceptable.

use crate::numeric::{MAX_ITERATIONS, Real};
use tracing::{debug, trace};

/// Convergence criterion on the x-axis of a search.
#[derive(Clone, Copy, Debug)]
pub enum SearchTolerance {
    /// Bracket width below this value.
    Absolute(Real),
    /// Bracket width below this fraction of the bracket midpoint magnitude.
    /// Use for quantities spanning wide magnitudes, e.g. mass rates.
    Relative(Real),
}

impl SearchTolerance {
    fn met(&self, lower: Real, upper: Real) -> bool {
        let width = (upper - lower).abs();
        match *self {
            SearchTolerance::Absolute(tol) => width <= tol,
            SearchTolerance::Relative(tol) => {
                let scale = 0.5 * (lower.abs() + upper.abs());
                width <= tol * scale.max(Real::MIN_POSITIVE)
            }
        }
    }
}

/// Outcome of a bracketed root search.
#[derive(Clone, Copy, Debug)]
pub struct RootSearchResult {
    /// Best estimate of the root.
    pub x: Real,
    /// Function value at `x`.
    pub residual: Real,
    /// Iterations spent.
    pub iterations: usize,
    /// False when the iteration cap was hit before the tolerance.
    pub converged: bool,
}

/// Find `x` in `[lower, upper]` with `f(x) ≈ 0` by bisection.
///
/// Assumes a sign change across the bracket (monotonic or single-root).
/// If both endpoints share a sign the closer-to-zero endpoint is returned
/// with `converged = false`; the bracket is the caller's responsibility.
///
/// # Arguments
/// * `lower`, `upper` - Bracket, `lower < upper`
/// * `tol` - Convergence criterion on the bracket width
/// * `max_iterations` - Iteration cap, typically [`MAX_ITERATIONS`]
/// * `f` - Residual function; errors abort the search
pub fn find_root<F, E>(
    lower: Real,
    upper: Real,
    tol: SearchTolerance,
    max_iterations: usize,
    mut f: F,
) -> Result<RootSearchResult, E>
where
    F: FnMut(Real) -> Result<Real, E>,
{
    let mut lo = lower;
    let mut hi = upper;
    let mut f_lo = f(lo)?;
    let f_hi = f(hi)?;

    if f_lo == 0.0 {
        return Ok(RootSearchResult {
            x: lo,
            residual: 0.0,
            iterations: 0,
            converged: true,
        });
    }
    if f_hi == 0.0 {
        return Ok(RootSearchResult {
            x: hi,
            residual: 0.0,
            iterations: 0,
            converged: true,
        });
    }
    if f_lo.signum() == f_hi.signum() {
        debug!(lower, upper, f_lo, f_hi, "no sign change across bracket");
        let (x, residual) = if f_lo.abs() <= f_hi.abs() {
            (lo, f_lo)
        } else {
            (hi, f_hi)
        };
        return Ok(RootSearchResult {
            x,
            residual,
            iterations: 0,
            converged: false,
        });
    }

    let mut mid = 0.5 * (lo + hi);
    let mut f_mid = f_lo;
    for iter in 1..=max_iterations {
        mid = 0.5 * (lo + hi);
        f_mid = f(mid)?;
        trace!(iter, mid, f_mid, "root search step");

        if f_mid == 0.0 || tol.met(lo, hi) {
            return Ok(RootSearchResult {
                x: mid,
                residual: f_mid,
                iterations: iter,
                converged: true,
            });
        }

        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    debug!(
        x = mid,
        residual = f_mid,
        max_iterations,
        "root search hit iteration cap"
    );
    Ok(RootSearchResult {
        x: mid,
        residual: f_mid,
        iterations: max_iterations,
        converged: false,
    })
}

/// Binary-search the boundary of a boolean predicate.
///
/// The predicate is assumed to hold on a contiguous sub-interval adjoining
/// `valid_bound` and to fail beyond it. Returns the x closest to
/// `invalid_bound` for which the predicate still holds, to within `tol`.
/// Passing `valid_bound < invalid_bound` maximizes x; swapping the bounds
/// minimizes it.
///
/// No convergence guarantee beyond the iteration cap; the returned value is
/// a best estimate and always one where the predicate held.
pub fn boundary_search<F, E>(
    valid_bound: Real,
    invalid_bound: Real,
    tol: SearchTolerance,
    max_iterations: usize,
    mut predicate: F,
) -> Result<Real, E>
where
    F: FnMut(Real) -> Result<bool, E>,
{
    let mut valid = valid_bound;
    let mut invalid = invalid_bound;

    for iter in 0..max_iterations {
        if tol.met(valid.min(invalid), valid.max(invalid)) {
            break;
        }
        let mid = 0.5 * (valid + invalid);
        if predicate(mid)? {
            valid = mid;
        } else {
            invalid = mid;
        }
        trace!(iter, valid, invalid, "boundary search step");
    }

    Ok(valid)
}

/// Default iteration cap re-exported next to the searches that use it.
pub const DEFAULT_MAX_ITERATIONS: usize = MAX_ITERATIONS;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn root_of_linear_function() {
        let res: Result<_, std::convert::Infallible> = find_root(
            0.0,
            10.0,
            SearchTolerance::Absolute(1e-9),
            60,
            |x| Ok(x - 3.0),
        );
        let res = res.unwrap();
        assert!(res.converged);
        assert_relative_eq!(res.x, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn root_with_relative_tolerance() {
        // Root at 2e6; an absolute tolerance of 1e-9 would need ~50 steps,
        // a relative one gets there well inside the cap.
        let res: Result<_, std::convert::Infallible> = find_root(
            1.0e6,
            4.0e6,
            SearchTolerance::Relative(1e-6),
            60,
            |x| Ok(x - 2.0e6),
        );
        let res = res.unwrap();
        assert!(res.converged);
        assert_relative_eq!(res.x, 2.0e6, max_relative = 1e-5);
    }

    #[test]
    fn no_sign_change_returns_best_endpoint() {
        let res: Result<_, std::convert::Infallible> = find_root(
            1.0,
            2.0,
            SearchTolerance::Absolute(1e-9),
            20,
            |x| Ok(x + 10.0),
        );
        let res = res.unwrap();
        assert!(!res.converged);
        assert_eq!(res.x, 1.0);
    }

    #[test]
    fn iteration_cap_returns_best_effort() {
        let res: Result<_, std::convert::Infallible> = find_root(
            0.0,
            1.0,
            SearchTolerance::Absolute(1e-30),
            5,
            |x| Ok(x - 0.3),
        );
        let res = res.unwrap();
        assert!(!res.converged);
        assert!((res.x - 0.3).abs() < 0.1);
    }

    #[test]
    fn boundary_search_maximizes() {
        // predicate true on [0, 7.25]
        let x: Result<_, std::convert::Infallible> = boundary_search(
            0.0,
            10.0,
            SearchTolerance::Absolute(1e-6),
            60,
            |x| Ok(x <= 7.25),
        );
        let x = x.unwrap();
        assert_relative_eq!(x, 7.25, epsilon = 1e-4);
        assert!(x <= 7.25);
    }

    proptest::proptest! {
        #[test]
        fn finds_root_of_any_monotone_line(
            root in -1.0e6_f64..1.0e6,
            slope in 0.1_f64..100.0,
        ) {
            let res: Result<_, std::convert::Infallible> = find_root(
                -2.0e6,
                2.0e6,
                SearchTolerance::Absolute(1.0),
                60,
                |x| Ok(slope * (x - root)),
            );
            let res = res.unwrap();
            proptest::prop_assert!(res.converged);
            proptest::prop_assert!((res.x - root).abs() <= 1.0);
        }
    }

    #[test]
    fn boundary_search_minimizes_with_swapped_bounds() {
        // predicate true on [4.5, 10]
        let x: Result<_, std::convert::Infallible> = boundary_search(
            10.0,
            0.0,
            SearchTolerance::Absolute(1e-6),
            60,
            |x| Ok(x >= 4.5),
        );
        let x = x.unwrap();
        assert_relative_eq!(x, 4.5, epsilon = 1e-4);
        assert!(x >= 4.5);
    }
}
