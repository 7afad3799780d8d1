use crate::CoreError;

/// Floating point type used throughout the engine
pub type Real = f64;

/// Relative tolerance used when comparing a calculated pressure against a
/// requested target pressure.
pub const PRESSURE_CALCULATION_TOLERANCE: Real = 1e-3;

/// Hard cap on solver loop iterations. Searches return their best estimate
/// when the cap is reached; they never spin.
pub const MAX_ITERATIONS: usize = 20;

/// Smallest pressure the engine will ever hand to a fluid flash [Pa].
pub const EPSILON_PRESSURE: Real = 1e-3;

/// Mass rates below this are treated as zero flow [kg/s].
pub const EPSILON_MASS_RATE: Real = 1e-9;

/// One tolerance pair for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// True when `calculated` matches `target` within the engine's relative
/// pressure tolerance.
pub fn pressures_match(calculated: Real, target: Real) -> bool {
    if target == 0.0 {
        return calculated.abs() <= PRESSURE_CALCULATION_TOLERANCE;
    }
    ((calculated - target) / target).abs() <= PRESSURE_CALCULATION_TOLERANCE
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn pressure_match_is_relative() {
        assert!(pressures_match(100.0e5, 100.05e5));
        assert!(!pressures_match(100.0e5, 101.0e5));
        // scale-free: same relative error at 1 bar
        assert!(pressures_match(1.0e5, 1.0005e5));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }
}
