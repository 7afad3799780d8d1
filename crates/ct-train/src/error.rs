//! Train engine errors.
//!
//! Only programming and configuration errors surface here. Infeasible
//! operating points are data, not errors: they come back through
//! `TargetPressureStatus` and per-stage chart areas, and solver
//! non-convergence is a best-effort result, never an `Err`.

use ct_charts::ChartError;
use ct_fluids::FluidError;
use thiserror::Error;

/// Result type for train operations. (`TrainResult` is the per-time-step
/// output data type, hence the distinct alias name.)
pub type EngineResult<T> = Result<T, TrainError>;

/// Errors raised by the compressor-train engine.
#[derive(Error, Debug, Clone)]
pub enum TrainError {
    /// Sentinel for exhausted solution regions. Reaching this means a
    /// modeling assumption was violated, not that the input was infeasible.
    #[error("Internal error: {what}")]
    Internal { what: &'static str },

    /// A stage received zero net mass rate and no recirculation fluid has
    /// ever been stored for it.
    #[error("No recirculation fluid available for stage {stage}")]
    MissingRecirculationFluid { stage: usize },

    /// Train construction rejected the configuration.
    #[error("Invalid train configuration: {what}")]
    InvalidTrain { what: &'static str },

    /// Per-time-step input rejected.
    #[error("Invalid input: {what}")]
    InvalidInput { what: &'static str },

    #[error(transparent)]
    Fluid(#[from] FluidError),

    #[error(transparent)]
    Chart(#[from] ChartError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TrainError::MissingRecirculationFluid { stage: 2 };
        assert!(err.to_string().contains("stage 2"));
    }

    #[test]
    fn fluid_error_converts() {
        let err: TrainError = FluidError::NonPhysical { what: "density" }.into();
        assert!(matches!(err, TrainError::Fluid(_)));
    }
}
