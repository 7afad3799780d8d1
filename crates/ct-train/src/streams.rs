//! Declared train streams.

use crate::error::{EngineResult, TrainError};
use ct_fluids::Composition;

/// Direction of a declared stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamKind {
    /// Fluid entering the train ahead of its stage; composition is fixed at
    /// declaration, the rate arrives per time step.
    Inlet { composition: Composition },
    /// Fluid leaving the train ahead of its stage (export/injection takeoff).
    Outlet,
}

/// A stream attached to a stage.
///
/// Declared once at train construction. Multiple streams may attach to the
/// same stage: outgoing rates are always subtracted from the running stream
/// before incoming ones are mixed in, regardless of declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSpec {
    /// Stage this stream attaches to (0-based).
    pub stage_index: usize,
    pub kind: StreamKind,
}

impl StreamSpec {
    pub fn inlet(stage_index: usize, composition: Composition) -> Self {
        Self {
            stage_index,
            kind: StreamKind::Inlet { composition },
        }
    }

    pub fn outlet(stage_index: usize) -> Self {
        Self {
            stage_index,
            kind: StreamKind::Outlet,
        }
    }

    pub fn is_inlet(&self) -> bool {
        matches!(self.kind, StreamKind::Inlet { .. })
    }

    pub fn composition(&self) -> Option<&Composition> {
        match &self.kind {
            StreamKind::Inlet { composition } => Some(composition),
            StreamKind::Outlet => None,
        }
    }

    /// Validate a declared stream list against a stage count.
    pub fn validate_list(streams: &[StreamSpec], stage_count: usize) -> EngineResult<()> {
        if streams.is_empty() {
            return Err(TrainError::InvalidTrain {
                what: "train needs at least one stream",
            });
        }
        if streams.iter().any(|s| s.stage_index >= stage_count) {
            return Err(TrainError::InvalidTrain {
                what: "stream attached to a stage index out of range",
            });
        }
        if !streams.iter().any(|s| s.is_inlet() && s.stage_index == 0) {
            return Err(TrainError::InvalidTrain {
                what: "train needs an inlet stream at the first stage",
            });
        }
        Ok(())
    }
}
