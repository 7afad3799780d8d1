//! Common shaft shared by all stages of a train.

use crate::error::{EngineResult, TrainError};
use crate::stage::TrainStage;
use ct_core::units::Speed;

/// Speed capability of the shaft every stage is mounted on.
///
/// Derived from the stage charts at construction. The resolved operating
/// speed is never stored here: it is threaded through solver calls as a
/// parameter and persisted only in the returned result, so sub-trains that
/// share one physical shaft cannot observe each other's partial state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainShaft {
    /// Fixed-speed machine; no speed search is ever run.
    SingleSpeed(Speed),
    /// Variable-speed machine with bounds from the chart intersection.
    VariableSpeed { minimum: Speed, maximum: Speed },
}

impl TrainShaft {
    /// Derive the shaft from the stage charts: the operating window is the
    /// intersection of every stage's chart speed range.
    pub fn from_stages(stages: &[TrainStage]) -> EngineResult<Self> {
        if stages.is_empty() {
            return Err(TrainError::InvalidTrain {
                what: "train needs at least one stage",
            });
        }

        let minimum = stages
            .iter()
            .map(|s| s.chart.minimum_speed())
            .fold(f64::MIN, f64::max);
        let maximum = stages
            .iter()
            .map(|s| s.chart.maximum_speed())
            .fold(f64::MAX, f64::min);

        if minimum > maximum {
            return Err(TrainError::InvalidTrain {
                what: "stage chart speed ranges do not overlap",
            });
        }

        if minimum == maximum {
            Ok(TrainShaft::SingleSpeed(minimum))
        } else {
            Ok(TrainShaft::VariableSpeed { minimum, maximum })
        }
    }

    /// Allowed speed window [rpm].
    pub fn bounds(&self) -> (Speed, Speed) {
        match *self {
            TrainShaft::SingleSpeed(s) => (s, s),
            TrainShaft::VariableSpeed { minimum, maximum } => (minimum, maximum),
        }
    }

    pub fn is_single_speed(&self) -> bool {
        matches!(self, TrainShaft::SingleSpeed(_))
    }

    /// Clamp a caller-supplied sub-range to the shaft window.
    pub fn clamp_range(&self, range: Option<(Speed, Speed)>) -> (Speed, Speed) {
        let (lo, hi) = self.bounds();
        match range {
            None => (lo, hi),
            Some((a, b)) => (a.max(lo), b.min(hi)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::tests::test_stage_with_speeds;

    #[test]
    fn intersection_of_stage_ranges() {
        let stages = vec![
            test_stage_with_speeds(7000.0, 11_000.0),
            test_stage_with_speeds(7500.0, 10_500.0),
        ];
        let shaft = TrainShaft::from_stages(&stages).unwrap();
        assert_eq!(shaft.bounds(), (7500.0, 10_500.0));
        assert!(!shaft.is_single_speed());
    }

    #[test]
    fn disjoint_ranges_rejected() {
        let stages = vec![
            test_stage_with_speeds(7000.0, 8000.0),
            test_stage_with_speeds(9000.0, 10_000.0),
        ];
        assert!(TrainShaft::from_stages(&stages).is_err());
    }

    #[test]
    fn clamp_range_narrows() {
        let stages = vec![test_stage_with_speeds(7000.0, 11_000.0)];
        let shaft = TrainShaft::from_stages(&stages).unwrap();
        assert_eq!(
            shaft.clamp_range(Some((6000.0, 9000.0))),
            (7000.0, 9000.0)
        );
        assert_eq!(shaft.clamp_range(None), (7000.0, 11_000.0));
    }
}
