//! Compressor chart trait and operating-point classification.

use crate::error::ChartResult;
use ct_core::units::{ActualRate, PolytropicHead, Speed};
use serde::{Deserialize, Serialize};

/// Where an operating point sits relative to the chart envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartArea {
    /// Inside the valid envelope.
    Internal,
    /// Left of the surge line: actual rate below the minimum-flow curve.
    /// Recoverable, an anti-surge valve recirculates flow to compensate.
    BelowMinimumFlow,
    /// Right of the stone wall: actual rate above the maximum-flow curve.
    AboveMaximumFlow,
    /// Required head exceeds the chart at every rate (left of the chart).
    AboveMaximumHead,
}

impl ChartArea {
    /// True when the machine can physically run this point, possibly with
    /// recirculation. Below-minimum-flow points are within capacity because
    /// the ASV makes up the difference; the two right/above areas are not.
    pub fn is_within_capacity(self) -> bool {
        matches!(self, ChartArea::Internal | ChartArea::BelowMinimumFlow)
    }
}

/// Compressor performance chart.
///
/// Maps (actual volumetric rate [Am³/h], shaft speed [rpm]) to polytropic
/// head [J/kg] and polytropic efficiency, and exposes the capacity envelope.
/// Implementations must be thread-safe; the train engine shares one chart
/// per stage across nested solver closures.
///
/// Contract expected by the solvers:
/// - head is non-increasing in rate at fixed speed
/// - head, min rate and max rate are non-decreasing in speed at fixed rate
pub trait CompressorChart: Send + Sync {
    /// Polytropic head [J/kg] and efficiency (0, 1] at an operating point.
    ///
    /// Rate is clamped to the envelope at the given speed so that solver
    /// brackets remain finite; callers classify the point separately via
    /// [`CompressorChart::classify_rate`].
    fn head_and_efficiency(
        &self,
        rate: ActualRate,
        speed: Speed,
    ) -> ChartResult<(PolytropicHead, f64)>;

    /// Minimum-flow (surge) limit [Am³/h] at the given speed.
    fn minimum_rate(&self, speed: Speed) -> ActualRate;

    /// Maximum-flow (stone wall) limit [Am³/h] at the given speed.
    fn maximum_rate(&self, speed: Speed) -> ActualRate;

    /// Lowest chart speed [rpm].
    fn minimum_speed(&self) -> Speed;

    /// Highest chart speed [rpm].
    fn maximum_speed(&self) -> Speed;

    /// True for charts with exactly one speed curve.
    fn is_single_speed(&self) -> bool {
        self.minimum_speed() == self.maximum_speed()
    }

    /// Classify a rate against the envelope at the given speed.
    fn classify_rate(&self, rate: ActualRate, speed: Speed) -> ChartArea {
        if rate < self.minimum_rate(speed) {
            ChartArea::BelowMinimumFlow
        } else if rate > self.maximum_rate(speed) {
            ChartArea::AboveMaximumFlow
        } else {
            ChartArea::Internal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_classification() {
        assert!(ChartArea::Internal.is_within_capacity());
        assert!(ChartArea::BelowMinimumFlow.is_within_capacity());
        assert!(!ChartArea::AboveMaximumFlow.is_within_capacity());
        assert!(!ChartArea::AboveMaximumHead.is_within_capacity());
    }
}
