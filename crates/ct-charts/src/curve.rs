//! Interpolated speed-curve chart.

use crate::chart::CompressorChart;
use crate::error::{ChartError, ChartResult};
use ct_core::units::{ActualRate, PolytropicHead, Speed};
use serde::{Deserialize, Serialize};

/// One measured point on a speed curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Actual volumetric rate [Am³/h]
    pub rate: ActualRate,
    /// Polytropic head [J/kg]
    pub head: PolytropicHead,
    /// Polytropic efficiency (0, 1]
    pub efficiency: f64,
}

/// A constant-speed curve: head and efficiency versus rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedCurve {
    /// Shaft speed [rpm]
    pub speed: Speed,
    /// Points sorted by strictly increasing rate
    pub points: Vec<CurvePoint>,
}

impl SpeedCurve {
    fn validate(&self) -> ChartResult<()> {
        if self.points.len() < 2 {
            return Err(ChartError::InvalidChart {
                what: "speed curve needs at least two points",
            });
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(ChartError::InvalidChart {
                what: "curve speed must be positive and finite",
            });
        }
        for pair in self.points.windows(2) {
            if pair[1].rate <= pair[0].rate {
                return Err(ChartError::InvalidChart {
                    what: "curve rates must be strictly increasing",
                });
            }
            if pair[1].head > pair[0].head {
                return Err(ChartError::InvalidChart {
                    what: "curve head must be non-increasing with rate",
                });
            }
        }
        for p in &self.points {
            if p.efficiency <= 0.0 || p.efficiency > 1.0 {
                return Err(ChartError::InvalidChart {
                    what: "efficiency must be in (0, 1]",
                });
            }
            if !p.head.is_finite() || p.head < 0.0 {
                return Err(ChartError::InvalidChart {
                    what: "head must be non-negative and finite",
                });
            }
        }
        Ok(())
    }

    fn min_rate(&self) -> ActualRate {
        self.points[0].rate
    }

    fn max_rate(&self) -> ActualRate {
        self.points[self.points.len() - 1].rate
    }

    /// Head and efficiency at `rate`, clamped to the curve's rate range.
    fn head_and_efficiency(&self, rate: ActualRate) -> (PolytropicHead, f64) {
        let rate = rate.clamp(self.min_rate(), self.max_rate());
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if rate <= b.rate {
                let w = (rate - a.rate) / (b.rate - a.rate);
                let head = a.head + w * (b.head - a.head);
                let eff = a.efficiency + w * (b.efficiency - a.efficiency);
                return (head, eff);
            }
        }
        let last = self.points[self.points.len() - 1];
        (last.head, last.efficiency)
    }
}

/// Compressor chart built from one or more speed curves with linear
/// interpolation in rate along a curve and in speed between adjacent curves.
///
/// A single-curve chart models a fixed-speed machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveChart {
    /// Curves sorted by strictly increasing speed
    curves: Vec<SpeedCurve>,
}

impl CurveChart {
    /// Build a chart from speed curves.
    ///
    /// # Errors
    /// `InvalidChart` when there are no curves, speeds are not strictly
    /// increasing, or any curve fails its own validation.
    pub fn new(mut curves: Vec<SpeedCurve>) -> ChartResult<Self> {
        if curves.is_empty() {
            return Err(ChartError::InvalidChart {
                what: "chart needs at least one speed curve",
            });
        }
        curves.sort_by(|a, b| a.speed.total_cmp(&b.speed));
        for pair in curves.windows(2) {
            if pair[1].speed <= pair[0].speed {
                return Err(ChartError::InvalidChart {
                    what: "curve speeds must be distinct",
                });
            }
        }
        for curve in &curves {
            curve.validate()?;
        }
        Ok(Self { curves })
    }

    /// Build a fixed-speed chart from a single curve.
    pub fn single_speed(curve: SpeedCurve) -> ChartResult<Self> {
        Self::new(vec![curve])
    }

    /// Neighbouring curves and interpolation weight for a speed,
    /// clamped to the chart's speed range.
    fn bracket(&self, speed: Speed) -> (&SpeedCurve, &SpeedCurve, f64) {
        let first = &self.curves[0];
        let last = &self.curves[self.curves.len() - 1];
        if speed <= first.speed || self.curves.len() == 1 {
            return (first, first, 0.0);
        }
        if speed >= last.speed {
            return (last, last, 0.0);
        }
        for pair in self.curves.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if speed <= hi.speed {
                let w = (speed - lo.speed) / (hi.speed - lo.speed);
                return (lo, hi, w);
            }
        }
        (last, last, 0.0)
    }
}

impl CompressorChart for CurveChart {
    fn head_and_efficiency(
        &self,
        rate: ActualRate,
        speed: Speed,
    ) -> ChartResult<(PolytropicHead, f64)> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(ChartError::OutOfRange { what: "rate" });
        }
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ChartError::OutOfRange { what: "speed" });
        }
        let (lo, hi, w) = self.bracket(speed);
        let (head_lo, eff_lo) = lo.head_and_efficiency(rate);
        let (head_hi, eff_hi) = hi.head_and_efficiency(rate);
        Ok((
            head_lo + w * (head_hi - head_lo),
            eff_lo + w * (eff_hi - eff_lo),
        ))
    }

    fn minimum_rate(&self, speed: Speed) -> ActualRate {
        let (lo, hi, w) = self.bracket(speed);
        lo.min_rate() + w * (hi.min_rate() - lo.min_rate())
    }

    fn maximum_rate(&self, speed: Speed) -> ActualRate {
        let (lo, hi, w) = self.bracket(speed);
        lo.max_rate() + w * (hi.max_rate() - lo.max_rate())
    }

    fn minimum_speed(&self) -> Speed {
        self.curves[0].speed
    }

    fn maximum_speed(&self) -> Speed {
        self.curves[self.curves.len() - 1].speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartArea;
    use approx::assert_relative_eq;

    fn curve(speed: f64, scale: f64) -> SpeedCurve {
        SpeedCurve {
            speed,
            points: vec![
                CurvePoint {
                    rate: 1000.0 * scale,
                    head: 120_000.0 * scale * scale,
                    efficiency: 0.72,
                },
                CurvePoint {
                    rate: 2000.0 * scale,
                    head: 100_000.0 * scale * scale,
                    efficiency: 0.75,
                },
                CurvePoint {
                    rate: 3000.0 * scale,
                    head: 70_000.0 * scale * scale,
                    efficiency: 0.70,
                },
            ],
        }
    }

    #[test]
    fn single_speed_chart() {
        let chart = CurveChart::single_speed(curve(7500.0, 1.0)).unwrap();
        assert!(chart.is_single_speed());
        assert_eq!(chart.minimum_rate(7500.0), 1000.0);
        assert_eq!(chart.maximum_rate(7500.0), 3000.0);

        let (head, eff) = chart.head_and_efficiency(1500.0, 7500.0).unwrap();
        assert_relative_eq!(head, 110_000.0, epsilon = 1.0);
        assert_relative_eq!(eff, 0.735, epsilon = 1e-9);
    }

    #[test]
    fn rate_is_clamped_outside_envelope() {
        let chart = CurveChart::single_speed(curve(7500.0, 1.0)).unwrap();
        let (head_low, _) = chart.head_and_efficiency(100.0, 7500.0).unwrap();
        assert_relative_eq!(head_low, 120_000.0);
        let (head_high, _) = chart.head_and_efficiency(9000.0, 7500.0).unwrap();
        assert_relative_eq!(head_high, 70_000.0);
    }

    #[test]
    fn classification_against_envelope() {
        let chart = CurveChart::single_speed(curve(7500.0, 1.0)).unwrap();
        assert_eq!(chart.classify_rate(500.0, 7500.0), ChartArea::BelowMinimumFlow);
        assert_eq!(chart.classify_rate(1500.0, 7500.0), ChartArea::Internal);
        assert_eq!(chart.classify_rate(3500.0, 7500.0), ChartArea::AboveMaximumFlow);
    }

    #[test]
    fn speed_interpolation_midway() {
        let chart = CurveChart::new(vec![curve(7500.0, 1.0), curve(10_500.0, 1.4)]).unwrap();
        assert!(!chart.is_single_speed());

        let mid = 9000.0;
        let min_lo = 1000.0;
        let min_hi = 1400.0;
        assert_relative_eq!(chart.minimum_rate(mid), 0.5 * (min_lo + min_hi));

        // head at a common rate grows with speed
        let (h_lo, _) = chart.head_and_efficiency(1500.0, 7500.0).unwrap();
        let (h_mid, _) = chart.head_and_efficiency(1500.0, mid).unwrap();
        let (h_hi, _) = chart.head_and_efficiency(1500.0, 10_500.0).unwrap();
        assert!(h_lo < h_mid && h_mid < h_hi);
    }

    #[test]
    fn speed_is_clamped_to_chart_range() {
        let chart = CurveChart::new(vec![curve(7500.0, 1.0), curve(10_500.0, 1.4)]).unwrap();
        assert_eq!(chart.minimum_rate(5000.0), chart.minimum_rate(7500.0));
        assert_eq!(chart.maximum_rate(12_000.0), chart.maximum_rate(10_500.0));
    }

    #[test]
    fn rejects_unsorted_heads() {
        let bad = SpeedCurve {
            speed: 7500.0,
            points: vec![
                CurvePoint {
                    rate: 1000.0,
                    head: 100_000.0,
                    efficiency: 0.7,
                },
                CurvePoint {
                    rate: 2000.0,
                    head: 120_000.0,
                    efficiency: 0.7,
                },
            ],
        };
        assert!(CurveChart::single_speed(bad).is_err());
    }
}
