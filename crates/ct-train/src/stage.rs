//! Compression stage and its evaluator.

use crate::error::{EngineResult, TrainError};
use crate::result::StageEvaluation;
use ct_charts::CompressorChart;
use ct_core::units::constants::SECONDS_PER_HOUR;
use ct_core::units::{Pressure, Speed, Temperature, pa};
use ct_fluids::{FluidService, FluidStream};
use std::sync::Arc;

/// One compression stage mounted on the common shaft.
///
/// Immutable after train construction. Per-evaluation recirculation amounts
/// are carried in a [`StageContext`] rather than mutated here, so sub-trains
/// sharing stage references cannot interfere through evaluation order.
#[derive(Clone)]
pub struct TrainStage {
    /// Performance chart for this stage's machine.
    pub chart: Arc<dyn CompressorChart>,
    /// Gas is cooled to this temperature before entering the impeller.
    pub inlet_temperature: Temperature,
    /// Pressure drop across the upstream cooler/scrubber, taken off the
    /// feed pressure before the stage.
    pub pressure_drop_ahead: Pressure,
    /// Liquids dropped out in the upstream scrubber are removed before
    /// compression. The flash backend decides what, if anything, condenses.
    pub remove_liquid: bool,
}

impl std::fmt::Debug for TrainStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainStage")
            .field("inlet_temperature", &self.inlet_temperature.value)
            .field("pressure_drop_ahead", &self.pressure_drop_ahead.value)
            .field("remove_liquid", &self.remove_liquid)
            .finish()
    }
}

impl TrainStage {
    pub fn new(
        chart: Arc<dyn CompressorChart>,
        inlet_temperature: Temperature,
        pressure_drop_ahead: Pressure,
        remove_liquid: bool,
    ) -> EngineResult<Self> {
        if !inlet_temperature.value.is_finite() || inlet_temperature.value <= 0.0 {
            return Err(TrainError::InvalidTrain {
                what: "stage inlet temperature must be positive and finite",
            });
        }
        if !pressure_drop_ahead.value.is_finite() || pressure_drop_ahead.value < 0.0 {
            return Err(TrainError::InvalidTrain {
                what: "stage pressure drop must be non-negative and finite",
            });
        }
        Ok(Self {
            chart,
            inlet_temperature,
            pressure_drop_ahead,
            remove_liquid,
        })
    }
}

/// Per-evaluation rate modifier for one stage.
///
/// Exactly one of the two mechanisms is normally active; both default to
/// "no recirculation". Reset implicitly at every evaluation because a fresh
/// context is built per forward pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageContext {
    /// Fraction (0..=1) of the headroom toward the chart's maximum-flow
    /// curve recirculated through the anti-surge valve.
    pub asv_rate_fraction: f64,
    /// Explicit additional recirculated mass rate [kg/s].
    pub asv_additional_mass_rate: f64,
}

/// Evaluate one stage at a given speed.
///
/// Conditions the feed (upstream pressure drop, cooling to the stage inlet
/// temperature), applies ASV recirculation from `ctx`, looks up polytropic
/// head and efficiency, and flashes the outlet. Pure: reads the stage,
/// never mutates it.
///
/// # Arguments
/// * `feed` - Stream arriving from the previous stage or the train inlet
/// * `mass_rate` - Net throughput [kg/s], excluding recirculation
/// * `speed` - Shaft speed [rpm]
/// * `ctx` - Recirculation amounts for this evaluation
pub fn evaluate_stage(
    service: &dyn FluidService,
    stage: &TrainStage,
    feed: &FluidStream,
    mass_rate: f64,
    speed: Speed,
    ctx: StageContext,
) -> EngineResult<StageEvaluation> {
    let p_in = feed.pressure().value - stage.pressure_drop_ahead.value;
    if p_in <= 0.0 {
        return Err(TrainError::InvalidInput {
            what: "pressure drop ahead of stage exceeds feed pressure",
        });
    }

    // Inter-stage cooling; with remove_liquid the condensate leaves in the
    // scrubber and the gas phase continues. The backend's PT flash already
    // returns the continuing gas state.
    let inlet = service.stream_at_pt(feed.composition(), pa(p_in), stage.inlet_temperature)?;

    let rho = inlet.density().value;
    let total_before_fraction = mass_rate + ctx.asv_additional_mass_rate;
    let max_mass_rate = stage.chart.maximum_rate(speed) * rho / SECONDS_PER_HOUR;
    let headroom = (max_mass_rate - total_before_fraction).max(0.0);
    let total_mass_rate =
        total_before_fraction + ctx.asv_rate_fraction.clamp(0.0, 1.0) * headroom;

    let actual_rate = total_mass_rate / rho * SECONDS_PER_HOUR;
    let chart_area = stage.chart.classify_rate(actual_rate, speed);
    let (head, efficiency) = stage.chart.head_and_efficiency(actual_rate, speed)?;

    // Polytropic pressure ratio. p/rho stands in for ZRT/M at the inlet;
    // the flash backend already folded compressibility into rho.
    let kappa = inlet.kappa();
    let n_over_n_minus_1 = efficiency * kappa / (kappa - 1.0);
    let pressure_ratio =
        (1.0 + head * rho / (p_in * n_over_n_minus_1)).powf(n_over_n_minus_1);
    let p_out = p_in * pressure_ratio;

    let enthalpy_rise = if efficiency > 0.0 { head / efficiency } else { 0.0 };
    let outlet = service.stream_at_ph(
        inlet.composition(),
        pa(p_out),
        inlet.enthalpy() + enthalpy_rise,
    )?;

    let power_w = total_mass_rate * enthalpy_rise;

    Ok(StageEvaluation {
        inlet,
        outlet,
        mass_rate,
        recirculated_mass_rate: total_mass_rate - mass_rate,
        actual_rate,
        head,
        efficiency,
        power_w,
        chart_area,
    })
}
