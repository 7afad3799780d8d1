//! Per-time-step evaluation results.
//!
//! Two layers, after the pattern of keeping rich solver state separate from
//! what gets persisted: [`TrainEvaluation`] carries full fluid-stream
//! snapshots through the nested solvers, and [`TrainResult`] is the flat
//! serde-friendly record handed to the downstream result consumer.

use ct_charts::ChartArea;
use ct_core::numeric::pressures_match;
use ct_core::units::{ActualRate, PolytropicHead, Speed};
use ct_fluids::FluidStream;
use serde::{Deserialize, Serialize};

/// How the computed pressures relate to the requested targets.
///
/// Infeasibility is encoded here instead of in errors; callers must inspect
/// this alongside the per-stage chart areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetPressureStatus {
    /// No evaluation ran (zero-rate short-circuit).
    NotCalculated,
    /// All requested pressures met within tolerance.
    Met,
    BelowTargetSuctionPressure,
    AboveTargetSuctionPressure,
    BelowTargetDischargePressure,
    AboveTargetDischargePressure,
    BelowTargetInterstagePressure,
    AboveTargetInterstagePressure,
}

/// Requested pressures for one time step, in Pa.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureTargets {
    pub suction_pa: f64,
    pub discharge_pa: f64,
    /// Interstage constraint: pressure at the inlet of the given stage.
    pub interstage: Option<(usize, f64)>,
}

/// One stage's evaluated operating point, with full stream state.
#[derive(Debug, Clone)]
pub struct StageEvaluation {
    /// Conditioned stage inlet (after upstream pressure drop and cooling).
    pub inlet: FluidStream,
    /// Stage outlet after compression.
    pub outlet: FluidStream,
    /// Net throughput [kg/s], excluding recirculation.
    pub mass_rate: f64,
    /// Recirculated mass rate [kg/s] (ASV).
    pub recirculated_mass_rate: f64,
    /// Actual volumetric rate at the impeller [Am³/h], incl. recirculation.
    pub actual_rate: ActualRate,
    /// Polytropic head [J/kg] from the chart.
    pub head: PolytropicHead,
    /// Polytropic efficiency from the chart.
    pub efficiency: f64,
    /// Shaft power drawn by this stage [W].
    pub power_w: f64,
    /// Operating point classification against the chart envelope.
    pub chart_area: ChartArea,
}

/// Rich result of one train evaluation at one speed.
#[derive(Debug, Clone)]
pub struct TrainEvaluation {
    /// Per-stage results in stage order; empty for the zero-rate result.
    pub stages: Vec<StageEvaluation>,
    /// Shaft speed the evaluation ran at [rpm].
    pub speed: Speed,
    /// Feed pressure as supplied by the caller [Pa] (upstream of any choke).
    pub inlet_pressure_pa: f64,
    /// Inlet pressure after upstream choking, when a choke acted [Pa].
    pub choked_inlet_pressure_pa: Option<f64>,
    /// Reported discharge after downstream choking, when a choke acted [Pa].
    pub choked_discharge_pressure_pa: Option<f64>,
    /// Filled in by [`TrainEvaluation::derive_status`].
    pub target_pressure_status: TargetPressureStatus,
}

impl TrainEvaluation {
    /// The zero-power result used when no inlet stream carries flow.
    pub fn empty(speed: Speed, inlet_pressure_pa: f64) -> Self {
        Self {
            stages: Vec::new(),
            speed,
            inlet_pressure_pa,
            choked_inlet_pressure_pa: None,
            choked_discharge_pressure_pa: None,
            target_pressure_status: TargetPressureStatus::NotCalculated,
        }
    }

    /// Reported train discharge pressure [Pa]: the downstream-choked value
    /// when a choke acted, otherwise the last stage outlet. Zero for the
    /// empty result.
    pub fn discharge_pressure_pa(&self) -> f64 {
        if let Some(p) = self.choked_discharge_pressure_pa {
            return p;
        }
        self.stages
            .last()
            .map(|s| s.outlet.pressure().value)
            .unwrap_or(0.0)
    }

    /// Pressure at the inlet of stage `index` [Pa]: the previous stage's
    /// outlet, or the train feed for stage 0.
    pub fn pressure_at_stage_inlet(&self, index: usize) -> f64 {
        if index == 0 {
            return self
                .choked_inlet_pressure_pa
                .unwrap_or(self.inlet_pressure_pa);
        }
        self.stages
            .get(index - 1)
            .map(|s| s.outlet.pressure().value)
            .unwrap_or(0.0)
    }

    pub fn total_power_w(&self) -> f64 {
        self.stages.iter().map(|s| s.power_w).sum()
    }

    /// True when every stage operates within chart capacity (possibly with
    /// recirculation).
    pub fn is_within_capacity(&self) -> bool {
        self.stages.iter().all(|s| s.chart_area.is_within_capacity())
    }

    /// Compare computed pressures against the requested targets and set
    /// [`TrainEvaluation::target_pressure_status`].
    ///
    /// Checked in flow order: suction, interstage, discharge. The first
    /// mismatch wins.
    pub fn derive_status(&mut self, targets: &PressureTargets) {
        if self.stages.is_empty() {
            self.target_pressure_status = TargetPressureStatus::NotCalculated;
            return;
        }

        // Suction is reported upstream of any choke valve, so a mismatch
        // here means inconsistent inputs rather than control action.
        if !pressures_match(self.inlet_pressure_pa, targets.suction_pa) {
            self.target_pressure_status = if self.inlet_pressure_pa < targets.suction_pa {
                TargetPressureStatus::BelowTargetSuctionPressure
            } else {
                TargetPressureStatus::AboveTargetSuctionPressure
            };
            return;
        }

        if let Some((stage_index, target_pa)) = targets.interstage {
            let calc = self.pressure_at_stage_inlet(stage_index);
            if !pressures_match(calc, target_pa) {
                self.target_pressure_status = if calc < target_pa {
                    TargetPressureStatus::BelowTargetInterstagePressure
                } else {
                    TargetPressureStatus::AboveTargetInterstagePressure
                };
                return;
            }
        }

        let discharge = self.discharge_pressure_pa();
        self.target_pressure_status = if pressures_match(discharge, targets.discharge_pa) {
            TargetPressureStatus::Met
        } else if discharge < targets.discharge_pa {
            TargetPressureStatus::BelowTargetDischargePressure
        } else {
            TargetPressureStatus::AboveTargetDischargePressure
        };
    }
}

/// Flat serialization-ready snapshot of one stage result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSnapshot {
    pub inlet_pressure_pa: f64,
    pub inlet_temperature_k: f64,
    pub outlet_pressure_pa: f64,
    pub outlet_temperature_k: f64,
    pub mass_rate_kg_per_s: f64,
    pub recirculated_mass_rate_kg_per_s: f64,
    pub actual_rate_m3_per_h: f64,
    pub polytropic_head_j_per_kg: f64,
    pub polytropic_efficiency: f64,
    pub power_w: f64,
    pub chart_area: ChartArea,
}

/// Per-time-step train result handed to the downstream consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainResult {
    pub stages: Vec<StageSnapshot>,
    pub speed_rpm: f64,
    pub target_pressure_status: TargetPressureStatus,
    pub total_power_w: f64,
    pub suction_pressure_pa: f64,
    pub discharge_pressure_pa: f64,
    /// Set when upstream choking acted.
    pub choked_inlet_pressure_pa: Option<f64>,
}

impl TrainResult {
    pub fn from_evaluation(eval: &TrainEvaluation) -> Self {
        Self {
            stages: eval
                .stages
                .iter()
                .map(|s| StageSnapshot {
                    inlet_pressure_pa: s.inlet.pressure().value,
                    inlet_temperature_k: s.inlet.temperature().value,
                    outlet_pressure_pa: s.outlet.pressure().value,
                    outlet_temperature_k: s.outlet.temperature().value,
                    mass_rate_kg_per_s: s.mass_rate,
                    recirculated_mass_rate_kg_per_s: s.recirculated_mass_rate,
                    actual_rate_m3_per_h: s.actual_rate,
                    polytropic_head_j_per_kg: s.head,
                    polytropic_efficiency: s.efficiency,
                    power_w: s.power_w,
                    chart_area: s.chart_area,
                })
                .collect(),
            speed_rpm: eval.speed,
            target_pressure_status: eval.target_pressure_status,
            total_power_w: eval.total_power_w(),
            suction_pressure_pa: eval.inlet_pressure_pa,
            discharge_pressure_pa: eval.discharge_pressure_pa(),
            choked_inlet_pressure_pa: eval.choked_inlet_pressure_pa,
        }
    }
}
