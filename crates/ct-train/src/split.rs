//! Two-pressure solve for trains with an interstage pressure target.
//!
//! The train is cut ahead of a configured stage into two sub-trains that
//! share the physical shaft. Each sub-train solves its own speed for its
//! own pressure pair; the larger requirement governs, and the sub-train
//! that needed less is re-evaluated at the governing speed under its own
//! pressure-control policy.

use crate::error::{EngineResult, TrainError};
use crate::forward::{PassContext, net_stage_rates};
use crate::pressure_control::{self, PressureControl};
use crate::result::{PressureTargets, TargetPressureStatus, TrainEvaluation};
use crate::shaft::TrainShaft;
use crate::speed_solver::solve_shaft_speed;
use crate::stage::TrainStage;
use crate::streams::StreamSpec;
use ct_core::numeric::pressures_match;
use ct_fluids::{FluidService, FluidStream};
use tracing::debug;

/// Where to cut the train and how each half absorbs excess pressure when
/// the other half's speed requirement governs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterstageSpec {
    /// First stage of the downstream sub-train; the interstage pressure
    /// target applies at this stage's inlet.
    pub stage_index: usize,
    /// Policy for the upstream sub-train when the downstream one governs.
    pub upstream_policy: PressureControl,
    /// Policy for the downstream sub-train when the upstream one governs.
    pub downstream_policy: PressureControl,
}

impl InterstageSpec {
    pub fn validate(&self, stage_count: usize) -> EngineResult<()> {
        if self.stage_index == 0 || self.stage_index >= stage_count {
            return Err(TrainError::InvalidTrain {
                what: "interstage pressure target must cut between two stages",
            });
        }
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn solve_with_interstage(
    service: &dyn FluidService,
    stages: &[TrainStage],
    streams: &[StreamSpec],
    mass_rates: &[f64],
    memory: &[Option<FluidStream>],
    shaft: &TrainShaft,
    spec: &InterstageSpec,
    targets: &PressureTargets,
) -> EngineResult<TrainEvaluation> {
    let cut = spec.stage_index;
    let Some((_, interstage_pa)) = targets.interstage else {
        return Err(TrainError::Internal {
            what: "interstage solve called without an interstage target",
        });
    };

    let mut upstream_streams = Vec::new();
    let mut upstream_rates = Vec::new();
    for (stream, &rate) in streams.iter().zip(mass_rates) {
        if stream.stage_index < cut {
            upstream_streams.push(stream.clone());
            upstream_rates.push(rate);
        }
    }
    let upstream_ctx = PassContext {
        service,
        stages: &stages[..cut],
        streams: &upstream_streams,
        mass_rates: &upstream_rates,
        memory: &memory[..cut],
    };
    let upstream_targets = PressureTargets {
        suction_pa: targets.suction_pa,
        discharge_pa: interstage_pa,
        interstage: None,
    };
    let mut upstream = solve_shaft_speed(&upstream_ctx, shaft, &upstream_targets, None, None)?;

    // The downstream sub-train is fed by whatever crosses the cut: same
    // composition as the upstream outlet, at the net rate through the last
    // upstream stage.
    let Some(last_upstream) = upstream.stages.last() else {
        return Err(TrainError::Internal {
            what: "upstream sub-train produced no stage results",
        });
    };
    let handoff_composition = last_upstream.outlet.composition().clone();
    let handoff_rate = net_stage_rates(streams, mass_rates, stages.len())[cut - 1];

    let mut downstream_streams = vec![StreamSpec::inlet(0, handoff_composition)];
    let mut downstream_rates = vec![handoff_rate];
    for (stream, &rate) in streams.iter().zip(mass_rates) {
        if stream.stage_index >= cut {
            let mut shifted = stream.clone();
            shifted.stage_index -= cut;
            downstream_streams.push(shifted);
            downstream_rates.push(rate);
        }
    }
    let downstream_ctx = PassContext {
        service,
        stages: &stages[cut..],
        streams: &downstream_streams,
        mass_rates: &downstream_rates,
        memory: &memory[cut..],
    };
    let downstream_targets = PressureTargets {
        suction_pa: interstage_pa,
        discharge_pa: targets.discharge_pa,
        interstage: None,
    };
    let mut downstream =
        solve_shaft_speed(&downstream_ctx, shaft, &downstream_targets, None, None)?;

    // One physical shaft: the larger speed requirement wins, and the other
    // sub-train absorbs its overshoot through its policy.
    let governing = upstream.speed.max(downstream.speed);
    if upstream.speed < governing {
        debug!(governing, "downstream sub-train governs the shaft speed");
        upstream = pressure_control::apply(
            &spec.upstream_policy,
            &upstream_ctx,
            governing,
            targets.suction_pa,
            interstage_pa,
        )?;
        upstream.derive_status(&upstream_targets);
    } else if downstream.speed < governing {
        debug!(governing, "upstream sub-train governs the shaft speed");
        downstream = pressure_control::apply(
            &spec.downstream_policy,
            &downstream_ctx,
            governing,
            interstage_pa,
            targets.discharge_pa,
        )?;
        downstream.derive_status(&downstream_targets);
    }

    // Status checked against the choke-aware sub-train discharges; the raw
    // last-stage outlet of the upstream half may sit above the interstage
    // target when its choke absorbed the difference.
    let interstage_calc = upstream.discharge_pressure_pa();
    let discharge_calc = downstream.discharge_pressure_pa();
    let status = if !pressures_match(interstage_calc, interstage_pa) {
        if interstage_calc < interstage_pa {
            TargetPressureStatus::BelowTargetInterstagePressure
        } else {
            TargetPressureStatus::AboveTargetInterstagePressure
        }
    } else if pressures_match(discharge_calc, targets.discharge_pa) {
        TargetPressureStatus::Met
    } else if discharge_calc < targets.discharge_pa {
        TargetPressureStatus::BelowTargetDischargePressure
    } else {
        TargetPressureStatus::AboveTargetDischargePressure
    };

    Ok(TrainEvaluation {
        stages: upstream
            .stages
            .into_iter()
            .chain(downstream.stages)
            .collect(),
        speed: governing,
        inlet_pressure_pa: targets.suction_pa,
        choked_inlet_pressure_pa: upstream.choked_inlet_pressure_pa,
        choked_discharge_pressure_pa: downstream.choked_discharge_pressure_pa,
        target_pressure_status: status,
    })
}
