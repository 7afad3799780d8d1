//! Forward pass over the stages of a (sub-)train.
//!
//! Borrows everything it needs for one evaluation so the nested solvers can
//! re-run the pass at candidate speeds, inlet pressures, and recirculation
//! settings without touching train state.

use crate::error::{EngineResult, TrainError};
use crate::result::{TargetPressureStatus, TrainEvaluation};
use crate::stage::{StageContext, TrainStage, evaluate_stage};
use crate::streams::{StreamKind, StreamSpec};
use ct_core::numeric::EPSILON_MASS_RATE;
use ct_core::units::{Speed, pa};
use ct_fluids::{FluidService, FluidStream};

/// Everything one forward pass reads, borrowed from the train.
///
/// `mass_rates` pairs with `streams` index-for-index. `memory` holds one
/// recirculation slot per stage; for a sub-train it is the parent's slice
/// starting at the sub-train's first stage.
pub(crate) struct PassContext<'a> {
    pub service: &'a dyn FluidService,
    pub stages: &'a [TrainStage],
    pub streams: &'a [StreamSpec],
    pub mass_rates: &'a [f64],
    pub memory: &'a [Option<FluidStream>],
}

impl PassContext<'_> {
    /// Run the pass with no recirculation on any stage.
    pub fn run_plain(&self, inlet_pressure_pa: f64, speed: Speed) -> EngineResult<TrainEvaluation> {
        let contexts = vec![StageContext::default(); self.stages.len()];
        self.run(inlet_pressure_pa, speed, &contexts)
    }

    /// Evaluate every stage in flow order at one speed.
    ///
    /// At each stage, rates of outgoing streams are subtracted from the
    /// running stream first, then incoming streams are mixed in. A stage
    /// whose net rate lands at zero runs on its remembered recirculation
    /// fluid; without one the pass fails with
    /// [`TrainError::MissingRecirculationFluid`].
    pub fn run(
        &self,
        inlet_pressure_pa: f64,
        speed: Speed,
        stage_contexts: &[StageContext],
    ) -> EngineResult<TrainEvaluation> {
        if stage_contexts.len() != self.stages.len() || self.memory.len() < self.stages.len() {
            return Err(TrainError::Internal {
                what: "stage context or memory length does not match stage count",
            });
        }

        let mut evaluations = Vec::with_capacity(self.stages.len());
        let mut running: Option<FluidStream> = None;
        let mut running_rate = 0.0_f64;

        for (stage_index, stage) in self.stages.iter().enumerate() {
            for (spec, &rate) in self.streams.iter().zip(self.mass_rates) {
                if spec.stage_index == stage_index && !spec.is_inlet() {
                    running_rate -= rate.max(0.0);
                }
            }
            // Rates were sanitized against conservation up front; anything
            // below zero here is numerical dust.
            running_rate = running_rate.max(0.0);

            for (spec, &rate) in self.streams.iter().zip(self.mass_rates) {
                if spec.stage_index != stage_index || rate <= 0.0 {
                    continue;
                }
                let StreamKind::Inlet { composition } = &spec.kind else {
                    continue;
                };
                let mix_pressure = running
                    .as_ref()
                    .map(|s| s.pressure())
                    .unwrap_or_else(|| pa(inlet_pressure_pa));
                let incoming = self.service.stream_at_pt(
                    composition,
                    mix_pressure,
                    stage.inlet_temperature,
                )?;
                running = match running.take() {
                    Some(current) if running_rate > EPSILON_MASS_RATE => Some(
                        self.service
                            .mix(&[&current, &incoming], &[running_rate, rate])?,
                    ),
                    _ => Some(incoming),
                };
                running_rate += rate;
            }

            let feed = if running_rate > EPSILON_MASS_RATE {
                running.clone().ok_or(TrainError::Internal {
                    what: "running stream missing despite positive rate",
                })?
            } else {
                self.memory[stage_index]
                    .clone()
                    .ok_or(TrainError::MissingRecirculationFluid { stage: stage_index })?
            };

            let evaluation = evaluate_stage(
                self.service,
                stage,
                &feed,
                running_rate.max(0.0),
                speed,
                stage_contexts[stage_index],
            )?;
            running = Some(evaluation.outlet.clone());
            evaluations.push(evaluation);
        }

        Ok(TrainEvaluation {
            stages: evaluations,
            speed,
            inlet_pressure_pa,
            choked_inlet_pressure_pa: None,
            choked_discharge_pressure_pa: None,
            target_pressure_status: TargetPressureStatus::NotCalculated,
        })
    }

    /// Pressure drop ahead of the first stage [Pa]. Lower bound for any
    /// upstream-choke search: below this the first stage inlet goes
    /// non-positive.
    pub fn first_stage_pressure_drop_pa(&self) -> f64 {
        self.stages
            .first()
            .map(|s| s.pressure_drop_ahead.value)
            .unwrap_or(0.0)
    }

    /// Net mass rate through each stage [kg/s], from the declared streams
    /// alone (no recirculation).
    pub fn net_rates(&self) -> Vec<f64> {
        net_stage_rates(self.streams, self.mass_rates, self.stages.len())
    }
}

/// Net mass rate through each of `stage_count` stages.
pub(crate) fn net_stage_rates(
    streams: &[StreamSpec],
    mass_rates: &[f64],
    stage_count: usize,
) -> Vec<f64> {
    let mut rates = Vec::with_capacity(stage_count);
    let mut running = 0.0_f64;
    for stage_index in 0..stage_count {
        for (spec, &rate) in streams.iter().zip(mass_rates) {
            if spec.stage_index != stage_index {
                continue;
            }
            if spec.is_inlet() {
                running += rate.max(0.0);
            } else {
                running -= rate.max(0.0);
            }
        }
        running = running.max(0.0);
        rates.push(running);
    }
    rates
}

/// Check the declared rates against mass conservation, stage by stage in
/// flow order with outgoing rates subtracted before incoming ones are added.
/// On violation all rates are zeroed and `true` is returned; bad inputs
/// short-circuit the time step instead of failing it.
pub(crate) fn sanitize_rates(
    streams: &[StreamSpec],
    mass_rates: &mut [f64],
    stage_count: usize,
) -> bool {
    for rate in mass_rates.iter_mut() {
        if !rate.is_finite() || *rate < 0.0 {
            *rate = 0.0;
        }
    }

    let mut available = 0.0_f64;
    for stage_index in 0..stage_count {
        for (spec, &rate) in streams.iter().zip(mass_rates.iter()) {
            if spec.stage_index == stage_index && !spec.is_inlet() {
                available -= rate;
            }
        }
        if available < -EPSILON_MASS_RATE {
            for rate in mass_rates.iter_mut() {
                *rate = 0.0;
            }
            return true;
        }
        available = available.max(0.0);
        for (spec, &rate) in streams.iter().zip(mass_rates.iter()) {
            if spec.stage_index == stage_index && spec.is_inlet() {
                available += rate;
            }
        }
    }
    false
}

/// True when no inlet stream carries positive rate.
pub(crate) fn all_inlets_non_positive(streams: &[StreamSpec], mass_rates: &[f64]) -> bool {
    streams
        .iter()
        .zip(mass_rates)
        .filter(|(spec, _)| spec.is_inlet())
        .all(|(_, &rate)| rate <= 0.0)
}
