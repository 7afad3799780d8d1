//! The compressor train: configuration, per-time-step evaluation, and the
//! maximum-rate query.

use crate::error::{EngineResult, TrainError};
use crate::forward::{PassContext, all_inlets_non_positive, sanitize_rates};
use crate::max_rate::{RateSearch, find_maximum_mass_rate};
use crate::memory::RecirculationMemory;
use crate::pressure_control::PressureControl;
use crate::result::{PressureTargets, TrainEvaluation, TrainResult};
use crate::shaft::TrainShaft;
use crate::speed_solver::{solve_at_fixed_speed, solve_shaft_speed};
use crate::split::{InterstageSpec, solve_with_interstage};
use crate::stage::TrainStage;
use crate::streams::StreamSpec;
use ct_core::units::{Pressure, StandardRate};
use ct_fluids::FluidService;
use std::sync::Arc;
use tracing::debug;

/// Boundary conditions for one time step.
///
/// `stream_rates` pairs with the train's declared streams index-for-index,
/// in standard volumetric rate [Sm³/day].
#[derive(Debug, Clone, PartialEq)]
pub struct TimeStepRequest {
    pub stream_rates: Vec<StandardRate>,
    pub suction_pressure: Pressure,
    pub discharge_pressure: Pressure,
    /// Required when the train is configured with an interstage cut.
    pub interstage_pressure: Option<Pressure>,
}

/// A multi-stage compressor train on one common shaft.
///
/// Configuration is fixed at construction; [`CompressorTrain::evaluate_time_step`]
/// is the only mutating call and only through the recirculation memory.
pub struct CompressorTrain {
    service: Arc<dyn FluidService>,
    stages: Vec<TrainStage>,
    streams: Vec<StreamSpec>,
    shaft: TrainShaft,
    pressure_control: Option<PressureControl>,
    interstage: Option<InterstageSpec>,
    maximum_power_w: Option<f64>,
    memory: RecirculationMemory,
}

impl CompressorTrain {
    pub fn new(
        service: Arc<dyn FluidService>,
        stages: Vec<TrainStage>,
        streams: Vec<StreamSpec>,
        pressure_control: Option<PressureControl>,
        interstage: Option<InterstageSpec>,
        maximum_power_w: Option<f64>,
    ) -> EngineResult<Self> {
        let shaft = TrainShaft::from_stages(&stages)?;
        StreamSpec::validate_list(&streams, stages.len())?;
        if let Some(spec) = &interstage {
            spec.validate(stages.len())?;
        }
        if let Some(cap) = maximum_power_w {
            if !cap.is_finite() || cap <= 0.0 {
                return Err(TrainError::InvalidTrain {
                    what: "maximum power must be positive and finite",
                });
            }
        }
        let memory = RecirculationMemory::new(stages.len());
        Ok(Self {
            service,
            stages,
            streams,
            shaft,
            pressure_control,
            interstage,
            maximum_power_w,
            memory,
        })
    }

    pub fn shaft(&self) -> &TrainShaft {
        &self.shaft
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Evaluate one time step against the requested pressures.
    ///
    /// Infeasible targets come back as data: inspect
    /// [`TrainResult::target_pressure_status`] and the per-stage chart
    /// areas. Errors are reserved for inconsistent configuration and
    /// failed property calls.
    pub fn evaluate_time_step(&mut self, request: &TimeStepRequest) -> EngineResult<TrainResult> {
        if request.stream_rates.len() != self.streams.len() {
            return Err(TrainError::InvalidInput {
                what: "one rate per declared stream is required",
            });
        }
        let suction_pa = request.suction_pressure.value;
        let discharge_pa = request.discharge_pressure.value;
        if !(suction_pa.is_finite() && suction_pa > 0.0)
            || !(discharge_pa.is_finite() && discharge_pa > 0.0)
        {
            return Err(TrainError::InvalidInput {
                what: "suction and discharge pressures must be positive and finite",
            });
        }

        let mut mass_rates = self.mass_rates(&request.stream_rates)?;
        if sanitize_rates(&self.streams, &mut mass_rates, self.stages.len()) {
            debug!("stream rates violate mass conservation, zeroed");
        }
        if all_inlets_non_positive(&self.streams, &mass_rates) {
            let mut eval = TrainEvaluation::empty(0.0, suction_pa);
            let targets = self.targets(request, suction_pa, discharge_pa)?;
            eval.derive_status(&targets);
            return Ok(TrainResult::from_evaluation(&eval));
        }

        let targets = self.targets(request, suction_pa, discharge_pa)?;
        let ctx = PassContext {
            service: self.service.as_ref(),
            stages: &self.stages,
            streams: &self.streams,
            mass_rates: &mass_rates,
            memory: self.memory.slots(),
        };

        let eval = match (&self.interstage, &self.shaft) {
            (Some(spec), _) => solve_with_interstage(
                self.service.as_ref(),
                &self.stages,
                &self.streams,
                &mass_rates,
                self.memory.slots(),
                &self.shaft,
                spec,
                &targets,
            )?,
            (None, TrainShaft::SingleSpeed(speed)) => {
                solve_at_fixed_speed(&ctx, *speed, &targets, self.pressure_control.as_ref())?
            }
            (None, TrainShaft::VariableSpeed { .. }) => solve_shaft_speed(
                &ctx,
                &self.shaft,
                &targets,
                None,
                self.pressure_control.as_ref(),
            )?,
        };

        for (stage_index, stage_eval) in eval.stages.iter().enumerate() {
            self.memory.set(stage_index, stage_eval.inlet.clone());
        }

        Ok(TrainResult::from_evaluation(&eval))
    }

    /// Largest standard rate [Sm³/day] the train can move between the given
    /// pressures, or zero when none can. Single-inlet trains without an
    /// interstage cut only.
    pub fn maximum_standard_rate(
        &self,
        suction_pressure: Pressure,
        discharge_pressure: Pressure,
    ) -> EngineResult<StandardRate> {
        if self.interstage.is_some() || self.streams.len() != 1 {
            return Err(TrainError::InvalidInput {
                what: "maximum rate is defined for single-inlet trains without interstage targets",
            });
        }
        let composition = self.streams[0].composition().ok_or(TrainError::Internal {
            what: "validated stream list lost its inlet",
        })?;

        let search = RateSearch {
            service: self.service.as_ref(),
            stages: &self.stages,
            shaft: &self.shaft,
            policy: self.pressure_control.as_ref(),
            memory: self.memory.slots(),
            composition,
            maximum_power_w: self.maximum_power_w,
        };
        let mass_rate =
            find_maximum_mass_rate(&search, suction_pressure.value, discharge_pressure.value)?;
        Ok(self
            .service
            .mass_rate_to_standard_rate(composition, mass_rate)?)
    }

    fn mass_rates(&self, stream_rates: &[StandardRate]) -> EngineResult<Vec<f64>> {
        // Outlet streams carry whatever flows at their takeoff point; the
        // primary inlet composition is the conversion basis for them.
        let primary = self
            .streams
            .iter()
            .find_map(|s| s.composition())
            .ok_or(TrainError::Internal {
                what: "validated stream list lost its inlet",
            })?;

        self.streams
            .iter()
            .zip(stream_rates)
            .map(|(spec, &rate)| {
                let comp = spec.composition().unwrap_or(primary);
                Ok(self.service.standard_rate_to_mass_rate(comp, rate)?)
            })
            .collect()
    }

    fn targets(
        &self,
        request: &TimeStepRequest,
        suction_pa: f64,
        discharge_pa: f64,
    ) -> EngineResult<PressureTargets> {
        let interstage = match (&self.interstage, request.interstage_pressure) {
            (Some(spec), Some(p)) => {
                if !(p.value.is_finite() && p.value > 0.0) {
                    return Err(TrainError::InvalidInput {
                        what: "interstage pressure must be positive and finite",
                    });
                }
                Some((spec.stage_index, p.value))
            }
            (Some(_), None) => {
                return Err(TrainError::InvalidInput {
                    what: "train with an interstage cut needs an interstage pressure",
                });
            }
            (None, Some(_)) => {
                return Err(TrainError::InvalidInput {
                    what: "interstage pressure given but no interstage cut is configured",
                });
            }
            (None, None) => None,
        };
        Ok(PressureTargets {
            suction_pa,
            discharge_pa,
            interstage,
        })
    }
}
