//! Maximum-rate search: the largest mass rate the train can move between a
//! fixed pair of suction and discharge pressures.

use crate::error::{EngineResult, TrainError};
use crate::forward::PassContext;
use crate::pressure_control::PressureControl;
use crate::result::{PressureTargets, TargetPressureStatus, TrainEvaluation};
use crate::shaft::TrainShaft;
use crate::speed_solver::solve_shaft_speed;
use crate::stage::TrainStage;
use crate::streams::StreamSpec;
use ct_core::numeric::MAX_ITERATIONS;
use ct_core::search::{SearchTolerance, boundary_search, find_root};
use ct_core::units::constants::SECONDS_PER_HOUR;
use ct_core::units::{Speed, pa};
use ct_fluids::{Composition, FluidService, FluidStream};
use tracing::debug;

/// Inputs of a maximum-rate search over a single-inlet train.
pub(crate) struct RateSearch<'a> {
    pub service: &'a dyn FluidService,
    pub stages: &'a [TrainStage],
    pub shaft: &'a TrainShaft,
    pub policy: Option<&'a PressureControl>,
    pub memory: &'a [Option<FluidStream>],
    pub composition: &'a Composition,
    pub maximum_power_w: Option<f64>,
}

/// Largest feed mass rate [kg/s] for which the train can hold the given
/// pressure pair, or zero when no rate can.
///
/// The search walks the first stage's chart envelope at fixed inlet
/// conditions, so the candidate regions are checked in order of the rate
/// they admit: the full maximum-speed curve, then a pressure-control
/// policy absorbing the overshoot at the chart maximum, then the stone
/// wall at reduced speed. A configured power ceiling trims the result
/// afterwards.
pub(crate) fn find_maximum_mass_rate(
    search: &RateSearch<'_>,
    suction_pa: f64,
    discharge_pa: f64,
) -> EngineResult<f64> {
    let first = search.stages.first().ok_or(TrainError::InvalidTrain {
        what: "train needs at least one stage",
    })?;
    let p_in = suction_pa - first.pressure_drop_ahead.value;
    if p_in <= 0.0 {
        return Err(TrainError::InvalidInput {
            what: "pressure drop ahead of stage exceeds feed pressure",
        });
    }
    let inlet = search
        .service
        .stream_at_pt(search.composition, pa(p_in), first.inlet_temperature)?;
    let rho = inlet.density().value;
    let to_mass = |rate_am3h: f64| rate_am3h * rho / SECONDS_PER_HOUR;

    let streams = vec![StreamSpec::inlet(0, search.composition.clone())];
    let targets = PressureTargets {
        suction_pa,
        discharge_pa,
        interstage: None,
    };
    let eval_plain = |mass_rate: f64, speed: Speed| -> EngineResult<TrainEvaluation> {
        let rates = [mass_rate];
        let ctx = PassContext {
            service: search.service,
            stages: search.stages,
            streams: &streams,
            mass_rates: &rates,
            memory: search.memory,
        };
        ctx.run_plain(suction_pa, speed)
    };
    let solve = |mass_rate: f64| -> EngineResult<TrainEvaluation> {
        let rates = [mass_rate];
        let ctx = PassContext {
            service: search.service,
            stages: search.stages,
            streams: &streams,
            mass_rates: &rates,
            memory: search.memory,
        };
        solve_shaft_speed(&ctx, search.shaft, &targets, None, search.policy)
    };

    let (min_speed, max_speed) = search.shaft.bounds();
    let chart = &first.chart;
    let m_min = to_mass(chart.minimum_rate(max_speed));
    let m_wall = to_mass(chart.maximum_rate(max_speed));
    let tol = SearchTolerance::Relative(1e-4);

    // Flat out at minimum rate is the best the train can do; below the
    // target there, no rate works.
    let at_min = eval_plain(m_min, max_speed)?;
    if !at_min.is_within_capacity() || at_min.discharge_pressure_pa() < discharge_pa {
        debug!("target pressures unreachable at any rate");
        return Ok(0.0);
    }

    // A downstream stage's stone wall can bind before the first stage's
    // chart maximum does.
    let mut m_upper = m_wall;
    let mut at_upper = eval_plain(m_upper, max_speed)?;
    if !at_upper.is_within_capacity() {
        m_upper = boundary_search(m_min, m_wall, tol, MAX_ITERATIONS, |m| {
            Ok::<bool, TrainError>(eval_plain(m, max_speed)?.is_within_capacity())
        })?;
        at_upper = eval_plain(m_upper, max_speed)?;
    }

    let mut found = if discharge_pa >= at_upper.discharge_pressure_pa() {
        // Target crosses the maximum-speed curve: the rate on that curve
        // delivering exactly the target is the maximum.
        let root = find_root(m_min, m_upper, tol, MAX_ITERATIONS, |m| {
            eval_plain(m, max_speed).map(|e| e.discharge_pressure_pa() - discharge_pa)
        })?;
        root.x
    } else if search.policy.is_some() {
        // The train overshoots even at the chart maximum; the policy
        // absorbs the excess, so the chart maximum itself may be feasible.
        let met = |m: f64| -> EngineResult<bool> {
            let e = solve(m)?;
            Ok(e.target_pressure_status == TargetPressureStatus::Met && e.is_within_capacity())
        };
        if met(m_upper)? {
            m_upper
        } else if met(m_min)? {
            // Upstream choking lowers the inlet density and with it the
            // feasible rate; search for where the policy stops coping.
            boundary_search(m_min, m_upper, tol, MAX_ITERATIONS, met)?
        } else {
            return Ok(0.0);
        }
    } else {
        // No policy: ride the stone wall down in speed until the wall
        // discharge meets the target.
        let wall_discharge = |speed: Speed| -> EngineResult<f64> {
            let m = to_mass(chart.maximum_rate(speed));
            Ok(eval_plain(m, speed)?.discharge_pressure_pa())
        };
        if discharge_pa < wall_discharge(min_speed)? {
            return Ok(0.0);
        }
        let root = find_root(
            min_speed,
            max_speed,
            SearchTolerance::Relative(1e-5),
            MAX_ITERATIONS,
            |speed| wall_discharge(speed).map(|p| p - discharge_pa),
        )?;
        to_mass(chart.maximum_rate(root.x))
    };

    if let Some(cap_w) = search.maximum_power_w {
        let power_at = |m: f64| -> EngineResult<f64> { Ok(solve(m)?.total_power_w()) };
        if power_at(found)? > cap_w {
            let low = m_min.min(found);
            if power_at(low)? > cap_w {
                debug!(cap_w, "power ceiling below any feasible operating point");
                return Ok(0.0);
            }
            let root = find_root(low, found, tol, MAX_ITERATIONS, |m| {
                power_at(m).map(|p| p - cap_w)
            })?;
            found = root.x;
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::tests::test_stage_with_speeds;
    use approx::assert_relative_eq;
    use ct_core::numeric::PRESSURE_CALCULATION_TOLERANCE;
    use ct_fluids::IdealGasService;

    struct Fixture {
        svc: IdealGasService,
        stages: Vec<TrainStage>,
        shaft: TrainShaft,
        memory: Vec<Option<FluidStream>>,
        composition: Composition,
    }

    impl Fixture {
        fn new() -> Self {
            let stages = vec![test_stage_with_speeds(7500.0, 11_000.0)];
            let shaft = TrainShaft::from_stages(&stages).unwrap();
            Self {
                svc: IdealGasService::new(),
                stages,
                shaft,
                memory: vec![None],
                composition: Composition::lean_gas(),
            }
        }

        fn search<'a>(&'a self, policy: Option<&'a PressureControl>) -> RateSearch<'a> {
            RateSearch {
                service: &self.svc,
                stages: &self.stages,
                shaft: &self.shaft,
                policy,
                memory: &self.memory,
                composition: &self.composition,
                maximum_power_w: None,
            }
        }

        fn discharge_at(&self, rate_am3h: f64, speed: f64, suction_pa: f64) -> (f64, f64) {
            let inlet = self
                .svc
                .stream_at_pt(
                    &self.composition,
                    pa(suction_pa),
                    self.stages[0].inlet_temperature,
                )
                .unwrap();
            let mass = rate_am3h * inlet.density().value / 3600.0;
            let streams = vec![StreamSpec::inlet(0, self.composition.clone())];
            let rates = [mass];
            let ctx = PassContext {
                service: &self.svc,
                stages: &self.stages,
                streams: &streams,
                mass_rates: &rates,
                memory: &self.memory,
            };
            (
                mass,
                ctx.run_plain(suction_pa, speed)
                    .unwrap()
                    .discharge_pressure_pa(),
            )
        }
    }

    #[test]
    fn unreachable_target_yields_zero() {
        let fx = Fixture::new();
        // Best case: minimum rate, maximum speed.
        let min_rate = fx.stages[0].chart.minimum_rate(11_000.0);
        let (_, p_best) = fx.discharge_at(min_rate, 11_000.0, 50.0e5);

        let found =
            find_maximum_mass_rate(&fx.search(None), 50.0e5, p_best * 1.2).unwrap();
        assert_eq!(found, 0.0);
    }

    #[test]
    fn target_on_the_maximum_speed_curve() {
        let fx = Fixture::new();
        let min_rate = fx.stages[0].chart.minimum_rate(11_000.0);
        let max_rate = fx.stages[0].chart.maximum_rate(11_000.0);
        let (m_min, p_min_rate) = fx.discharge_at(min_rate, 11_000.0, 50.0e5);
        let (m_wall, p_wall) = fx.discharge_at(max_rate, 11_000.0, 50.0e5);
        let target = 0.5 * (p_min_rate + p_wall);

        let found = find_maximum_mass_rate(&fx.search(None), 50.0e5, target).unwrap();
        assert!(found > m_min && found < m_wall);

        // The found rate delivers the target at maximum speed.
        let inlet = fx
            .svc
            .stream_at_pt(&fx.composition, pa(50.0e5), fx.stages[0].inlet_temperature)
            .unwrap();
        let rate_am3h = found / inlet.density().value * 3600.0;
        let (_, p_check) = fx.discharge_at(rate_am3h, 11_000.0, 50.0e5);
        assert_relative_eq!(
            p_check,
            target,
            max_relative = PRESSURE_CALCULATION_TOLERANCE
        );
    }

    #[test]
    fn policy_admits_the_full_chart_maximum() {
        let fx = Fixture::new();
        let max_rate = fx.stages[0].chart.maximum_rate(11_000.0);
        let (m_wall, p_wall) = fx.discharge_at(max_rate, 11_000.0, 50.0e5);

        let policy = PressureControl::DownstreamChoke {
            maximum_discharge_pressure_pa: None,
        };
        let found =
            find_maximum_mass_rate(&fx.search(Some(&policy)), 50.0e5, p_wall * 0.8).unwrap();
        assert_relative_eq!(found, m_wall, max_relative = 1e-6);
    }

    #[test]
    fn stone_wall_limits_the_rate_without_a_policy() {
        let fx = Fixture::new();
        let max_rate_hi = fx.stages[0].chart.maximum_rate(11_000.0);
        let max_rate_lo = fx.stages[0].chart.maximum_rate(7500.0);
        let (m_wall_hi, p_wall_hi) = fx.discharge_at(max_rate_hi, 11_000.0, 50.0e5);
        let (m_wall_lo, p_wall_lo) = fx.discharge_at(max_rate_lo, 7500.0, 50.0e5);
        let target = 0.5 * (p_wall_lo + p_wall_hi);

        let found = find_maximum_mass_rate(&fx.search(None), 50.0e5, target).unwrap();
        assert!(found > m_wall_lo && found < m_wall_hi);
    }

    #[test]
    fn power_ceiling_trims_the_rate() {
        let fx = Fixture::new();
        let min_rate = fx.stages[0].chart.minimum_rate(11_000.0);
        let max_rate = fx.stages[0].chart.maximum_rate(11_000.0);
        let (_, p_min_rate) = fx.discharge_at(min_rate, 11_000.0, 50.0e5);
        let (_, p_wall) = fx.discharge_at(max_rate, 11_000.0, 50.0e5);
        let target = 0.5 * (p_min_rate + p_wall);

        let unlimited = find_maximum_mass_rate(&fx.search(None), 50.0e5, target).unwrap();

        // Cap at 80% of the power drawn at the unlimited maximum.
        let streams = vec![StreamSpec::inlet(0, fx.composition.clone())];
        let rates = [unlimited];
        let ctx = PassContext {
            service: &fx.svc,
            stages: &fx.stages,
            streams: &streams,
            mass_rates: &rates,
            memory: &fx.memory,
        };
        let targets = PressureTargets {
            suction_pa: 50.0e5,
            discharge_pa: target,
            interstage: None,
        };
        let full_power = solve_shaft_speed(&ctx, &fx.shaft, &targets, None, None)
            .unwrap()
            .total_power_w();

        let mut search = fx.search(None);
        search.maximum_power_w = Some(0.8 * full_power);
        let trimmed = find_maximum_mass_rate(&search, 50.0e5, target).unwrap();
        assert!(trimmed > 0.0 && trimmed < unlimited);
    }
}
