//! Shaft-speed solve for one time step.

use crate::error::{EngineResult, TrainError};
use crate::forward::PassContext;
use crate::pressure_control::{self, PressureControl};
use crate::result::{PressureTargets, TrainEvaluation};
use crate::shaft::TrainShaft;
use ct_core::numeric::MAX_ITERATIONS;
use ct_core::search::{SearchTolerance, boundary_search, find_root};
use ct_core::units::Speed;
use tracing::debug;

/// Find the speed at which the train delivers the target discharge
/// pressure, within the shaft window (optionally narrowed to
/// `speed_range`).
///
/// Discharge pressure rises monotonically with speed, so the solve is a
/// bisection between the window's endpoint evaluations. When the target
/// falls below the minimum-speed discharge the configured policy absorbs
/// the excess; when it falls above the maximum-speed discharge the
/// maximum-speed result is returned and the status reports the shortfall.
/// Capacity failures at the low end re-anchor the window to the lowest
/// speed every stage can actually run at.
pub(crate) fn solve_shaft_speed(
    ctx: &PassContext<'_>,
    shaft: &TrainShaft,
    targets: &PressureTargets,
    speed_range: Option<(Speed, Speed)>,
    policy: Option<&PressureControl>,
) -> EngineResult<TrainEvaluation> {
    let (mut min_speed, max_speed) = shaft.clamp_range(speed_range);
    let suction_pa = targets.suction_pa;
    let target_pa = targets.discharge_pa;

    if min_speed >= max_speed {
        let mut eval = at_fixed_speed(ctx, max_speed, suction_pa, target_pa, policy)?;
        eval.derive_status(targets);
        return Ok(eval);
    }

    let mut at_max = ctx.run_plain(suction_pa, max_speed)?;
    if !at_max.is_within_capacity() {
        // Beyond chart capacity even flat out: nothing a slower speed can
        // fix, report the failure as-is.
        at_max.derive_status(targets);
        return Ok(at_max);
    }

    let mut at_min = ctx.run_plain(suction_pa, min_speed)?;
    if !at_min.is_within_capacity() {
        // The rate exceeds some stage's stone wall at low speed. Re-anchor
        // the window to the lowest speed the whole train tolerates.
        min_speed = boundary_search(
            max_speed,
            min_speed,
            SearchTolerance::Relative(1e-5),
            MAX_ITERATIONS,
            |speed| Ok::<bool, TrainError>(ctx.run_plain(suction_pa, speed)?.is_within_capacity()),
        )?;
        debug!(min_speed, "speed window re-anchored above stone wall");
        at_min = ctx.run_plain(suction_pa, min_speed)?;
    }

    if target_pa >= at_max.discharge_pressure_pa() {
        at_max.derive_status(targets);
        return Ok(at_max);
    }
    if target_pa <= at_min.discharge_pressure_pa() {
        let mut eval = match policy {
            Some(policy) => {
                pressure_control::apply(policy, ctx, min_speed, suction_pa, target_pa)?
            }
            None => at_min,
        };
        eval.derive_status(targets);
        return Ok(eval);
    }

    let root = find_root(
        min_speed,
        max_speed,
        SearchTolerance::Relative(1e-5),
        MAX_ITERATIONS,
        |speed| {
            ctx.run_plain(suction_pa, speed)
                .map(|e| e.discharge_pressure_pa() - target_pa)
        },
    )?;
    if !root.converged {
        debug!(residual = root.residual, "speed search did not converge");
    }

    let mut eval = ctx.run_plain(suction_pa, root.x)?;
    eval.derive_status(targets);
    Ok(eval)
}

/// Single-speed machines skip the search entirely: run once, and hand any
/// overshoot to the policy.
fn at_fixed_speed(
    ctx: &PassContext<'_>,
    speed: Speed,
    suction_pa: f64,
    target_pa: f64,
    policy: Option<&PressureControl>,
) -> EngineResult<TrainEvaluation> {
    let eval = ctx.run_plain(suction_pa, speed)?;
    let eval = match policy {
        Some(policy) if eval.discharge_pressure_pa() > target_pa => {
            pressure_control::apply(policy, ctx, speed, suction_pa, target_pa)?
        }
        _ => eval,
    };
    Ok(eval)
}

pub(crate) fn solve_at_fixed_speed(
    ctx: &PassContext<'_>,
    speed: Speed,
    targets: &PressureTargets,
    policy: Option<&PressureControl>,
) -> EngineResult<TrainEvaluation> {
    let mut eval = at_fixed_speed(ctx, speed, targets.suction_pa, targets.discharge_pa, policy)?;
    eval.derive_status(targets);
    Ok(eval)
}
