//! Property test: stage discharge pressure is non-decreasing in shaft
//! speed at fixed inlet conditions and rate. The shaft-speed bisection
//! relies on this.

use std::sync::Arc;

use ct_charts::{CurveChart, CurvePoint, SpeedCurve};
use ct_core::units::{k, pa};
use ct_fluids::{Composition, FluidService, IdealGasService};
use ct_train::{StageContext, TrainStage, evaluate_stage};
use proptest::prelude::*;

fn curve(speed: f64) -> SpeedCurve {
    let scale = speed / 7500.0;
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

fn stage() -> TrainStage {
    let chart = CurveChart::new(vec![curve(7500.0), curve(11_000.0)]).unwrap();
    TrainStage::new(Arc::new(chart), k(303.15), pa(0.0), false).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn discharge_pressure_non_decreasing_in_speed(
        rate_am3h in 1200.0_f64..2800.0,
        speed_lo in 7500.0_f64..11_000.0,
        speed_delta in 1.0_f64..2000.0,
    ) {
        let speed_hi = (speed_lo + speed_delta).min(11_000.0);
        prop_assume!(speed_hi > speed_lo);

        let svc = IdealGasService::new();
        let stage = stage();
        let feed = svc
            .stream_at_pt(&Composition::lean_gas(), pa(50.0e5), k(303.15))
            .unwrap();
        let mass_rate = rate_am3h * feed.density().value / 3600.0;

        let at_lo =
            evaluate_stage(&svc, &stage, &feed, mass_rate, speed_lo, StageContext::default())
                .unwrap();
        let at_hi =
            evaluate_stage(&svc, &stage, &feed, mass_rate, speed_hi, StageContext::default())
                .unwrap();

        // Tiny slack for interpolation corners.
        prop_assert!(
            at_hi.outlet.pressure().value >= at_lo.outlet.pressure().value * (1.0 - 1e-9),
            "p({speed_hi}) = {} < p({speed_lo}) = {}",
            at_hi.outlet.pressure().value,
            at_lo.outlet.pressure().value,
        );
    }
}
