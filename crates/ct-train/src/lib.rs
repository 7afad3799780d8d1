//! ct-train: multi-stage compressor train simulation on a common shaft.
//!
//! The core of the engine: per-stage evaluation against performance charts,
//! a forward pass with multi-stream mass bookkeeping, shaft-speed solving,
//! pressure-control policies for absorbing excess discharge pressure,
//! interstage pressure targets, and a maximum-rate search.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ct_charts::{CurveChart, CurvePoint, SpeedCurve};
//! use ct_core::units::{k, pa};
//! use ct_fluids::{Composition, IdealGasService};
//! use ct_train::{CompressorTrain, StreamSpec, TimeStepRequest, TrainStage};
//!
//! let chart = CurveChart::new(vec![
//!     SpeedCurve {
//!         speed: 7500.0,
//!         points: vec![
//!             CurvePoint { rate: 1000.0, head: 120_000.0, efficiency: 0.72 },
//!             CurvePoint { rate: 3000.0, head: 70_000.0, efficiency: 0.70 },
//!         ],
//!     },
//!     SpeedCurve {
//!         speed: 11_000.0,
//!         points: vec![
//!             CurvePoint { rate: 1500.0, head: 260_000.0, efficiency: 0.72 },
//!             CurvePoint { rate: 4400.0, head: 150_000.0, efficiency: 0.70 },
//!         ],
//!     },
//! ])
//! .unwrap();
//!
//! let stage = TrainStage::new(Arc::new(chart), k(303.15), pa(0.0), false).unwrap();
//! let mut train = CompressorTrain::new(
//!     Arc::new(IdealGasService::new()),
//!     vec![stage],
//!     vec![StreamSpec::inlet(0, Composition::lean_gas())],
//!     None,
//!     None,
//!     None,
//! )
//! .unwrap();
//!
//! let result = train
//!     .evaluate_time_step(&TimeStepRequest {
//!         stream_rates: vec![2.0e6],
//!         suction_pressure: pa(50.0e5),
//!         discharge_pressure: pa(120.0e5),
//!         interstage_pressure: None,
//!     })
//!     .unwrap();
//! println!("{:?} at {:.0} rpm", result.target_pressure_status, result.speed_rpm);
//! ```

pub mod error;
pub mod memory;
pub mod pressure_control;
pub mod result;
pub mod shaft;
pub mod split;
pub mod stage;
pub mod streams;
pub mod train;

mod forward;
mod max_rate;
mod speed_solver;

// Re-exports
pub use error::{EngineResult, TrainError};
pub use memory::RecirculationMemory;
pub use pressure_control::PressureControl;
pub use result::{
    PressureTargets, StageEvaluation, StageSnapshot, TargetPressureStatus, TrainEvaluation,
    TrainResult,
};
pub use shaft::TrainShaft;
pub use split::InterstageSpec;
pub use stage::{StageContext, TrainStage, evaluate_stage};
pub use streams::{StreamKind, StreamSpec};
pub use train::{CompressorTrain, TimeStepRequest};
