//! ct-charts: compressor performance chart contract.
//!
//! Provides:
//! - `CompressorChart` trait: polytropic head/efficiency lookup plus the
//!   capacity envelope (min/max rate as a function of speed, speed bounds)
//! - `ChartArea` classification of an operating point against the envelope
//! - `CurveChart`, an interpolated speed-curve-table implementation covering
//!   both single-speed and variable-speed machines
//!
//! The train engine consumes the trait only; chart construction from vendor
//! data sheets belongs to the configuration layer upstream.

pub mod chart;
pub mod curve;
pub mod error;

// Re-exports
pub use chart::{ChartArea, CompressorChart};
pub use curve::{CurveChart, CurvePoint, SpeedCurve};
pub use error::{ChartError, ChartResult};
