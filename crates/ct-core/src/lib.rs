//! ct-core: stable foundation for the compressor-train engine.
//!
//! Contains:
//! - units (uom SI types + constructors, f64 aliases for head/enthalpy/speed)
//! - numeric (Real + tolerances + float helpers + engine constants)
//! - search (bracketed root-finder and boolean boundary search)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod search;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use search::*;
pub use units::*;
