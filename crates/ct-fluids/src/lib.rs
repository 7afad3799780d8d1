//! ct-fluids: fluid-service contract for the compressor-train engine.
//!
//! Provides:
//! - Chemical species definitions for natural-gas mixtures
//! - Composition handling (normalized mole fractions)
//! - `FluidStream`, an immutable thermodynamic state snapshot
//! - `FluidService` trait for PT/PH flashes, stream mixing, and
//!   standard-rate conversions
//! - Ideal-gas backend used by tests and demos
//!
//! # Architecture
//!
//! The engine never performs phase-equilibrium computation itself; it talks
//! to a `FluidService` implementation. The ideal-gas backend here is
//! closed-form and exact for its own equation of state, which is all the
//! train solvers need. A real flash package slots in behind the same trait.

pub mod composition;
pub mod error;
pub mod ideal_gas;
pub mod service;
pub mod species;
pub mod stream;

// Re-exports for ergonomics
pub use composition::Composition;
pub use error::{FluidError, FluidResult};
pub use ideal_gas::IdealGasService;
pub use service::FluidService;
pub use species::Species;
pub use stream::FluidStream;
