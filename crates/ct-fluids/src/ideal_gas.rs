//! Ideal-gas fluid backend.
//!
//! Closed-form equation of state used by the engine's tests and demos.
//! Constant-cp ideal gas: every flash is exact and allocation-free, which
//! keeps the nested train solvers fast and their results reproducible.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::service::FluidService;
use crate::stream::FluidStream;
use ct_core::units::constants::R_UNIVERSAL;
use ct_core::units::{Pressure, SpecEnthalpy, Temperature, k, kg_per_m3};

/// Ideal-gas implementation of [`FluidService`].
#[derive(Debug, Clone)]
pub struct IdealGasService {
    /// Enthalpy reference temperature [K]; h = cp · (T − T_ref).
    reference_temperature_k: f64,
}

impl IdealGasService {
    pub fn new() -> Self {
        Self {
            reference_temperature_k: 273.15,
        }
    }
}

impl Default for IdealGasService {
    fn default() -> Self {
        Self::new()
    }
}

impl FluidService for IdealGasService {
    fn name(&self) -> &str {
        "ideal-gas"
    }

    fn stream_at_pt(
        &self,
        comp: &Composition,
        p: Pressure,
        t: Temperature,
    ) -> FluidResult<FluidStream> {
        if !p.value.is_finite() || p.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        if !t.value.is_finite() || t.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }

        let m = comp.molar_mass();
        let r_specific = R_UNIVERSAL / m;
        let cp = comp.molar_cp() / m;
        let cv = cp - r_specific;
        if cv <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "cv must be positive",
            });
        }
        let kappa = cp / cv;

        let rho = p.value / (r_specific * t.value);
        let h = cp * (t.value - self.reference_temperature_k);

        FluidStream::new(p, t, kg_per_m3(rho), h, kappa, cp, comp.clone())
    }

    fn stream_at_ph(
        &self,
        comp: &Composition,
        p: Pressure,
        h: SpecEnthalpy,
    ) -> FluidResult<FluidStream> {
        let cp = comp.molar_cp() / comp.molar_mass();
        let t = self.reference_temperature_k + h / cp;
        if t <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "enthalpy implies non-positive temperature",
            });
        }
        self.stream_at_pt(comp, p, k(t))
    }
}
