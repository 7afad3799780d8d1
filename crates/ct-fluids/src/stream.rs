//! Fluid stream state snapshot.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use ct_core::units::{Density, Pressure, SpecEnthalpy, SpecHeatCapacity, Temperature};

/// An immutable snapshot of a flowing fluid's thermodynamic state.
///
/// Produced by a [`crate::FluidService`] flash; the train engine only ever
/// reads it. Derived properties that every stage evaluation needs (density,
/// enthalpy, kappa, cp) are carried on the snapshot so the engine does not
/// round-trip through the backend for each one.
#[derive(Debug, Clone, PartialEq)]
pub struct FluidStream {
    p: Pressure,
    t: Temperature,
    rho: Density,
    h: SpecEnthalpy,
    kappa: f64,
    cp: SpecHeatCapacity,
    comp: Composition,
}

impl FluidStream {
    /// Create a stream snapshot, validating physical plausibility.
    pub fn new(
        p: Pressure,
        t: Temperature,
        rho: Density,
        h: SpecEnthalpy,
        kappa: f64,
        cp: SpecHeatCapacity,
        comp: Composition,
    ) -> FluidResult<Self> {
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
        if !rho.value.is_finite() || rho.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "density must be positive and finite",
            });
        }
        if !h.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "enthalpy must be finite",
            });
        }
        if !kappa.is_finite() || kappa < 1.0 {
            return Err(FluidError::NonPhysical {
                what: "kappa must be >= 1 and finite",
            });
        }
        if !cp.is_finite() || cp <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "cp must be positive and finite",
            });
        }

        Ok(Self {
            p,
            t,
            rho,
            h,
            kappa,
            cp,
            comp,
        })
    }

    pub fn pressure(&self) -> Pressure {
        self.p
    }

    pub fn temperature(&self) -> Temperature {
        self.t
    }

    /// Density at stream conditions [kg/m³].
    pub fn density(&self) -> Density {
        self.rho
    }

    /// Specific enthalpy [J/kg].
    pub fn enthalpy(&self) -> SpecEnthalpy {
        self.h
    }

    /// Heat capacity ratio cp/cv.
    pub fn kappa(&self) -> f64 {
        self.kappa
    }

    /// Specific heat capacity at constant pressure [J/(kg·K)].
    pub fn cp(&self) -> SpecHeatCapacity {
        self.cp
    }

    pub fn composition(&self) -> &Composition {
        &self.comp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Species;
    use ct_core::units::{k, kg_per_m3, pa};

    fn comp() -> Composition {
        Composition::pure(Species::Methane)
    }

    #[test]
    fn create_valid_stream() {
        let s = FluidStream::new(
            pa(50.0e5),
            k(300.0),
            kg_per_m3(35.0),
            1.0e4,
            1.28,
            2.2e3,
            comp(),
        )
        .unwrap();
        assert_eq!(s.pressure().value, 50.0e5);
        assert_eq!(s.kappa(), 1.28);
    }

    #[test]
    fn reject_negative_pressure() {
        let res = FluidStream::new(
            pa(-1.0),
            k(300.0),
            kg_per_m3(35.0),
            0.0,
            1.28,
            2.2e3,
            comp(),
        );
        assert!(res.is_err());
    }

    #[test]
    fn reject_kappa_below_one() {
        let res = FluidStream::new(
            pa(50.0e5),
            k(300.0),
            kg_per_m3(35.0),
            0.0,
            0.9,
            2.2e3,
            comp(),
        );
        assert!(res.is_err());
    }
}
