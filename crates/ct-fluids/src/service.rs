//! Fluid service trait: the engine's only window onto thermodynamics.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::stream::FluidStream;
use ct_core::units::constants::{
    R_UNIVERSAL, SECONDS_PER_DAY, STANDARD_PRESSURE_PA, STANDARD_TEMPERATURE_K,
};
use ct_core::units::{Pressure, SpecEnthalpy, StandardRate, Temperature};

/// Trait for fluid property backends.
///
/// Implementations must be thread-safe (Send + Sync). The engine treats
/// flashes as a black box: it asks for a stream at (p, T) or (p, h), mixes
/// streams, and converts between standard volumetric and mass rates. It
/// never inspects phase behavior itself.
pub trait FluidService: Send + Sync {
    /// Backend name (for debugging/logging).
    fn name(&self) -> &str;

    /// Flash to a stream at the given pressure and temperature.
    fn stream_at_pt(
        &self,
        comp: &Composition,
        p: Pressure,
        t: Temperature,
    ) -> FluidResult<FluidStream>;

    /// Flash to a stream at the given pressure and specific enthalpy.
    ///
    /// This is the flash the stage evaluator uses for compressor outlets and
    /// that stream mixing uses for the combined state.
    fn stream_at_ph(
        &self,
        comp: &Composition,
        p: Pressure,
        h: SpecEnthalpy,
    ) -> FluidResult<FluidStream>;

    /// Gas density at standard reference conditions [kg/Sm³].
    ///
    /// Default: ideal-gas density at the standard reference point, which is
    /// exact for the reference backend and a close approximation elsewhere.
    fn standard_density(&self, comp: &Composition) -> FluidResult<f64> {
        let m = comp.molar_mass();
        if m <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "molar mass must be positive",
            });
        }
        Ok(STANDARD_PRESSURE_PA * m / (R_UNIVERSAL * STANDARD_TEMPERATURE_K))
    }

    /// Convert a standard volumetric rate [Sm³/day] to mass rate [kg/s].
    fn standard_rate_to_mass_rate(
        &self,
        comp: &Composition,
        standard_rate: StandardRate,
    ) -> FluidResult<f64> {
        Ok(standard_rate * self.standard_density(comp)? / SECONDS_PER_DAY)
    }

    /// Convert a mass rate [kg/s] to a standard volumetric rate [Sm³/day].
    fn mass_rate_to_standard_rate(
        &self,
        comp: &Composition,
        mass_rate: f64,
    ) -> FluidResult<StandardRate> {
        let rho_std = self.standard_density(comp)?;
        Ok(mass_rate * SECONDS_PER_DAY / rho_std)
    }

    /// Mix streams by mass/enthalpy-weighted combination.
    ///
    /// Streams with non-positive mass rate are ignored. The mixed state is
    /// flashed at the lowest participating pressure (mixing cannot raise
    /// pressure) and the mass-weighted enthalpy.
    ///
    /// # Errors
    /// `InvalidArg` when no stream has positive rate or the slices differ in
    /// length.
    fn mix(&self, streams: &[&FluidStream], mass_rates: &[f64]) -> FluidResult<FluidStream> {
        if streams.len() != mass_rates.len() {
            return Err(FluidError::InvalidArg {
                what: "streams and mass_rates must have equal length",
            });
        }

        let mut total_mass = 0.0;
        let mut h_sum = 0.0;
        let mut p_min = f64::INFINITY;
        let mut combined: Option<Composition> = None;
        let mut combined_moles = 0.0;

        for (stream, &rate) in streams.iter().zip(mass_rates) {
            if rate <= 0.0 {
                continue;
            }
            total_mass += rate;
            h_sum += rate * stream.enthalpy();
            p_min = p_min.min(stream.pressure().value);

            let moles = rate / stream.composition().molar_mass();
            combined = Some(match combined {
                None => stream.composition().clone(),
                Some(acc) => acc.combine(combined_moles, stream.composition(), moles)?,
            });
            combined_moles += moles;
        }

        let comp = combined.ok_or(FluidError::InvalidArg {
            what: "mixing requires at least one stream with positive rate",
        })?;
        let h_mixed = h_sum / total_mass;

        self.stream_at_ph(&comp, ct_core::units::pa(p_min), h_mixed)
    }
}
