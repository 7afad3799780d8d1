// ct-core/src/units.rs

use uom::si::f64::{
    MassDensity as UomMassDensity, MassRate as UomMassRate, Power as UomPower,
    Pressure as UomPressure, Ratio as UomRatio,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Density = UomMassDensity;
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Pressure = UomPressure;
pub type Ratio = UomRatio;
pub type Temperature = UomThermodynamicTemperature;

/// Polytropic head [J/kg].
///
/// Not part of uom's standard set, so we use f64 with clear documentation.
pub type PolytropicHead = f64;

/// Specific enthalpy [J/kg].
pub type SpecEnthalpy = f64;

/// Specific heat capacity [J/(kg·K)].
pub type SpecHeatCapacity = f64;

/// Shaft rotational speed [rpm]. Charts and speed solvers work in rpm
/// throughout; nothing in the engine ever needs rad/s.
pub type Speed = f64;

/// Volumetric rate at standard conditions [Sm³/day].
pub type StandardRate = f64;

/// Volumetric rate at actual (in-situ) conditions [Am³/hour].
pub type ActualRate = f64;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

/// Absolute bar, the unit operating envelopes are specified in.
#[inline]
pub fn bara(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn watt(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

pub mod constants {
    /// Universal gas constant [J/(mol·K)]
    pub const R_UNIVERSAL: f64 = 8.314_462_618;

    /// Standard-condition pressure [Pa] (15 °C reference used for Sm³)
    pub const STANDARD_PRESSURE_PA: f64 = 101_325.0;

    /// Standard-condition temperature [K]
    pub const STANDARD_TEMPERATURE_K: f64 = 288.15;

    pub const SECONDS_PER_DAY: f64 = 86_400.0;
    pub const SECONDS_PER_HOUR: f64 = 3_600.0;
}
