//! Chemical species definitions.

use serde::{Deserialize, Serialize};

/// Chemical species relevant for natural-gas compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    /// Methane (CH₄)
    Methane,
    /// Ethane (C₂H₆)
    Ethane,
    /// Propane (C₃H₈)
    Propane,
    /// n-Butane
    NButane,
    /// Isobutane
    Isobutane,
    /// n-Pentane
    NPentane,
    /// Nitrogen (N₂)
    Nitrogen,
    /// Carbon dioxide (CO₂)
    CarbonDioxide,
    /// Water (H₂O)
    Water,
}

impl Species {
    /// Molar mass [kg/mol].
    pub fn molar_mass(self) -> f64 {
        match self {
            Species::Methane => 0.016_043,
            Species::Ethane => 0.030_070,
            Species::Propane => 0.044_097,
            Species::NButane => 0.058_123,
            Species::Isobutane => 0.058_123,
            Species::NPentane => 0.072_150,
            Species::Nitrogen => 0.028_014,
            Species::CarbonDioxide => 0.044_010,
            Species::Water => 0.018_015,
        }
    }

    /// Ideal-gas molar heat capacity at constant pressure [J/(mol·K)],
    /// evaluated near typical suction temperatures (~300 K).
    pub fn molar_cp(self) -> f64 {
        match self {
            Species::Methane => 35.69,
            Species::Ethane => 52.49,
            Species::Propane => 73.60,
            Species::NButane => 98.49,
            Species::Isobutane => 96.65,
            Species::NPentane => 120.04,
            Species::Nitrogen => 29.12,
            Species::CarbonDioxide => 37.13,
            Species::Water => 33.59,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn molar_masses_are_plausible() {
        assert!((Species::Methane.molar_mass() - 0.016).abs() < 1e-3);
        assert!(Species::NButane.molar_mass() > Species::Propane.molar_mass());
    }

    #[test]
    fn cp_grows_with_chain_length() {
        assert!(Species::Ethane.molar_cp() > Species::Methane.molar_cp());
        assert!(Species::Propane.molar_cp() > Species::Ethane.molar_cp());
    }
}
