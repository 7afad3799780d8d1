//! Fluid composition (pure or mixtures).

use crate::error::{FluidError, FluidResult};
use crate::species::Species;
use serde::{Deserialize, Serialize};

/// Fluid composition defined by normalized mole fractions.
///
/// The composition is always normalized (mole fractions sum to 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// Species and their mole fractions (always normalized to sum=1).
    items: Vec<(Species, f64)>,
}

impl Composition {
    /// Create a pure-species composition.
    pub fn pure(species: Species) -> Self {
        Self {
            items: vec![(species, 1.0)],
        }
    }

    /// Create a composition from mole fractions.
    ///
    /// Validates that all fractions are finite, non-negative, and have a
    /// positive sum, then normalizes to sum=1.
    pub fn new_mole_fractions(fractions: Vec<(Species, f64)>) -> FluidResult<Self> {
        if fractions.is_empty() {
            return Err(FluidError::InvalidArg {
                what: "empty composition",
            });
        }

        let mut sum = 0.0;
        for (_, frac) in &fractions {
            if !frac.is_finite() {
                return Err(FluidError::NonPhysical {
                    what: "non-finite mole fraction",
                });
            }
            if *frac < 0.0 {
                return Err(FluidError::NonPhysical {
                    what: "negative mole fraction",
                });
            }
            sum += frac;
        }

        if sum <= 0.0 || !sum.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "mole fractions sum to zero or non-finite",
            });
        }

        let normalized: Vec<(Species, f64)> = fractions
            .into_iter()
            .map(|(s, f)| (s, f / sum))
            .filter(|(_, f)| *f > 1e-15)
            .collect();

        if normalized.is_empty() {
            return Err(FluidError::NonPhysical {
                what: "all mole fractions negligible",
            });
        }

        Ok(Self { items: normalized })
    }

    /// A lean sales-gas mixture used widely in tests and demos.
    pub fn lean_gas() -> Self {
        // Cannot fail: fractions are hardcoded positive.
        Self::new_mole_fractions(vec![
            (Species::Methane, 0.92),
            (Species::Ethane, 0.045),
            (Species::Propane, 0.015),
            (Species::Nitrogen, 0.01),
            (Species::CarbonDioxide, 0.01),
        ])
        .unwrap()
    }

    /// Iterate species and mole fractions.
    pub fn iter(&self) -> impl Iterator<Item = (Species, f64)> + '_ {
        self.items.iter().copied()
    }

    /// Get mole fraction of a species (0.0 if not present).
    pub fn mole_fraction(&self, species: Species) -> f64 {
        self.items
            .iter()
            .find(|(s, _)| *s == species)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    /// Mixture molar mass [kg/mol].
    pub fn molar_mass(&self) -> f64 {
        self.items
            .iter()
            .map(|(s, f)| f * s.molar_mass())
            .sum()
    }

    /// Mixture ideal-gas molar cp [J/(mol·K)].
    pub fn molar_cp(&self) -> f64 {
        self.items.iter().map(|(s, f)| f * s.molar_cp()).sum()
    }

    /// Mole-weighted combination of two compositions.
    ///
    /// `moles_self` and `moles_other` are relative molar amounts; the result
    /// is renormalized.
    pub fn combine(&self, moles_self: f64, other: &Self, moles_other: f64) -> FluidResult<Self> {
        let mut fractions: Vec<(Species, f64)> = Vec::new();
        let mut add = |species: Species, amount: f64| {
            if let Some(entry) = fractions.iter_mut().find(|(s, _)| *s == species) {
                entry.1 += amount;
            } else {
                fractions.push((species, amount));
            }
        };
        for (s, f) in self.iter() {
            add(s, f * moles_self);
        }
        for (s, f) in other.iter() {
            add(s, f * moles_other);
        }
        Self::new_mole_fractions(fractions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalization() {
        let comp = Composition::new_mole_fractions(vec![
            (Species::Methane, 2.0),
            (Species::Ethane, 2.0),
        ])
        .unwrap();
        assert_relative_eq!(comp.mole_fraction(Species::Methane), 0.5);
        assert_relative_eq!(comp.mole_fraction(Species::Ethane), 0.5);
    }

    #[test]
    fn rejects_negative_fraction() {
        let res = Composition::new_mole_fractions(vec![(Species::Methane, -1.0)]);
        assert!(res.is_err());
    }

    #[test]
    fn molar_mass_of_pure_methane() {
        let comp = Composition::pure(Species::Methane);
        assert_relative_eq!(comp.molar_mass(), 0.016_043, epsilon = 1e-6);
    }

    #[test]
    fn combine_weights_by_moles() {
        let a = Composition::pure(Species::Methane);
        let b = Composition::pure(Species::Ethane);
        let mixed = a.combine(3.0, &b, 1.0).unwrap();
        assert_relative_eq!(mixed.mole_fraction(Species::Methane), 0.75);
        assert_relative_eq!(mixed.mole_fraction(Species::Ethane), 0.25);
    }

    #[test]
    fn lean_gas_is_normalized() {
        let comp = Composition::lean_gas();
        let total: f64 = comp.iter().map(|(_, f)| f).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }
}
