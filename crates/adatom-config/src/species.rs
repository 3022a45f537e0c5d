//! Per-species valence limits and collision diameters.

use adatom_types::{BondType, Species};
use serde::{Deserialize, Serialize};

/// Maximum bond count for a species, optionally restricted to one bond type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValenceRule {
    pub species: Species,
    #[serde(default)]
    pub bond_type: Option<BondType>,
    pub max_bonds: u32,
}

/// Explicit collision diameter for a species pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairSigma {
    pub a: Species,
    pub b: Species,
    pub sigma: f64,
}

/// Collision diameter of a single species, mixed with others by [`SigmaMix`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesSigma {
    pub species: Species,
    pub sigma: f64,
}

/// Mixing rule for per-species diameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SigmaMix {
    #[default]
    Arithmetic,
    Geometric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesRules {
    /// Bond limit for species without a total-count rule. `None` = unlimited.
    pub default_max_bonds: Option<u32>,
    pub valence: Vec<ValenceRule>,
    pub pair_sigmas: Vec<PairSigma>,
    pub species_sigmas: Vec<SpeciesSigma>,
    pub mix: SigmaMix,
    /// Diameter used when no rule matches.
    pub default_sigma: f64,
}

impl Default for SpeciesRules {
    fn default() -> Self {
        Self {
            default_max_bonds: None,
            valence: Vec::new(),
            pair_sigmas: Vec::new(),
            species_sigmas: Vec::new(),
            mix: SigmaMix::Arithmetic,
            default_sigma: 1.0,
        }
    }
}

impl SpeciesRules {
    /// Total bond limit of `species`.
    pub fn max_bonds(&self, species: Species) -> Option<u32> {
        self.valence
            .iter()
            .find(|r| r.species == species && r.bond_type.is_none())
            .map(|r| r.max_bonds)
            .or(self.default_max_bonds)
    }

    /// Limit on bonds of `bond_type` for `species`, if one is configured.
    pub fn max_bonds_of_type(&self, species: Species, bond_type: BondType) -> Option<u32> {
        self.valence
            .iter()
            .find(|r| r.species == species && r.bond_type == Some(bond_type))
            .map(|r| r.max_bonds)
    }

    /// True when a particle of `species` holding `bonds` bonds can take no more.
    pub fn is_saturated(&self, species: Species, bonds: usize) -> bool {
        self.max_bonds(species).is_some_and(|max| bonds >= max as usize)
    }

    fn species_sigma(&self, species: Species) -> Option<f64> {
        self.species_sigmas
            .iter()
            .find(|s| s.species == species)
            .map(|s| s.sigma)
    }

    /// Collision diameter for a species pair.
    ///
    /// Lookup order: explicit pair, mixed per-species diameters, default.
    pub fn sigma(&self, a: Species, b: Species) -> f64 {
        if let Some(p) = self
            .pair_sigmas
            .iter()
            .find(|p| (p.a == a && p.b == b) || (p.a == b && p.b == a))
        {
            return p.sigma;
        }
        match (self.species_sigma(a), self.species_sigma(b)) {
            (Some(sa), Some(sb)) => match self.mix {
                SigmaMix::Arithmetic => 0.5 * (sa + sb),
                SigmaMix::Geometric => (sa * sb).sqrt(),
            },
            _ => self.default_sigma,
        }
    }

    /// Largest diameter any pair can have.
    pub fn max_sigma(&self) -> f64 {
        let pairs = self.pair_sigmas.iter().map(|p| p.sigma);
        let singles = self.species_sigmas.iter().map(|s| s.sigma);
        pairs
            .chain(singles)
            .fold(self.default_sigma, f64::max)
    }
}
