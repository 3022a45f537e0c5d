//! Event templates: the kinds of events the detector may instantiate.
//!
//! Each template family is keyed (bond type, species pair, or species) and
//! at most one template exists per key.

use adatom_math::DVec3;
use adatom_rates::RateLaw;
use adatom_types::{BondType, Species};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTemplates {
    pub bond_break: Vec<BondBreakTemplate>,
    pub bond_form: Vec<BondFormTemplate>,
    pub diffusion: Vec<DiffusionTemplate>,
    pub deposition: Vec<DepositionTemplate>,
    pub desorption: Vec<DesorptionTemplate>,
}

/// Breaks an existing bond of `bond_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondBreakTemplate {
    pub bond_type: BondType,
    pub rate: RateLaw,
    /// If non-empty, a particle of one of these species must sit within
    /// the catalyst radius of the bond head.
    #[serde(default)]
    pub catalysts: Vec<Species>,
}

/// Forms a bond between two nearby unbonded particles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondFormTemplate {
    /// Unordered species pair.
    pub species: [Species; 2],
    pub bond_type: BondType,
    /// Maximum separation (minimum image).
    pub cutoff: f64,
    pub rate: RateLaw,
    /// Delete both participants after forming the bond.
    #[serde(default)]
    pub consume_participants: bool,
    /// Both participants must be unbonded.
    #[serde(default)]
    pub lone_only: bool,
    /// Allow participants from the same molecule.
    #[serde(default = "default_true")]
    pub same_molecule: bool,
    #[serde(default)]
    pub catalysts: Vec<Species>,
}

/// Minimum number of neighbors of a species a diffusing particle needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborRequirement {
    pub species: Species,
    pub count: u32,
    pub radius: f64,
    /// Only count neighbors whose valence is saturated.
    #[serde(default)]
    pub saturated: bool,
}

/// Hops a particle of `species` along fixed vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffusionTemplate {
    pub species: Species,
    pub hops: Vec<DVec3>,
    pub rate: RateLaw,
    /// Relocate the particle. When false a new particle is spawned at the target.
    #[serde(default = "default_true")]
    pub displacive: bool,
    /// Species of the particle after the hop (displacive) or of the spawned particle.
    #[serde(default)]
    pub diffused_species: Option<Species>,
    #[serde(default)]
    pub neighbor_requirement: Option<NeighborRequirement>,
}

impl DiffusionTemplate {
    pub fn max_hop_length(&self) -> f64 {
        self.hops.iter().map(|h| h.length()).fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoleculeAtom {
    pub species: Species,
    /// Position in the molecule's own frame (Å).
    pub position: DVec3,
}

/// Bond between two atoms of a molecule template, by atom index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoleculeBond {
    pub a: usize,
    pub b: usize,
    pub bond_type: BondType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoleculeTemplate {
    pub atoms: Vec<MoleculeAtom>,
    #[serde(default)]
    pub bonds: Vec<MoleculeBond>,
}

impl MoleculeTemplate {
    /// A molecule of a single atom.
    pub fn monoatomic(species: Species) -> Self {
        Self {
            atoms: vec![MoleculeAtom {
                species,
                position: DVec3::ZERO,
            }],
            bonds: Vec::new(),
        }
    }

    /// Geometric center of the atoms.
    pub fn center(&self) -> DVec3 {
        if self.atoms.is_empty() {
            return DVec3::ZERO;
        }
        let sum: DVec3 = self.atoms.iter().map(|a| a.position).sum();
        sum / self.atoms.len() as f64
    }

    /// Largest atom distance from the center.
    pub fn extent(&self) -> f64 {
        let c = self.center();
        self.atoms
            .iter()
            .map(|a| (a.position - c).length())
            .fold(0.0, f64::max)
    }

    /// Atom positions when the molecule center is placed at `site`.
    pub fn placed_at(&self, site: DVec3) -> Vec<DVec3> {
        let c = self.center();
        self.atoms.iter().map(|a| site + (a.position - c)).collect()
    }
}

/// Inserts a molecule above a parent particle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositionTemplate {
    pub name: String,
    pub parent_species: Species,
    /// Height of the molecule center above the parent (Å).
    pub offset: f64,
    pub rate: RateLaw,
    /// Fraction of impinging molecules that stick.
    #[serde(default = "default_one")]
    pub sticking_coefficient: f64,
    pub molecule: MoleculeTemplate,
    /// Only parents within this distance below the film height qualify.
    #[serde(default)]
    pub scan_band: Option<f64>,
    /// Reject sites higher than film height plus this value.
    #[serde(default)]
    pub reject_above: Option<f64>,
    #[serde(default)]
    pub insertion_velocity: DVec3,
}

/// Removes a weakly bound particle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesorptionTemplate {
    pub species: Species,
    pub rate: RateLaw,
    /// Largest bond count that still allows desorption. 0 = lone particles only.
    #[serde(default)]
    pub max_bonds: u32,
}

fn default_true() -> bool {
    true
}

fn default_one() -> f64 {
    1.0
}

impl EventTemplates {
    pub fn is_empty(&self) -> bool {
        self.bond_break.is_empty()
            && self.bond_form.is_empty()
            && self.diffusion.is_empty()
            && self.deposition.is_empty()
            && self.desorption.is_empty()
    }

    /// Break template for `bond_type`, with its index.
    pub fn bond_break_for(&self, bond_type: BondType) -> Option<(usize, &BondBreakTemplate)> {
        self.bond_break.iter().enumerate().find(|(_, t)| t.bond_type == bond_type)
    }

    /// Form template for an unordered species pair, with its index.
    pub fn bond_form_for(&self, a: Species, b: Species) -> Option<(usize, &BondFormTemplate)> {
        self.bond_form
            .iter()
            .enumerate()
            .find(|(_, t)| (t.species[0] == a && t.species[1] == b) || (t.species[0] == b && t.species[1] == a))
    }

    pub fn diffusion_for(&self, species: Species) -> Option<(usize, &DiffusionTemplate)> {
        self.diffusion.iter().enumerate().find(|(_, t)| t.species == species)
    }

    pub fn deposition_for(&self, parent: Species) -> Option<(usize, &DepositionTemplate)> {
        self.deposition.iter().enumerate().find(|(_, t)| t.parent_species == parent)
    }

    pub fn desorption_for(&self, species: Species) -> Option<(usize, &DesorptionTemplate)> {
        self.desorption.iter().enumerate().find(|(_, t)| t.species == species)
    }
}
