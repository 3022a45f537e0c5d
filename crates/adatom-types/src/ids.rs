//! Strongly-typed identifiers for simulation entities.
//!
//! Newtype wrappers prevent accidental mixing of particle ids
//! with species numbers or bond types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host-assigned particle identifier. Stable for the lifetime of the particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

/// Particle species (the host's atom type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Species(pub u32);

/// Bond type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BondType(pub u32);

/// Molecule identifier. `MoleculeId(0)` means "not part of a molecule".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct MoleculeId(pub u64);

impl ParticleId {
    /// Returns the raw id.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl MoleculeId {
    /// The "no molecule" sentinel.
    pub const NONE: MoleculeId = MoleculeId(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for ParticleId {
    fn from(val: u64) -> Self {
        Self(val)
    }
}

impl From<u32> for Species {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for BondType {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl fmt::Display for BondType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}
