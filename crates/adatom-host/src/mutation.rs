//! Structural mutations and the change sets they report.

use adatom_math::DVec3;
use adatom_types::{BondType, ParticleId, Species};

use crate::error::HostError;

/// One relocated particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relocation {
    pub id: ParticleId,
    pub from: DVec3,
    pub to: DVec3,
}

/// Effective change reported by a mutation. Bounds incremental detection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub created: Vec<ParticleId>,
    /// Deleted particles with their last position.
    pub deleted: Vec<(ParticleId, DVec3)>,
    pub relocated: Vec<Relocation>,
    /// Particles whose bonds or attributes changed in place.
    pub modified: Vec<ParticleId>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.deleted.is_empty()
            && self.relocated.is_empty()
            && self.modified.is_empty()
    }

    /// Appends another change set.
    pub fn merge(&mut self, other: ChangeSet) {
        self.created.extend(other.created);
        self.deleted.extend(other.deleted);
        self.relocated.extend(other.relocated);
        self.modified.extend(other.modified);
    }

    /// Total number of touched particles (with repeats).
    pub fn len(&self) -> usize {
        self.created.len() + self.deleted.len() + self.relocated.len() + self.modified.len()
    }
}

/// Structural edits applied by the host.
///
/// Each call either succeeds and reports its [`ChangeSet`] or fails
/// without side effects.
pub trait HostMutation {
    fn create_particle(&mut self, species: Species, position: DVec3) -> Result<ChangeSet, HostError>;

    /// Deletes particles together with all their bonds.
    fn delete_particles(&mut self, ids: &[ParticleId]) -> Result<ChangeSet, HostError>;

    fn create_bond(&mut self, a: ParticleId, b: ParticleId, bond_type: BondType) -> Result<ChangeSet, HostError>;

    fn delete_bond(&mut self, a: ParticleId, b: ParticleId, bond_type: BondType) -> Result<ChangeSet, HostError>;

    /// Moves a particle; the host remaps the target into the periodic box.
    fn relocate_particle(&mut self, id: ParticleId, target: DVec3) -> Result<ChangeSet, HostError>;

    fn set_species(&mut self, id: ParticleId, species: Species) -> Result<ChangeSet, HostError>;

    /// Inserts a molecule. `bonds` index into `atoms`.
    fn insert_molecule(
        &mut self,
        atoms: &[(Species, DVec3)],
        bonds: &[(usize, usize, BondType)],
        velocity: DVec3,
    ) -> Result<ChangeSet, HostError>;
}
