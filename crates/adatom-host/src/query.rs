//! Read-only configuration queries.

use adatom_math::{DVec3, PeriodicBox};
use adatom_types::{BondType, MoleculeId, ParticleId, Species};

use crate::error::HostError;

/// Snapshot of one particle's attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleView {
    pub id: ParticleId,
    pub species: Species,
    pub position: DVec3,
    pub molecule: MoleculeId,
}

/// Side-effect-free view of the host configuration.
///
/// Every list-returning method yields ids in ascending order so that
/// detection is deterministic regardless of the host's storage order.
pub trait ConfigurationQuery {
    /// Looks up a particle. `None` for unknown ids.
    fn particle(&self, id: ParticleId) -> Option<ParticleView>;

    /// All particles visible to this process (owned and ghost), ascending.
    fn particle_ids(&self) -> Vec<ParticleId>;

    fn particle_count(&self) -> usize;

    /// Particles within `cutoff` of `id` (minimum image), excluding `id`, ascending.
    fn neighbors(&self, id: ParticleId, cutoff: f64) -> Result<Vec<ParticleId>, HostError>;

    /// Particles within `cutoff` of an arbitrary point, ascending.
    fn neighbors_of_point(&self, point: DVec3, cutoff: f64) -> Vec<ParticleId>;

    /// Bond partners of `id` with bond types, ascending by partner.
    fn bonds(&self, id: ParticleId) -> Result<Vec<(ParticleId, BondType)>, HostError>;

    fn simulation_box(&self) -> &PeriodicBox;

    /// Height of the growing film, used for deposition and trimming.
    fn film_height(&self) -> f64;

    /// False for ghost copies of particles owned by another subdomain.
    fn is_owned(&self, _id: ParticleId) -> bool {
        true
    }

    fn distance_sq(&self, a: DVec3, b: DVec3) -> f64 {
        self.simulation_box().distance_sq(a, b)
    }

    fn remap(&self, p: DVec3) -> DVec3 {
        self.simulation_box().remap(p)
    }
}
