//! In-memory reference host.
//!
//! Stores particles and bonds in ordered maps and answers radius
//! queries through a periodic [`CellGrid`].

use std::collections::{BTreeMap, BTreeSet};

use adatom_math::{CellGrid, DVec3, PeriodicBox};
use adatom_types::{BondType, MoleculeId, ParticleId, Species};

use crate::error::HostError;
use crate::mutation::{ChangeSet, HostMutation, Relocation};
use crate::query::{ConfigurationQuery, ParticleView};

#[derive(Debug, Clone)]
struct Particle {
    species: Species,
    position: DVec3,
    molecule: MoleculeId,
    velocity: DVec3,
}

/// Self-contained host with periodic boundaries.
#[derive(Debug, Clone)]
pub struct InMemoryHost {
    bounds: PeriodicBox,
    particles: BTreeMap<ParticleId, Particle>,
    adjacency: BTreeMap<ParticleId, BTreeSet<(ParticleId, BondType)>>,
    grid: CellGrid,
    ghosts: BTreeSet<ParticleId>,
    next_id: u64,
    next_molecule: u64,
    /// Fraction of particles lying at or below the film height.
    film_fraction: f64,
    rejecting: bool,
}

impl InMemoryHost {
    /// Creates an empty host. `cell_size` should be near the largest query radius.
    pub fn new(bounds: PeriodicBox, cell_size: f64) -> Self {
        Self {
            bounds,
            particles: BTreeMap::new(),
            adjacency: BTreeMap::new(),
            grid: CellGrid::new(bounds, cell_size),
            ghosts: BTreeSet::new(),
            next_id: 1,
            next_molecule: 1,
            film_fraction: 0.95,
            rejecting: false,
        }
    }

    /// Adds a particle and returns its id.
    pub fn add_particle(&mut self, species: Species, position: DVec3) -> ParticleId {
        self.spawn(species, position, MoleculeId::NONE, DVec3::ZERO)
    }

    /// Adds a particle with a caller-chosen molecule id.
    pub fn add_particle_in_molecule(&mut self, species: Species, position: DVec3, molecule: MoleculeId) -> ParticleId {
        if molecule.0 >= self.next_molecule {
            self.next_molecule = molecule.0 + 1;
        }
        self.spawn(species, position, molecule, DVec3::ZERO)
    }

    /// Adds a bond during setup.
    pub fn add_bond(&mut self, a: ParticleId, b: ParticleId, bond_type: BondType) -> Result<(), HostError> {
        self.create_bond(a, b, bond_type).map(|_| ())
    }

    /// Marks a particle as a ghost owned by another subdomain.
    pub fn mark_ghost(&mut self, id: ParticleId) {
        self.ghosts.insert(id);
    }

    /// Sets the fraction of particles considered part of the film.
    pub fn set_film_fraction(&mut self, fraction: f64) {
        self.film_fraction = fraction.clamp(0.0, 1.0);
    }

    /// Makes every subsequent mutation fail with [`HostError::Rejected`].
    pub fn set_rejecting(&mut self, rejecting: bool) {
        self.rejecting = rejecting;
    }

    pub fn velocity(&self, id: ParticleId) -> Option<DVec3> {
        self.particles.get(&id).map(|p| p.velocity)
    }

    /// Number of bonds currently stored.
    pub fn bond_count(&self) -> usize {
        self.adjacency.values().map(|s| s.len()).sum::<usize>() / 2
    }

    /// Sorted `(id, species, position)` triples, for comparisons in tests.
    pub fn snapshot(&self) -> Vec<(ParticleId, Species, DVec3)> {
        self.particles
            .iter()
            .map(|(&id, p)| (id, p.species, p.position))
            .collect()
    }

    fn spawn(&mut self, species: Species, position: DVec3, molecule: MoleculeId, velocity: DVec3) -> ParticleId {
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        let position = self.bounds.remap(position);
        self.particles.insert(
            id,
            Particle {
                species,
                position,
                molecule,
                velocity,
            },
        );
        self.adjacency.insert(id, BTreeSet::new());
        self.grid.insert(id.raw(), position);
        id
    }

    fn guard(&self) -> Result<(), HostError> {
        if self.rejecting {
            return Err(HostError::Rejected("host is not accepting mutations".into()));
        }
        Ok(())
    }

    fn require(&self, id: ParticleId) -> Result<&Particle, HostError> {
        self.particles.get(&id).ok_or(HostError::UnknownParticle(id))
    }
}

impl ConfigurationQuery for InMemoryHost {
    fn particle(&self, id: ParticleId) -> Option<ParticleView> {
        self.particles.get(&id).map(|p| ParticleView {
            id,
            species: p.species,
            position: p.position,
            molecule: p.molecule,
        })
    }

    fn particle_ids(&self) -> Vec<ParticleId> {
        self.particles.keys().copied().collect()
    }

    fn particle_count(&self) -> usize {
        self.particles.len()
    }

    fn neighbors(&self, id: ParticleId, cutoff: f64) -> Result<Vec<ParticleId>, HostError> {
        let center = self.require(id)?.position;
        let mut out = self.neighbors_of_point(center, cutoff);
        out.retain(|&n| n != id);
        Ok(out)
    }

    fn neighbors_of_point(&self, point: DVec3, cutoff: f64) -> Vec<ParticleId> {
        let cutoff_sq = cutoff * cutoff;
        let mut out: Vec<ParticleId> = self
            .grid
            .candidates(point, cutoff)
            .into_iter()
            .map(ParticleId)
            .filter(|id| {
                self.particles
                    .get(id)
                    .is_some_and(|p| self.bounds.distance_sq(point, p.position) <= cutoff_sq)
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn bonds(&self, id: ParticleId) -> Result<Vec<(ParticleId, BondType)>, HostError> {
        self.adjacency
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .ok_or(HostError::UnknownParticle(id))
    }

    fn simulation_box(&self) -> &PeriodicBox {
        &self.bounds
    }

    /// Height below which `film_fraction` of all particles lie.
    fn film_height(&self) -> f64 {
        if self.particles.is_empty() {
            return self.bounds.lo.z;
        }
        let mut heights: Vec<f64> = self.particles.values().map(|p| p.position.z).collect();
        heights.sort_by(f64::total_cmp);
        let idx = ((heights.len() - 1) as f64 * self.film_fraction).floor() as usize;
        heights[idx.min(heights.len() - 1)]
    }

    fn is_owned(&self, id: ParticleId) -> bool {
        !self.ghosts.contains(&id)
    }
}

impl HostMutation for InMemoryHost {
    fn create_particle(&mut self, species: Species, position: DVec3) -> Result<ChangeSet, HostError> {
        self.guard()?;
        let id = self.add_particle(species, position);
        Ok(ChangeSet {
            created: vec![id],
            ..Default::default()
        })
    }

    fn delete_particles(&mut self, ids: &[ParticleId]) -> Result<ChangeSet, HostError> {
        self.guard()?;
        let targets: BTreeSet<ParticleId> = ids.iter().copied().collect();
        for &id in &targets {
            self.require(id)?;
        }

        let mut changes = ChangeSet::default();
        let mut partners = BTreeSet::new();
        for &id in &targets {
            if let Some(bonds) = self.adjacency.remove(&id) {
                for (partner, bond_type) in bonds {
                    if let Some(set) = self.adjacency.get_mut(&partner) {
                        set.remove(&(id, bond_type));
                    }
                    if !targets.contains(&partner) {
                        partners.insert(partner);
                    }
                }
            }
            if let Some(p) = self.particles.remove(&id) {
                self.grid.remove(id.raw(), p.position);
                self.ghosts.remove(&id);
                changes.deleted.push((id, p.position));
            }
        }
        changes.modified = partners.into_iter().collect();
        Ok(changes)
    }

    fn create_bond(&mut self, a: ParticleId, b: ParticleId, bond_type: BondType) -> Result<ChangeSet, HostError> {
        self.guard()?;
        self.require(a)?;
        self.require(b)?;
        if a == b {
            return Err(HostError::Rejected(format!("cannot bond {a} to itself")));
        }
        let exists = self
            .adjacency
            .get(&a)
            .is_some_and(|s| s.contains(&(b, bond_type)));
        if exists {
            return Err(HostError::DuplicateBond { a, b, bond_type });
        }
        self.adjacency.entry(a).or_default().insert((b, bond_type));
        self.adjacency.entry(b).or_default().insert((a, bond_type));
        Ok(ChangeSet {
            modified: vec![a, b],
            ..Default::default()
        })
    }

    fn delete_bond(&mut self, a: ParticleId, b: ParticleId, bond_type: BondType) -> Result<ChangeSet, HostError> {
        self.guard()?;
        let removed = self
            .adjacency
            .get_mut(&a)
            .is_some_and(|s| s.remove(&(b, bond_type)));
        if !removed {
            return Err(HostError::MissingBond { a, b, bond_type });
        }
        if let Some(s) = self.adjacency.get_mut(&b) {
            s.remove(&(a, bond_type));
        }
        Ok(ChangeSet {
            modified: vec![a, b],
            ..Default::default()
        })
    }

    fn relocate_particle(&mut self, id: ParticleId, target: DVec3) -> Result<ChangeSet, HostError> {
        self.guard()?;
        let to = self.bounds.remap(target);
        let from = self.require(id)?.position;
        self.grid.remove(id.raw(), from);
        self.grid.insert(id.raw(), to);
        if let Some(p) = self.particles.get_mut(&id) {
            p.position = to;
        }
        Ok(ChangeSet {
            relocated: vec![Relocation { id, from, to }],
            ..Default::default()
        })
    }

    fn set_species(&mut self, id: ParticleId, species: Species) -> Result<ChangeSet, HostError> {
        self.guard()?;
        let p = self.particles.get_mut(&id).ok_or(HostError::UnknownParticle(id))?;
        p.species = species;
        Ok(ChangeSet {
            modified: vec![id],
            ..Default::default()
        })
    }

    fn insert_molecule(
        &mut self,
        atoms: &[(Species, DVec3)],
        bonds: &[(usize, usize, BondType)],
        velocity: DVec3,
    ) -> Result<ChangeSet, HostError> {
        self.guard()?;
        if let Some(&(a, b, _)) = bonds.iter().find(|(a, b, _)| *a >= atoms.len() || *b >= atoms.len() || a == b) {
            return Err(HostError::Rejected(format!("invalid molecule bond ({a}, {b})")));
        }
        let molecule = if atoms.len() > 1 {
            let m = MoleculeId(self.next_molecule);
            self.next_molecule += 1;
            m
        } else {
            MoleculeId::NONE
        };

        let ids: Vec<ParticleId> = atoms
            .iter()
            .map(|&(species, position)| self.spawn(species, position, molecule, velocity))
            .collect();
        for &(a, b, bond_type) in bonds {
            self.adjacency.entry(ids[a]).or_default().insert((ids[b], bond_type));
            self.adjacency.entry(ids[b]).or_default().insert((ids[a], bond_type));
        }
        Ok(ChangeSet {
            created: ids,
            ..Default::default()
        })
    }
}
