//! Pair-keyed bond index.
//!
//! Bonds are keyed by the sorted particle pair plus bond type, so lookup
//! is independent of the order participants are named in. Per-particle
//! adjacency is kept ordered for deterministic iteration.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use adatom_host::ConfigurationQuery;
use adatom_types::{AdatomError, AdatomResult, BondType, ParticleId};
use serde::{Deserialize, Serialize};

/// Order-independent bond key. `head` is always the smaller id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BondKey {
    pub head: ParticleId,
    pub tail: ParticleId,
    pub bond_type: BondType,
}

impl BondKey {
    pub fn new(a: ParticleId, b: ParticleId, bond_type: BondType) -> Self {
        let (head, tail) = if a <= b { (a, b) } else { (b, a) };
        Self { head, tail, bond_type }
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.head == id || self.tail == id
    }

    /// The partner of `id` in this bond.
    pub fn other(&self, id: ParticleId) -> Option<ParticleId> {
        if self.head == id {
            Some(self.tail)
        } else if self.tail == id {
            Some(self.head)
        } else {
            None
        }
    }
}

impl fmt::Display for BondKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}:{}", self.head, self.tail, self.bond_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondIndex {
    bonds: HashSet<BondKey>,
    adjacency: HashMap<ParticleId, BTreeSet<(ParticleId, BondType)>>,
}

impl BondIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from the host's bond lists.
    ///
    /// Fails with `InvalidConfiguration` when a bond names an unknown
    /// particle or is reported by only one of its ends.
    pub fn from_host<Q: ConfigurationQuery + ?Sized>(host: &Q) -> AdatomResult<Self> {
        let mut index = Self::new();
        for id in host.particle_ids() {
            index.load_particle(host, id)?;
        }
        Ok(index)
    }

    /// Replaces everything known about `ids` with the host's current view.
    ///
    /// Ids no longer present in the host lose all their bonds.
    pub fn sync_particles<Q: ConfigurationQuery + ?Sized>(&mut self, host: &Q, ids: &BTreeSet<ParticleId>) -> AdatomResult<()> {
        for &id in ids {
            self.remove_particle(id);
        }
        for &id in ids {
            if host.particle(id).is_some() {
                self.load_particle(host, id)?;
            }
        }
        Ok(())
    }

    fn load_particle<Q: ConfigurationQuery + ?Sized>(&mut self, host: &Q, id: ParticleId) -> AdatomResult<()> {
        let partners = host
            .bonds(id)
            .map_err(|e| AdatomError::InvalidConfiguration(format!("bond list of {id}: {e}")))?;
        for (partner, bond_type) in partners {
            if host.particle(partner).is_none() {
                return Err(AdatomError::InvalidConfiguration(format!(
                    "bond {id}-{partner} references a particle the host does not know"
                )));
            }
            let reciprocal = host
                .bonds(partner)
                .map_err(|e| AdatomError::InvalidConfiguration(format!("bond list of {partner}: {e}")))?
                .contains(&(id, bond_type));
            if !reciprocal {
                return Err(AdatomError::InvalidConfiguration(format!(
                    "bond {id}-{partner} of type {bond_type} is not reported by {partner}"
                )));
            }
            let key = BondKey::new(id, partner, bond_type);
            if self.bonds.insert(key) {
                self.link(key);
            }
        }
        Ok(())
    }

    fn link(&mut self, key: BondKey) {
        self.adjacency
            .entry(key.head)
            .or_default()
            .insert((key.tail, key.bond_type));
        self.adjacency
            .entry(key.tail)
            .or_default()
            .insert((key.head, key.bond_type));
    }

    fn unlink(&mut self, key: BondKey) {
        for (a, b) in [(key.head, key.tail), (key.tail, key.head)] {
            if let Some(set) = self.adjacency.get_mut(&a) {
                set.remove(&(b, key.bond_type));
                if set.is_empty() {
                    self.adjacency.remove(&a);
                }
            }
        }
    }

    /// Adds a bond. At most one bond per pair per type.
    pub fn insert(&mut self, key: BondKey) -> AdatomResult<()> {
        if !self.bonds.insert(key) {
            return Err(AdatomError::InvalidConfiguration(format!("bond {key} already indexed")));
        }
        self.link(key);
        Ok(())
    }

    pub fn remove(&mut self, key: &BondKey) -> AdatomResult<()> {
        if !self.bonds.remove(key) {
            return Err(AdatomError::NotFound(format!("bond {key}")));
        }
        self.unlink(*key);
        Ok(())
    }

    /// Drops every bond of `id`. Returns the removed keys in ascending order.
    pub fn remove_particle(&mut self, id: ParticleId) -> Vec<BondKey> {
        let Some(partners) = self.adjacency.remove(&id) else {
            return Vec::new();
        };
        let mut removed = Vec::with_capacity(partners.len());
        for (partner, bond_type) in partners {
            let key = BondKey::new(id, partner, bond_type);
            self.bonds.remove(&key);
            if let Some(set) = self.adjacency.get_mut(&partner) {
                set.remove(&(id, bond_type));
                if set.is_empty() {
                    self.adjacency.remove(&partner);
                }
            }
            removed.push(key);
        }
        removed.sort();
        removed
    }

    pub fn contains(&self, key: &BondKey) -> bool {
        self.bonds.contains(key)
    }

    /// True when `a` and `b` share a bond of any type.
    pub fn contains_pair(&self, a: ParticleId, b: ParticleId) -> bool {
        self.adjacency.get(&a).is_some_and(|set| {
            set.range((b, BondType(0))..=(b, BondType(u32::MAX)))
                .next()
                .is_some()
        })
    }

    /// Bond partners of `id`, ascending.
    pub fn bonds_of(&self, id: ParticleId) -> impl Iterator<Item = (ParticleId, BondType)> + '_ {
        self.adjacency.get(&id).into_iter().flatten().copied()
    }

    pub fn bond_count(&self, id: ParticleId) -> usize {
        self.adjacency.get(&id).map_or(0, |s| s.len())
    }

    pub fn bond_count_of_type(&self, id: ParticleId, bond_type: BondType) -> usize {
        self.bonds_of(id).filter(|&(_, t)| t == bond_type).count()
    }

    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    /// All bonds, ascending.
    pub fn keys(&self) -> Vec<BondKey> {
        let mut keys: Vec<BondKey> = self.bonds.iter().copied().collect();
        keys.sort();
        keys
    }
}
