//! The live set of applicable events and its rate-weighted index.
//!
//! Events occupy slots in insertion order. A Fenwick tree over slot rates
//! gives O(log n) cumulative sampling; removal leaves a zero-rate
//! tombstone that is compacted away once tombstones dominate. The total
//! rate is a compensated running sum, periodically recomputed from
//! scratch by [`EventCatalog::resync`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use adatom_types::{AdatomError, AdatomResult, ParticleId};
use serde::{Deserialize, Serialize};

use crate::event::{Event, EventKey, EventKind};
use crate::fenwick::FenwickTree;

/// Compaction is skipped below this many tombstones.
const MIN_COMPACTION: usize = 64;

#[derive(Debug, Clone)]
struct Slot {
    event: Option<Event>,
    rate: f64,
}

/// Neumaier-compensated running sum.
#[derive(Debug, Clone, Copy, Default)]
struct RunningSum {
    sum: f64,
    compensation: f64,
}

impl RunningSum {
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }

    fn of(values: impl IntoIterator<Item = f64>) -> Self {
        let mut s = Self::default();
        for v in values {
            s.add(v);
        }
        s
    }
}

/// Per-kind statistics for export collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub events: usize,
    pub total_rate: f64,
    pub zero_rate: usize,
    pub per_kind: BTreeMap<EventKind, KindStats>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KindStats {
    pub count: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    slots: Vec<Slot>,
    tree: FenwickTree,
    index: HashMap<EventKey, usize>,
    by_participant: HashMap<ParticleId, BTreeSet<EventKey>>,
    total: RunningSum,
    tombstones: usize,
}

impl EventCatalog {
    pub fn new() -> Self {
        Self {
            tree: FenwickTree::new(),
            ..Default::default()
        }
    }

    /// Inserts an event with its current rate.
    ///
    /// Fails with `DuplicateEvent` if an event with the same key is cataloged.
    pub fn add(&mut self, event: Event, rate: f64) -> AdatomResult<()> {
        let key = event.key();
        if !rate.is_finite() || rate < 0.0 {
            return Err(AdatomError::InvalidConfiguration(format!("{key} has invalid rate {rate}")));
        }
        if self.index.contains_key(&key) {
            return Err(AdatomError::DuplicateEvent(key.to_string()));
        }
        let slot = self.slots.len();
        self.slots.push(Slot {
            event: Some(event),
            rate,
        });
        self.tree.push(rate);
        self.index.insert(key, slot);
        for id in key.participants().into_iter().flatten() {
            self.by_participant.entry(id).or_default().insert(key);
        }
        self.total.add(rate);
        Ok(())
    }

    /// Removes an event. Fails with `NotFound` if it is not cataloged.
    pub fn remove(&mut self, key: &EventKey) -> AdatomResult<Event> {
        let slot = self
            .index
            .remove(key)
            .ok_or_else(|| AdatomError::NotFound(format!("event {key}")))?;
        for id in key.participants().into_iter().flatten() {
            if let Some(set) = self.by_participant.get_mut(&id) {
                set.remove(key);
                if set.is_empty() {
                    self.by_participant.remove(&id);
                }
            }
        }

        let entry = &mut self.slots[slot];
        let rate = entry.rate;
        let event = entry
            .event
            .take()
            .ok_or_else(|| AdatomError::NotFound(format!("event {key} (empty slot)")))?;
        entry.rate = 0.0;
        self.tree.add(slot, -rate);
        self.tombstones += 1;

        if self.index.is_empty() {
            self.clear();
        } else {
            self.total.add(-rate);
            if self.tombstones >= MIN_COMPACTION && self.tombstones > self.index.len() {
                self.compact();
            }
        }
        Ok(event)
    }

    /// Removes every event `id` participates in. Returns the removed keys, ascending.
    pub fn remove_participant(&mut self, id: ParticleId) -> AdatomResult<Vec<EventKey>> {
        let keys: Vec<EventKey> = self
            .by_participant
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        for key in &keys {
            self.remove(key)?;
        }
        Ok(keys)
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.index.contains_key(key)
    }

    /// The cataloged event and its rate.
    pub fn get(&self, key: &EventKey) -> Option<(&Event, f64)> {
        let slot = &self.slots[*self.index.get(key)?];
        slot.event.as_ref().map(|e| (e, slot.rate))
    }

    /// Sum of all cataloged rates. O(1).
    pub fn total_rate(&self) -> f64 {
        self.total.value().max(0.0)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maps a uniform draw `u ∈ [0, 1)` to a cataloged event.
    ///
    /// Events own half-open intervals `[C(i-1), C(i))` of the cumulative
    /// rate in insertion order; a target landing exactly on a boundary
    /// belongs to the later event. Zero-rate events own empty intervals and
    /// are never returned. `None` when the total rate is zero.
    pub fn sample_by_rate(&self, u: f64) -> Option<(&Event, f64)> {
        let total = self.tree.total();
        if self.is_empty() || total <= 0.0 || self.total_rate() <= 0.0 {
            return None;
        }
        let u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.0 };
        let target = u * total;
        let found = self.tree.find_exceeding(target);

        // Rounding inside the tree can land on a dead or zero-rate slot, or
        // past the end when u is at its upper limit.
        let forward = (found..self.slots.len()).find(|&i| self.live_positive(i));
        let pick = forward.or_else(|| (0..found.min(self.slots.len())).rev().find(|&i| self.live_positive(i)))?;
        let slot = &self.slots[pick];
        slot.event.as_ref().map(|e| (e, slot.rate))
    }

    fn live_positive(&self, slot: usize) -> bool {
        let s = &self.slots[slot];
        s.event.is_some() && s.rate > 0.0
    }

    /// Recomputes the total and the cumulative index from the individual
    /// rates. Returns the drift that was corrected (old minus new total).
    pub fn resync(&mut self) -> f64 {
        let before = self.total.value();
        self.compact();
        self.total = RunningSum::of(self.slots.iter().map(|s| s.rate));
        before - self.total.value()
    }

    /// Exact sum of the individual rates, recomputed from scratch.
    pub fn recomputed_total(&self) -> f64 {
        RunningSum::of(self.slots.iter().filter(|s| s.event.is_some()).map(|s| s.rate)).value()
    }

    /// Drops tombstones while preserving insertion order.
    fn compact(&mut self) {
        self.slots.retain(|s| s.event.is_some());
        self.index.clear();
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(event) = &slot.event {
                self.index.insert(event.key(), i);
            }
        }
        self.tree = FenwickTree::from_weights(self.slots.iter().map(|s| s.rate));
        self.tombstones = 0;
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.tree = FenwickTree::new();
        self.index.clear();
        self.by_participant.clear();
        self.total = RunningSum::default();
        self.tombstones = 0;
    }

    /// Live events with their rates, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Event, f64)> + '_ {
        self.slots
            .iter()
            .filter_map(|s| s.event.as_ref().map(|e| (e, s.rate)))
    }

    /// Order-independent view of the catalog, for comparisons.
    pub fn snapshot(&self) -> BTreeMap<EventKey, f64> {
        self.iter().map(|(e, r)| (e.key(), r)).collect()
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats {
            events: self.len(),
            total_rate: self.total_rate(),
            ..Default::default()
        };
        for (event, rate) in self.iter() {
            let entry = stats.per_kind.entry(event.kind()).or_default();
            entry.count += 1;
            entry.rate += rate;
            if rate == 0.0 {
                stats.zero_rate += 1;
            }
        }
        stats
    }
}
