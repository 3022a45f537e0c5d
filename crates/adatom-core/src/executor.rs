//! Event execution with incremental catalog repair.

use std::collections::BTreeSet;

use adatom_host::{ChangeSet, Collective, Host};
use adatom_types::{AdatomError, AdatomResult, ParticleId};

use crate::bond::BondIndex;
use crate::catalog::EventCatalog;
use crate::detector::{EventDetector, UpdateReport};
use crate::event::Event;

/// What one execution changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    pub changes: ChangeSet,
    pub update: UpdateReport,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EventExecutor;

impl EventExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Applies `event` through the host, then brings the bond index and the
    /// catalog back in line with the mutated configuration.
    ///
    /// Events touching ghost particles wait at a collective barrier first.
    /// A host rejection is returned as `Execution` and nothing is rolled back.
    pub fn execute<H: Host + ?Sized>(
        &self,
        event: &Event,
        host: &mut H,
        bonds: &mut BondIndex,
        catalog: &mut EventCatalog,
        detector: &EventDetector,
        collective: &dyn Collective,
    ) -> AdatomResult<ExecutionReport> {
        let key = event.key();
        if !catalog.contains(&key) {
            return Err(AdatomError::NotFound(format!("selected event {key} is not cataloged")));
        }

        let crosses_subdomain = key
            .participants()
            .into_iter()
            .flatten()
            .any(|id| !host.is_owned(id));
        if crosses_subdomain {
            collective.barrier()?;
        }

        let changes = event.execute(detector.config(), host)?;
        bonds.sync_particles(&*host, &touched(&changes))?;
        let update = detector.update(&*host, bonds, catalog, &changes)?;

        tracing::debug!(event = %key, changed = changes.len(), "executed event");
        Ok(ExecutionReport { changes, update })
    }
}

/// Particles whose bond lists may have changed.
fn touched(changes: &ChangeSet) -> BTreeSet<ParticleId> {
    changes
        .created
        .iter()
        .chain(&changes.modified)
        .copied()
        .chain(changes.deleted.iter().map(|&(id, _)| id))
        .collect()
}
