//! Read-only engine snapshots for checkpoint collaborators.

use std::sync::{Arc, Mutex};

use adatom_types::AdatomResult;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogStats;
use crate::clock::ClockSnapshot;

/// Clock and catalog statistics at a point in the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub clock: ClockSnapshot,
    pub catalog: CatalogStats,
    pub particles: usize,
    pub bonds: usize,
    pub film_height: f64,
    pub seed: u64,
    /// Random values drawn so far.
    pub draws: u64,
}

/// Receives checkpoints on the configured step cadence. Never mutates the engine.
pub trait CheckpointSink {
    fn checkpoint(&mut self, snapshot: &EngineSnapshot) -> AdatomResult<()>;

    fn name(&self) -> &str;
}

/// Keeps checkpoints in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpoints {
    snapshots: Arc<Mutex<Vec<EngineSnapshot>>>,
}

impl MemoryCheckpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<EngineSnapshot> {
        match self.snapshots.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl CheckpointSink for MemoryCheckpoints {
    fn checkpoint(&mut self, snapshot: &EngineSnapshot) -> AdatomResult<()> {
        match self.snapshots.lock() {
            Ok(mut guard) => guard.push(snapshot.clone()),
            Err(poisoned) => poisoned.into_inner().push(snapshot.clone()),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
