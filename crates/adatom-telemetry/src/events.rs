//! Run event types.
//!
//! Lightweight value types emitted by the engine, carrying just enough
//! data to monitor a run and compare runs for repeatability.

use serde::{Deserialize, Serialize};

/// A run event, tagged with the kMC step it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    /// kMC step count when the event was emitted.
    pub step: u64,
    pub kind: RunEventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// A kMC step drew its event and is about to execute it. Not emitted
    /// when the catalog is empty.
    StepBegin {
        time: f64,
        total_rate: f64,
        cataloged: usize,
    },

    /// An event was selected and executed.
    EventExecuted {
        /// Event kind label (`bond_break`, `deposition`, ...).
        kind: String,
        /// Human-readable event key.
        key: String,
        rate: f64,
        dt: f64,
    },

    /// Incremental catalog repair after an execution.
    CatalogUpdated {
        affected: usize,
        removed: usize,
        added: usize,
    },

    /// Scheduled recomputation of the total rate.
    CatalogResync {
        /// Running total minus the recomputed total.
        drift: f64,
    },

    /// An external MD phase completed.
    MdPhase {
        steps: u64,
        long: bool,
    },

    /// Particles above the film were removed after MD.
    Trimmed {
        deleted: usize,
    },

    /// Checkpoint hook fired.
    Checkpoint {
        time: f64,
    },

    /// The run stopped.
    Terminated {
        reason: String,
        time: f64,
    },
}

impl RunEvent {
    pub fn new(step: u64, kind: RunEventKind) -> Self {
        Self { step, kind }
    }
}
