//! Pluggable event sinks.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::events::RunEventKind;

use crate::events::RunEvent;

/// Trait for event consumers.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &RunEvent);

    /// Called when the run ends. Flush buffers, close files, etc.
    fn finalize(&mut self) {}

    /// Returns a human-readable name for this sink.
    fn name(&self) -> &str;
}

/// Collects events into a `Vec`.
#[derive(Debug, Default)]
pub struct VecSink {
    pub events: Vec<RunEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &RunEvent) {
        self.events.push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// Like [`VecSink`], but the collected events stay reachable through a
/// cloned handle after the sink is boxed into a bus.
#[derive(Debug, Clone, Default)]
pub struct SharedVecSink {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl SharedVecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far.
    pub fn events(&self) -> Vec<RunEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for SharedVecSink {
    fn handle(&mut self, event: &RunEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }

    fn name(&self) -> &str {
        "shared_vec_sink"
    }
}

/// Counts executed events per kind label. Memory stays bounded by the
/// number of event kinds, however long the run.
#[derive(Debug, Clone, Default)]
pub struct KindCountSink {
    counts: Arc<Mutex<BTreeMap<String, u64>>>,
}

impl KindCountSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> BTreeMap<String, u64> {
        match self.counts.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn total(&self) -> u64 {
        self.counts().values().sum()
    }
}

impl EventSink for KindCountSink {
    fn handle(&mut self, event: &RunEvent) {
        let RunEventKind::EventExecuted { kind, .. } = &event.kind else {
            return;
        };
        let mut guard = match self.counts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard.entry(kind.clone()).or_default() += 1;
    }

    fn name(&self) -> &str {
        "kind_count_sink"
    }
}

/// Logs events through `tracing`.
pub struct TracingSink {
    level: tracing::Level,
}

impl TracingSink {
    pub fn new(level: tracing::Level) -> Self {
        Self { level }
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &RunEvent) {
        if self.level == tracing::Level::DEBUG || self.level == tracing::Level::TRACE {
            tracing::debug!(step = event.step, event = ?event.kind, "run_event");
        } else {
            tracing::info!(step = event.step, event = ?event.kind, "run_event");
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}
