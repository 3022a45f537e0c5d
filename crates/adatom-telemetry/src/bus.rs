//! Per-step telemetry batching.
//!
//! The kMC loop is single-threaded, so the bus is a plain queue: the
//! engine pushes events while a step runs and delivers the whole batch
//! to the sinks once the step has committed. A step that halts still
//! flushes what it emitted, ending with the `Terminated` event.

use std::collections::VecDeque;

use crate::events::RunEvent;
use crate::sinks::EventSink;

/// Queue of run events awaiting delivery, plus the sinks that observe them.
pub struct EventBus {
    pending: VecDeque<RunEvent>,
    sinks: Vec<Box<dyn EventSink>>,
    enabled: bool,
    delivered: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            sinks: Vec::new(),
            enabled: true,
            delivered: 0,
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// A disabled bus drops events at `emit`.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.pending.clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Queues `event` for the current batch.
    pub fn emit(&mut self, event: RunEvent) {
        if self.enabled {
            self.pending.push_back(event);
        }
    }

    /// Events of the current batch not yet delivered.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Total events handed to the sinks so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Delivers the current batch to every sink in emission order.
    pub fn flush(&mut self) {
        while let Some(event) = self.pending.pop_front() {
            for sink in &mut self.sinks {
                sink.handle(&event);
            }
            self.delivered += 1;
        }
    }

    /// Delivers the last batch and lets every sink finalize.
    pub fn finalize(&mut self) {
        self.flush();
        for sink in &mut self.sinks {
            sink.finalize();
        }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
