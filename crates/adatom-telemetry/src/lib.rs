//! # adatom-telemetry
//!
//! Event bus for run telemetry. The engine emits structured events
//! (executed events, catalog repairs, MD phases, checkpoints) that are
//! consumed by pluggable sinks. Sinks only observe; they never mutate
//! engine state.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{RunEvent, RunEventKind};
pub use sinks::{EventSink, KindCountSink, SharedVecSink, TracingSink, VecSink};
