//! # adatom-core
//!
//! Rejection-free (BKL) kinetic Monte Carlo engine.
//!
//! ## Pipeline
//!
//! ```text
//! EventDetector::populate ──► EventCatalog
//!         ▲                        │ total rate, sample_by_rate(u1)
//!         │ incremental update     ▼
//! EventExecutor ◄──────────── EventSelector ──► SimulationClock (Δt = −ln u2 / R)
//! ```
//!
//! [`Engine`] drives the loop, alternates with an external MD phase on
//! the configured cadence, and halts on the first fatal error with the
//! clock state attached.

pub mod bond;
pub mod catalog;
pub mod clock;
pub mod detector;
pub mod engine;
pub mod event;
pub mod executor;
pub mod fenwick;
pub mod rng;
pub mod selector;
pub mod snapshot;
pub mod trim;

pub use bond::{BondIndex, BondKey};
pub use catalog::{CatalogStats, EventCatalog};
pub use clock::{Cadence, ClockSnapshot, MdPlan, SimulationClock};
pub use detector::{EventDetector, UpdateReport};
pub use engine::{Engine, ExecutedEvent, RunSummary, StepOutcome, Termination};
pub use event::{Event, EventKey, EventKind};
pub use executor::{EventExecutor, ExecutionReport};
pub use rng::KmcRng;
pub use selector::{EventSelector, Selection};
pub use snapshot::{CheckpointSink, EngineSnapshot, MemoryCheckpoints};
