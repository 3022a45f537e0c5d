//! # adatom-rates
//!
//! Rate-model abstraction and the physical rate laws used by the event
//! templates.
//!
//! ## Design
//!
//! The [`RateModel`] trait turns a [`LocalEnvironment`] into a
//! non-negative rate constant. Rate laws are pure functions of their
//! parameters and the environment, so identical inputs always give
//! identical rates.
//!
//! The [`RateLaw`] enum is the serializable form used in run
//! configuration files; it dispatches to the concrete models.

pub mod arrhenius;
pub mod kinetic_gas;
pub mod law;
pub mod tabulated;
pub mod traits;

pub use arrhenius::{ArrheniusRate, TransitionStateRate};
pub use kinetic_gas::HertzKnudsenFlux;
pub use law::RateLaw;
pub use tabulated::CoordinationTable;
pub use traits::{ConstantRate, LocalEnvironment, RateModel};
