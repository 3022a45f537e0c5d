//! # adatom-host
//!
//! The narrow contract between the kMC core and the particle host that
//! owns atom storage, geometry and MD integration.
//!
//! - [`ConfigurationQuery`]: side-effect-free neighbor, distance and attribute lookups
//! - [`HostMutation`]: structural edits, each reporting its [`ChangeSet`]
//! - [`Collective`]: barrier and broadcast across subdomains
//! - [`MdPhase`]: external relaxation between kMC stretches
//!
//! [`InMemoryHost`] is a self-contained reference host with a periodic
//! cell grid, used by tests, benchmarks and the CLI.

pub mod error;
pub mod md;
pub mod memory;
pub mod mutation;
pub mod query;
pub mod sync;

pub use error::HostError;
pub use md::{JitterMd, MdPhase, MdReport, StaticMd};
pub use memory::InMemoryHost;
pub use mutation::{ChangeSet, HostMutation, Relocation};
pub use query::{ConfigurationQuery, ParticleView};
pub use sync::{Collective, SingleProcess};

/// A full host: queryable and mutable.
pub trait Host: ConfigurationQuery + HostMutation {}

impl<T: ConfigurationQuery + HostMutation + ?Sized> Host for T {}
