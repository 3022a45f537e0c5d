//! # adatom-types
//!
//! Shared types, identifiers, error types, and physical constants
//! for the adatom kinetic Monte Carlo engine.
//!
//! This crate has zero domain logic. It defines the vocabulary
//! that all other adatom crates share.

pub mod constants;
pub mod error;
pub mod ids;

pub use error::{AdatomError, AdatomResult};
pub use ids::{BondType, MoleculeId, ParticleId, Species};
