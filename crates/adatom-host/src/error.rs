//! Host-side failures.

use adatom_types::{AdatomError, BondType, ParticleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("unknown particle {0}")]
    UnknownParticle(ParticleId),

    #[error("bond {a}-{b} of type {bond_type} already exists")]
    DuplicateBond {
        a: ParticleId,
        b: ParticleId,
        bond_type: BondType,
    },

    #[error("no bond {a}-{b} of type {bond_type}")]
    MissingBond {
        a: ParticleId,
        b: ParticleId,
        bond_type: BondType,
    },

    #[error("mutation rejected: {0}")]
    Rejected(String),

    #[error("MD phase failed: {0}")]
    Md(String),

    #[error("collective operation failed: {0}")]
    Collective(String),
}

/// Host failures during mutation surface as execution errors.
impl From<HostError> for AdatomError {
    fn from(e: HostError) -> Self {
        AdatomError::Execution(e.to_string())
    }
}
