//! Error types for the adatom engine.
//!
//! All crates return `AdatomResult<T>` from fallible operations.

use thiserror::Error;

/// Unified error type for the adatom engine.
#[derive(Debug, Error)]
pub enum AdatomError {
    /// The host configuration is inconsistent (dangling id, missing bond partner).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An equivalent event is already cataloged.
    #[error("Duplicate event: {0}")]
    DuplicateEvent(String),

    /// A referenced event or entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Total rate is zero. Terminal, not a bug.
    #[error("No eligible events at t = {time:.6e}")]
    NoEligibleEvents {
        time: f64,
    },

    /// The host rejected a structural mutation.
    #[error("Execution failed: {0}")]
    Execution(String),

    /// Run parameters failed validation.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// A fatal error surfaced together with the clock state at the moment it occurred.
    #[error("Simulation halted at t = {time:.6e} (kMC step {kmc_steps}, MD step {md_steps}): {source}")]
    Halted {
        #[source]
        source: Box<AdatomError>,
        time: f64,
        kmc_steps: u64,
        md_steps: u64,
    },

    /// The engine halted earlier and refuses to continue.
    #[error("Engine already halted at t = {time:.6e} (kMC step {kmc_steps}): {reason}")]
    AlreadyHalted {
        reason: String,
        time: f64,
        kmc_steps: u64,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AdatomError {
    /// Everything except the quiescent terminal condition stops the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AdatomError::NoEligibleEvents { .. })
    }

    /// Strips any `Halted` wrapper.
    pub fn root_cause(&self) -> &AdatomError {
        match self {
            AdatomError::Halted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Convenience alias for `Result<T, AdatomError>`.
pub type AdatomResult<T> = Result<T, AdatomError>;
