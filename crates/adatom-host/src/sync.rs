//! Collective synchronization across subdomains.

use crate::error::HostError;

/// Blocking collective primitives provided by the multi-process layer.
pub trait Collective {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Blocks until every subdomain reaches the barrier.
    fn barrier(&self) -> Result<(), HostError>;

    /// Overwrites `values` on every rank with the values held by `root`.
    fn broadcast(&self, values: &mut [f64], root: usize) -> Result<(), HostError>;

    fn is_root(&self) -> bool {
        self.rank() == 0
    }
}

/// Collective for a single-process run. Every primitive is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl Collective for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) -> Result<(), HostError> {
        Ok(())
    }

    fn broadcast(&self, _values: &mut [f64], root: usize) -> Result<(), HostError> {
        if root != 0 {
            return Err(HostError::Collective(format!("root {root} out of range for 1 process")));
        }
        Ok(())
    }
}
