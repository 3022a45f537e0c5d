//! MD phase abstraction.
//!
//! The engine hands the host to an [`MdPhase`] between kMC stretches.
//! Real integrators live in the host; the implementations here are
//! lightweight stand-ins for tests and benchmarks.

use adatom_math::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::HostError;
use crate::Host;

/// Outcome of one MD phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MdReport {
    /// Integrator steps performed.
    pub steps: u64,
    /// Particles whose position changed.
    pub relocated: usize,
}

/// External relaxation run between kMC stretches.
pub trait MdPhase {
    /// Advances the host by `steps` MD steps.
    fn relax(&mut self, host: &mut dyn Host, steps: u64) -> Result<MdReport, HostError>;

    /// Returns the name of this MD phase.
    fn name(&self) -> &str;
}

/// MD stand-in that performs no motion.
///
/// Keeps the cadence bookkeeping intact without touching positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticMd;

impl MdPhase for StaticMd {
    fn relax(&mut self, _host: &mut dyn Host, steps: u64) -> Result<MdReport, HostError> {
        Ok(MdReport { steps, relocated: 0 })
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// MD stand-in applying one random displacement per particle per phase.
///
/// `amplitude` bounds the displacement on each axis; `lift` is added to z,
/// letting weakly bound particles drift away from the film.
#[derive(Debug, Clone)]
pub struct JitterMd {
    pub amplitude: f64,
    pub lift: f64,
    rng: ChaCha8Rng,
}

impl JitterMd {
    pub fn new(amplitude: f64, lift: f64, seed: u64) -> Self {
        Self {
            amplitude,
            lift,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl MdPhase for JitterMd {
    fn relax(&mut self, host: &mut dyn Host, steps: u64) -> Result<MdReport, HostError> {
        let mut relocated = 0;
        for id in host.particle_ids() {
            if !host.is_owned(id) {
                continue;
            }
            let view = host.particle(id).ok_or(HostError::UnknownParticle(id))?;
            let a = self.amplitude;
            let delta = DVec3::new(
                self.rng.gen_range(-a..=a),
                self.rng.gen_range(-a..=a),
                self.rng.gen_range(-a..=a) + self.lift,
            );
            host.relocate_particle(id, view.position + delta)?;
            relocated += 1;
        }
        tracing::debug!(steps, relocated, "jitter MD phase");
        Ok(MdReport { steps, relocated })
    }

    fn name(&self) -> &str {
        "jitter"
    }
}
