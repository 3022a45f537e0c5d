//! Rate model trait: the core rate abstraction.
//!
//! Every rate law implements this trait, so event templates can carry
//! any law without the detector knowing its functional form.

use serde::{Deserialize, Serialize};

/// Local physical context an event's rate may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalEnvironment {
    /// Thermostat temperature (K).
    pub temperature: f64,
    /// Bond count of the event's primary participant.
    pub coordination: u32,
}

impl LocalEnvironment {
    pub fn at_temperature(temperature: f64) -> Self {
        Self {
            temperature,
            coordination: 0,
        }
    }

    pub fn with_coordination(mut self, coordination: u32) -> Self {
        self.coordination = coordination;
        self
    }
}

/// Trait for rate laws.
///
/// # Strategy Pattern
///
/// - `ConstantRate`: fixed rate, independent of environment
/// - `ArrheniusRate`: `A · exp(−Ea / RT)`
/// - `TransitionStateRate`: Eyring prefactor `kB·T/h`
/// - `HertzKnudsenFlux`: kinetic-gas impingement rate on a site
/// - `CoordinationTable`: tabulated by bond count
pub trait RateModel: Send + Sync {
    /// Rate constant (1/s) for the given environment. Must be deterministic.
    fn rate(&self, env: &LocalEnvironment) -> f64;

    /// Returns the name of this rate law.
    fn name(&self) -> &str;
}

/// Environment-independent rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantRate {
    pub rate: f64,
}

impl ConstantRate {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl RateModel for ConstantRate {
    fn rate(&self, _env: &LocalEnvironment) -> f64 {
        self.rate
    }

    fn name(&self) -> &str {
        "constant"
    }
}
