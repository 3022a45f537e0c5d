//! Thermally activated rate laws.
//!
//! Barriers are in kcal/mol and temperatures in K, so the exponent is
//! `Ea / (R·T)` with the molar gas constant in kcal/(mol·K).

use adatom_types::constants::{BOLTZMANN, GAS_CONSTANT_KCAL, PLANCK};
use serde::{Deserialize, Serialize};

use crate::traits::{LocalEnvironment, RateModel};

/// Boltzmann factor `exp(−Ea / RT)`, with the `T → 0` limit taken explicitly.
pub fn boltzmann_factor(barrier: f64, temperature: f64) -> f64 {
    if temperature <= 0.0 {
        return if barrier > 0.0 { 0.0 } else { 1.0 };
    }
    (-barrier / (GAS_CONSTANT_KCAL * temperature)).exp()
}

/// `rate = prefactor · exp(−barrier / RT)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrheniusRate {
    /// Attempt frequency (1/s).
    pub prefactor: f64,
    /// Activation energy (kcal/mol).
    pub barrier: f64,
}

impl ArrheniusRate {
    pub fn new(prefactor: f64, barrier: f64) -> Self {
        Self { prefactor, barrier }
    }
}

impl RateModel for ArrheniusRate {
    fn rate(&self, env: &LocalEnvironment) -> f64 {
        self.prefactor * boltzmann_factor(self.barrier, env.temperature)
    }

    fn name(&self) -> &str {
        "arrhenius"
    }
}

/// Transition-state (Eyring) rate: `(kB·T / h) · exp(−barrier / RT)`.
///
/// Used for desorption, where the attempt frequency scales with temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionStateRate {
    /// Activation energy (kcal/mol).
    pub barrier: f64,
}

impl TransitionStateRate {
    pub fn new(barrier: f64) -> Self {
        Self { barrier }
    }

    /// Eyring attempt frequency `kB·T / h` (1/s).
    pub fn attempt_frequency(temperature: f64) -> f64 {
        BOLTZMANN * temperature.max(0.0) / PLANCK
    }
}

impl RateModel for TransitionStateRate {
    fn rate(&self, env: &LocalEnvironment) -> f64 {
        Self::attempt_frequency(env.temperature) * boltzmann_factor(self.barrier, env.temperature)
    }

    fn name(&self) -> &str {
        "transition_state"
    }
}
