//! Serializable rate-law selection for run configurations.

use adatom_types::{AdatomError, AdatomResult};
use serde::{Deserialize, Serialize};

use crate::arrhenius::{ArrheniusRate, TransitionStateRate};
use crate::kinetic_gas::HertzKnudsenFlux;
use crate::tabulated::CoordinationTable;
use crate::traits::{ConstantRate, LocalEnvironment, RateModel};

/// Rate law as written in a configuration file.
///
/// ```toml
/// rate = { law = "arrhenius", prefactor = 1.0e13, barrier = 12.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum RateLaw {
    Constant(ConstantRate),
    Arrhenius(ArrheniusRate),
    TransitionState(TransitionStateRate),
    HertzKnudsen(HertzKnudsenFlux),
    Coordination(CoordinationTable),
}

impl RateLaw {
    pub fn constant(rate: f64) -> Self {
        RateLaw::Constant(ConstantRate::new(rate))
    }

    pub fn arrhenius(prefactor: f64, barrier: f64) -> Self {
        RateLaw::Arrhenius(ArrheniusRate::new(prefactor, barrier))
    }

    fn model(&self) -> &dyn RateModel {
        match self {
            RateLaw::Constant(m) => m,
            RateLaw::Arrhenius(m) => m,
            RateLaw::TransitionState(m) => m,
            RateLaw::HertzKnudsen(m) => m,
            RateLaw::Coordination(m) => m,
        }
    }

    /// Checks that every parameter is finite and in range.
    pub fn validate(&self) -> AdatomResult<()> {
        let bad = |what: &str, v: f64| {
            AdatomError::InvalidParameters(format!("{} rate law: {what} = {v} is out of range", self.name()))
        };
        match self {
            RateLaw::Constant(m) => {
                if !m.rate.is_finite() || m.rate < 0.0 {
                    return Err(bad("rate", m.rate));
                }
            }
            RateLaw::Arrhenius(m) => {
                if !m.prefactor.is_finite() || m.prefactor < 0.0 {
                    return Err(bad("prefactor", m.prefactor));
                }
                if !m.barrier.is_finite() {
                    return Err(bad("barrier", m.barrier));
                }
            }
            RateLaw::TransitionState(m) => {
                if !m.barrier.is_finite() {
                    return Err(bad("barrier", m.barrier));
                }
            }
            RateLaw::HertzKnudsen(m) => {
                if !m.pressure_bar.is_finite() || m.pressure_bar < 0.0 {
                    return Err(bad("pressure_bar", m.pressure_bar));
                }
                if !m.site_area.is_finite() || m.site_area < 0.0 {
                    return Err(bad("site_area", m.site_area));
                }
                if !m.molar_mass.is_finite() || m.molar_mass <= 0.0 {
                    return Err(bad("molar_mass", m.molar_mass));
                }
            }
            RateLaw::Coordination(m) => {
                if let Some(&v) = m.table.iter().find(|v| !v.is_finite() || **v < 0.0) {
                    return Err(bad("table entry", v));
                }
                if !m.beyond.is_finite() || m.beyond < 0.0 {
                    return Err(bad("beyond", m.beyond));
                }
            }
        }
        Ok(())
    }
}

impl RateModel for RateLaw {
    fn rate(&self, env: &LocalEnvironment) -> f64 {
        self.model().rate(env)
    }

    fn name(&self) -> &str {
        self.model().name()
    }
}

impl Default for RateLaw {
    fn default() -> Self {
        RateLaw::constant(1.0)
    }
}
