//! Top-level run configuration.

use std::path::Path;

use adatom_types::constants::DEFAULT_RESYNC_INTERVAL;
use adatom_types::{AdatomError, AdatomResult};
use serde::{Deserialize, Serialize};

use crate::species::SpeciesRules;
use crate::templates::EventTemplates;
use crate::validator::validate_config;

/// Complete parameter set for one kMC/MD run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KmcConfig {
    /// Seed for the run's single random stream.
    pub seed: u64,

    /// Thermostat temperature (K), passed to every rate law.
    pub temperature: f64,

    pub run: RunLimits,

    pub cadence: CadenceConfig,

    /// Checkpoint every this many kMC steps. 0 disables checkpoints.
    pub checkpoint_interval: u64,

    /// Recompute the catalog's total rate from scratch every this many kMC steps.
    pub resync_interval: u64,

    /// Radius around a participant searched for catalyst species.
    pub catalyst_radius: f64,

    pub species: SpeciesRules,

    pub trim: TrimConfig,

    pub events: EventTemplates,
}

/// Termination limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLimits {
    /// Maximum number of kMC steps.
    pub kmc_steps: u64,
    /// Stop once simulated kMC time reaches this value (s).
    pub end_time: Option<f64>,
}

/// kMC/MD alternation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    /// kMC steps between MD phases. 0 disables MD.
    pub kmc_per_md: u64,
    /// MD steps per regular phase.
    pub md_steps: u64,
    /// Simulated time per MD step (s), accumulated into the clock's MD time.
    pub md_time_per_step: f64,
    /// Every this many kMC steps a long MD phase replaces the regular one. 0 disables.
    pub kmc_per_long_md: u64,
    /// MD steps per long phase.
    pub long_md_steps: u64,
    /// Run an MD phase instead of stopping when no kMC event is eligible.
    pub md_on_quiescence: bool,
}

/// Removal of particles that left the film after an MD phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    /// Particles higher than film height plus this value are deleted
    /// together with everything bonded to them. `None` disables trimming.
    pub height_above_film: Option<f64>,
    /// Refuse to trim when more than this many particles would be deleted.
    pub max_deletions: usize,
}

impl Default for KmcConfig {
    fn default() -> Self {
        Self {
            seed: 12_345,
            temperature: 300.0,
            run: RunLimits::default(),
            cadence: CadenceConfig::default(),
            checkpoint_interval: 0,
            resync_interval: DEFAULT_RESYNC_INTERVAL,
            catalyst_radius: 0.0,
            species: SpeciesRules::default(),
            trim: TrimConfig::default(),
            events: EventTemplates::default(),
        }
    }
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            kmc_steps: 1_000,
            end_time: None,
        }
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            kmc_per_md: 0,
            md_steps: 0,
            md_time_per_step: 0.0,
            kmc_per_long_md: 0,
            long_md_steps: 0,
            md_on_quiescence: false,
        }
    }
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            height_above_film: None,
            max_deletions: 100,
        }
    }
}

impl CadenceConfig {
    pub fn md_enabled(&self) -> bool {
        self.kmc_per_md > 0 && self.md_steps > 0
    }
}

impl KmcConfig {
    /// Parses a TOML document. Does not validate.
    pub fn from_toml_str(text: &str) -> AdatomResult<Self> {
        toml::from_str(text).map_err(|e| AdatomError::Serialization(e.to_string()))
    }

    /// Serializes to TOML.
    pub fn to_toml_string(&self) -> AdatomResult<String> {
        toml::to_string_pretty(self).map_err(|e| AdatomError::Serialization(e.to_string()))
    }

    /// Reads, parses and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> AdatomResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// kMC-only run with the given seed and step budget.
    pub fn kmc_only(seed: u64, kmc_steps: u64) -> Self {
        Self {
            seed,
            run: RunLimits {
                kmc_steps,
                end_time: None,
            },
            ..Default::default()
        }
    }
}
