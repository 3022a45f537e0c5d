//! Simulated time, step counters and the kMC/MD cadence.

use adatom_config::CadenceConfig;
use adatom_types::{AdatomError, AdatomResult};
use serde::{Deserialize, Serialize};

/// kMC time advances only through Gillespie draws; MD phases are tracked
/// separately so `time` stays a pure kMC clock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationClock {
    time: f64,
    kmc_steps: u64,
    md_steps: u64,
    md_time: f64,
    md_phases: u64,
}

/// Read-only copy of the clock for export collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub time: f64,
    pub kmc_steps: u64,
    pub md_steps: u64,
    pub md_time: f64,
    pub md_phases: u64,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one kMC step of duration `dt`. `dt` must be finite and positive.
    pub fn advance(&mut self, dt: f64) -> AdatomResult<()> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(AdatomError::InvalidParameters(format!("time increment {dt} is not positive")));
        }
        self.time += dt;
        self.kmc_steps += 1;
        Ok(())
    }

    /// Records a completed MD phase.
    pub fn record_md(&mut self, steps: u64, time_per_step: f64) {
        self.md_steps += steps;
        self.md_time += steps as f64 * time_per_step;
        self.md_phases += 1;
    }

    /// Simulated kMC time.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn kmc_steps(&self) -> u64 {
        self.kmc_steps
    }

    pub fn md_steps(&self) -> u64 {
        self.md_steps
    }

    pub fn md_time(&self) -> f64 {
        self.md_time
    }

    pub fn md_phases(&self) -> u64 {
        self.md_phases
    }

    /// kMC time plus time spent in MD phases.
    pub fn elapsed(&self) -> f64 {
        self.time + self.md_time
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            time: self.time,
            kmc_steps: self.kmc_steps,
            md_steps: self.md_steps,
            md_time: self.md_time,
            md_phases: self.md_phases,
        }
    }

    /// True once `time` has reached `end`.
    pub fn reached(&self, end: Option<f64>) -> bool {
        end.is_some_and(|end| self.time >= end)
    }
}

/// An MD phase the cadence asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MdPlan {
    pub steps: u64,
    pub long: bool,
}

/// Decides after which kMC steps an MD phase runs.
#[derive(Debug, Clone)]
pub struct Cadence {
    config: CadenceConfig,
}

impl Cadence {
    pub fn new(config: CadenceConfig) -> Self {
        Self { config }
    }

    /// MD phase due after `kmc_steps` completed kMC steps, if any.
    /// A long phase replaces the regular one on its multiples.
    pub fn md_due(&self, kmc_steps: u64) -> Option<MdPlan> {
        let c = &self.config;
        if kmc_steps == 0 {
            return None;
        }
        if c.kmc_per_long_md > 0 && kmc_steps % c.kmc_per_long_md == 0 {
            return Some(MdPlan {
                steps: c.long_md_steps,
                long: true,
            });
        }
        if c.kmc_per_md > 0 && kmc_steps % c.kmc_per_md == 0 {
            return Some(MdPlan {
                steps: c.md_steps,
                long: false,
            });
        }
        None
    }

    /// Regular MD phase used when the system is quiescent, if enabled.
    pub fn on_quiescence(&self) -> Option<MdPlan> {
        (self.config.md_on_quiescence && self.config.md_enabled()).then_some(MdPlan {
            steps: self.config.md_steps,
            long: false,
        })
    }

    pub fn md_time_per_step(&self) -> f64 {
        self.config.md_time_per_step
    }
}
