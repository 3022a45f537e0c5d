//! Benchmark metrics collected during a scenario run.

use serde::{Deserialize, Serialize};

/// Metrics collected from a benchmark scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    /// kMC steps executed.
    pub kmc_steps: u64,
    /// MD steps run between kMC stretches.
    pub md_steps: u64,
    /// Average wall-clock time per kMC step (seconds).
    pub avg_step_time: f64,
    pub min_step_time: f64,
    pub max_step_time: f64,
    /// Simulated kMC time reached (s).
    pub sim_time: f64,
    /// Average number of particles whose events were rebuilt per step.
    pub avg_affected: f64,
    /// Events cataloged at the end of the run.
    pub final_events: usize,
    pub final_total_rate: f64,
    pub particles: usize,
    pub bonds: usize,
    /// True when the run ended early because no event was eligible.
    pub quiescent: bool,
}

impl BenchmarkMetrics {
    /// CSV header row.
    pub fn to_csv_header() -> String {
        "scenario,particles,bonds,kmc_steps,md_steps,total_wall_time_s,avg_step_us,min_step_us,max_step_us,sim_time,avg_affected,final_events,final_total_rate,quiescent".to_string()
    }

    /// Format this metrics instance as a CSV data row.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{:.6},{:.3},{:.3},{:.3},{:.6e},{:.2},{},{:.6e},{}",
            self.scenario,
            self.particles,
            self.bonds,
            self.kmc_steps,
            self.md_steps,
            self.total_wall_time,
            self.avg_step_time * 1e6,
            self.min_step_time * 1e6,
            self.max_step_time * 1e6,
            self.sim_time,
            self.avg_affected,
            self.final_events,
            self.final_total_rate,
            self.quiescent,
        )
    }

    /// Format multiple metrics as a complete CSV string.
    pub fn to_csv(metrics: &[BenchmarkMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}
