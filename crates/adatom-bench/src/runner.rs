//! Benchmark runner: executes scenarios step by step and collects metrics.

use std::time::Instant;

use adatom_core::Engine;
use adatom_host::{ConfigurationQuery, JitterMd};
use adatom_types::{AdatomError, AdatomResult};

use crate::metrics::BenchmarkMetrics;
use crate::scenarios::{Scenario, ScenarioKind};

/// Runs benchmark scenarios and collects metrics.
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Run a single scenario.
    ///
    /// Steps until the budget is spent or no event is eligible.
    pub fn run(scenario: &Scenario) -> AdatomResult<BenchmarkMetrics> {
        let mut engine = Engine::new(scenario.config.clone(), scenario.host.clone())?;
        if let Some(amplitude) = scenario.md_amplitude {
            engine = engine.with_md_phase(Box::new(JitterMd::new(amplitude, 0.0, scenario.config.seed)));
        }

        let budget = scenario.config.run.kmc_steps;
        let mut step_times: Vec<f64> = Vec::with_capacity(budget as usize);
        let mut affected = 0usize;
        let mut quiescent = false;

        let total_start = Instant::now();
        for _ in 0..budget {
            let start = Instant::now();
            match engine.step() {
                Ok(outcome) => affected += outcome.update.affected,
                Err(AdatomError::NoEligibleEvents { .. }) => {
                    quiescent = true;
                    break;
                }
                Err(e) => return Err(e),
            }
            step_times.push(start.elapsed().as_secs_f64());
        }
        let total_wall_time = total_start.elapsed().as_secs_f64();

        let steps = step_times.len();
        let avg_step = if steps == 0 {
            0.0
        } else {
            step_times.iter().sum::<f64>() / steps as f64
        };
        let min_step = step_times.iter().copied().fold(f64::MAX, f64::min);
        let max_step = step_times.iter().copied().fold(0.0, f64::max);
        let avg_affected = if steps == 0 { 0.0 } else { affected as f64 / steps as f64 };

        let clock = engine.clock();
        tracing::info!(
            scenario = scenario.kind.name(),
            steps,
            wall_time = total_wall_time,
            "benchmark scenario finished"
        );

        Ok(BenchmarkMetrics {
            scenario: scenario.kind.name().to_string(),
            total_wall_time,
            kmc_steps: clock.kmc_steps(),
            md_steps: clock.md_steps(),
            avg_step_time: avg_step,
            min_step_time: if steps == 0 { 0.0 } else { min_step },
            max_step_time: max_step,
            sim_time: clock.time(),
            avg_affected,
            final_events: engine.catalog().len(),
            final_total_rate: engine.catalog().total_rate(),
            particles: engine.host().particle_count(),
            bonds: engine.bonds().len(),
            quiescent,
        })
    }

    /// Run all scenarios and return metrics for each.
    pub fn run_all() -> AdatomResult<Vec<BenchmarkMetrics>> {
        ScenarioKind::all()
            .iter()
            .map(|&kind| Self::run(&Scenario::from_kind(kind)))
            .collect()
    }
}
