//! CLI command implementations.

use adatom_bench::metrics::BenchmarkMetrics;
use adatom_bench::runner::BenchmarkRunner;
use adatom_bench::scenarios::{Scenario, ScenarioKind};
use adatom_config::KmcConfig;
use adatom_core::{Engine, EventDetector};
use adatom_host::{ConfigurationQuery, JitterMd, StaticMd};
use adatom_telemetry::{EventBus, KindCountSink, TracingSink};

use crate::checkpoint::{read_checkpoints, JsonLinesCheckpoints};

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn parse_scenario(name: &str) -> Result<ScenarioKind, Box<dyn std::error::Error>> {
    ScenarioKind::from_name(name).ok_or_else(|| {
        let available: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
        format!("Unknown scenario: '{name}'. Available: {}", available.join(", ")).into()
    })
}

/// Arguments of the `run` subcommand.
pub struct RunArgs<'a> {
    pub scenario: &'a str,
    pub config: Option<&'a str>,
    pub steps: Option<u64>,
    pub seed: Option<u64>,
    pub checkpoints: Option<&'a str>,
    pub output: Option<&'a str>,
}

/// Run a kMC simulation.
pub fn run(args: &RunArgs<'_>) -> CliResult {
    println!("adatom kMC Run");
    println!("──────────────");

    let kind = parse_scenario(args.scenario)?;
    let mut scenario = Scenario::from_kind(kind);
    if let Some(path) = args.config {
        scenario.config = KmcConfig::load(path)?;
        println!("Config:       {path}");
    }
    if let Some(steps) = args.steps {
        scenario = scenario.with_steps(steps);
    }
    if let Some(seed) = args.seed {
        scenario = scenario.with_seed(seed);
    }

    let config = scenario.config.clone();
    println!("Scenario:     {}", kind.name());
    println!("Particles:    {}", scenario.host.particle_count());
    println!("Seed:         {}", config.seed);
    println!("Step budget:  {}", config.run.kmc_steps);
    println!();

    let mut bus = EventBus::new();
    bus.add_sink(Box::new(TracingSink::new(tracing::Level::DEBUG)));
    let per_kind = KindCountSink::new();
    bus.add_sink(Box::new(per_kind.clone()));

    let mut engine = Engine::new(config.clone(), scenario.host)?.with_telemetry(bus);
    if config.cadence.md_enabled() {
        engine = match scenario.md_amplitude {
            Some(amplitude) => engine.with_md_phase(Box::new(JitterMd::new(amplitude, 0.0, config.seed))),
            None => engine.with_md_phase(Box::new(StaticMd)),
        };
    }
    if let Some(path) = args.checkpoints {
        engine = engine.with_checkpoint(Box::new(JsonLinesCheckpoints::create(path)?));
    }

    println!(
        "Initial catalog: {} events, total rate {:.6e} /s",
        engine.catalog().len(),
        engine.catalog().total_rate()
    );

    let summary = engine.run()?;

    println!("Termination:  {}", summary.termination.label());
    println!("kMC steps:    {}", summary.clock.kmc_steps);
    println!("kMC time:     {:.6e} s", summary.clock.time);
    println!("MD steps:     {} ({} phases)", summary.clock.md_steps, summary.clock.md_phases);
    println!("Particles:    {}", summary.particles);
    println!("Bonds:        {}", summary.bonds);
    println!("Cataloged:    {} (total rate {:.6e} /s)", summary.cataloged, summary.final_total_rate);
    for (kind, count) in &per_kind.counts() {
        println!("  {kind:<24} {count}");
    }

    if let Some(path) = args.output {
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        println!("Summary written to: {path}");
    }
    Ok(())
}

/// Run benchmark suite.
pub fn benchmark(scenario_name: &str, steps: Option<u64>, output_path: Option<&str>) -> CliResult {
    println!("adatom Benchmark Suite");
    println!("══════════════════════");
    println!();

    let scenarios: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        vec![parse_scenario(scenario_name)?]
    };

    let mut all_metrics = Vec::new();
    for &kind in &scenarios {
        let mut scenario = Scenario::from_kind(kind);
        if let Some(steps) = steps {
            scenario = scenario.with_steps(steps);
        }

        println!(
            "Running: {} ({} particles, {} steps)",
            kind.name(),
            scenario.host.particle_count(),
            scenario.config.run.kmc_steps,
        );

        let metrics = BenchmarkRunner::run(&scenario).map_err(|e| format!("Benchmark failed: {e}"))?;

        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Avg step:      {:.3}us", metrics.avg_step_time * 1e6);
        println!("  Avg affected:  {:.1}", metrics.avg_affected);
        println!("  Sim time:      {:.6e}s", metrics.sim_time);
        println!();

        all_metrics.push(metrics);
    }

    if let Some(path) = output_path {
        let csv = BenchmarkMetrics::to_csv(&all_metrics);
        std::fs::write(path, &csv)?;
        println!("Results written to: {path}");
    } else {
        println!("CSV Output:");
        println!("{}", BenchmarkMetrics::to_csv(&all_metrics));
    }

    Ok(())
}

/// Inspect a checkpoint file.
pub fn inspect(path: &str) -> CliResult {
    println!("adatom Checkpoint Inspector");
    println!("───────────────────────────");
    println!();

    let checkpoints = read_checkpoints(path)?;
    println!("Checkpoints:  {}", checkpoints.len());
    println!();
    println!("{:>10} {:>14} {:>10} {:>8} {:>14}", "kmc_step", "time_s", "particles", "events", "total_rate");
    for c in &checkpoints {
        println!(
            "{:>10} {:>14.6e} {:>10} {:>8} {:>14.6e}",
            c.clock.kmc_steps, c.clock.time, c.particles, c.catalog.events, c.catalog.total_rate
        );
    }
    Ok(())
}

/// Validate a run-parameter file.
pub fn validate(path: &str) -> CliResult {
    println!("Validating: {path}");

    let config = KmcConfig::load(path)?;
    let events = &config.events;
    println!("  Temperature:       {} K", config.temperature);
    println!("  Seed:              {}", config.seed);
    println!("  Bond-break:        {}", events.bond_break.len());
    println!("  Bond-form:         {}", events.bond_form.len());
    println!("  Diffusion:         {}", events.diffusion.len());
    println!("  Deposition:        {}", events.deposition.len());
    println!("  Desorption:        {}", events.desorption.len());
    println!("  Interaction range: {:.3}", EventDetector::interaction_radius(&config));
    if events.is_empty() {
        println!("  Warning: no event templates; every run will end immediately");
    }
    println!("  ✓ Config is valid");
    Ok(())
}
