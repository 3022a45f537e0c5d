//! adatom CLI: kMC runs, benchmarking and config validation.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod checkpoint;
mod commands;

#[derive(Parser)]
#[command(name = "adatom")]
#[command(version, about = "adatom: rejection-free kinetic Monte Carlo for hybrid kMC/MD runs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a kMC simulation on a procedural starting configuration.
    Run {
        /// Starting configuration (simple_adsorption, brownian_diffusion, polymer_network).
        #[arg(short, long, default_value = "simple_adsorption")]
        scenario: String,

        /// Run parameters (TOML). Replaces the scenario's own parameters.
        #[arg(short, long)]
        config: Option<String>,

        /// Override the kMC step budget.
        #[arg(long)]
        steps: Option<u64>,

        /// Override the random seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Write checkpoints as JSON lines to this file.
        #[arg(long)]
        checkpoints: Option<String>,

        /// Write the run summary as JSON to this file.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run the benchmark suite.
    Benchmark {
        /// Which scenario to run (simple_adsorption, brownian_diffusion, polymer_network, all).
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Override the kMC step budget of every scenario.
        #[arg(long)]
        steps: Option<u64>,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Inspect a checkpoint file written by `run --checkpoints`.
    Inspect {
        /// Path to the JSON-lines checkpoint file.
        path: String,
    },

    /// Validate a run-parameter file.
    Validate {
        /// Path to the TOML config.
        path: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            scenario,
            config,
            steps,
            seed,
            checkpoints,
            output,
        } => commands::run(&commands::RunArgs {
            scenario: &scenario,
            config: config.as_deref(),
            steps,
            seed,
            checkpoints: checkpoints.as_deref(),
            output: output.as_deref(),
        }),
        Commands::Benchmark { scenario, steps, output } => commands::benchmark(&scenario, steps, output.as_deref()),
        Commands::Inspect { path } => commands::inspect(&path),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
