//! noise-trap: noise budget injection attacks against BFV ciphertexts.
//!
//! Runs the bundled attack presets, or a scenario described in a JSON file,
//! against the noise-tracking BFV simulator and reports every observation.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "noise-trap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging of every observation
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print reports as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the bundled attack presets
    List,

    /// Run bundled presets by name
    Run {
        /// Preset names, see `list`
        #[arg(required_unless_present = "all")]
        names: Vec<String>,

        /// Run every preset
        #[arg(long, conflicts_with = "names")]
        all: bool,

        #[command(flatten)]
        flavor: Flavor,
    },

    /// Run a scenario from a JSON file holding `bfv` parameters and a `scenario`
    Config {
        /// Scenario file (JSON)
        #[arg(env = "NOISE_TRAP_SCENARIO")]
        file: PathBuf,

        #[command(flatten)]
        flavor: Flavor,
    },
}

/// Overrides of the detector flavor a scenario was configured with.
#[derive(Args, Clone, Copy)]
struct Flavor {
    /// Halt once the budget drops into the danger zone
    #[arg(long, conflicts_with = "report_only")]
    halt_on_danger: bool,

    /// Only report zones, halting on value mismatches alone
    #[arg(long)]
    report_only: bool,
}

impl Flavor {
    fn halt_on_danger_zone(self) -> Option<bool> {
        match (self.halt_on_danger, self.report_only) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::List => commands::list::run(cli.json),
        Commands::Run { names, all, flavor } => {
            commands::run::presets(names, all, flavor.halt_on_danger_zone(), cli.json)
        }
        Commands::Config { file, flavor } => {
            commands::run::config(file, flavor.halt_on_danger_zone(), cli.json)
        }
    }
}
