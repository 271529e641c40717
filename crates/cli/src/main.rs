//! Out-of-order pipeline model CLI.
//!
//! Runs the cycle-accurate datapath over a seeded random trace. It performs:
//! 1. **Configuration:** JSON config file plus common command-line overrides.
//! 2. **Observability:** `RUST_LOG=ooo_core=trace` reproduces the full
//!    per-stage pipeline trace; component port limits log at `debug`.
//! 3. **Run:** drives the simulator to completion and prints the final
//!    cycle and instruction counts.
//!
//! Any structural violation, broken invariant, or divergence from the
//! golden reference aborts with a diagnostic and a nonzero exit code.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use ooo_core::Simulator;
use ooo_core::config::{Config, RenameMode};

#[derive(Parser, Debug)]
#[command(
    name = "oosim",
    version,
    about = "Cycle-accurate model of an R10K-style out-of-order pipeline",
    long_about = "Simulate a superscalar, speculative, out-of-order datapath over a \
                  seeded random instruction trace, cross-checked every cycle against \
                  a golden functional reference.\n\nExamples:\n  \
                  oosim --length 100000 --seed 7\n  \
                  oosim --rob-rename --cascade\n  \
                  RUST_LOG=ooo_core=trace oosim --length 64"
)]
struct Cli {
    /// JSON configuration file; defaults apply for missing fields.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use ROB-slot renaming instead of the physical register file.
    #[arg(long)]
    rob_rename: bool,

    /// Collapse Issue and Operand Fetch into one cycle, as in the R10K.
    #[arg(long)]
    cascade: bool,

    /// Random trace seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Random trace length.
    #[arg(long)]
    length: Option<u64>,
}

fn load_config(cli: &Cli) -> Result<Config, String> {
    let mut cfg = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("cannot parse {}: {e}", path.display()))?
        }
        None => Config::default(),
    };

    if cli.rob_rename {
        cfg.rename = RenameMode::Rob;
    }
    if cli.cascade {
        cfg.cascade_issue_operand = true;
    }
    if let Some(seed) = cli.seed {
        cfg.trace.seed = seed;
    }
    if let Some(length) = cli.length {
        cfg.trace.length = length;
    }
    Ok(cfg)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("oosim: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut sim = match Simulator::new(&cfg) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("oosim: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let report = sim.run();
    println!(
        "Exiting: {} cycles; {} instructions completed.",
        report.cycles, report.instructions
    );
    ExitCode::SUCCESS
}
