//! leafspan command line
//!
//! Sweeps leaf construction cost and reports the optimal leaf lifespan for
//! each value.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release -- --config run.toml --format json
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};
use leafspan::leafspan_core::sweep::SweepResult;
use leafspan::Experiment;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

/// Optimal leaf lifespan versus construction cost
#[derive(Parser, Debug)]
#[command(name = "leafspan")]
#[command(about = "Find the leaf lifespan maximising marginal carbon gain across construction costs")]
struct Args {
    /// TOML run configuration (reference run if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Solve sweep points on all cores
    #[arg(long)]
    parallel: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    write_default_config: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn write_table(out: &mut impl Write, result: &SweepResult) -> io::Result<()> {
    writeln!(
        out,
        "{:>18} {:>14} {:>12}  status",
        "construction_cost", "lifespan_days", "annual_gain"
    )?;
    for point in result.iter() {
        let record = point.record();
        writeln!(
            out,
            "{:>18.3} {:>14.3} {:>12.4}  {}",
            record.construction_cost,
            point.optimal_days(),
            point.annual_carbon_gain(),
            record.status
        )?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let experiment = match &args.config {
        Some(path) => Experiment::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Experiment::default(),
    };

    if args.write_default_config {
        print!("{}", experiment.to_toml_string()?);
        return Ok(());
    }

    info!(
        parallel = args.parallel,
        construction_costs = experiment.run.sweep.costs()?.len(),
        "starting lifespan sweep"
    );
    let result = experiment.run(args.parallel)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        Format::Table => write_table(&mut out, &result)?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &result.records())?;
            writeln!(out)?;
        }
    }

    if result.failures() > 0 {
        eprintln!(
            "{} of {} sweep points failed",
            result.failures(),
            result.len()
        );
    }
    Ok(())
}
