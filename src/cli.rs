//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "site-ems")]
#[command(author, version, about = "Site energy dispatch and accounting engine")]
#[command(
    long_about = "Runs the dispatch policy over a sequence of solar, wind, and load readings,\n\
    pricing every tick and keeping cumulative savings, income, and CO2 totals.\n\
    \nExamples:\n  \
    site-ems                                   # baseline preset, synthetic profiles\n  \
    site-ems --preset export_contract --ticks 96\n  \
    site-ems --inputs readings.csv --ledger ledger.json --telemetry-out run.csv"
)]
pub struct Cli {
    /// Load the scenario from a TOML file
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, export_contract, grid_charging)
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Override the random seed of the synthetic profiles
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the number of synthetic ticks
    #[arg(long)]
    pub ticks: Option<usize>,

    /// Replay readings from CSV (header: solar_kw,wind_kw,load_kw) instead of synthetic profiles
    #[arg(long, value_name = "PATH")]
    pub inputs: Option<PathBuf>,

    /// Keep the ledger counters in this JSON file across runs
    #[arg(long, value_name = "PATH")]
    pub ledger: Option<PathBuf>,

    /// Export tick records to CSV
    #[arg(long, value_name = "PATH")]
    pub telemetry_out: Option<PathBuf>,

    /// Suppress per-tick lines
    #[arg(long, short)]
    pub quiet: bool,

    /// Start the REST API after the run (requires the `api` feature)
    #[arg(long)]
    pub serve: bool,

    /// API server port
    #[arg(long, default_value_t = 3000, requires = "serve")]
    pub port: u16,
}
