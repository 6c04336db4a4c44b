//! Site EMS entry point: CLI wiring and config-driven site construction.

use std::process;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use site_ems::cli::Cli;
use site_ems::config::ScenarioConfig;
use site_ems::error::{EmsError, Result};
use site_ems::inputs::{CsvSource, SyntheticProfile};
use site_ems::io::export::export_csv;
use site_ems::ledger::{CounterStore, JsonFileStore, MemoryStore};
use site_ems::sim::Site;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("site_ems=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves the scenario: `--scenario` takes priority, then `--preset`, then baseline.
fn load_scenario(cli: &Cli) -> Result<ScenarioConfig> {
    let mut scenario = if let Some(ref path) = cli.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(seed) = cli.seed {
        scenario.simulation.seed = seed;
    }
    if let Some(ticks) = cli.ticks {
        scenario.simulation.ticks = ticks;
    }
    if let Some(ref path) = cli.ledger {
        scenario.ledger.store_path = Some(path.clone());
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        return Err(EmsError::Config(errors));
    }
    Ok(scenario)
}

fn build_store(scenario: &ScenarioConfig) -> Box<dyn CounterStore + Send> {
    match scenario.ledger.store_path {
        Some(ref path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    }
}

fn run(cli: Cli) -> Result<()> {
    let scenario = load_scenario(&cli)?;
    let mut site = Site::from_config(&scenario, build_store(&scenario))?;

    if let Some(ref path) = cli.inputs {
        let mut source = CsvSource::from_path(path)?;
        info!(rows = source.len(), path = %path.display(), "replaying recorded readings");
        site.run(&mut source)?;
    } else {
        let mut source = SyntheticProfile::from_config(&scenario);
        site.run(&mut source)?;
    }

    if !cli.quiet {
        for r in site.records() {
            println!("{r}");
        }
    }

    println!("\n{}", site.kpi());
    println!("\n{}", site.ledger_snapshot());

    if let Some(ref path) = cli.telemetry_out {
        export_csv(site.records(), path)?;
        info!(path = %path.display(), "telemetry written");
    }

    #[cfg(not(feature = "api"))]
    if cli.serve {
        tracing::warn!("--serve ignored: built without the `api` feature");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(site_ems::api::AppState::new(scenario, site));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(site_ems::api::serve(state, addr))?;
    }

    Ok(())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match e {
            EmsError::Config(errors) => {
                for err in &errors {
                    eprintln!("{err}");
                }
            }
            other => eprintln!("error: {other}"),
        }
        process::exit(1);
    }
}
