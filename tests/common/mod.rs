//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use rand::{Rng, SeedableRng, rngs::StdRng};

use site_ems::config::ScenarioConfig;
use site_ems::dispatch::{BatteryState, DispatchConfig, TickInput};
use site_ems::ledger::{CounterStore, MemoryStore};
use site_ems::sim::Site;

/// Battery at `soc` percent with the default 500 kWh per percent.
pub fn battery(soc: f64) -> BatteryState {
    BatteryState::new(soc, 500.0)
}

/// Dispatch policy without manual grid charging.
pub fn policy(priority: f64, reserve: f64, export_demand: f64) -> DispatchConfig {
    DispatchConfig {
        battery_priority: priority,
        reserve,
        export_demand,
        manual_grid_charge_kw: 0.0,
    }
}

/// Baseline site with in-memory counters.
pub fn baseline_site() -> Site<MemoryStore> {
    site_with(&ScenarioConfig::baseline(), MemoryStore::new())
}

/// Site built from `cfg` over `store`.
pub fn site_with<S: CounterStore>(cfg: &ScenarioConfig, store: S) -> Site<S> {
    match Site::from_config(cfg, store) {
        Ok(site) => site,
        Err(e) => panic!("site should build: {e}"),
    }
}

/// Reproducible random readings in `[0, 500)` kW for each series.
pub fn random_inputs(seed: u64, n: usize) -> Vec<TickInput> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            TickInput::new(
                rng.random_range(0.0..500.0),
                rng.random_range(0.0..500.0),
                rng.random_range(0.0..500.0),
            )
        })
        .collect()
}

/// Random in-contract policy: priority, reserve in `[0, 100]`, export in `[0, 300)`.
pub fn random_policy(rng: &mut StdRng) -> DispatchConfig {
    DispatchConfig {
        battery_priority: rng.random_range(0.0..=100.0),
        reserve: rng.random_range(0.0..=100.0),
        export_demand: if rng.random_bool(0.5) {
            rng.random_range(0.0..300.0)
        } else {
            0.0
        },
        manual_grid_charge_kw: if rng.random_bool(0.2) {
            rng.random_range(0.0..200.0)
        } else {
            0.0
        },
    }
}
