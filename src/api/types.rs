//! API response and query types.
//!
//! Telemetry field names follow the CSV export columns.

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::dispatch::{BatteryState, DispatchCase, DispatchConfig};
use crate::ledger::LedgerSnapshot;
use crate::sim::{KpiReport, TickRecord};

/// Combined state response: config, battery, ledger, summary, and latest tick.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub config: ScenarioConfig,
    /// Policy currently applied by the site.
    pub dispatch: DispatchConfig,
    pub battery: BatteryState,
    pub ledger: LedgerSnapshot,
    /// Cumulative CO₂ reduction, in kg or tons.
    pub co2_reduced_display: String,
    pub kpi: KpiReport,
    /// Most recent tick, `None` before the first tick.
    pub latest_tick: Option<TelemetryRecord>,
}

/// Single telemetry record using the CSV column names.
#[derive(Debug, Serialize)]
pub struct TelemetryRecord {
    pub tick: usize,
    pub solar_kw: f64,
    pub wind_kw: f64,
    pub load_kw: f64,
    pub generation_kw: f64,
    pub grid_import_kw: f64,
    pub grid_export_kw: f64,
    /// Manual grid-to-battery draw (kW), billed with import.
    pub manual_grid_charge_kw: f64,
    pub battery_soc: f64,
    pub case: DispatchCase,
    pub import_cost: f64,
    pub export_income: f64,
    pub cost_savings_total: f64,
    pub co2_reduced_total: f64,
    pub net_income: f64,
}

impl From<&TickRecord> for TelemetryRecord {
    fn from(r: &TickRecord) -> Self {
        let d = &r.dispatch;
        let l = &r.ledger;
        Self {
            tick: r.tick,
            solar_kw: r.input.solar_gen,
            wind_kw: r.input.wind_gen,
            load_kw: r.input.load,
            generation_kw: d.total_generation,
            grid_import_kw: d.grid_import,
            grid_export_kw: d.grid_export,
            manual_grid_charge_kw: d.manual_grid_charge_kw,
            battery_soc: d.battery.state_of_charge,
            case: d.case,
            import_cost: l.import_cost_per_hour,
            export_income: l.export_income_per_hour,
            cost_savings_total: l.totals.cost_savings_total,
            co2_reduced_total: l.totals.co2_reduced_total,
            net_income: l.total_net_income,
        }
    }
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// Start tick (inclusive).
    pub from: Option<usize>,
    /// End tick (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 4xx/5xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
