//! Cumulative cost, income, and emission accounting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchResult;

/// CO₂ totals at or above this many kilograms are displayed in tons.
const CO2_TONS_THRESHOLD_KG: f64 = 1000.0;

/// Days per month used for export earnings projections.
const DAYS_PER_MONTH: f64 = 30.0;

/// Scalar rates used to price one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Income per kW exported per tick.
    pub grid_rate: f64,
    /// Cost per kW drawn from the grid per tick (load import and manual charge).
    pub import_price: f64,
    /// Avoided cost per kW of on-site generation per tick.
    pub savings_rate: f64,
    /// Avoided emissions per kW of on-site generation per tick (kg).
    pub co2_kg_per_kwh: f64,
    /// Export hours per day assumed by earnings projections.
    pub sun_hours: f64,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            grid_rate: 6.0,
            import_price: 5.4,
            savings_rate: 5.3,
            co2_kg_per_kwh: 0.91,
            sun_hours: 6.0,
        }
    }
}

/// Durable cumulative counters. Every field only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerState {
    /// Sum of per-tick export values (kW, not kWh).
    pub grid_export_total: f64,
    pub grid_export_income: f64,
    pub grid_import_cost_total: f64,
    pub cost_savings_total: f64,
    /// Kilograms.
    pub co2_reduced_total: f64,
}

impl LedgerState {
    /// Export income minus import cost. Not stored.
    pub fn total_net_income(&self) -> f64 {
        self.grid_export_income - self.grid_import_cost_total
    }

    /// Returns `true` if no counter of `self` is below the matching counter of `earlier`.
    pub fn dominates(&self, earlier: &LedgerState) -> bool {
        self.grid_export_total >= earlier.grid_export_total
            && self.grid_export_income >= earlier.grid_export_income
            && self.grid_import_cost_total >= earlier.grid_import_cost_total
            && self.cost_savings_total >= earlier.cost_savings_total
            && self.co2_reduced_total >= earlier.co2_reduced_total
    }
}

/// Export earnings extrapolated from the current export rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExportProjection {
    pub hourly: f64,
    /// `hourly * sun_hours`
    pub daily: f64,
    /// `daily * 30`
    pub monthly: f64,
}

impl ExportProjection {
    pub fn new(export_kw: f64, tariff: &TariffConfig) -> Self {
        let hourly = export_kw * tariff.grid_rate;
        let daily = hourly * tariff.sun_hours;
        Self {
            hourly,
            daily,
            monthly: daily * DAYS_PER_MONTH,
        }
    }
}

/// Ledger view after one tick: per-tick amounts plus the updated totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub cost_savings_per_hour: f64,
    pub co2_reduced_per_hour: f64,
    pub import_cost_per_hour: f64,
    pub export_income_per_hour: f64,
    /// On-site generation plus the manual grid charge draw (kW).
    pub total_energy_after_import: f64,
    pub export_projection: ExportProjection,
    pub totals: LedgerState,
    pub total_net_income: f64,
}

impl LedgerSnapshot {
    /// Snapshot of stored counters with zeroed per-tick amounts.
    pub fn from_totals(totals: LedgerState) -> Self {
        Self {
            cost_savings_per_hour: 0.0,
            co2_reduced_per_hour: 0.0,
            import_cost_per_hour: 0.0,
            export_income_per_hour: 0.0,
            total_energy_after_import: 0.0,
            export_projection: ExportProjection::default(),
            totals,
            total_net_income: totals.total_net_income(),
        }
    }

    /// Cumulative CO₂ reduction formatted for display.
    pub fn co2_total_display(&self) -> String {
        format_co2(self.totals.co2_reduced_total)
    }
}

/// Formats a CO₂ mass, switching to tons at 1000 kg.
pub fn format_co2(kg: f64) -> String {
    if kg >= CO2_TONS_THRESHOLD_KG {
        format!("{:.2} tons", kg / 1000.0)
    } else {
        format!("{kg:.2} kg")
    }
}

/// Applies one tick's dispatch outcome to the cumulative counters.
///
/// Import cost bills both the deficit import and the manual grid charge draw,
/// even though the latter never enters the load balance.
pub fn accrue(
    result: &DispatchResult,
    tariff: &TariffConfig,
    state: &mut LedgerState,
) -> LedgerSnapshot {
    let cost_savings_per_hour = result.total_generation * tariff.savings_rate;
    state.cost_savings_total += cost_savings_per_hour;

    let co2_reduced_per_hour = result.total_generation * tariff.co2_kg_per_kwh;
    state.co2_reduced_total += co2_reduced_per_hour;

    let mut export_income_per_hour = 0.0;
    if result.grid_export > 0.0 {
        export_income_per_hour = result.grid_export * tariff.grid_rate;
        state.grid_export_total += result.grid_export;
        state.grid_export_income += export_income_per_hour;
    }

    let import_cost_per_hour =
        (result.grid_import + result.manual_grid_charge_kw) * tariff.import_price;
    state.grid_import_cost_total += import_cost_per_hour;

    LedgerSnapshot {
        cost_savings_per_hour,
        co2_reduced_per_hour,
        import_cost_per_hour,
        export_income_per_hour,
        total_energy_after_import: result.total_generation + result.manual_grid_charge_kw,
        export_projection: ExportProjection::new(result.grid_export, tariff),
        totals: *state,
        total_net_income: state.total_net_income(),
    }
}

impl fmt::Display for LedgerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.totals;
        writeln!(f, "--- Ledger ---")?;
        writeln!(
            f,
            "Cost savings:          {:.2} this tick, {:.2} total",
            self.cost_savings_per_hour, t.cost_savings_total
        )?;
        writeln!(
            f,
            "CO2 reduced:           {:.2} kg this tick, {} total",
            self.co2_reduced_per_hour,
            self.co2_total_display()
        )?;
        writeln!(
            f,
            "Grid import cost:      {:.2} this tick, {:.2} total",
            self.import_cost_per_hour, t.grid_import_cost_total
        )?;
        writeln!(
            f,
            "Grid export:           {:.2} kW total, {:.2} income",
            t.grid_export_total, t.grid_export_income
        )?;
        writeln!(
            f,
            "Export projection:     {:.2}/h, {:.2}/day, {:.0}/month",
            self.export_projection.hourly,
            self.export_projection.daily,
            self.export_projection.monthly
        )?;
        write!(f, "Net income:            {:.2}", self.total_net_income)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{BatteryState, DispatchCase};

    fn result(generation: f64, import: f64, export: f64, manual: f64) -> DispatchResult {
        DispatchResult {
            case: DispatchCase::SurplusCharge,
            grid_import: import,
            grid_export: export,
            total_generation: generation,
            manual_grid_charge_kw: manual,
            battery: BatteryState::default(),
        }
    }

    #[test]
    fn generation_drives_savings_and_co2() {
        let mut state = LedgerState::default();
        let snap = accrue(&result(100.0, 0.0, 0.0, 0.0), &TariffConfig::default(), &mut state);
        assert!((snap.cost_savings_per_hour - 530.0).abs() < 1e-9);
        assert!((snap.co2_reduced_per_hour - 91.0).abs() < 1e-9);
        assert!((state.cost_savings_total - 530.0).abs() < 1e-9);
        assert!((state.co2_reduced_total - 91.0).abs() < 1e-9);
    }

    #[test]
    fn export_accrues_total_and_income() {
        let mut state = LedgerState::default();
        let tariff = TariffConfig::default();
        accrue(&result(0.0, 0.0, 50.0, 0.0), &tariff, &mut state);
        accrue(&result(0.0, 0.0, 30.0, 0.0), &tariff, &mut state);
        assert_eq!(state.grid_export_total, 80.0);
        assert_eq!(state.grid_export_income, 480.0);
    }

    #[test]
    fn manual_charge_is_billed_with_import() {
        let mut state = LedgerState::default();
        let snap = accrue(&result(0.0, 10.0, 0.0, 90.0), &TariffConfig::default(), &mut state);
        assert!((snap.import_cost_per_hour - 540.0).abs() < 1e-9);
        assert!((state.grid_import_cost_total - 540.0).abs() < 1e-9);
        assert_eq!(snap.total_energy_after_import, 90.0);
    }

    #[test]
    fn net_income_is_income_minus_cost() {
        let mut state = LedgerState::default();
        let tariff = TariffConfig {
            grid_rate: 2.0,
            import_price: 1.0,
            ..TariffConfig::default()
        };
        accrue(&result(0.0, 0.0, 10.0, 0.0), &tariff, &mut state);
        let snap = accrue(&result(0.0, 5.0, 0.0, 0.0), &tariff, &mut state);
        assert_eq!(snap.total_net_income, 15.0);
        assert_eq!(state.total_net_income(), 15.0);
    }

    #[test]
    fn export_projection_scales_by_sun_hours_and_month() {
        let p = ExportProjection::new(10.0, &TariffConfig::default());
        assert_eq!(p.hourly, 60.0);
        assert_eq!(p.daily, 360.0);
        assert_eq!(p.monthly, 10_800.0);
    }

    #[test]
    fn co2_display_switches_to_tons() {
        assert_eq!(format_co2(999.0), "999.00 kg");
        assert_eq!(format_co2(1000.0), "1.00 tons");
        assert_eq!(format_co2(2500.0), "2.50 tons");
    }

    #[test]
    fn counters_never_decrease() {
        let mut state = LedgerState::default();
        let tariff = TariffConfig::default();
        let mut prev = state;
        for (g, i, e, m) in [
            (0.0, 0.0, 0.0, 0.0),
            (10.0, 5.0, 0.0, 0.0),
            (0.0, 0.0, 7.5, 0.0),
            (3.0, 0.0, 0.0, 20.0),
        ] {
            accrue(&result(g, i, e, m), &tariff, &mut state);
            assert!(state.dominates(&prev));
            prev = state;
        }
    }

    #[test]
    fn ledger_state_tolerates_missing_fields() {
        let state: LedgerState = serde_json::from_str(r#"{"grid_export_total": 12.5}"#)
            .expect("partial ledger should parse");
        assert_eq!(state.grid_export_total, 12.5);
        assert_eq!(state.co2_reduced_total, 0.0);
    }
}
