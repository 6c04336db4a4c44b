//! Dispatch inputs, battery state, and per-tick dispatch outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound of the battery state of charge (percent).
pub const SOC_FULL: f64 = 100.0;

/// Default energy represented by one percentage point of charge (kWh).
///
/// 100% therefore equals 50,000 kWh.
pub const DEFAULT_CAPACITY_PER_PERCENT: f64 = 500.0;

/// Battery state carried from one tick to the next.
///
/// The state of charge is a percentage. It is not clamped on construction, so
/// a misconfigured initial value outside `[0, 100]` survives until the first
/// charge or drain brings it back inside the range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryState {
    /// State of charge in percent.
    pub state_of_charge: f64,
    /// Energy represented by one percentage point (kWh).
    pub capacity_per_percent: f64,
}

impl BatteryState {
    /// Creates a battery at the given state of charge.
    ///
    /// # Panics
    ///
    /// Panics if `capacity_per_percent` is not strictly positive.
    pub fn new(state_of_charge: f64, capacity_per_percent: f64) -> Self {
        assert!(
            capacity_per_percent > 0.0,
            "capacity_per_percent must be > 0"
        );
        Self {
            state_of_charge,
            capacity_per_percent,
        }
    }

    /// Converts one tick-hour of power (kW) into percentage points.
    pub fn kw_to_percent(&self, kw: f64) -> f64 {
        kw / self.capacity_per_percent
    }

    /// Power (kW over one tick-hour) stored above `floor` percent.
    pub fn headroom_above_kw(&self, floor: f64) -> f64 {
        (self.state_of_charge - floor) * self.capacity_per_percent
    }

    /// Adds `kw` of charge, saturating at full.
    pub(crate) fn charge_kw(&mut self, kw: f64) {
        self.state_of_charge = (self.state_of_charge + self.kw_to_percent(kw)).min(SOC_FULL);
    }

    /// Removes `kw` of charge, never going below `floor`.
    pub(crate) fn drain_kw(&mut self, kw: f64, floor: f64) {
        self.state_of_charge = (self.state_of_charge - self.kw_to_percent(kw)).max(floor);
    }

    /// Returns `true` if the battery is below 100%.
    pub fn can_charge(&self) -> bool {
        self.state_of_charge < SOC_FULL
    }
}

impl Default for BatteryState {
    fn default() -> Self {
        Self::new(55.0, DEFAULT_CAPACITY_PER_PERCENT)
    }
}

/// Policy inputs for one tick. Immutable while the tick runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Share of a deficit covered by the battery (0–100).
    pub battery_priority: f64,
    /// Protected floor for load- and export-driven discharge (percent, 0–100).
    pub reserve: f64,
    /// Requested continuous export rate (kW).
    pub export_demand: f64,
    /// Grid power routed straight into the battery (kW). Values `<= 0` mean none.
    pub manual_grid_charge_kw: f64,
}

impl DispatchConfig {
    /// Manual grid charge actually requested this tick (negative treated as absent).
    pub fn effective_manual_charge_kw(&self) -> f64 {
        self.manual_grid_charge_kw.max(0.0)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            battery_priority: 50.0,
            reserve: 20.0,
            export_demand: 0.0,
            manual_grid_charge_kw: 0.0,
        }
    }
}

/// Generation and load for one tick (kW).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Solar generation (kW, >= 0).
    pub solar_gen: f64,
    /// Wind generation (kW, >= 0).
    pub wind_gen: f64,
    /// Site load (kW, >= 0).
    pub load: f64,
}

impl TickInput {
    pub fn new(solar_gen: f64, wind_gen: f64, load: f64) -> Self {
        Self {
            solar_gen,
            wind_gen,
            load,
        }
    }

    /// Total on-site generation.
    pub fn generation(&self) -> f64 {
        self.solar_gen + self.wind_gen
    }

    /// Generation minus load. Negative means deficit.
    pub fn balance(&self) -> f64 {
        self.generation() - self.load
    }

    /// Checks that every value is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("solar_gen", self.solar_gen),
            ("wind_gen", self.wind_gen),
            ("load", self.load),
        ] {
            if !value.is_finite() {
                return Err(format!("{name} must be finite, got {value}"));
            }
            if value < 0.0 {
                return Err(format!("{name} must be >= 0, got {value}"));
            }
        }
        Ok(())
    }
}

/// Which dispatch policy branch a tick takes.
///
/// Classification is done after manual grid charging has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchCase {
    /// Deficit with no battery-backed export. The battery shares the deficit
    /// if it is above reserve, otherwise the grid covers all of it.
    DeficitNoExport,
    /// Deficit while the battery (above reserve) also serves export demand.
    DeficitExportFromBattery,
    /// Surplus, no export demand, battery below full: all surplus charges.
    SurplusCharge,
    /// Surplus, no export demand, battery full: surplus is exported.
    SurplusBatteryFull,
    /// Surplus covers the whole export demand; the rest charges.
    SurplusExportCovered,
    /// Surplus plus battery headroom meet the export demand in full.
    SurplusExportHybrid,
    /// Export limited to surplus plus battery headroom; battery ends at reserve.
    SurplusExportBatteryLimited,
    /// Export demand present but the battery is at or below reserve:
    /// export stops and all surplus charges.
    SurplusExportAtReserve,
}

impl DispatchCase {
    /// All cases, in declaration order.
    pub const ALL: [DispatchCase; 8] = [
        DispatchCase::DeficitNoExport,
        DispatchCase::DeficitExportFromBattery,
        DispatchCase::SurplusCharge,
        DispatchCase::SurplusBatteryFull,
        DispatchCase::SurplusExportCovered,
        DispatchCase::SurplusExportHybrid,
        DispatchCase::SurplusExportBatteryLimited,
        DispatchCase::SurplusExportAtReserve,
    ];

    /// Short stable label used in telemetry.
    pub fn label(self) -> &'static str {
        match self {
            DispatchCase::DeficitNoExport => "deficit_no_export",
            DispatchCase::DeficitExportFromBattery => "deficit_export_from_battery",
            DispatchCase::SurplusCharge => "surplus_charge",
            DispatchCase::SurplusBatteryFull => "surplus_battery_full",
            DispatchCase::SurplusExportCovered => "surplus_export_covered",
            DispatchCase::SurplusExportHybrid => "surplus_export_hybrid",
            DispatchCase::SurplusExportBatteryLimited => "surplus_export_battery_limited",
            DispatchCase::SurplusExportAtReserve => "surplus_export_at_reserve",
        }
    }

    /// Returns `true` for the deficit branch.
    pub fn is_deficit(self) -> bool {
        matches!(
            self,
            DispatchCase::DeficitNoExport | DispatchCase::DeficitExportFromBattery
        )
    }
}

impl fmt::Display for DispatchCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DispatchResult {
    /// Branch taken.
    pub case: DispatchCase,
    /// Power drawn from the grid to cover load (kW).
    pub grid_import: f64,
    /// Power delivered to the grid (kW).
    pub grid_export: f64,
    /// `solar_gen + wind_gen` (kW).
    pub total_generation: f64,
    /// Grid power routed to the battery outside the load balance (kW).
    pub manual_grid_charge_kw: f64,
    /// Battery after this tick.
    pub battery: BatteryState,
}
