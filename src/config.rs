//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dispatch::{BatteryState, DispatchConfig};
use crate::ledger::TariffConfig;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Run length, seed, and synthetic day length.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Initial battery state.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Operator policy knobs.
    #[serde(default)]
    pub dispatch: DispatchSettings,
    /// Prices and emission factor.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Synthetic solar profile.
    #[serde(default)]
    pub solar: SolarProfileConfig,
    /// Synthetic wind profile.
    #[serde(default)]
    pub wind: WindProfileConfig,
    /// Synthetic site load profile.
    #[serde(default)]
    pub load: LoadProfileConfig,
    /// Dashboard history buffers.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Durable ledger counters.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Run length and global parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of ticks to run (must be > 0).
    pub ticks: usize,
    /// Master random seed for the synthetic profiles.
    pub seed: u64,
    /// Ticks per simulated day for the synthetic profiles (must be > 0).
    pub steps_per_day: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: 48,
            seed: 42,
            steps_per_day: 24,
        }
    }
}

/// Initial battery parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Initial state of charge (percent, 0–100).
    pub initial_soc: f64,
    /// Energy per percentage point (kWh, must be > 0).
    pub capacity_per_percent: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            initial_soc: 55.0,
            capacity_per_percent: 500.0,
        }
    }
}

/// Operator policy knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchSettings {
    /// Share of a deficit served by the battery (percent, 0–100).
    pub battery_priority: f64,
    /// Discharge floor (percent, 0–100).
    pub reserve: f64,
    /// Requested export rate (kW, >= 0).
    pub export_demand_kw: f64,
    /// Grid power routed into the battery every tick (kW). `<= 0` disables it.
    pub manual_grid_charge_kw: f64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        let d = DispatchConfig::default();
        Self {
            battery_priority: d.battery_priority,
            reserve: d.reserve,
            export_demand_kw: d.export_demand,
            manual_grid_charge_kw: d.manual_grid_charge_kw,
        }
    }
}

/// Synthetic solar profile: half-sine daylight bell with an AR(1) cloud multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarProfileConfig {
    /// Peak generation (kW).
    pub kw_peak: f64,
    /// Sunrise step within the day (inclusive).
    pub sunrise_idx: usize,
    /// Sunset step within the day (exclusive).
    pub sunset_idx: usize,
    /// AR(1) correlation coefficient (0.0–1.0).
    pub alpha: f64,
    /// AR(1) innovation noise standard deviation.
    pub cloud_noise_std: f64,
}

impl Default for SolarProfileConfig {
    fn default() -> Self {
        Self {
            kw_peak: 300.0,
            sunrise_idx: 6,
            sunset_idx: 18,
            alpha: 0.9,
            cloud_noise_std: 0.2,
        }
    }
}

/// Synthetic wind profile: AR(1) process around a mean output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindProfileConfig {
    /// Long-run mean output (kW).
    pub mean_kw: f64,
    /// Turbine rating; output is clamped to `[0, max_kw]`.
    pub max_kw: f64,
    /// AR(1) correlation coefficient (0.0–1.0).
    pub alpha: f64,
    /// Innovation noise standard deviation (kW).
    pub noise_std: f64,
}

impl Default for WindProfileConfig {
    fn default() -> Self {
        Self {
            mean_kw: 60.0,
            max_kw: 150.0,
            alpha: 0.8,
            noise_std: 15.0,
        }
    }
}

/// Synthetic site load: daily sinusoid plus Gaussian noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadProfileConfig {
    /// Baseline consumption (kW).
    pub base_kw: f64,
    /// Sinusoidal amplitude (kW).
    pub amp_kw: f64,
    /// Phase offset (radians).
    pub phase_rad: f64,
    /// Gaussian noise standard deviation (kW).
    pub noise_std: f64,
}

impl Default for LoadProfileConfig {
    fn default() -> Self {
        Self {
            base_kw: 220.0,
            amp_kw: 60.0,
            phase_rad: 1.2,
            noise_std: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Samples kept per series (must be > 0).
    pub capacity: usize,
    /// Tick records kept for telemetry (must be > 0). Older records are evicted;
    /// the run summary still covers every tick.
    pub telemetry_retention: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: crate::history::DEFAULT_CAPACITY,
            telemetry_retention: crate::sim::DEFAULT_TELEMETRY_RETENTION,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// JSON file holding the cumulative counters. `None` keeps them in memory.
    pub store_path: Option<PathBuf>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"dispatch.reserve"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ScenarioConfig {
    /// Returns the baseline scenario: default policy, no export contract.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the export-contract preset: a continuous export commitment
    /// served from surplus and battery, with a higher reserve.
    pub fn export_contract() -> Self {
        Self {
            battery: BatteryConfig {
                initial_soc: 80.0,
                ..BatteryConfig::default()
            },
            dispatch: DispatchSettings {
                battery_priority: 70.0,
                reserve: 30.0,
                export_demand_kw: 120.0,
                ..DispatchSettings::default()
            },
            solar: SolarProfileConfig {
                kw_peak: 450.0,
                ..SolarProfileConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the grid-charging preset: a low battery topped up from the
    /// grid every tick while the site runs a deficit.
    pub fn grid_charging() -> Self {
        Self {
            battery: BatteryConfig {
                initial_soc: 25.0,
                ..BatteryConfig::default()
            },
            dispatch: DispatchSettings {
                battery_priority: 40.0,
                manual_grid_charge_kw: 100.0,
                ..DispatchSettings::default()
            },
            solar: SolarProfileConfig {
                kw_peak: 150.0,
                ..SolarProfileConfig::default()
            },
            load: LoadProfileConfig {
                base_kw: 280.0,
                ..LoadProfileConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "export_contract", "grid_charging"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "export_contract" => Ok(Self::export_contract()),
            "grid_charging" => Ok(Self::grid_charging()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Policy inputs handed to the dispatch engine.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            battery_priority: self.dispatch.battery_priority,
            reserve: self.dispatch.reserve,
            export_demand: self.dispatch.export_demand_kw,
            manual_grid_charge_kw: self.dispatch.manual_grid_charge_kw,
        }
    }

    /// Initial battery. Call only on a validated config.
    pub fn initial_battery(&self) -> BatteryState {
        BatteryState::new(self.battery.initial_soc, self.battery.capacity_per_percent)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.ticks == 0 {
            errors.push(ConfigError::new("simulation.ticks", "must be > 0"));
        }
        if s.steps_per_day == 0 {
            errors.push(ConfigError::new("simulation.steps_per_day", "must be > 0"));
        }

        let bat = &self.battery;
        check_percent(&mut errors, "battery.initial_soc", bat.initial_soc);
        check_positive(&mut errors, "battery.capacity_per_percent", bat.capacity_per_percent);

        let d = &self.dispatch;
        check_percent(&mut errors, "dispatch.battery_priority", d.battery_priority);
        check_percent(&mut errors, "dispatch.reserve", d.reserve);
        check_non_negative(&mut errors, "dispatch.export_demand_kw", d.export_demand_kw);
        if !d.manual_grid_charge_kw.is_finite() {
            errors.push(ConfigError::new(
                "dispatch.manual_grid_charge_kw",
                "must be finite",
            ));
        }

        let t = &self.tariff;
        check_non_negative(&mut errors, "tariff.grid_rate", t.grid_rate);
        check_non_negative(&mut errors, "tariff.import_price", t.import_price);
        check_non_negative(&mut errors, "tariff.savings_rate", t.savings_rate);
        check_non_negative(&mut errors, "tariff.co2_kg_per_kwh", t.co2_kg_per_kwh);
        check_non_negative(&mut errors, "tariff.sun_hours", t.sun_hours);

        let sol = &self.solar;
        check_non_negative(&mut errors, "solar.kw_peak", sol.kw_peak);
        if sol.sunrise_idx >= sol.sunset_idx {
            errors.push(ConfigError::new("solar.sunrise_idx", "must be < solar.sunset_idx"));
        }
        if s.steps_per_day > 0 && sol.sunset_idx > s.steps_per_day {
            errors.push(ConfigError::new(
                "solar.sunset_idx",
                "must be <= simulation.steps_per_day",
            ));
        }
        check_unit(&mut errors, "solar.alpha", sol.alpha);
        check_non_negative(&mut errors, "solar.cloud_noise_std", sol.cloud_noise_std);

        let w = &self.wind;
        check_non_negative(&mut errors, "wind.mean_kw", w.mean_kw);
        check_non_negative(&mut errors, "wind.max_kw", w.max_kw);
        if w.max_kw < w.mean_kw {
            errors.push(ConfigError::new("wind.max_kw", "must be >= wind.mean_kw"));
        }
        check_unit(&mut errors, "wind.alpha", w.alpha);
        check_non_negative(&mut errors, "wind.noise_std", w.noise_std);

        let l = &self.load;
        check_non_negative(&mut errors, "load.base_kw", l.base_kw);
        check_non_negative(&mut errors, "load.amp_kw", l.amp_kw);
        check_non_negative(&mut errors, "load.noise_std", l.noise_std);

        if self.history.capacity == 0 {
            errors.push(ConfigError::new("history.capacity", "must be > 0"));
        }
        if self.history.telemetry_retention == 0 {
            errors.push(ConfigError::new("history.telemetry_retention", "must be > 0"));
        }

        errors
    }
}

fn check_percent(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(0.0..=100.0).contains(&value) {
        errors.push(ConfigError::new(field, format!("must be in [0, 100], got {value}")));
    }
}

fn check_unit(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ConfigError::new(field, format!("must be in [0.0, 1.0], got {value}")));
    }
}

fn check_non_negative(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(ConfigError::new(field, format!("must be >= 0, got {value}")));
    }
}

fn check_positive(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(ConfigError::new(field, format!("must be finite and > 0, got {value}")));
    }
}
