//! Per-tick allocation of load, export demand, battery, and grid.

use tracing::debug;

use super::types::{BatteryState, DispatchCase, DispatchConfig, DispatchResult, TickInput};

/// Picks the policy branch for a tick.
///
/// Must be called with the battery state *after* manual grid charging, which
/// is what [`dispatch`] does. Pure: neither argument is modified.
pub fn classify(config: &DispatchConfig, input: &TickInput, battery: &BatteryState) -> DispatchCase {
    let balance = input.balance();
    let above_reserve = battery.state_of_charge > config.reserve;

    if balance < 0.0 {
        return if config.export_demand > 0.0 && above_reserve {
            DispatchCase::DeficitExportFromBattery
        } else {
            DispatchCase::DeficitNoExport
        };
    }

    let surplus = balance;
    if config.export_demand > 0.0 {
        if !above_reserve {
            DispatchCase::SurplusExportAtReserve
        } else if surplus >= config.export_demand {
            DispatchCase::SurplusExportCovered
        } else if config.export_demand - surplus <= battery.headroom_above_kw(config.reserve) {
            DispatchCase::SurplusExportHybrid
        } else {
            DispatchCase::SurplusExportBatteryLimited
        }
    } else if battery.can_charge() {
        DispatchCase::SurplusCharge
    } else {
        DispatchCase::SurplusBatteryFull
    }
}

/// Runs one tick of the dispatch policy and updates `battery` in place.
///
/// Order of operations:
/// 1. Manual grid charge goes straight into the battery (bypasses the balance).
/// 2. The tick is classified into a [`DispatchCase`].
/// 3. The case arm settles battery drain/charge, grid import, and grid export.
///
/// In the surplus branch export demand is served before charging. In the
/// deficit branch the load share and any export-from-battery are drained as
/// one combined amount, floored at the reserve; the grid import split is then
/// decided on the drained state of charge.
///
/// Out-of-contract inputs (negative reserve or priority) are not checked here.
pub fn dispatch(
    config: &DispatchConfig,
    input: &TickInput,
    battery: &mut BatteryState,
) -> DispatchResult {
    let manual_kw = config.effective_manual_charge_kw();
    if manual_kw > 0.0 && battery.can_charge() {
        let before = battery.state_of_charge;
        battery.charge_kw(manual_kw);
        debug!(
            "grid->battery: {manual_kw:.2} kW, soc {before:.2}% -> {:.2}%",
            battery.state_of_charge
        );
    }

    let generation = input.generation();
    let balance = generation - input.load;
    let reserve = config.reserve;
    let case = classify(config, input, battery);
    let soc_before = battery.state_of_charge;

    let (grid_import, grid_export) = match case {
        DispatchCase::DeficitNoExport | DispatchCase::DeficitExportFromBattery => {
            let deficit = -balance;
            let export_from_battery = if case == DispatchCase::DeficitExportFromBattery {
                config
                    .export_demand
                    .min(battery.headroom_above_kw(reserve))
            } else {
                0.0
            };

            if battery.state_of_charge > reserve {
                let load_drain_kw = deficit * config.battery_priority / 100.0;
                battery.drain_kw(load_drain_kw + export_from_battery, reserve);
            }

            // Re-read after the drain: a battery left on the floor imports the full deficit.
            let grid_import = if battery.state_of_charge > reserve {
                deficit * (100.0 - config.battery_priority) / 100.0
            } else {
                deficit
            };
            (grid_import, export_from_battery)
        }
        DispatchCase::SurplusCharge => {
            battery.charge_kw(balance);
            (0.0, 0.0)
        }
        DispatchCase::SurplusBatteryFull => (0.0, balance),
        DispatchCase::SurplusExportAtReserve => {
            if battery.can_charge() {
                battery.charge_kw(balance);
            }
            (0.0, 0.0)
        }
        DispatchCase::SurplusExportCovered => {
            let remaining = balance - config.export_demand;
            if remaining > 0.0 && battery.can_charge() {
                battery.charge_kw(remaining);
            }
            (0.0, config.export_demand)
        }
        DispatchCase::SurplusExportHybrid => {
            let shortfall = config.export_demand - balance;
            battery.drain_kw(shortfall, reserve);
            (0.0, config.export_demand)
        }
        DispatchCase::SurplusExportBatteryLimited => {
            let export = balance + battery.headroom_above_kw(reserve);
            battery.state_of_charge = reserve;
            (0.0, export)
        }
    };

    debug!(
        %case,
        balance_kw = balance,
        grid_import_kw = grid_import,
        grid_export_kw = grid_export,
        "soc {soc_before:.2}% -> {:.2}%",
        battery.state_of_charge
    );

    DispatchResult {
        case,
        grid_import,
        grid_export,
        total_generation: generation,
        manual_grid_charge_kw: manual_kw,
        battery: *battery,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn battery(soc: f64) -> BatteryState {
        BatteryState::new(soc, 500.0)
    }

    fn config(priority: f64, reserve: f64, export_demand: f64) -> DispatchConfig {
        DispatchConfig {
            battery_priority: priority,
            reserve,
            export_demand,
            manual_grid_charge_kw: 0.0,
        }
    }

    #[test]
    fn deficit_shares_load_between_battery_and_grid() {
        // Scenario A: deficit 50, priority 50 -> 25 from battery, 25 from grid.
        let mut b = battery(55.0);
        let r = dispatch(
            &config(50.0, 20.0, 0.0),
            &TickInput::new(100.0, 50.0, 200.0),
            &mut b,
        );
        assert_eq!(r.case, DispatchCase::DeficitNoExport);
        assert_eq!(r.grid_import, 25.0);
        assert_eq!(r.grid_export, 0.0);
        assert!((b.state_of_charge - 54.95).abs() < EPS);
        assert_eq!(r.total_generation, 150.0);
    }

    #[test]
    fn deficit_at_reserve_imports_everything() {
        // Scenario B
        let mut b = battery(20.0);
        let r = dispatch(
            &config(50.0, 20.0, 0.0),
            &TickInput::new(100.0, 50.0, 200.0),
            &mut b,
        );
        assert_eq!(r.grid_import, 50.0);
        assert_eq!(b.state_of_charge, 20.0);
    }

    #[test]
    fn deficit_below_reserve_is_not_drained() {
        let mut b = battery(10.0);
        let r = dispatch(
            &config(80.0, 20.0, 30.0),
            &TickInput::new(0.0, 0.0, 100.0),
            &mut b,
        );
        assert_eq!(r.case, DispatchCase::DeficitNoExport);
        assert_eq!(r.grid_import, 100.0);
        assert_eq!(r.grid_export, 0.0);
        assert_eq!(b.state_of_charge, 10.0);
    }

    #[test]
    fn deficit_with_export_drains_combined_amount() {
        // deficit 100, priority 50 -> 50 for load + 200 export = 250 kW = 0.5%
        let mut b = battery(60.0);
        let r = dispatch(
            &config(50.0, 20.0, 200.0),
            &TickInput::new(50.0, 50.0, 200.0),
            &mut b,
        );
        assert_eq!(r.case, DispatchCase::DeficitExportFromBattery);
        assert_eq!(r.grid_export, 200.0);
        assert_eq!(r.grid_import, 50.0);
        assert!((b.state_of_charge - 59.5).abs() < EPS);
    }

    #[test]
    fn deficit_export_capped_by_headroom() {
        // 0.1% above reserve = 50 kW of headroom
        let mut b = battery(20.1);
        let r = dispatch(
            &config(0.0, 20.0, 200.0),
            &TickInput::new(0.0, 0.0, 10.0),
            &mut b,
        );
        assert!((r.grid_export - 50.0).abs() < 1e-6);
        assert_eq!(r.grid_import, 10.0);
        assert_eq!(b.state_of_charge, 20.0);
    }

    #[test]
    fn deficit_drain_landing_on_reserve_imports_full_deficit() {
        // 50 kW drain wants 0.1% but only 0.05% is above the floor.
        let mut b = battery(20.05);
        let r = dispatch(
            &config(50.0, 20.0, 0.0),
            &TickInput::new(0.0, 0.0, 100.0),
            &mut b,
        );
        assert_eq!(b.state_of_charge, 20.0);
        assert_eq!(r.grid_import, 100.0);
    }

    #[test]
    fn deficit_drain_staying_above_reserve_keeps_priority_split() {
        let mut b = battery(20.2);
        let r = dispatch(
            &config(50.0, 20.0, 0.0),
            &TickInput::new(0.0, 0.0, 100.0),
            &mut b,
        );
        assert!((b.state_of_charge - 20.1).abs() < EPS);
        assert_eq!(r.grid_import, 50.0);
    }

    #[test]
    fn surplus_covers_export_then_charges() {
        // Scenario C
        let mut b = battery(90.0);
        let r = dispatch(
            &config(50.0, 20.0, 50.0),
            &TickInput::new(300.0, 100.0, 200.0),
            &mut b,
        );
        assert_eq!(r.case, DispatchCase::SurplusExportCovered);
        assert_eq!(r.grid_export, 50.0);
        assert_eq!(r.grid_import, 0.0);
        assert!((b.state_of_charge - 90.3).abs() < EPS);
    }

    #[test]
    fn full_battery_exports_surplus() {
        // Scenario D
        let mut b = battery(100.0);
        let r = dispatch(
            &config(50.0, 20.0, 0.0),
            &TickInput::new(80.0, 0.0, 0.0),
            &mut b,
        );
        assert_eq!(r.case, DispatchCase::SurplusBatteryFull);
        assert_eq!(r.grid_export, 80.0);
        assert_eq!(b.state_of_charge, 100.0);
    }

    #[test]
    fn surplus_without_export_charges_battery() {
        let mut b = battery(40.0);
        let r = dispatch(
            &config(50.0, 20.0, 0.0),
            &TickInput::new(150.0, 0.0, 50.0),
            &mut b,
        );
        assert_eq!(r.case, DispatchCase::SurplusCharge);
        assert_eq!(r.grid_export, 0.0);
        assert!((b.state_of_charge - 40.2).abs() < EPS);
    }

    #[test]
    fn hybrid_export_drains_shortfall() {
        // surplus 20, demand 100 -> 80 kW from battery = 0.16%
        let mut b = battery(50.0);
        let r = dispatch(
            &config(50.0, 20.0, 100.0),
            &TickInput::new(70.0, 0.0, 50.0),
            &mut b,
        );
        assert_eq!(r.case, DispatchCase::SurplusExportHybrid);
        assert_eq!(r.grid_export, 100.0);
        assert!((b.state_of_charge - 49.84).abs() < EPS);
    }

    #[test]
    fn battery_limited_export_ends_at_reserve() {
        // headroom 0.1% = 50 kW, surplus 10 -> export 60
        let mut b = battery(20.1);
        let r = dispatch(
            &config(50.0, 20.0, 500.0),
            &TickInput::new(60.0, 0.0, 50.0),
            &mut b,
        );
        assert_eq!(r.case, DispatchCase::SurplusExportBatteryLimited);
        assert!((r.grid_export - 60.0).abs() < 1e-6);
        assert_eq!(b.state_of_charge, 20.0);
    }

    #[test]
    fn export_stops_at_reserve() {
        let mut b = battery(20.0);
        let r = dispatch(
            &config(50.0, 20.0, 100.0),
            &TickInput::new(300.0, 0.0, 50.0),
            &mut b,
        );
        assert_eq!(r.case, DispatchCase::SurplusExportAtReserve);
        assert_eq!(r.grid_export, 0.0);
        assert!((b.state_of_charge - 20.5).abs() < EPS);
    }

    #[test]
    fn manual_charge_applies_before_balance() {
        let mut b = battery(20.0);
        let cfg = DispatchConfig {
            manual_grid_charge_kw: 250.0,
            ..config(50.0, 20.0, 0.0)
        };
        // Manual charge lifts the battery to 20.5%, so the deficit is shared.
        let r = dispatch(&cfg, &TickInput::new(0.0, 0.0, 100.0), &mut b);
        assert_eq!(r.manual_grid_charge_kw, 250.0);
        assert_eq!(r.grid_import, 50.0);
        assert!((b.state_of_charge - 20.4).abs() < EPS);
    }

    #[test]
    fn manual_charge_saturates_and_is_still_reported() {
        let mut b = battery(100.0);
        let cfg = DispatchConfig {
            manual_grid_charge_kw: 100.0,
            ..config(50.0, 20.0, 0.0)
        };
        let r = dispatch(&cfg, &TickInput::default(), &mut b);
        assert_eq!(b.state_of_charge, 100.0);
        assert_eq!(r.manual_grid_charge_kw, 100.0);
    }

    #[test]
    fn negative_manual_charge_is_ignored() {
        let mut b = battery(50.0);
        let cfg = DispatchConfig {
            manual_grid_charge_kw: -100.0,
            ..config(50.0, 20.0, 0.0)
        };
        let r = dispatch(&cfg, &TickInput::default(), &mut b);
        assert_eq!(b.state_of_charge, 50.0);
        assert_eq!(r.manual_grid_charge_kw, 0.0);
    }

    #[test]
    fn zero_tick_is_idempotent() {
        let mut b = battery(63.0);
        let r = dispatch(&config(50.0, 20.0, 0.0), &TickInput::default(), &mut b);
        assert_eq!(b.state_of_charge, 63.0);
        assert_eq!(r.grid_import, 0.0);
        assert_eq!(r.grid_export, 0.0);
    }

    #[test]
    fn classify_does_not_mutate() {
        let b = battery(30.0);
        let cfg = config(50.0, 20.0, 100.0);
        let input = TickInput::new(10.0, 0.0, 0.0);
        assert_eq!(classify(&cfg, &input, &b), DispatchCase::SurplusExportHybrid);
        assert_eq!(b.state_of_charge, 30.0);
    }

    #[test]
    fn classify_boundary_surplus_equals_demand() {
        let cfg = config(50.0, 20.0, 100.0);
        let input = TickInput::new(100.0, 0.0, 0.0);
        assert_eq!(
            classify(&cfg, &input, &battery(50.0)),
            DispatchCase::SurplusExportCovered
        );
    }

    #[test]
    fn classify_zero_balance_is_surplus() {
        let cfg = config(50.0, 20.0, 0.0);
        let input = TickInput::new(100.0, 0.0, 100.0);
        assert_eq!(
            classify(&cfg, &input, &battery(50.0)),
            DispatchCase::SurplusCharge
        );
        assert_eq!(
            classify(&cfg, &input, &battery(100.0)),
            DispatchCase::SurplusBatteryFull
        );
    }
}
