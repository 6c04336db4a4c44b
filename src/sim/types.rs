//! Per-tick record produced by the site loop.

use std::fmt;

use serde::Serialize;

use crate::dispatch::{DispatchResult, TickInput};
use crate::ledger::LedgerSnapshot;

/// Complete record of one tick: readings, dispatch outcome, and ledger view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickRecord {
    /// Tick index since the site started (not persisted across restarts).
    pub tick: usize,
    pub input: TickInput,
    pub dispatch: DispatchResult,
    pub ledger: LedgerSnapshot,
}

impl TickRecord {
    pub fn state_of_charge(&self) -> f64 {
        self.dispatch.battery.state_of_charge
    }
}

impl fmt::Display for TickRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.dispatch;
        write!(
            f,
            "t={:>3} | solar={:>7.2}  wind={:>7.2}  load={:>7.2} kW | \
             import={:>7.2}  export={:>7.2} kW | SoC={:>6.2}% | {:<30} | net={:.2}",
            self.tick,
            self.input.solar_gen,
            self.input.wind_gen,
            self.input.load,
            d.grid_import,
            d.grid_export,
            d.battery.state_of_charge,
            d.case,
            self.ledger.total_net_income,
        )
    }
}
