//! Run summary accumulated from tick records.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::types::TickRecord;
use crate::dispatch::DispatchCase;

/// Aggregate indicators over every tick a site has run.
///
/// Kept as running totals so a long-lived site reports the whole run even
/// after old tick records have been evicted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiReport {
    pub ticks: usize,
    /// Sum of per-tick on-site generation (kW).
    pub generation_total_kw: f64,
    /// Sum of per-tick load (kW).
    pub load_total_kw: f64,
    pub peak_import_kw: f64,
    pub peak_export_kw: f64,
    pub min_soc: f64,
    pub max_soc: f64,
    pub final_soc: f64,
    /// Ticks that drew any power from the grid for load.
    pub import_ticks: usize,
    /// Ticks that delivered any power to the grid.
    pub export_ticks: usize,
    /// How often each dispatch branch was taken.
    pub case_counts: BTreeMap<DispatchCase, usize>,
    /// Net income over the run (sum of per-tick export income minus import cost).
    pub net_income_delta: f64,
}

impl KpiReport {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TickRecord>) -> Self {
        let mut report = Self::default();
        for r in records {
            report.record(r);
        }
        report
    }

    /// Folds one tick into the running totals.
    pub fn record(&mut self, r: &TickRecord) {
        let d = &r.dispatch;
        let soc = d.battery.state_of_charge;
        if self.ticks == 0 {
            self.min_soc = soc;
            self.max_soc = soc;
        } else {
            self.min_soc = self.min_soc.min(soc);
            self.max_soc = self.max_soc.max(soc);
        }
        self.ticks += 1;
        self.final_soc = soc;
        self.generation_total_kw += d.total_generation;
        self.load_total_kw += r.input.load;
        self.peak_import_kw = self.peak_import_kw.max(d.grid_import);
        self.peak_export_kw = self.peak_export_kw.max(d.grid_export);
        if d.grid_import > 0.0 {
            self.import_ticks += 1;
        }
        if d.grid_export > 0.0 {
            self.export_ticks += 1;
        }
        *self.case_counts.entry(d.case).or_insert(0) += 1;
        self.net_income_delta += r.ledger.export_income_per_hour - r.ledger.import_cost_per_hour;
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Summary ---")?;
        writeln!(f, "Ticks:                 {}", self.ticks)?;
        writeln!(f, "Generation (sum):      {:.2} kW", self.generation_total_kw)?;
        writeln!(f, "Load (sum):            {:.2} kW", self.load_total_kw)?;
        writeln!(
            f,
            "Peak import:           {:.2} kW ({} ticks importing)",
            self.peak_import_kw, self.import_ticks
        )?;
        writeln!(
            f,
            "Peak export:           {:.2} kW ({} ticks exporting)",
            self.peak_export_kw, self.export_ticks
        )?;
        writeln!(
            f,
            "Battery SoC:           min {:.2}%  max {:.2}%  final {:.2}%",
            self.min_soc, self.max_soc, self.final_soc
        )?;
        writeln!(f, "Net income this run:   {:.2}", self.net_income_delta)?;
        write!(f, "Dispatch cases:")?;
        for (case, count) in &self.case_counts {
            write!(f, "\n  {:<32}{count}", case.label())?;
        }
        Ok(())
    }
}
