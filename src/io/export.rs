//! CSV export for tick records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::sim::TickRecord;

/// Column header for CSV telemetry export.
const HEADER: &str = "tick,solar_kw,wind_kw,load_kw,generation_kw,\
                       grid_import_kw,grid_export_kw,battery_soc,case,\
                       import_cost,export_income,cost_savings_total,\
                       co2_reduced_total,net_income";

/// Exports tick records to a CSV file at the given path.
///
/// Writes a header row followed by one row per tick. Produces deterministic
/// output for identical inputs.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_csv<'a>(
    records: impl IntoIterator<Item = &'a TickRecord>,
    path: &Path,
) -> Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes tick records as CSV to any writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_csv<'a>(
    records: impl IntoIterator<Item = &'a TickRecord>,
    writer: impl Write,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        let d = &r.dispatch;
        let l = &r.ledger;
        wtr.write_record(&[
            r.tick.to_string(),
            format!("{:.4}", r.input.solar_gen),
            format!("{:.4}", r.input.wind_gen),
            format!("{:.4}", r.input.load),
            format!("{:.4}", d.total_generation),
            format!("{:.4}", d.grid_import),
            format!("{:.4}", d.grid_export),
            format!("{:.4}", d.battery.state_of_charge),
            d.case.label().to_string(),
            format!("{:.4}", l.import_cost_per_hour),
            format!("{:.4}", l.export_income_per_hour),
            format!("{:.4}", l.totals.cost_savings_total),
            format!("{:.4}", l.totals.co2_reduced_total),
            format!("{:.4}", l.total_net_income),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
