//! Replay of recorded readings from CSV.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::TickSource;
use crate::dispatch::TickInput;
use crate::error::{EmsError, Result};

#[derive(Debug, Deserialize)]
struct CsvRow {
    solar_kw: f64,
    wind_kw: f64,
    load_kw: f64,
}

/// Readings loaded from a CSV file with header `solar_kw,wind_kw,load_kw`.
///
/// Every row is validated on load, so a bad file is rejected before any tick runs.
#[derive(Debug, Clone)]
pub struct CsvSource {
    rows: Vec<TickInput>,
}

impl CsvSource {
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or any row is malformed or invalid.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// # Errors
    ///
    /// Returns an error if any row is malformed or invalid.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut rows = Vec::new();
        for (i, record) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = record?;
            let input = TickInput::new(row.solar_kw, row.wind_kw, row.load_kw);
            input
                .validate()
                .map_err(|e| EmsError::InvalidInput(format!("row {}: {e}", i + 1)))?;
            rows.push(input);
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TickSource for CsvSource {
    fn next_tick(&mut self, index: usize) -> Option<TickInput> {
        self.rows.get(index).copied()
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
