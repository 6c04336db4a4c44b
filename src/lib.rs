//! Site energy management: per-tick dispatch of solar, wind, battery, and grid
//! with cumulative cost, income, and emissions accounting.

#[cfg(feature = "api")]
pub mod api;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod inputs;
pub mod io;
pub mod ledger;
/// Site loop, tick records, and run summary.
pub mod sim;
