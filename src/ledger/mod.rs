//! Accounting ledger: prices each tick and keeps the durable running totals.

pub mod accounting;
pub mod store;

pub use accounting::{
    ExportProjection, LedgerSnapshot, LedgerState, TariffConfig, accrue, format_co2,
};
pub use store::{CounterStore, JsonFileStore, MemoryStore};
