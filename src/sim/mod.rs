/// Site loop wiring dispatch, ledger, history, and store.
pub mod engine;
pub mod kpi;
pub mod types;

pub use engine::{DEFAULT_TELEMETRY_RETENTION, Site};
pub use kpi::KpiReport;
pub use types::TickRecord;
