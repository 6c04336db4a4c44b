//! Dispatch engine: decides battery, import, and export flows for one tick.

pub mod engine;
pub mod types;

pub use engine::{classify, dispatch};
pub use types::{
    BatteryState, DEFAULT_CAPACITY_PER_PERCENT, DispatchCase, DispatchConfig, DispatchResult,
    SOC_FULL, TickInput,
};
