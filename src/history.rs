//! Fixed-capacity sample buffers backing the dashboard trend charts.

use std::collections::VecDeque;

use serde::Serialize;

use crate::dispatch::{DispatchResult, TickInput};

/// Samples kept per series unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 30;

/// FIFO of the most recent samples of one series.
///
/// Appending at capacity drops the oldest sample first, so the buffer never
/// holds more than `capacity` values.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl HistoryBuffer {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be > 0");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, value: f64) {
        self.samples.push_back(value);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Samples, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// The four tracked series, appended together once per tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteHistory {
    pub solar: HistoryBuffer,
    pub wind: HistoryBuffer,
    /// Grid import (kW).
    pub grid: HistoryBuffer,
    /// Battery state of charge (percent).
    pub battery: HistoryBuffer,
}

impl SiteHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            solar: HistoryBuffer::new(capacity),
            wind: HistoryBuffer::new(capacity),
            grid: HistoryBuffer::new(capacity),
            battery: HistoryBuffer::new(capacity),
        }
    }

    /// Appends one sample per series for a completed tick.
    pub fn record(&mut self, input: &TickInput, result: &DispatchResult) {
        self.solar.append(input.solar_gen);
        self.wind.append(input.wind_gen);
        self.grid.append(result.grid_import);
        self.battery.append(result.battery.state_of_charge);
    }

    pub fn len(&self) -> usize {
        self.solar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solar.is_empty()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            capacity: self.solar.capacity(),
            solar: self.solar.values(),
            wind: self.wind.values(),
            grid: self.grid.values(),
            battery: self.battery.values(),
        }
    }
}

/// Serializable copy of [`SiteHistory`], oldest sample first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySnapshot {
    pub capacity: usize,
    pub solar: Vec<f64>,
    pub wind: Vec<f64>,
    pub grid: Vec<f64>,
    pub battery: Vec<f64>,
}
