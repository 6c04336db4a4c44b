//! Site loop: dispatch, accounting, history, and persistence for each tick.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use super::kpi::KpiReport;
use super::types::TickRecord;
use crate::config::ScenarioConfig;
use crate::dispatch::{BatteryState, DispatchConfig, TickInput, dispatch};
use crate::error::{EmsError, Result};
use crate::history::SiteHistory;
use crate::inputs::TickSource;
use crate::ledger::{CounterStore, LedgerSnapshot, LedgerState, TariffConfig, accrue};

/// Tick records kept by default before the oldest are evicted.
pub const DEFAULT_TELEMETRY_RETENTION: usize = 10_000;

/// One site: battery, ledger, history, and the store that keeps the ledger durable.
///
/// Generic over `S: CounterStore` for static dispatch; use
/// `Box<dyn CounterStore + Send>` when the store is chosen at runtime.
/// [`Site::tick`] takes `&mut self`, so ticks are serialized by construction.
pub struct Site<S: CounterStore> {
    dispatch: DispatchConfig,
    tariff: TariffConfig,
    battery: BatteryState,
    ledger: LedgerState,
    last_snapshot: Option<LedgerSnapshot>,
    history: SiteHistory,
    store: S,
    next_tick: usize,
    records: VecDeque<TickRecord>,
    retention: usize,
    kpi: KpiReport,
}

impl<S: CounterStore> Site<S> {
    /// Creates a site and restores the ledger counters from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn new(
        dispatch: DispatchConfig,
        tariff: TariffConfig,
        battery: BatteryState,
        history: SiteHistory,
        store: S,
    ) -> Result<Self> {
        let ledger = store.load()?;
        info!(
            soc = battery.state_of_charge,
            net_income = ledger.total_net_income(),
            "site initialised"
        );
        Ok(Self {
            dispatch,
            tariff,
            battery,
            ledger,
            last_snapshot: None,
            history,
            store,
            next_tick: 0,
            records: VecDeque::new(),
            retention: DEFAULT_TELEMETRY_RETENTION,
            kpi: KpiReport::default(),
        })
    }

    /// Caps the number of tick records kept for telemetry.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is 0.
    pub fn with_telemetry_retention(mut self, limit: usize) -> Self {
        assert!(limit > 0, "telemetry retention must be > 0");
        self.retention = limit;
        while self.records.len() > limit {
            self.records.pop_front();
        }
        self
    }

    /// Builds a site from a validated scenario.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Config`] if the scenario is invalid, or a store error.
    pub fn from_config(cfg: &ScenarioConfig, store: S) -> Result<Self> {
        let errors = cfg.validate();
        if !errors.is_empty() {
            return Err(EmsError::Config(errors));
        }
        Ok(Self::new(
            cfg.dispatch_config(),
            cfg.tariff,
            cfg.initial_battery(),
            SiteHistory::new(cfg.history.capacity),
            store,
        )?
        .with_telemetry_retention(cfg.history.telemetry_retention))
    }

    /// Runs one tick.
    ///
    /// The input is validated before dispatch; a rejected tick changes nothing.
    /// Once dispatch has run, the ledger is saved to the store.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::InvalidInput`] for negative or non-finite readings,
    /// or a store error if saving fails.
    pub fn tick(&mut self, input: TickInput) -> Result<TickRecord> {
        if let Err(msg) = input.validate() {
            warn!(tick = self.next_tick, "tick rejected: {msg}");
            return Err(EmsError::InvalidInput(msg));
        }

        let result = dispatch(&self.dispatch, &input, &mut self.battery);
        let snapshot = accrue(&result, &self.tariff, &mut self.ledger);
        self.history.record(&input, &result);
        self.last_snapshot = Some(snapshot);

        let record = TickRecord {
            tick: self.next_tick,
            input,
            dispatch: result,
            ledger: snapshot,
        };
        self.next_tick += 1;
        self.kpi.record(&record);
        self.records.push_back(record);
        while self.records.len() > self.retention {
            self.records.pop_front();
        }

        self.store.save(&self.ledger)?;
        debug!(tick = record.tick, case = %result.case, "tick complete");
        Ok(record)
    }

    /// Drains `source` from its first reading, ticking once per reading.
    ///
    /// Returns the number of ticks run. Record tick numbers continue from
    /// earlier ticks on this site.
    ///
    /// # Errors
    ///
    /// Stops at the first failing tick and returns its error.
    pub fn run(&mut self, source: &mut impl TickSource) -> Result<usize> {
        info!(source = source.name(), first_tick = self.next_tick, "run started");
        let mut index = 0;
        while let Some(input) = source.next_tick(index) {
            self.tick(input)?;
            index += 1;
        }
        info!(
            ticks = index,
            net_income = self.ledger.total_net_income(),
            "run finished"
        );
        Ok(index)
    }

    pub fn battery(&self) -> &BatteryState {
        &self.battery
    }

    pub fn ledger(&self) -> &LedgerState {
        &self.ledger
    }

    /// Latest ledger view; stored totals with zero per-tick amounts before the first tick.
    pub fn ledger_snapshot(&self) -> LedgerSnapshot {
        self.last_snapshot
            .unwrap_or_else(|| LedgerSnapshot::from_totals(self.ledger))
    }

    pub fn history(&self) -> &SiteHistory {
        &self.history
    }

    /// Retained tick records, oldest first.
    pub fn records(&self) -> &VecDeque<TickRecord> {
        &self.records
    }

    pub fn latest(&self) -> Option<&TickRecord> {
        self.records.back()
    }

    /// Summary over every tick this site has run, including evicted records.
    pub fn kpi(&self) -> &KpiReport {
        &self.kpi
    }

    pub fn dispatch_config(&self) -> &DispatchConfig {
        &self.dispatch
    }

    pub fn tariff(&self) -> &TariffConfig {
        &self.tariff
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
