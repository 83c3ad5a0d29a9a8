//! Scripted runtime that records every outbound call.
//!
//! No matching and no events: positions, clock and resting orders are set by
//! the caller. Useful for driving a strategy through exact scenarios.

use std::collections::BTreeMap;

use crate::clock::{self, ClockError, SessionTime};
use crate::domain::{InstrumentInfo, LocalId, Side};
use crate::runtime::ExecutionRuntime;

/// One recorded submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub side: Side,
    pub instrument: String,
    pub price: f64,
    pub qty: f64,
    pub tag: String,
    pub ids: Vec<LocalId>,
}

#[derive(Debug, Clone)]
pub struct RecordingRuntime {
    date: u32,
    time: u32,
    millis: u32,
    next_id: u32,
    instruments: BTreeMap<String, InstrumentInfo>,
    positions: BTreeMap<String, f64>,
    resting: BTreeMap<LocalId, (String, Side, f64)>,
    subscriptions: Vec<String>,
    submissions: Vec<Submission>,
    cancels: Vec<LocalId>,
    cancel_all_calls: Vec<(String, bool)>,
    reject_all: bool,
}

impl Default for RecordingRuntime {
    fn default() -> Self {
        Self {
            date: 20211008,
            time: 900,
            millis: 0,
            next_id: 1,
            instruments: BTreeMap::new(),
            positions: BTreeMap::new(),
            resting: BTreeMap::new(),
            subscriptions: Vec::new(),
            submissions: Vec::new(),
            cancels: Vec::new(),
            cancel_all_calls: Vec::new(),
            reject_all: false,
        }
    }
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register instrument metadata.
    pub fn with_instrument(mut self, code: &str, tick_size: f64) -> Self {
        let info = InstrumentInfo {
            code: code.to_string(),
            tick_size,
        };
        self.instruments.insert(code.to_string(), info);
        self
    }

    /// Move the clock; returns the composed session time.
    pub fn set_clock(&mut self, date: u32, time: u32, millis: u32) -> Result<SessionTime, ClockError> {
        let now = clock::now(date, time, millis)?;
        self.date = date;
        self.time = time;
        self.millis = millis;
        Ok(now)
    }

    pub fn set_position(&mut self, instrument: &str, qty: f64) {
        self.positions.insert(instrument.to_string(), qty);
    }

    /// Submissions return no ids while set.
    pub fn set_reject_all(&mut self, reject: bool) {
        self.reject_all = reject;
    }

    /// An order resting at the venue that no strategy submitted.
    pub fn add_external_order(&mut self, instrument: &str, side: Side, qty: f64) -> LocalId {
        let id = LocalId(self.next_id);
        self.next_id += 1;
        self.resting.insert(id, (instrument.to_string(), side, qty));
        id
    }

    /// Drop a resting order as if it filled or its cancel confirmed.
    pub fn close_order(&mut self, id: LocalId) {
        self.resting.remove(&id);
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn cancels(&self) -> &[LocalId] {
        &self.cancels
    }

    pub fn cancel_all_calls(&self) -> &[(String, bool)] {
        &self.cancel_all_calls
    }

    fn record(&mut self, side: Side, instrument: &str, price: f64, qty: f64, tag: &str) -> Vec<LocalId> {
        let ids = if self.reject_all {
            Vec::new()
        } else {
            let id = LocalId(self.next_id);
            self.next_id += 1;
            self.resting.insert(id, (instrument.to_string(), side, qty));
            vec![id]
        };
        self.submissions.push(Submission {
            side,
            instrument: instrument.to_string(),
            price,
            qty,
            tag: tag.to_string(),
            ids: ids.clone(),
        });
        ids
    }
}

impl ExecutionRuntime for RecordingRuntime {
    fn subscribe(&mut self, instrument: &str) {
        self.subscriptions.push(instrument.to_string());
    }

    fn position(&self, instrument: &str) -> f64 {
        self.positions.get(instrument).copied().unwrap_or(0.0)
    }

    fn instrument_info(&self, instrument: &str) -> Option<InstrumentInfo> {
        self.instruments.get(instrument).cloned()
    }

    fn unmanaged_open_qty(&self, instrument: &str) -> f64 {
        self.resting
            .values()
            .filter(|(code, _, _)| code == instrument)
            .map(|(_, side, qty)| side.sign() * qty)
            .sum()
    }

    fn submit_buy(&mut self, instrument: &str, price: f64, qty: f64, tag: &str) -> Vec<LocalId> {
        self.record(Side::Buy, instrument, price, qty, tag)
    }

    fn submit_sell(&mut self, instrument: &str, price: f64, qty: f64, tag: &str) -> Vec<LocalId> {
        self.record(Side::Sell, instrument, price, qty, tag)
    }

    fn cancel(&mut self, id: LocalId) {
        self.cancels.push(id);
    }

    fn cancel_all(&mut self, instrument: &str, is_buy_side: bool) -> Vec<LocalId> {
        self.cancel_all_calls.push((instrument.to_string(), is_buy_side));
        let side = if is_buy_side { Side::Buy } else { Side::Sell };
        self.resting
            .iter()
            .filter(|(_, (code, s, _))| code == instrument && *s == side)
            .map(|(id, _)| *id)
            .collect()
    }

    fn date(&self) -> u32 {
        self.date
    }

    fn time(&self) -> u32 {
        self.time
    }

    fn millis(&self) -> u32 {
        self.millis
    }
}
