//! Replay driver: feeds recorded ticks through a [`SimVenue`] into one
//! strategy, delivering every callback serially.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use super::venue::{SimVenue, VenueEvent, VenueStats};
use crate::domain::{Tick, TickError};
use crate::strategy::Strategy;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("tick for unknown instrument {0}")]
    UnknownInstrument(String),

    #[error(transparent)]
    Tick(#[from] TickError),
}

/// Plain counts from one replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub strategy: String,
    pub ticks: u64,
    /// Ticks for instruments the strategy never subscribed.
    pub ticks_skipped: u64,
    pub sessions: u64,
    pub submitted: u64,
    pub rejected: u64,
    pub fills: u64,
    pub filled_qty: f64,
    pub cancels: u64,
    /// Cancels the strategy still considers in flight.
    pub pending_cancels: u64,
    pub open_orders: usize,
    pub positions: BTreeMap<String, f64>,
}

pub struct Replay {
    venue: SimVenue,
    strategy: Box<dyn Strategy>,
}

impl Replay {
    pub fn new(venue: SimVenue, strategy: Box<dyn Strategy>) -> Self {
        Self { venue, strategy }
    }

    pub fn venue(&self) -> &SimVenue {
        &self.venue
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    /// Run every tick through the strategy.
    ///
    /// Ticks from several instruments are merged by timestamp; ticks sharing a
    /// timestamp keep their input order. Channel ready is raised before the
    /// first tick; session end fires when the trading date changes and after
    /// the last tick.
    pub fn run(&mut self, mut ticks: Vec<Tick>) -> Result<ReplaySummary, SimError> {
        for tick in &ticks {
            tick.validate()?;
            if !self.venue.knows(&tick.instrument) {
                return Err(SimError::UnknownInstrument(tick.instrument.clone()));
            }
        }
        ticks.sort_by_key(|t| (t.date, t.time, t.millis));

        self.strategy.on_init(&mut self.venue);
        self.strategy.on_channel_ready(&mut self.venue);
        self.deliver();

        let mut processed = 0u64;
        let mut skipped = 0u64;
        let mut sessions = 0u64;
        let mut current_date: Option<u32> = None;

        for tick in &ticks {
            if let Some(date) = current_date {
                if date != tick.date {
                    self.end_session(date);
                    sessions += 1;
                }
            }
            current_date = Some(tick.date);

            self.venue.on_market(tick);
            self.deliver();
            if !self.venue.is_subscribed(&tick.instrument) {
                skipped += 1;
                continue;
            }
            self.strategy.on_tick(&mut self.venue, tick);
            self.deliver();
            processed += 1;
        }
        if let Some(date) = current_date {
            self.end_session(date);
            sessions += 1;
        }

        let stats: &VenueStats = self.venue.stats();
        let summary = ReplaySummary {
            strategy: self.strategy.name().to_string(),
            ticks: processed,
            ticks_skipped: skipped,
            sessions,
            submitted: stats.submitted,
            rejected: stats.rejected,
            fills: stats.fills,
            filled_qty: stats.filled_qty,
            cancels: stats.cancels,
            pending_cancels: self.strategy.pending_cancels(),
            open_orders: self.venue.open_order_count(),
            positions: self.venue.positions().clone(),
        };
        tracing::info!(
            strategy = %summary.strategy,
            ticks = summary.ticks,
            submitted = summary.submitted,
            fills = summary.fills,
            cancels = summary.cancels,
            rejected = summary.rejected,
            "replay finished"
        );
        Ok(summary)
    }

    fn end_session(&mut self, date: u32) {
        self.strategy.on_session_end(&mut self.venue, date);
        self.deliver();
    }

    /// Drain the venue queue. Events raised while handling one are appended
    /// and delivered in the same pass.
    fn deliver(&mut self) {
        while let Some(event) = self.venue.next_event() {
            match event {
                VenueEvent::Ack(ack) => self.strategy.on_order_ack(&mut self.venue, &ack),
                VenueEvent::Update(update) => self.strategy.on_order_update(&mut self.venue, &update),
                VenueEvent::Trade(trade) => self.strategy.on_trade(&mut self.venue, &trade),
            }
        }
    }
}
