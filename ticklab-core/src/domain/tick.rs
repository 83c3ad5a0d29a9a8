//! Tick — one market-data update for an instrument.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{self, ClockError, SessionTime};

/// Deepest book ladder a tick may carry.
pub const MAX_BOOK_LEVELS: usize = 5;

/// One price level of the book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub qty: f64,
}

impl BookLevel {
    pub fn new(price: f64, qty: f64) -> Self {
        Self { price, qty }
    }
}

/// Immutable market snapshot: last trade, bid/ask ladders, and the runtime
/// timestamp fields it was stamped with.
///
/// Ladders are best-first and carry between 1 and [`MAX_BOOK_LEVELS`] levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub instrument: String,
    /// Last trade price.
    pub price: f64,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    /// `YYYYMMDD`
    pub date: u32,
    /// `HHMM`
    pub time: u32,
    /// `SSmmm`
    pub millis: u32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickError {
    #[error("tick for {0}: {1} ladder is empty")]
    EmptyLadder(String, &'static str),

    #[error("tick for {0}: {1} ladder has {2} levels (max {MAX_BOOK_LEVELS})")]
    TooManyLevels(String, &'static str, usize),

    #[error("tick for {0}: non-finite or negative value in {1}")]
    BadValue(String, &'static str),

    #[error("tick for {0}: {1}")]
    Clock(String, ClockError),
}

impl Tick {
    /// Build and validate a tick.
    pub fn new(
        instrument: impl Into<String>,
        price: f64,
        bids: Vec<BookLevel>,
        asks: Vec<BookLevel>,
        date: u32,
        time: u32,
        millis: u32,
    ) -> Result<Self, TickError> {
        let tick = Self {
            instrument: instrument.into(),
            price,
            bids,
            asks,
            date,
            time,
            millis,
        };
        tick.validate()?;
        Ok(tick)
    }

    /// Check ladder shape, value sanity and timestamp fields.
    pub fn validate(&self) -> Result<(), TickError> {
        for (name, ladder) in [("bid", &self.bids), ("ask", &self.asks)] {
            if ladder.is_empty() {
                return Err(TickError::EmptyLadder(self.instrument.clone(), name));
            }
            if ladder.len() > MAX_BOOK_LEVELS {
                return Err(TickError::TooManyLevels(
                    self.instrument.clone(),
                    name,
                    ladder.len(),
                ));
            }
            let sane = ladder
                .iter()
                .all(|l| l.price.is_finite() && l.qty.is_finite() && l.qty >= 0.0);
            if !sane {
                return Err(TickError::BadValue(self.instrument.clone(), name));
            }
        }
        if !self.price.is_finite() {
            return Err(TickError::BadValue(self.instrument.clone(), "last price"));
        }
        self.timestamp()
            .map(|_| ())
            .map_err(|e| TickError::Clock(self.instrument.clone(), e))
    }

    pub fn best_bid(&self) -> BookLevel {
        self.bids[0]
    }

    pub fn best_ask(&self) -> BookLevel {
        self.asks[0]
    }

    /// Session time this tick was stamped with.
    pub fn timestamp(&self) -> Result<SessionTime, ClockError> {
        clock::now(self.date, self.time, self.millis)
    }
}
