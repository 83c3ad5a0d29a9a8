//! Time-sliced order scheduler.
//!
//! Spreads a slot budget over a bounded horizon as a series of limit slices
//! priced off the touch. A slice fires on a tick only when:
//!
//! 1. nothing from a previous slice is still pending,
//! 2. slot budget remains,
//! 3. the cooldown since the last slice has elapsed,
//! 4. the tick falls inside the horizon.
//!
//! There are no timers: every condition is re-evaluated on the next tick.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AlgoStatus;
use crate::clock::SessionTime;
use crate::domain::{LocalId, Side, Tick};
use crate::registry::OrderRegistry;
use crate::runtime::ExecutionRuntime;

/// Construction-time misuse. Never clamped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlgoError {
    #[error("instrument code is empty")]
    EmptyInstrument,

    #[error("total slots must be positive")]
    ZeroTotalSlots,

    #[error("slice size must be positive")]
    ZeroSliceSize,

    #[error("horizon {0} minutes must be positive and finite")]
    InvalidHorizon(f64),

    #[error("cooldown {0} seconds must be non-negative and finite")]
    InvalidCooldown(f64),

    #[error("price offset {0} ticks must be non-negative and finite")]
    InvalidPriceOffset(f64),
}

/// Fixed parameters of one algorithm instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceParams {
    pub instrument: String,
    pub horizon_minutes: f64,
    pub total_slots: u32,
    pub slice_size: u32,
    pub side: Side,
    /// Ticks to cross past the near touch (bid for buys, ask for sells).
    pub price_offset_ticks: f64,
    pub cooldown_secs: f64,
}

impl SliceParams {
    pub fn validate(&self) -> Result<(), AlgoError> {
        if self.instrument.is_empty() {
            return Err(AlgoError::EmptyInstrument);
        }
        if self.total_slots == 0 {
            return Err(AlgoError::ZeroTotalSlots);
        }
        if self.slice_size == 0 {
            return Err(AlgoError::ZeroSliceSize);
        }
        if !(self.horizon_minutes.is_finite() && self.horizon_minutes > 0.0) {
            return Err(AlgoError::InvalidHorizon(self.horizon_minutes));
        }
        if !(self.cooldown_secs.is_finite() && self.cooldown_secs >= 0.0) {
            return Err(AlgoError::InvalidCooldown(self.cooldown_secs));
        }
        if !(self.price_offset_ticks.is_finite() && self.price_offset_ticks >= 0.0) {
            return Err(AlgoError::InvalidPriceOffset(self.price_offset_ticks));
        }
        Ok(())
    }
}

/// A running slicing algorithm.
#[derive(Debug, Clone)]
pub struct SlicingAlgo {
    params: SliceParams,
    activated_at: SessionTime,
    consumed_slots: u32,
    last_submission: Option<SessionTime>,
}

impl SlicingAlgo {
    /// Activate at `activated_at`. Fails fast on invalid parameters.
    pub fn new(activated_at: SessionTime, params: SliceParams) -> Result<Self, AlgoError> {
        params.validate()?;
        Ok(Self {
            params,
            activated_at,
            consumed_slots: 0,
            last_submission: None,
        })
    }

    pub fn params(&self) -> &SliceParams {
        &self.params
    }

    pub fn activated_at(&self) -> SessionTime {
        self.activated_at
    }

    pub fn consumed_slots(&self) -> u32 {
        self.consumed_slots
    }

    pub fn last_submission(&self) -> Option<SessionTime> {
        self.last_submission
    }

    pub fn remaining_slots(&self) -> u32 {
        self.params.total_slots.saturating_sub(self.consumed_slots)
    }

    /// `0 <= now - activated_at < horizon`, in fractional minutes.
    pub fn is_in_horizon(&self, now: SessionTime) -> bool {
        let elapsed = now.minutes_since(self.activated_at);
        (0.0..self.params.horizon_minutes).contains(&elapsed)
    }

    /// A slice was sent and `0 <= now - last < cooldown` seconds.
    pub fn is_in_cooldown(&self, now: SessionTime) -> bool {
        match self.last_submission {
            Some(last) => (0.0..self.params.cooldown_secs).contains(&now.seconds_since(last)),
            None => false,
        }
    }

    pub fn status(&self, now: SessionTime) -> AlgoStatus {
        if self.consumed_slots >= self.params.total_slots {
            AlgoStatus::Exhausted
        } else if !self.is_in_horizon(now) {
            AlgoStatus::Expired
        } else {
            AlgoStatus::Active
        }
    }

    /// Evaluate one tick. Submits a slice and returns its ids when all firing
    /// conditions hold; returns `None` otherwise.
    pub fn tick(
        &mut self,
        ctx: &mut dyn ExecutionRuntime,
        tick: &Tick,
        now: SessionTime,
        pending: &OrderRegistry,
    ) -> Option<Vec<LocalId>> {
        if tick.instrument != self.params.instrument {
            return None;
        }
        if !pending.is_empty()
            || self.remaining_slots() == 0
            || self.is_in_cooldown(now)
            || !self.is_in_horizon(now)
        {
            return None;
        }

        let Some(info) = ctx.instrument_info(&self.params.instrument) else {
            tracing::warn!(
                instrument = %self.params.instrument,
                "no instrument info, slice skipped"
            );
            return None;
        };

        let side = self.params.side;
        let touch = match side {
            Side::Buy => tick.best_bid().price,
            Side::Sell => tick.best_ask().price,
        };
        let price = info.offset_through(touch, side, self.params.price_offset_ticks);
        let qty = self.params.slice_size.min(self.remaining_slots());
        let tag = match side {
            Side::Buy => "buy_far",
            Side::Sell => "sell_far",
        };

        self.consumed_slots += qty;
        self.last_submission = Some(now);
        let ids = ctx.submit(side, &self.params.instrument, price, qty as f64, tag);

        tracing::info!(
            instrument = %self.params.instrument,
            %side,
            price,
            qty,
            consumed = self.consumed_slots,
            total_slots = self.params.total_slots,
            at = %now,
            ids = ?ids,
            "slice submitted"
        );
        Some(ids)
    }
}
