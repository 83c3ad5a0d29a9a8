//! Progressive-urgency repricing ladder for a scheduled entry and exit.
//!
//! Inside the primary window an order is priced passively off its own touch.
//! Once the window closes with the target still unmet, the remaining quantity
//! is priced through the far touch. Later attempts only ever get more
//! aggressive.

use serde::{Deserialize, Serialize};

use crate::config::LadderOptions;
use crate::domain::{InstrumentInfo, Side, Tick};

/// How hard a step leans on the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Passive,
    Aggressive,
}

/// One order the ladder wants on the book now.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderStep {
    pub side: Side,
    pub qty: f64,
    pub price: f64,
    pub urgency: Urgency,
    pub tag: String,
}

#[derive(Debug, Clone)]
pub struct RepricingLadder {
    options: LadderOptions,
}

impl RepricingLadder {
    pub fn new(options: LadderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LadderOptions {
        &self.options
    }

    /// Decide the next step for a leg holding `position` with target
    /// magnitude `bet_size` on the ladder's side.
    ///
    /// Entry applies while the position is flat or on the wrong side; exit
    /// applies once it carries exposure on the ladder's side.
    pub fn step(
        &self,
        minute: u32,
        position: f64,
        bet_size: f64,
        tick: &Tick,
        info: &InstrumentInfo,
    ) -> Option<LadderStep> {
        let o = &self.options;
        let entry_side = o.side;

        if position * entry_side.sign() <= 0.0 {
            let target = entry_side.sign() * bet_size;
            let qty = (target - position).abs();
            if qty == 0.0 {
                return None;
            }
            let urgency = if (o.entry_start..=o.entry_end).contains(&minute) {
                Urgency::Passive
            } else if minute > o.entry_end && minute < o.entry_deadline {
                Urgency::Aggressive
            } else {
                return None;
            };
            let suffix = match urgency {
                Urgency::Passive => "",
                Urgency::Aggressive => "_2",
            };
            return Some(self.price_step(
                entry_side,
                qty,
                urgency,
                tick,
                info,
                format!("{entry_side}_far{suffix}"),
            ));
        }

        let close_side = entry_side.opposite();
        let qty = position.abs();
        let urgency = if (o.exit_start..=o.exit_end).contains(&minute) {
            Urgency::Passive
        } else if minute > o.exit_end {
            Urgency::Aggressive
        } else {
            return None;
        };
        let suffix = match urgency {
            Urgency::Passive => "",
            Urgency::Aggressive => "_2",
        };
        Some(self.price_step(
            close_side,
            qty,
            urgency,
            tick,
            info,
            format!("{close_side}close_far{suffix}"),
        ))
    }

    fn price_step(
        &self,
        side: Side,
        qty: f64,
        urgency: Urgency,
        tick: &Tick,
        info: &InstrumentInfo,
        tag: String,
    ) -> LadderStep {
        let (bid, ask) = (tick.best_bid().price, tick.best_ask().price);
        let (own, far) = match side {
            Side::Buy => (bid, ask),
            Side::Sell => (ask, bid),
        };
        let price = match urgency {
            Urgency::Passive => info.offset_through(own, side, self.options.passive_offset_ticks),
            Urgency::Aggressive => {
                info.offset_through(far, side, self.options.aggressive_offset_ticks)
            }
        };
        LadderStep {
            side,
            qty,
            price,
            urgency,
            tag,
        }
    }
}
