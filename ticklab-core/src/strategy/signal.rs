//! Book-imbalance signal.
//!
//! The reference price weights each touch by the *opposite* side's quantity,
//! so it leans toward the side with less resting size:
//!
//! ```text
//! theo = (bid * ask_qty + ask * bid_qty) / (ask_qty + bid_qty)
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::Tick;

/// Directional intent derived from one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Long,
    Flat,
    Short,
}

/// Imbalance-weighted mid. `None` when both touch quantities are zero.
pub fn theoretical_price(tick: &Tick) -> Option<f64> {
    let bid = tick.best_bid();
    let ask = tick.best_ask();
    let depth = bid.qty + ask.qty;
    if depth <= 0.0 {
        return None;
    }
    Some((bid.price * ask.qty + ask.price * bid.qty) / depth)
}

impl Signal {
    /// Compare the reference price with the last trade.
    pub fn from_tick(tick: &Tick) -> Self {
        match theoretical_price(tick) {
            Some(theo) if theo > tick.price => Self::Long,
            Some(theo) if theo < tick.price => Self::Short,
            _ => Self::Flat,
        }
    }
}
