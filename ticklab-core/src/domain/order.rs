//! Order side and the order/trade callback payloads delivered by the runtime.
//!
//! The kernel does not own order storage. These are the observable fields of
//! an external order as reported through callbacks.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::LocalId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> f64 {
        match self {
            Self::Buy => 1.0,
            Self::Sell => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// The side that reduces a signed quantity toward zero, if any.
    pub fn to_flatten(signed_qty: f64) -> Option<Self> {
        if signed_qty > 0.0 {
            Some(Self::Sell)
        } else if signed_qty < 0.0 {
            Some(Self::Buy)
        } else {
            None
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Submission acknowledgement (`onOrderAck`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub local_id: LocalId,
    pub instrument: String,
    pub accepted: bool,
    pub message: String,
    pub tag: String,
}

/// Order state change (`onOrderUpdate`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub local_id: LocalId,
    pub instrument: String,
    pub side: Side,
    pub total_qty: f64,
    pub remaining_qty: f64,
    pub price: f64,
    pub canceled: bool,
    pub tag: String,
}

impl OrderUpdate {
    /// Canceled or fully filled.
    pub fn is_terminal(&self) -> bool {
        self.canceled || self.remaining_qty == 0.0
    }
}

/// Execution report (`onTrade`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReport {
    pub local_id: LocalId,
    pub instrument: String,
    pub side: Side,
    pub qty: f64,
    pub price: f64,
    pub tag: String,
}
