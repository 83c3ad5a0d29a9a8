use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::order::Side;

/// Static instrument metadata the kernel needs for repricing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentInfo {
    pub code: String,
    /// Minimum price increment.
    pub tick_size: f64,
}

impl InstrumentInfo {
    pub fn new(code: impl Into<String>, tick_size: f64) -> Result<Self, InstrumentError> {
        let code = code.into();
        if !(tick_size.is_finite() && tick_size > 0.0) {
            return Err(InstrumentError::InvalidTickSize { code, tick_size });
        }
        Ok(Self { code, tick_size })
    }

    /// Price distance of `n` ticks.
    pub fn ticks(&self, n: f64) -> f64 {
        n * self.tick_size
    }

    /// Move `price` by `n` ticks against the order's favor: up for buys,
    /// down for sells. A larger `n` crosses further into the book.
    pub fn offset_through(&self, price: f64, side: Side, n: f64) -> f64 {
        self.round_price(price + side.sign() * self.ticks(n))
    }

    /// Snap to the nearest tick.
    pub fn round_price(&self, price: f64) -> f64 {
        (price / self.tick_size).round() * self.tick_size
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstrumentError {
    #[error("instrument {code}: tick size {tick_size} must be positive and finite")]
    InvalidTickSize { code: String, tick_size: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_moves_against_order_favor() {
        let inst = InstrumentInfo::new("SHFE.sp.2202", 2.0).unwrap();
        assert_eq!(inst.offset_through(5000.0, Side::Buy, 3.0), 5006.0);
        assert_eq!(inst.offset_through(5000.0, Side::Sell, 3.0), 4994.0);
        assert_eq!(inst.offset_through(5000.0, Side::Sell, 0.0), 5000.0);
    }

    #[test]
    fn rounds_to_tick_grid() {
        let inst = InstrumentInfo::new("ES", 0.25).unwrap();
        assert_eq!(inst.round_price(4500.10), 4500.00);
        assert_eq!(inst.round_price(4500.15), 4500.25);
    }

    #[test]
    fn rejects_non_positive_tick() {
        assert!(InstrumentInfo::new("X", 0.0).is_err());
        assert!(InstrumentInfo::new("X", -1.0).is_err());
        assert!(InstrumentInfo::new("X", f64::NAN).is_err());
    }
}
