//! The execution runtime the kernel is embedded in.
//!
//! Market data, positions, order routing and the session clock all belong to
//! the runtime (a backtest engine or a live gateway). The kernel only calls
//! through this trait and receives callbacks through
//! [`Strategy`](crate::strategy::Strategy).

use crate::clock::{self, ClockError, SessionTime};
use crate::domain::{InstrumentInfo, LocalId, Side};

/// Outbound API the kernel consumes.
///
/// Positions and resting quantities are always re-queried: fills reported
/// out-of-band can change them between any two events.
pub trait ExecutionRuntime {
    /// Start receiving ticks for `instrument`.
    fn subscribe(&mut self, instrument: &str);

    /// Signed position (long > 0).
    fn position(&self, instrument: &str) -> f64;

    /// Instrument metadata, `None` if the runtime does not know the code.
    fn instrument_info(&self, instrument: &str) -> Option<InstrumentInfo>;

    /// Signed quantity of open orders resting at the venue (buys > 0), whether
    /// or not the strategy tracks them.
    fn unmanaged_open_qty(&self, instrument: &str) -> f64;

    fn submit_buy(&mut self, instrument: &str, price: f64, qty: f64, tag: &str) -> Vec<LocalId>;

    fn submit_sell(&mut self, instrument: &str, price: f64, qty: f64, tag: &str) -> Vec<LocalId>;

    /// Request cancellation. The effect is confirmed by a later order update.
    fn cancel(&mut self, id: LocalId);

    /// Cancel every open order on one side of `instrument`; returns the ids
    /// the cancels were issued for.
    fn cancel_all(&mut self, instrument: &str, is_buy_side: bool) -> Vec<LocalId>;

    /// Current trading date, `YYYYMMDD`.
    fn date(&self) -> u32;

    /// Current time of day, `HHMM`.
    fn time(&self) -> u32;

    /// Current seconds within the minute, `SSmmm`.
    fn millis(&self) -> u32;

    /// Submit on `side`.
    fn submit(&mut self, side: Side, instrument: &str, price: f64, qty: f64, tag: &str) -> Vec<LocalId> {
        match side {
            Side::Buy => self.submit_buy(instrument, price, qty, tag),
            Side::Sell => self.submit_sell(instrument, price, qty, tag),
        }
    }

    /// Current session time, composed through the session clock.
    fn now(&self) -> Result<SessionTime, ClockError> {
        clock::now(self.date(), self.time(), self.millis())
    }
}
