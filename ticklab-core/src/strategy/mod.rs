//! Decision layer — strategies driven by runtime callbacks.
//!
//! A strategy instance is owned by exactly one runtime and receives every
//! callback serially. It never blocks and never spawns: each callback is a
//! short synchronous state transition, and any waiting is re-evaluated on the
//! next inbound event.

pub mod imbalance;
pub mod ladder;
pub mod leg;
pub mod lifecycle;
pub mod pair;
pub mod signal;

pub use imbalance::ImbalanceStrategy;
pub use ladder::{LadderStep, RepricingLadder};
pub use leg::ManagedLeg;
pub use lifecycle::{LifecycleController, LogThrottle};
pub use pair::PairStrategy;
pub use signal::{theoretical_price, Signal};

use crate::domain::{OrderAck, OrderUpdate, Tick, TradeReport};
use crate::runtime::ExecutionRuntime;

/// Inbound callbacks from the runtime.
///
/// # Architecture invariants
/// - Callbacks for one instance never overlap.
/// - Time comes from the runtime (`ctx.now()`), never the host clock.
/// - Positions are re-queried on every decision, never cached.
///
/// Every callback has a no-op default so implementations only override what
/// they react to.
pub trait Strategy: Send {
    /// Human-readable name (e.g., "sp_pair").
    fn name(&self) -> &str;

    /// Called once before any other callback. Subscribes instruments.
    fn on_init(&mut self, _ctx: &mut dyn ExecutionRuntime) {}

    fn on_tick(&mut self, _ctx: &mut dyn ExecutionRuntime, _tick: &Tick) {}

    /// Submission acknowledgement. A rejected id was never tracked, so the
    /// registry is left alone and the next eligible tick retries.
    fn on_order_ack(&mut self, _ctx: &mut dyn ExecutionRuntime, ack: &OrderAck) {
        if ack.accepted {
            tracing::debug!(
                strategy = self.name(),
                instrument = %ack.instrument,
                local_id = %ack.local_id,
                tag = %ack.tag,
                "order accepted"
            );
        } else {
            tracing::warn!(
                strategy = self.name(),
                instrument = %ack.instrument,
                local_id = %ack.local_id,
                tag = %ack.tag,
                message = %ack.message,
                "order rejected"
            );
        }
    }

    fn on_order_update(&mut self, _ctx: &mut dyn ExecutionRuntime, _update: &OrderUpdate) {}

    fn on_trade(&mut self, _ctx: &mut dyn ExecutionRuntime, trade: &TradeReport) {
        tracing::info!(
            strategy = self.name(),
            instrument = %trade.instrument,
            local_id = %trade.local_id,
            side = %trade.side,
            qty = trade.qty,
            price = trade.price,
            tag = %trade.tag,
            "trade"
        );
    }

    fn on_channel_ready(&mut self, _ctx: &mut dyn ExecutionRuntime) {}

    fn on_channel_lost(&mut self, _ctx: &mut dyn ExecutionRuntime) {}

    fn on_session_end(&mut self, _ctx: &mut dyn ExecutionRuntime, _trading_date: u32) {}

    /// Cancellation requests sent and not yet confirmed.
    fn pending_cancels(&self) -> u64 {
        0
    }
}
