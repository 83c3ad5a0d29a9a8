//! Channel and session lifecycle.
//!
//! Ready: reconcile every managed leg, then allow new signals.
//! Lost: stop new signals; resting orders are left to the venue.
//! Session end: reset per-session counters; positions and registries carry
//! over.

use super::leg::ManagedLeg;
use crate::registry::CancelCounter;
use crate::runtime::ExecutionRuntime;

/// Number of ticks per session logged at `info` before dropping to `trace`.
pub const DEFAULT_TICK_LOG_LIMIT: u32 = 3;

/// Suppresses repetitive log lines after the first `limit` per session.
#[derive(Debug, Clone)]
pub struct LogThrottle {
    limit: u32,
    seen: u32,
}

impl LogThrottle {
    pub fn new(limit: u32) -> Self {
        Self { limit, seen: 0 }
    }

    /// True for the first `limit` calls since the last reset.
    pub fn allow(&mut self) -> bool {
        if self.seen < self.limit {
            self.seen += 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.seen = 0;
    }
}

impl Default for LogThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_LOG_LIMIT)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LifecycleController {
    ready: bool,
    tick_log: LogThrottle,
}

impl LifecycleController {
    pub fn new() -> Self {
        Self::default()
    }

    /// New-signal evaluation is allowed.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Reconcile each leg and mark the channel ready. Returns the number of
    /// reconciled ids.
    pub fn channel_ready(
        &mut self,
        ctx: &mut dyn ExecutionRuntime,
        legs: &mut [&mut ManagedLeg],
        cancels: &mut CancelCounter,
    ) -> usize {
        let mut reconciled = 0;
        for leg in legs.iter_mut() {
            reconciled += leg.reconcile(ctx, cancels);
        }
        self.ready = true;
        tracing::info!(reconciled, "channel ready");
        reconciled
    }

    pub fn channel_lost(&mut self) {
        self.ready = false;
        tracing::warn!("channel lost, new orders suspended");
    }

    pub fn session_end(&mut self, trading_date: u32) {
        self.tick_log.reset();
        tracing::info!(trading_date, "session end");
    }

    /// Whether this tick should be logged at `info`.
    pub fn log_tick(&mut self) -> bool {
        self.tick_log.allow()
    }
}
