//! One managed instrument: its order registry plus the timing state that
//! drives order-timeout management.

use crate::clock::SessionTime;
use crate::domain::{LocalId, OrderUpdate};
use crate::registry::{CancelCounter, OrderRegistry};
use crate::runtime::ExecutionRuntime;

#[derive(Debug, Clone)]
pub struct ManagedLeg {
    code: String,
    orders: OrderRegistry,
    last_entry: Option<SessionTime>,
}

impl ManagedLeg {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            orders: OrderRegistry::new(),
            last_entry: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn orders(&self) -> &OrderRegistry {
        &self.orders
    }

    /// No managed orders outstanding.
    pub fn is_idle(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn last_entry(&self) -> Option<SessionTime> {
        self.last_entry
    }

    /// Register ids from a submission made at `now`.
    pub fn track_entry(&mut self, ids: Vec<LocalId>, now: SessionTime) {
        if ids.is_empty() {
            return;
        }
        self.orders.track(ids);
        self.last_entry = Some(now);
    }

    /// Cancel every tracked id once the last entry is older than
    /// `expiry_secs`. Each id is cancelled at most once; returns how many
    /// cancels were sent.
    pub fn cancel_expired(
        &mut self,
        ctx: &mut dyn ExecutionRuntime,
        now: SessionTime,
        expiry_secs: f64,
        cancels: &mut CancelCounter,
    ) -> usize {
        let Some(last) = self.last_entry else {
            return 0;
        };
        if self.orders.is_empty() || now.seconds_since(last) <= expiry_secs {
            return 0;
        }
        let sent = self.cancel_outstanding(ctx, cancels);
        if sent > 0 {
            tracing::info!(
                instrument = %self.code,
                count = sent,
                age_secs = now.seconds_since(last),
                expiry_secs,
                pending_cancels = cancels.get(),
                "expired orders cancelled"
            );
        }
        sent
    }

    /// Cancel every tracked id with no cancel already in flight.
    pub fn cancel_outstanding(
        &mut self,
        ctx: &mut dyn ExecutionRuntime,
        cancels: &mut CancelCounter,
    ) -> usize {
        let mut sent = 0;
        for id in self.orders.cancelable_ids() {
            if self.orders.mark_cancel_requested(id) {
                ctx.cancel(id);
                tracing::debug!(instrument = %self.code, local_id = %id, "cancel sent");
                sent += 1;
            }
        }
        cancels.add(sent);
        sent
    }

    /// Apply an order update. Returns true if a tracked id left the registry.
    ///
    /// Updates for other instruments and ids not tracked here are ignored.
    /// A cancel in flight is settled whenever its id resolves, including a
    /// full fill that beat the cancel to the venue.
    pub fn on_update(&mut self, update: &OrderUpdate, cancels: &mut CancelCounter) -> bool {
        if update.instrument != self.code {
            return false;
        }
        let Some(handle) =
            self.orders
                .take_if_terminal(update.local_id, update.canceled, update.remaining_qty)
        else {
            return false;
        };
        if update.canceled || handle.cancel_requested {
            cancels.confirm_one();
        }
        tracing::debug!(
            instrument = %self.code,
            local_id = %update.local_id,
            canceled = update.canceled,
            remaining = self.orders.count(),
            pending_cancels = cancels.get(),
            "order resolved"
        );
        true
    }

    /// Absorb orders resting at the venue that this leg does not track.
    ///
    /// Only runs when the registry is empty: anything resting then escaped
    /// tracking. The side holding the open quantity is bulk-cancelled and the
    /// returned ids are tracked until their cancels confirm.
    pub fn reconcile(&mut self, ctx: &mut dyn ExecutionRuntime, cancels: &mut CancelCounter) -> usize {
        let undone = ctx.unmanaged_open_qty(&self.code);
        if undone == 0.0 || !self.orders.is_empty() {
            return 0;
        }
        let is_buy_side = undone > 0.0;
        let ids = ctx.cancel_all(&self.code, is_buy_side);
        let count = ids.len();
        self.orders.track(ids.iter().copied());
        for id in ids {
            self.orders.mark_cancel_requested(id);
        }
        cancels.add(count);
        tracing::info!(
            instrument = %self.code,
            undone,
            is_buy_side,
            count,
            pending_cancels = cancels.get(),
            "reconciled unmanaged orders"
        );
        count
    }
}
