//! Order registry — the set of local order ids a strategy instance is
//! responsible for, per managed instrument.
//!
//! Registry membership is the only signal decision logic uses to answer "do I
//! have unresolved risk on this instrument". Every id in a registry was
//! returned by a submission or a reconciliation bulk cancel, and leaves it
//! exactly once: on the callback reporting it canceled or fully filled.
//! Late or duplicate callbacks for ids already gone are no-ops.
//!
//! The cancel counter tracking in-flight cancellation requests lives here too.

use std::collections::BTreeMap;

use crate::domain::LocalId;

/// Lightweight per-id bookkeeping. Order state itself stays with the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderHandle {
    /// A cancel has been sent and not yet confirmed.
    pub cancel_requested: bool,
}

/// Managed order ids for one instrument.
#[derive(Debug, Clone, Default)]
pub struct OrderRegistry {
    handles: BTreeMap<LocalId, OrderHandle>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add ids. Ids already present keep their handle.
    pub fn track<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = LocalId>,
    {
        for id in ids {
            self.handles.entry(id).or_default();
        }
    }

    /// Remove `id` iff the update is terminal (`canceled || remaining_qty == 0`).
    ///
    /// Returns true if the id was present and removed. Absent ids are ignored.
    pub fn untrack_if_terminal(&mut self, id: LocalId, canceled: bool, remaining_qty: f64) -> bool {
        self.take_if_terminal(id, canceled, remaining_qty).is_some()
    }

    /// Like [`untrack_if_terminal`](Self::untrack_if_terminal), but hands back
    /// the removed handle so callers can see whether a cancel was in flight.
    pub fn take_if_terminal(
        &mut self,
        id: LocalId,
        canceled: bool,
        remaining_qty: f64,
    ) -> Option<OrderHandle> {
        if !(canceled || remaining_qty == 0.0) {
            return None;
        }
        self.handles.remove(&id)
    }

    pub fn contains(&self, id: LocalId) -> bool {
        self.handles.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn count(&self) -> usize {
        self.handles.len()
    }

    /// Tracked ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = LocalId> + '_ {
        self.handles.keys().copied()
    }

    /// Tracked ids with no cancel outstanding.
    pub fn cancelable_ids(&self) -> Vec<LocalId> {
        self.handles
            .iter()
            .filter(|(_, h)| !h.cancel_requested)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Flag `id` as having a cancel in flight. Returns false if `id` is not
    /// tracked or was already flagged.
    pub fn mark_cancel_requested(&mut self, id: LocalId) -> bool {
        match self.handles.get_mut(&id) {
            Some(h) if !h.cancel_requested => {
                h.cancel_requested = true;
                true
            }
            _ => false,
        }
    }
}

/// Count of cancellation requests not yet confirmed.
///
/// Diagnostics only: nothing gates on it. Decrements below zero are ignored,
/// so duplicate or unexpected confirmations cannot drive it negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelCounter(u64);

impl CancelCounter {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn add(&mut self, n: usize) {
        self.0 += n as u64;
    }

    /// Decrement if non-zero. Returns whether a decrement happened.
    pub fn confirm_one(&mut self) -> bool {
        if self.0 > 0 {
            self.0 -= 1;
            true
        } else {
            false
        }
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_is_idempotent() {
        let mut reg = OrderRegistry::new();
        reg.track([LocalId(1), LocalId(2)]);
        reg.track([LocalId(2)]);
        assert_eq!(reg.count(), 2);
        assert!(reg.contains(LocalId(1)));
    }

    #[test]
    fn untrack_requires_terminal_state() {
        let mut reg = OrderRegistry::new();
        reg.track([LocalId(1)]);
        assert!(!reg.untrack_if_terminal(LocalId(1), false, 1.0));
        assert_eq!(reg.count(), 1);
        assert!(reg.untrack_if_terminal(LocalId(1), false, 0.0));
        assert!(reg.is_empty());
    }

    #[test]
    fn double_removal_is_noop() {
        let mut reg = OrderRegistry::new();
        reg.track([LocalId(5)]);
        assert!(reg.untrack_if_terminal(LocalId(5), true, 3.0));
        assert!(!reg.untrack_if_terminal(LocalId(5), true, 3.0));
        assert!(!reg.untrack_if_terminal(LocalId(99), false, 0.0));
        assert_eq!(reg.count(), 0);
    }

    #[test]
    fn retracking_keeps_cancel_flag() {
        let mut reg = OrderRegistry::new();
        reg.track([LocalId(1), LocalId(2)]);
        assert!(reg.mark_cancel_requested(LocalId(1)));
        assert!(!reg.mark_cancel_requested(LocalId(1)));
        reg.track([LocalId(1)]);
        assert_eq!(reg.cancelable_ids(), vec![LocalId(2)]);
        assert!(!reg.mark_cancel_requested(LocalId(42)));
    }

    #[test]
    fn take_reports_cancel_in_flight() {
        let mut reg = OrderRegistry::new();
        reg.track([LocalId(1), LocalId(2)]);
        reg.mark_cancel_requested(LocalId(1));
        assert_eq!(reg.take_if_terminal(LocalId(1), false, 1.0), None);
        let filled = reg.take_if_terminal(LocalId(1), false, 0.0).unwrap();
        assert!(filled.cancel_requested);
        assert!(!reg.take_if_terminal(LocalId(2), false, 0.0).unwrap().cancel_requested);
        assert_eq!(reg.take_if_terminal(LocalId(2), true, 0.0), None);
    }

    #[test]
    fn cancel_counter_floors_at_zero() {
        let mut c = CancelCounter::new();
        assert!(!c.confirm_one());
        c.add(2);
        assert!(c.confirm_one());
        assert!(c.confirm_one());
        assert!(!c.confirm_one());
        assert_eq!(c.get(), 0);
    }
}
