//! Execution algorithms: stateful schedulers that turn a parent intent into a
//! bounded sequence of child submissions.
//!
//! A strategy owns at most one running algorithm per managed instrument pair,
//! held in an [`AlgoSlot`]. The slot makes start and teardown explicit so
//! decision code never has to null-check a shared instance.

pub mod slicer;

pub use slicer::{AlgoError, SliceParams, SlicingAlgo};

use serde::{Deserialize, Serialize};

/// Lifecycle of an algorithm instance.
///
/// `Inactive` is represented by an empty [`AlgoSlot`], not by a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlgoStatus {
    /// Inside its horizon with slot budget left.
    Active,
    /// Slot budget consumed.
    Exhausted,
    /// Horizon elapsed (or not yet started) before the budget was used.
    Expired,
}

impl AlgoStatus {
    pub fn is_done(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Optional-state holder for the one algorithm an owner may run.
#[derive(Debug, Default)]
pub struct AlgoSlot {
    algo: Option<SlicingAlgo>,
}

impl AlgoSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.algo.is_some()
    }

    /// Install a new instance. Returns false, leaving the running instance in
    /// place, if one is already installed.
    pub fn start(&mut self, algo: SlicingAlgo) -> bool {
        if self.algo.is_some() {
            return false;
        }
        tracing::info!(
            instrument = %algo.params().instrument,
            side = %algo.params().side,
            activated_at = %algo.activated_at(),
            horizon_min = algo.params().horizon_minutes,
            total_slots = algo.params().total_slots,
            slice = algo.params().slice_size,
            "slicing algorithm started"
        );
        self.algo = Some(algo);
        true
    }

    pub fn get(&self) -> Option<&SlicingAlgo> {
        self.algo.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut SlicingAlgo> {
        self.algo.as_mut()
    }

    /// Discard the running instance, returning it.
    pub fn teardown(&mut self, status: AlgoStatus) -> Option<SlicingAlgo> {
        let algo = self.algo.take()?;
        tracing::info!(
            instrument = %algo.params().instrument,
            consumed = algo.consumed_slots(),
            total_slots = algo.params().total_slots,
            status = ?status,
            "slicing algorithm torn down"
        );
        Some(algo)
    }
}
