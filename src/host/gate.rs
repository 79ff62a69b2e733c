//! Build serialization.
//!
//! At most one cycle runs at a time and at most one follow-up waits behind
//! it. Requests arriving while a follow-up is already queued are absorbed by
//! that follow-up.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

/// Result of asking the gate to run a cycle.
#[derive(Debug, PartialEq, Eq)]
pub enum GateResult<T> {
    /// This caller ran the cycle.
    Ran(T),
    /// An earlier follow-up already served this request.
    Coalesced,
}

#[derive(Debug, Default)]
pub struct BuildGate {
    lock: Mutex<()>,
    /// A request is waiting for a cycle that has not read sources yet
    pending: AtomicBool,
    cycles: AtomicU64,
}

impl BuildGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a cycle and block until it has been served.
    ///
    /// The pending flag is consumed right after the lock is taken, before
    /// `cycle` reads any source. A request raised before that point is
    /// served by the cycle about to start; one raised later gets its own.
    pub fn run<T>(&self, cycle: impl FnOnce() -> T) -> GateResult<T> {
        self.pending.store(true, Ordering::SeqCst);
        let _guard = self.lock.lock();

        if !self.pending.swap(false, Ordering::SeqCst) {
            return GateResult::Coalesced;
        }

        self.cycles.fetch_add(1, Ordering::SeqCst);
        GateResult::Ran(cycle())
    }

    /// A cycle is in flight.
    pub fn is_busy(&self) -> bool {
        self.lock.is_locked()
    }

    /// Number of cycles actually run.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }
}
