//! Debounce scheduler.
//!
//! ```text
//!          notify                   notify (re-arm)
//!   Idle ---------> Pending(t+w) -----------------> Pending(t'+w)
//!    ^                   |
//!    +---- poll >= deadline: one trigger
//! ```
//!
//! Pure state machine: every method takes `now`, nothing reads the clock.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::ChangeKind;

/// How long the actor sleeps when nothing is pending.
pub(super) const IDLE_TICK: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum State {
    Idle,
    Pending { deadline: Instant },
}

pub(super) struct Debouncer {
    window: Duration,
    pub(super) state: State,
    /// Path -> ChangeKind (dedup is free via HashMap key uniqueness)
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
}

impl Debouncer {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            window,
            state: State::Idle,
            changes: FxHashMap::default(),
        }
    }

    /// Record a change and (re-)arm the deadline to `now + window`.
    ///
    /// Dedup rules for the same path within one window:
    /// - Removed + Created/Modified -> the restore event
    /// - Modified + Removed -> Removed
    /// - Created + Removed -> nothing left to report for the path
    /// - otherwise the first event wins
    pub(super) fn notify(&mut self, path: PathBuf, kind: ChangeKind, now: Instant) {
        match self.changes.get(&path).copied() {
            None => {
                crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
                self.changes.insert(path, kind);
            }
            Some(ChangeKind::Removed) if kind != ChangeKind::Removed => {
                self.changes.insert(path, kind);
            }
            Some(ChangeKind::Modified) if kind == ChangeKind::Removed => {
                self.changes.insert(path, ChangeKind::Removed);
            }
            Some(ChangeKind::Created) if kind == ChangeKind::Removed => {
                self.changes.remove(&path);
            }
            Some(_) => {}
        }
        self.state = State::Pending {
            deadline: now + self.window,
        };
    }

    /// Fire if the deadline has passed: returns the collected changes (sorted
    /// by path, possibly empty) exactly once and goes back to Idle.
    pub(super) fn poll(&mut self, now: Instant) -> Option<Vec<(PathBuf, ChangeKind)>> {
        let State::Pending { deadline } = self.state else {
            return None;
        };
        if now < deadline {
            return None;
        }

        self.state = State::Idle;
        let mut changes: Vec<_> = std::mem::take(&mut self.changes).into_iter().collect();
        changes.sort_by(|a, b| a.0.cmp(&b.0));
        Some(changes)
    }

    /// Time until the next `poll` can fire.
    pub(super) fn sleep_duration(&self, now: Instant) -> Duration {
        match self.state {
            State::Idle => IDLE_TICK,
            State::Pending { deadline } => deadline
                .saturating_duration_since(now)
                .max(Duration::from_millis(1)),
        }
    }
}
