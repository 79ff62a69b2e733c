//! The published plugin set.
//!
//! Exactly one `PluginSet` is current at any instant. Readers take a snapshot
//! with a lock-free load and keep using it for as long as they like; a new
//! publication never touches a snapshot already handed out. Superseded sets
//! (and the libraries behind them) are dropped with their last snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::Behaviour;
use crate::log;

/// One live behaviour instance.
pub struct PluginEntry {
    type_name: String,
    instance: Mutex<Box<dyn Behaviour>>,
    /// An update already failed; later failures are not logged again
    faulted: AtomicBool,
}

impl PluginEntry {
    pub fn new(type_name: impl Into<String>, instance: Box<dyn Behaviour>) -> Self {
        Self {
            type_name: type_name.into(),
            instance: Mutex::new(instance),
            faulted: AtomicBool::new(false),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Run one frame of this instance. Returns `false` when it failed.
    pub fn update(&self) -> bool {
        match self.instance.lock().update() {
            Ok(()) => true,
            Err(err) => {
                if !self.faulted.swap(true, Ordering::Relaxed) {
                    log!("error"; "behaviour {} failed: {}", self.type_name, err);
                }
                false
            }
        }
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Relaxed)
    }
}

/// Instances produced by one successful build, in discovery order.
pub struct PluginSet {
    generation: u64,
    entries: Vec<PluginEntry>,
}

impl PluginSet {
    pub fn new(generation: u64, entries: Vec<PluginEntry>) -> Self {
        Self {
            generation,
            entries,
        }
    }

    /// The set current before the first successful build.
    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginEntry> {
        self.entries.iter()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(PluginEntry::type_name)
    }

    /// Update every instance once, in order. Failures never stop the loop.
    ///
    /// Returns the number of instances that failed this frame.
    pub fn update_all(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.update()).count()
    }
}

impl std::fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSet")
            .field("generation", &self.generation)
            .field("types", &self.type_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Single-writer slot holding the current set.
pub struct PublishedSet {
    current: ArcSwap<PluginSet>,
}

impl PublishedSet {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(PluginSet::empty()),
        }
    }

    /// Current set. Wait-free; never blocks on a running build.
    #[inline]
    pub fn snapshot(&self) -> Arc<PluginSet> {
        self.current.load_full()
    }

    /// Replace the current set, returning the superseded one.
    pub(crate) fn publish(&self, set: PluginSet) -> Arc<PluginSet> {
        self.current.swap(Arc::new(set))
    }
}

impl Default for PublishedSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PluginError;
    use std::sync::atomic::AtomicU32;

    struct Ticker {
        ticks: Arc<AtomicU32>,
        fail: bool,
    }

    impl Behaviour for Ticker {
        fn initialize(&mut self) -> Result<(), PluginError> {
            Ok(())
        }

        fn update(&mut self) -> Result<(), PluginError> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PluginError::HookPanicked("update"));
            }
            Ok(())
        }
    }

    fn ticker(name: &str, ticks: &Arc<AtomicU32>, fail: bool) -> PluginEntry {
        PluginEntry::new(
            name,
            Box::new(Ticker {
                ticks: Arc::clone(ticks),
                fail,
            }),
        )
    }

    #[test]
    fn test_initial_set_is_empty_generation_zero() {
        let published = PublishedSet::new();
        let set = published.snapshot();
        assert_eq!(set.generation(), 0);
        assert!(set.is_empty());
        assert_eq!(set.update_all(), 0);
    }

    #[test]
    fn test_failing_entry_does_not_stop_others() {
        let ticks = Arc::new(AtomicU32::new(0));
        let set = PluginSet::new(
            1,
            vec![
                ticker("a::Bad", &ticks, true),
                ticker("b::Good", &ticks, false),
            ],
        );

        assert_eq!(set.update_all(), 1);
        assert_eq!(set.update_all(), 1);
        assert_eq!(ticks.load(Ordering::SeqCst), 4);
        assert!(set.iter().next().unwrap().is_faulted());
    }

    #[test]
    fn test_snapshot_survives_publication() {
        let published = PublishedSet::new();
        let ticks = Arc::new(AtomicU32::new(0));
        published.publish(PluginSet::new(1, vec![ticker("a::A", &ticks, false)]));

        let held = published.snapshot();
        let old = published.publish(PluginSet::new(2, vec![]));

        assert!(Arc::ptr_eq(&held, &old));
        assert_eq!(held.generation(), 1);
        assert_eq!(held.update_all(), 0);
        assert_eq!(published.snapshot().generation(), 2);
    }
}
