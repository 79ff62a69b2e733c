//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads from any thread: the frame loop, the
//! build worker and the logger all read it while a cycle runs.

use crate::config::KilnConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<KilnConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(KilnConfig::default()));

#[inline]
pub fn cfg() -> Arc<KilnConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: KilnConfig) -> Arc<KilnConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
