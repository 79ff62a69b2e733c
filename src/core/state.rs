//! Process-wide runtime flags.
//!
//! Two orthogonal states:
//! - `SHOW_WARNINGS`: Are warning diagnostics displayed? (runtime toggle)
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C or `q`)

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Warning diagnostics are displayed.
/// Display only: never consulted when deciding whether a build succeeded.
static SHOW_WARNINGS: AtomicBool = AtomicBool::new(false);

/// Shutdown has been requested.
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Shutdown signal sender for actor system
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

// =============================================================================
// SHOW_WARNINGS state
// =============================================================================

pub fn show_warnings() -> bool {
    SHOW_WARNINGS.load(Ordering::Relaxed)
}

pub fn set_show_warnings(show: bool) {
    SHOW_WARNINGS.store(show, Ordering::Relaxed);
}

/// Flip warning display, returning the new state.
pub fn toggle_show_warnings() -> bool {
    !SHOW_WARNINGS.fetch_xor(true, Ordering::Relaxed)
}

// =============================================================================
// SHUTDOWN state
// =============================================================================

/// Setup the global Ctrl+C handler. Call once at program start
///
/// - Before `register_shutdown()`: nothing to wind down, exit immediately
/// - After `register_shutdown()`: set the flag and notify the actor system
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SHUTDOWN_TX.get().is_none() {
            std::process::exit(0);
        }
        request_shutdown();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the actor system's shutdown channel
pub fn register_shutdown(shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Request shutdown from anywhere (Ctrl+C handler, console `q`).
pub fn request_shutdown() {
    if SHUTDOWN.swap(true, Ordering::SeqCst) {
        return;
    }
    crate::log!("host"; "shutting down...");
    if let Some(tx) = SHUTDOWN_TX.get() {
        let _ = tx.try_send(());
    }
}

/// Check if shutdown has been requested
///
/// Relaxed is enough: the frame loop may run one extra frame.
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_show_warnings() {
        set_show_warnings(false);
        assert!(toggle_show_warnings());
        assert!(show_warnings());
        assert!(!toggle_show_warnings());
        assert!(!show_warnings());
    }
}
