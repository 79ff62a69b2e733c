use std::path::{Path, PathBuf};

use notify::{RecursiveMode, Watcher};

use crate::{debug, log};

/// Attach/re-attach lifecycle of the watched directory.
///
/// Losing the directory is logged once; `maintain` re-attaches it on every
/// tick and logs when watching is restored.
pub(super) struct WatchRoot {
    path: PathBuf,
    attached: bool,
    /// The current outage was already reported
    failure_logged: bool,
}

impl WatchRoot {
    pub(super) fn new(path: PathBuf) -> Self {
        Self {
            path,
            attached: false,
            failure_logged: false,
        }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    /// Attach if the directory exists. Returns whether it is watched now.
    pub(super) fn attach(&mut self, watcher: &mut impl Watcher) -> bool {
        if self.attached {
            return true;
        }
        if !self.path.is_dir() {
            self.report_failure("directory does not exist");
            return false;
        }

        match watcher.watch(&self.path, RecursiveMode::NonRecursive) {
            Ok(()) => {
                if self.failure_logged {
                    log!("watch"; "watching {} again", self.path.display());
                } else {
                    debug!("watch"; "attached {}", self.path.display());
                }
                self.attached = true;
                self.failure_logged = false;
                true
            }
            Err(err) => {
                self.report_failure(&err.to_string());
                false
            }
        }
    }

    /// Detect a vanished root and try to re-attach a detached one.
    ///
    /// Returns `true` when the root was re-attached by this call.
    pub(super) fn maintain(&mut self, watcher: &mut impl Watcher) -> bool {
        if self.attached && !self.path.is_dir() {
            self.attached = false;
            // The handle may already be gone with the directory
            let _ = watcher.unwatch(&self.path);
            self.report_failure("directory was removed");
        }
        !self.attached && self.attach(watcher)
    }

    /// A notify error: the watch may be broken; re-attach on the next tick.
    pub(super) fn on_error(&mut self, watcher: &mut impl Watcher, err: &notify::Error) {
        log!("watch"; "notify error: {}", err);
        if self.attached {
            let _ = watcher.unwatch(&self.path);
            self.attached = false;
        }
    }

    fn report_failure(&mut self, reason: &str) {
        if !self.failure_logged {
            log!("watch"; "cannot watch {}: {}; retrying", self.path.display(), reason);
            self.failure_logged = true;
        }
    }
}
