//! FileSystem Actor
//!
//! Watches the behaviour directory and sends one rebuild request per burst of
//! edits. The watcher is attached before the initial build is requested, so
//! nothing edited during that build is lost.
//!
//! Architecture:
//! ```text
//! notify thread -> bridge thread -> FsActor: source_changes -> Debouncer -> BuildMsg
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::{BuildMsg, RebuildReason};

// Pure timing and deduplication.
mod debouncer;
// Event kinds and source filtering.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_root;


use debouncer::Debouncer;
use types::{ChangeKind, source_changes};
use watch_root::WatchRoot;

/// FileSystem Actor - watches for source changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    watch_root: WatchRoot,
    extension: String,
    debouncer: Debouncer,
    build_tx: mpsc::Sender<BuildMsg>,
}

impl FsActor {
    /// Create the watcher and attach the directory immediately.
    ///
    /// A missing directory is not an error; it is attached once it appears.
    pub fn new(
        dir: PathBuf,
        extension: impl Into<String>,
        debounce: Duration,
        build_tx: mpsc::Sender<BuildMsg>,
    ) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut watch_root = WatchRoot::new(dir);
        watch_root.attach(&mut watcher);

        Ok(Self {
            notify_rx,
            watcher,
            watch_root,
            extension: extension.into(),
            debouncer: Debouncer::new(debounce),
            build_tx,
        })
    }

    /// Run the actor event loop until the build actor goes away.
    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_root,
            extension,
            mut debouncer,
            build_tx,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Result<notify::Event>>(64);

        // notify delivers on a std channel; forward into the runtime
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                if async_tx.blocking_send(result).is_err() {
                    break; // Receiver dropped
                }
            }
        });

        crate::debug!("watch"; "watching {}", watch_root.path().display());

        loop {
            // Re-created every iteration: a new event re-arms the deadline
            let sleep = tokio::time::sleep(debouncer.sleep_duration(Instant::now()));

            tokio::select! {
                biased;
                Some(result) = async_rx.recv() => match result {
                    Ok(event) => {
                        let now = Instant::now();
                        for (path, kind) in source_changes(&event, &extension) {
                            debouncer.notify(path, kind, now);
                        }
                    }
                    Err(err) => watch_root.on_error(&mut watcher, &err),
                },
                _ = sleep => {
                    if watch_root.maintain(&mut watcher) {
                        // Anything may have happened while detached
                        let dir = watch_root.path().to_path_buf();
                        debouncer.notify(dir, ChangeKind::Modified, Instant::now());
                    }
                    if let Some(changes) = debouncer.poll(Instant::now()) {
                        let paths = changes.into_iter().map(|(path, _)| path).collect();
                        let msg = BuildMsg::Rebuild {
                            reason: RebuildReason::FileChange(paths),
                        };
                        if build_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
}
