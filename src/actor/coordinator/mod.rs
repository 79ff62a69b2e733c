//! Actor Coordinator - Wires up the Hot Reload Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Wires up actors
//! - Requests the startup build once the watcher is attached
//! - Runs them until shutdown

mod runtime;

use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::builder::{BuildActor, BuildHandle};
use super::fs::FsActor;
use super::messages::{BuildMsg, RebuildReason};
use crate::config::KilnConfig;
use crate::host::PluginHost;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<KilnConfig>,
    host: Arc<PluginHost>,
    build_tx: mpsc::Sender<BuildMsg>,
    build_rx: mpsc::Receiver<BuildMsg>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(config: Arc<KilnConfig>, host: Arc<PluginHost>) -> Self {
        let (build_tx, build_rx) = mpsc::channel(CHANNEL_BUFFER);
        Self {
            config,
            host,
            build_tx,
            build_rx,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Handle for requesting rebuilds from outside the runtime.
    pub fn build_handle(&self) -> BuildHandle {
        BuildHandle::new(self.build_tx.clone())
    }

    /// Run the actor system.
    pub async fn run(self) -> Result<()> {
        let watch = &self.config.watch;
        let fs_actor = FsActor::new(
            watch.dir.clone(),
            watch.extension.clone(),
            watch.debounce(),
            self.build_tx.clone(),
        )
        .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;

        let build_actor = BuildActor::new(self.build_rx, self.host);

        // Watcher first: edits made during the initial build are not lost
        self.build_tx
            .send(BuildMsg::Rebuild {
                reason: RebuildReason::Startup,
            })
            .await
            .map_err(|_| anyhow::anyhow!("build actor unavailable"))?;

        crate::debug!("actor"; "start");
        runtime::run_actors(fs_actor, build_actor, self.build_tx, self.shutdown_rx).await?;
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
