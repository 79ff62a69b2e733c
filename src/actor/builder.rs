//! Build Actor
//!
//! Turns rebuild requests into compile cycles. Each request runs
//! `PluginHost::rebuild` on the blocking pool; the host's gate keeps at most
//! one cycle running and folds the rest into a single follow-up.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use super::messages::{BuildMsg, RebuildReason};
use crate::host::{CycleOutcome, PluginHost};
use crate::{debug, log};

pub struct BuildActor {
    rx: mpsc::Receiver<BuildMsg>,
    host: Arc<PluginHost>,
    in_flight: JoinSet<CycleOutcome>,
}

impl BuildActor {
    pub fn new(rx: mpsc::Receiver<BuildMsg>, host: Arc<PluginHost>) -> Self {
        Self {
            rx,
            host,
            in_flight: JoinSet::new(),
        }
    }

    /// Serve requests until `Shutdown` or until every sender is gone.
    ///
    /// Cycles already started run to completion before this returns.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(BuildMsg::Rebuild { reason }) => self.trigger(reason),
                    Some(BuildMsg::Shutdown) | None => break,
                },
                Some(done) = self.in_flight.join_next() => report(done),
            }
        }

        while let Some(done) = self.in_flight.join_next().await {
            report(done);
        }
        debug!("build"; "actor stopped");
    }

    fn trigger(&mut self, reason: RebuildReason) {
        match &reason {
            RebuildReason::Startup => {}
            RebuildReason::FileChange(_) => log!("watch"; "change detected: {}", reason),
            RebuildReason::Manual => log!("build"; "rebuild requested"),
        }

        let host = Arc::clone(&self.host);
        self.in_flight.spawn_blocking(move || host.rebuild());
    }
}

fn report(done: Result<CycleOutcome, JoinError>) {
    match done {
        Ok(outcome) => debug!("build"; "cycle finished: {:?}", outcome),
        Err(err) => log!("error"; "build task failed: {}", err),
    }
}

/// Sender side for requests from outside the runtime (the console thread).
#[derive(Clone)]
pub struct BuildHandle {
    tx: mpsc::Sender<BuildMsg>,
}

impl BuildHandle {
    pub fn new(tx: mpsc::Sender<BuildMsg>) -> Self {
        Self { tx }
    }

    /// Queue a rebuild. Returns `false` once the build actor has stopped.
    ///
    /// Blocks while the queue is full; must not be called on a runtime thread.
    pub fn request(&self, reason: RebuildReason) -> bool {
        self.tx.blocking_send(BuildMsg::Rebuild { reason }).is_ok()
    }
}
