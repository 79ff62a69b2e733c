use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::builder::BuildActor;
use crate::actor::fs::FsActor;
use crate::actor::messages::BuildMsg;

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Run all actors concurrently.
///
/// Returns after a shutdown signal, or when either actor stops on its own.
/// In-flight compile cycles always run to completion.
pub(super) async fn run_actors(
    fs: FsActor,
    builder: BuildActor,
    build_tx: mpsc::Sender<BuildMsg>,
    shutdown_rx: Option<Receiver<()>>,
) -> Result<()> {
    let build_handle = tokio::spawn(async move { builder.run().await });
    let fs_handle = tokio::spawn(async move { fs.run().await });

    loop {
        if let Some(rx) = &shutdown_rx
            && rx.try_recv().is_ok()
        {
            crate::debug!("actor"; "shutdown signal received");
            break;
        }
        if build_handle.is_finished() || fs_handle.is_finished() {
            break;
        }
        tokio::time::sleep(SHUTDOWN_POLL).await;
    }

    fs_handle.abort();

    crate::debug!("actor"; "sending shutdown to builder");
    let _ = build_tx.send(BuildMsg::Shutdown).await;
    let _ = build_handle.await;

    Ok(())
}
