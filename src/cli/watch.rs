//! `kiln watch`: initial build, file watching, frame loop.
//!
//! ```text
//! main thread     frame loop: snapshot() -> update_all() -> sleep
//! kiln-actors     tokio runtime: FsActor -> BuildActor -> PluginHost::rebuild
//! kiln-console    stdin commands
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};

use super::console;
use crate::actor::Coordinator;
use crate::config::KilnConfig;
use crate::core;
use crate::host::{PluginHost, abi};
use crate::log;

pub fn watch(config: Arc<KilnConfig>) -> Result<()> {
    core::set_show_warnings(config.build.diagnostics.show_warnings);
    ensure_watch_dir(&config.watch.dir)?;

    let host = Arc::new(PluginHost::from_config(&config));

    let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
    core::register_shutdown(shutdown_tx);

    let coordinator = Coordinator::new(Arc::clone(&config), Arc::clone(&host))
        .with_shutdown_signal(shutdown_rx);
    let builds = coordinator.build_handle();

    let actors = thread::Builder::new()
        .name("kiln-actors".into())
        .spawn(move || run_actor_system(coordinator))
        .context("failed to spawn actor thread")?;

    console::spawn(builds, Arc::clone(&host)).context("failed to spawn console")?;

    log!(
        "watch";
        "watching {} at {} fps ({})",
        config.root_relative(&config.watch.dir).display(),
        config.host.fps,
        console::HELP
    );
    frame_loop(&host, config.host.frame_interval());

    actors
        .join()
        .map_err(|_| anyhow!("actor thread panicked"))?
}

fn ensure_watch_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create `{}`", dir.display()))?;
        log!("watch"; "created {}", dir.display());
    }
    Ok(())
}

fn run_actor_system(coordinator: Coordinator) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let result = rt.block_on(coordinator.run());
    if let Err(e) = &result {
        log!("error"; "actor system: {:#}", e);
    }
    // The frame loop ends with the actors
    core::request_shutdown();
    result
}

/// Update the current set once per `interval` until shutdown.
///
/// Never waits for a build: each frame works on whatever set is current.
pub fn frame_loop(host: &PluginHost, interval: Duration) {
    let mut last = Instant::now();
    while !core::is_shutdown() {
        let start = Instant::now();
        abi::advance_frame(start.duration_since(last).as_secs_f32());
        last = start;

        host.snapshot().update_all();

        thread::sleep(interval.saturating_sub(start.elapsed()));
    }
}
