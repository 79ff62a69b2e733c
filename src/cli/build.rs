//! `kiln build`: one compile cycle, optionally followed by a few frames.

use std::time::Duration;

use anyhow::{Result, bail};

use crate::config::KilnConfig;
use crate::core;
use crate::host::{CycleOutcome, PluginHost, abi};
use crate::log;
use crate::utils::plural_count;

pub fn build_once(config: &KilnConfig, frames: u64) -> Result<()> {
    core::set_show_warnings(config.build.diagnostics.show_warnings);
    let host = PluginHost::from_config(config);
    run_build(&host, frames, config.host.frame_interval())?;
    Ok(())
}

/// Build, then run `frames` frames of fixed `dt` without sleeping.
///
/// Returns the number of failed updates. Errors when nothing was published.
pub fn run_build(host: &PluginHost, frames: u64, dt: Duration) -> Result<usize> {
    match host.rebuild() {
        CycleOutcome::Published { .. } | CycleOutcome::Coalesced => {}
        CycleOutcome::CompileFailed { errors, .. } => {
            bail!("compilation failed with {}", plural_count(errors, "error"))
        }
        CycleOutcome::InstantiationFailed {
            type_name, reason, ..
        } => bail!("cannot instantiate `{type_name}`: {reason}"),
    }

    let set = host.snapshot();
    let mut failures = 0;
    for _ in 0..frames {
        abi::advance_frame(dt.as_secs_f32());
        failures += set.update_all();
    }
    if frames > 0 {
        log!(
            "host";
            "ran {} ({})",
            plural_count(frames as usize, "frame"),
            plural_count(failures, "failed update")
        );
    }
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Toolchain;
    use crate::compiler::testing::{FakeToolchain, behaviour_source};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<FakeToolchain>, PluginHost) {
        let temp = TempDir::new().unwrap();
        let fake = Arc::new(FakeToolchain::new());
        let host = PluginHost::new(temp.path(), "rs", Arc::clone(&fake) as Arc<dyn Toolchain>);
        (temp, fake, host)
    }

    #[test]
    fn test_build_runs_requested_frames() {
        let (temp, fake, host) = setup();
        std::fs::write(temp.path().join("a.rs"), behaviour_source("Alpha")).unwrap();

        let failures = run_build(&host, 3, Duration::from_millis(16)).unwrap();

        assert_eq!(failures, 0);
        assert_eq!(fake.journal_matching("update").len(), 3);
    }

    #[test]
    fn test_build_fails_on_compile_error() {
        let (temp, _fake, host) = setup();
        std::fs::write(temp.path().join("a.rs"), "compile_error!(\"x\");").unwrap();

        let err = run_build(&host, 0, Duration::ZERO).unwrap_err();
        assert_eq!(err.to_string(), "compilation failed with 1 error");
    }

    #[test]
    fn test_build_fails_on_instantiation_error() {
        let (temp, fake, host) = setup();
        std::fs::write(temp.path().join("a.rs"), behaviour_source("Alpha")).unwrap();
        fake.fail_initialize("a::Alpha");

        let err = run_build(&host, 0, Duration::ZERO).unwrap_err();
        assert!(err.to_string().starts_with("cannot instantiate `a::Alpha`"));
    }
}
