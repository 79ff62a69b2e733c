//! Runtime console for watch mode.
//!
//! Single-letter commands read line by line from stdin:
//!
//! | Command | Effect                          |
//! |---------|---------------------------------|
//! | `w`     | Toggle warning display          |
//! | `r`     | Force a rebuild                 |
//! | `s`     | Print host status               |
//! | `q`     | Quit                            |

use std::io::{self, BufRead};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::actor::BuildHandle;
use crate::actor::messages::RebuildReason;
use crate::core;
use crate::host::{PluginHost, abi};
use crate::log;
use crate::utils::plural_count;

pub const HELP: &str = "w: warnings, r: rebuild, s: status, q: quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleWarnings,
    Rebuild,
    Status,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "w" => Some(Self::ToggleWarnings),
            "r" => Some(Self::Rebuild),
            "s" => Some(Self::Status),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Read commands until `q` or end of input.
pub fn spawn(builds: BuildHandle, host: Arc<PluginHost>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("kiln-console".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line) {
                    Some(command) => {
                        if execute(command, &builds, &host).is_break() {
                            break;
                        }
                    }
                    None => log!("host"; "unknown command `{}` ({})", line.trim(), HELP),
                }
            }
        })
}

fn execute(command: Command, builds: &BuildHandle, host: &PluginHost) -> ControlFlow<()> {
    match command {
        Command::ToggleWarnings => {
            let on = core::toggle_show_warnings();
            log!("host"; "{} warning display", if on { "Enabled" } else { "Disabled" });
        }
        Command::Rebuild => {
            if !builds.request(RebuildReason::Manual) {
                log!("host"; "build actor is not running");
            }
        }
        Command::Status => {
            for line in status_lines(host) {
                log!("host"; "{}", line);
            }
        }
        Command::Quit => {
            core::request_shutdown();
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

pub fn status_lines(host: &PluginHost) -> Vec<String> {
    let set = host.snapshot();
    let mut lines = Vec::new();

    if set.is_empty() {
        lines.push(format!("generation {}: no behaviours", set.generation()));
    } else {
        let names: Vec<_> = set.type_names().collect();
        lines.push(format!(
            "generation {}: {} ({})",
            set.generation(),
            plural_count(names.len(), "behaviour"),
            names.join(", ")
        ));
    }

    let faulted: Vec<_> = set
        .iter()
        .filter(|entry| entry.is_faulted())
        .map(|entry| entry.type_name())
        .collect();
    if !faulted.is_empty() {
        lines.push(format!("faulted: {}", faulted.join(", ")));
    }

    if let Some(report) = host.last_report() {
        lines.push(format!(
            "last build: generation {} {} at {} ({}, {})",
            report.generation,
            if report.success { "succeeded" } else { "failed" },
            report.finished_at.to_clock(),
            plural_count(report.count(crate::compiler::Severity::Error), "error"),
            plural_count(report.count(crate::compiler::Severity::Warning), "warning"),
        ));
    }
    if host.is_building() {
        lines.push("build in progress".into());
    }

    lines.push(format!(
        "frame {}, warnings {}",
        abi::frame_count(),
        if core::show_warnings() { "shown" } else { "hidden" }
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Toolchain;
    use crate::compiler::testing::{FakeToolchain, behaviour_source};
    use tempfile::TempDir;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("w"), Some(Command::ToggleWarnings));
        assert_eq!(Command::parse(" r \n"), Some(Command::Rebuild));
        assert_eq!(Command::parse("s"), Some(Command::Status));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("quit"), None);
    }

    #[test]
    fn test_status_before_and_after_build() {
        let temp = TempDir::new().unwrap();
        let fake: Arc<dyn Toolchain> = Arc::new(FakeToolchain::new());
        let host = PluginHost::new(temp.path(), "rs", fake);

        let before = status_lines(&host);
        assert_eq!(before[0], "generation 0: no behaviours");

        std::fs::write(temp.path().join("a.rs"), behaviour_source("Alpha")).unwrap();
        host.rebuild();

        let after = status_lines(&host);
        assert_eq!(after[0], "generation 1: 1 behaviour (a::Alpha)");
        assert!(after[1].starts_with("last build: generation 1 succeeded at "));
        assert!(after[1].ends_with("(0 errors, 0 warnings)"));
    }
}
