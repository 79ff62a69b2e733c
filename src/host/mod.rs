//! Plugin host: one compile cycle from sources to a published plugin set.
//!
//! # Module Structure
//!
//! - `gate` - serializes cycles (one running, one follow-up)
//! - `registry` - instantiates a compiled module
//! - `published` - the current plugin set and its lock-free snapshot
//! - `report` - diagnostics of the last cycle
//! - `abi` - host side of the library ABI and the frame clock
//! - `behaviour` - the capability contract
//!
//! # Cycle
//!
//! ```text
//! rebuild() -> gate -> compile -> print report -> instantiate -> publish
//!                         |                           |
//!                     errors: keep               failure: keep
//!                     current set                current set
//! ```

pub mod abi;
mod behaviour;
pub mod gate;
pub mod published;
pub mod registry;
pub mod report;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use arc_swap::ArcSwapOption;

use crate::compiler::{self, RustcToolchain, Severity, Toolchain};
use crate::config::KilnConfig;
use crate::utils::plural_count;
use crate::{debug, log, logger};

pub use behaviour::{Behaviour, PluginError};
pub use gate::{BuildGate, GateResult};
pub use published::{PluginEntry, PluginSet, PublishedSet};
pub use report::BuildReport;

/// What a `rebuild` request amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new set is current.
    Published { generation: u64, count: usize },
    /// Compilation reported errors; the previous set stays current.
    CompileFailed { generation: u64, errors: usize },
    /// A type could not be constructed or initialized; nothing was published.
    InstantiationFailed {
        generation: u64,
        type_name: String,
        reason: String,
    },
    /// Served by a cycle another request started.
    Coalesced,
}

impl CycleOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

pub struct PluginHost {
    dir: PathBuf,
    extension: String,
    toolchain: Arc<dyn Toolchain>,
    gate: BuildGate,
    published: PublishedSet,
    /// Handed out at cycle start; failed cycles consume one too
    next_generation: AtomicU64,
    last_report: ArcSwapOption<BuildReport>,
}

impl PluginHost {
    pub fn new(
        dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        toolchain: Arc<dyn Toolchain>,
    ) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            toolchain,
            gate: BuildGate::new(),
            published: PublishedSet::new(),
            next_generation: AtomicU64::new(1),
            last_report: ArcSwapOption::empty(),
        }
    }

    /// Host compiling with `rustc` as configured.
    pub fn from_config(config: &KilnConfig) -> Self {
        Self::new(
            config.watch.dir.clone(),
            config.watch.extension.clone(),
            Arc::new(RustcToolchain::new(&config.build)),
        )
    }

    /// Current plugin set; never waits for a running cycle.
    #[inline]
    pub fn snapshot(&self) -> Arc<PluginSet> {
        self.published.snapshot()
    }

    pub fn is_building(&self) -> bool {
        self.gate.is_busy()
    }

    pub fn last_report(&self) -> Option<Arc<BuildReport>> {
        self.last_report.load_full()
    }

    /// Run a compile cycle, or join the one that will serve this request.
    ///
    /// Blocks the calling thread until the request has been served.
    pub fn rebuild(&self) -> CycleOutcome {
        match self.gate.run(|| self.cycle()) {
            GateResult::Ran(outcome) => outcome,
            GateResult::Coalesced => {
                debug!("build"; "request coalesced into previous cycle");
                CycleOutcome::Coalesced
            }
        }
    }

    fn cycle(&self) -> CycleOutcome {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();
        log!("build"; "starting compilation...");

        let compilation =
            compiler::compile(&*self.toolchain, &self.dir, &self.extension, generation);

        let report = Arc::new(BuildReport::new(
            generation,
            compilation.module.is_some(),
            compilation.diagnostics,
        ));
        logger::print_report(&report, &self.dir);
        self.last_report.store(Some(Arc::clone(&report)));

        let Some(module) = compilation.module else {
            let errors = report.count(Severity::Error);
            logger::status_error(
                &format!(
                    "compilation failed ({}), keeping generation {}",
                    plural_count(errors, "error"),
                    self.published.snapshot().generation()
                ),
                "",
            );
            return CycleOutcome::CompileFailed { generation, errors };
        };

        log!(
            "build";
            "compilation succeeded ({} in {:.2?})",
            plural_count(compilation.source_count, "file"),
            started.elapsed()
        );

        let set = match registry::instantiate(&module) {
            Ok(set) => set,
            Err(err) => {
                logger::status_error(
                    "instantiation failed, nothing published",
                    &err.to_string(),
                );
                return CycleOutcome::InstantiationFailed {
                    generation,
                    type_name: err.type_name().to_string(),
                    reason: err.to_string(),
                };
            }
        };

        let names: Vec<String> = set.type_names().map(str::to_string).collect();
        let superseded = self.published.publish(set);
        self.toolchain.retire(generation);

        for name in &names {
            log!("load"; "loaded behaviour {}", name);
        }
        let live = format!(
            "generation {generation} live with {}",
            plural_count(names.len(), "behaviour")
        );
        let hidden = report.count(Severity::Warning);
        if hidden > 0 && !crate::core::show_warnings() {
            logger::status_warning(&format!(
                "{live} ({} hidden, `w` to show)",
                plural_count(hidden, "warning")
            ));
        } else {
            logger::status_success(&live);
        }
        debug!("load"; "generation {} superseded", superseded.generation());

        CycleOutcome::Published {
            generation,
            count: names.len(),
        }
    }
}
