//! In-process toolchain for deterministic tests.
//!
//! Sources are parsed with `syn` instead of compiled. A file that does not
//! parse, or that contains `compile_error!`, yields an error diagnostic; each
//! `// warn: <text>` line yields a warning. Every exported type becomes a
//! [`Probe`] that records its lifecycle in a shared journal.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::{
    BuildOutput, CompileUnit, CompiledModule, Diagnostic, ExportedType, Factory, Toolchain,
};
use crate::host::{Behaviour, PluginError};

pub type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
pub struct FakeToolchain {
    delay: Duration,
    builds: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    retired: AtomicU64,
    failing_construct: Mutex<FxHashSet<String>>,
    failing_initialize: Mutex<FxHashSet<String>>,
    journal: Journal,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every build take at least `delay`.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn fail_construct(&self, type_path: &str) {
        self.failing_construct.lock().insert(type_path.to_string());
    }

    pub fn fail_initialize(&self, type_path: &str) {
        self.failing_initialize.lock().insert(type_path.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing_construct.lock().clear();
        self.failing_initialize.lock().clear();
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Highest number of builds observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn retired(&self) -> u64 {
        self.retired.load(Ordering::SeqCst)
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().clone()
    }

    /// Journal entries starting with `prefix`.
    pub fn journal_matching(&self, prefix: &str) -> Vec<String> {
        self.journal
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn export(&self, name: String, generation: u64) -> ExportedType {
        let construct_fails = self.failing_construct.lock().contains(&name);
        let initialize_fails = self.failing_initialize.lock().contains(&name);
        let journal = Arc::clone(&self.journal);
        let label = name.clone();

        let factory: Factory = Arc::new(move || {
            if construct_fails {
                return Err(PluginError::ConstructPanicked);
            }
            journal.lock().push(format!("new {label} g{generation}"));
            Ok(Box::new(Probe {
                name: label.clone(),
                generation,
                initialize_fails,
                journal: Arc::clone(&journal),
            }) as Box<dyn Behaviour>)
        });
        ExportedType::new(name, factory)
    }

    fn check(unit: &CompileUnit) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for source in unit.sources {
            if let Err(err) = syn::parse_file(&source.content) {
                let start = err.span().start();
                diagnostics.push(
                    Diagnostic::error(err.to_string()).at(&source.path, start.line, start.column + 1),
                );
                continue;
            }
            for (index, line) in source.content.lines().enumerate() {
                if line.contains("compile_error!") {
                    diagnostics.push(
                        Diagnostic::error("compile_error! invoked").at(&source.path, index + 1, 1),
                    );
                }
                if let Some(text) = line.trim().strip_prefix("// warn:") {
                    diagnostics
                        .push(Diagnostic::warning(text.trim()).at(&source.path, index + 1, 1));
                }
            }
        }
        diagnostics
    }
}

impl Toolchain for FakeToolchain {
    fn build(&self, unit: &CompileUnit) -> BuildOutput {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.builds.fetch_add(1, Ordering::SeqCst);

        let diagnostics = Self::check(unit);
        let module = (!diagnostics.iter().any(Diagnostic::is_error)).then(|| {
            let exports = unit
                .exports
                .iter()
                .map(|spec| self.export(spec.path(), unit.generation))
                .collect();
            CompiledModule::from_factories(unit.generation, exports)
        });

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        BuildOutput {
            module,
            diagnostics,
        }
    }

    fn retire(&self, live_generation: u64) {
        self.retired.store(live_generation, Ordering::SeqCst);
    }
}

/// Behaviour instance produced by [`FakeToolchain`].
pub struct Probe {
    name: String,
    generation: u64,
    initialize_fails: bool,
    journal: Journal,
}

impl Behaviour for Probe {
    fn initialize(&mut self) -> Result<(), PluginError> {
        self.journal
            .lock()
            .push(format!("init {} g{}", self.name, self.generation));
        if self.initialize_fails {
            return Err(PluginError::Failed("refused to initialize".into()));
        }
        Ok(())
    }

    fn update(&mut self) -> Result<(), PluginError> {
        self.journal
            .lock()
            .push(format!("update {} g{}", self.name, self.generation));
        Ok(())
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.journal
            .lock()
            .push(format!("drop {} g{}", self.name, self.generation));
    }
}

/// Behaviour source declaring one `pub` type named `name`.
pub fn behaviour_source(name: &str) -> String {
    format!(
        "use crate::prelude::*;\n\n#[derive(Default)]\npub struct {name};\n\nimpl Behaviour for {name} {{\n    fn update(&mut self) {{}}\n}}\n"
    )
}
