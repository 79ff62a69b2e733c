//! Compilation pipeline: sources in, `CompiledModule` plus diagnostics out.
//!
//! # Module Structure
//!
//! - `source` - reads the watched directory at cycle start
//! - `scan` - finds behaviour types for the registry table
//! - `codegen` - renders the crate root
//! - `rustc` - compiles and loads the generated library
//! - `diagnostic` - compiler messages
//! - `module` - loaded modules and their exported types

pub mod codegen;
pub mod diagnostic;
pub mod module;
pub mod rustc;
pub mod scan;
pub mod source;

#[cfg(test)]
pub mod testing;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use diagnostic::{Diagnostic, Location, Severity, has_errors};
pub use module::{CompiledModule, ExportedType, Factory, LoadError};
pub use rustc::{RustcToolchain, resolve_rustc};
pub use scan::ExportSpec;
pub use source::SourceUnit;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("cannot read `{path}`: {1}", path = .0.display())]
    Io(PathBuf, #[source] std::io::Error),
}

/// Everything a backend needs for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct CompileUnit<'a> {
    pub generation: u64,
    pub sources: &'a [SourceUnit],
    /// Registry table rows in discovery order
    pub exports: &'a [ExportSpec],
}

/// What a backend produced.
#[derive(Debug, Default)]
pub struct BuildOutput {
    pub module: Option<CompiledModule>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildOutput {
    pub fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            module: None,
            diagnostics: vec![diagnostic],
        }
    }
}

/// Turns a compile unit into a loadable module.
pub trait Toolchain: Send + Sync {
    fn build(&self, unit: &CompileUnit) -> BuildOutput;

    /// Called after `live_generation` is published; older artifacts may go.
    fn retire(&self, _live_generation: u64) {}
}

/// Result of the whole pipeline.
#[derive(Debug, Default)]
pub struct Compilation {
    /// Present only when no diagnostic is an error
    pub module: Option<CompiledModule>,
    pub diagnostics: Vec<Diagnostic>,
    pub source_count: usize,
}

/// Run one compile cycle over `dir`.
///
/// All-or-nothing: any error diagnostic discards the module.
pub fn compile(
    toolchain: &dyn Toolchain,
    dir: &Path,
    extension: &str,
    generation: u64,
) -> Compilation {
    let sources = match source::collect_sources(dir, extension) {
        Ok(sources) => sources,
        Err(err) => {
            return Compilation {
                diagnostics: vec![Diagnostic::error(err.to_string())],
                ..Compilation::default()
            };
        }
    };

    let scan = scan::scan_sources(&sources);
    let mut diagnostics = scan.diagnostics;
    if has_errors(&diagnostics) {
        return Compilation {
            module: None,
            diagnostics,
            source_count: sources.len(),
        };
    }

    let output = toolchain.build(&CompileUnit {
        generation,
        sources: &sources,
        exports: &scan.exports,
    });
    diagnostics.extend(output.diagnostics);

    let module = output.module.filter(|_| !has_errors(&diagnostics));
    Compilation {
        module,
        diagnostics,
        source_count: sources.len(),
    }
}
