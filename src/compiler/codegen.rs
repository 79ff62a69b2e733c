//! Crate root generation.
//!
//! The generated root mounts the prelude, one module per source file, and the
//! exported entry point carrying the registry table.

use std::fmt::Write;

use super::scan::ExportSpec;
use super::source::SourceUnit;
use crate::embed::plugin::{ENTRY_SYMBOL, PRELUDE};

/// Render `unit.rs` for one compile cycle.
pub fn crate_root(generation: u64, sources: &[SourceUnit], exports: &[ExportSpec]) -> String {
    let mut out = String::with_capacity(PRELUDE.len() + 256 * (sources.len() + 1));

    // `write!` into a String cannot fail
    let _ = writeln!(out, "// Generated by kiln (generation {generation}). Do not edit.\n");
    out.push_str(PRELUDE);

    out.push('\n');
    for unit in sources {
        let _ = writeln!(
            out,
            "#[path = {:?}]\npub mod {};",
            unit.path.to_string_lossy(),
            unit.module_name
        );
    }

    let _ = writeln!(
        out,
        "\n#[unsafe(no_mangle)]\npub extern \"C\" fn {ENTRY_SYMBOL}(host: *const host::HostVTable) -> *const __kiln::ModuleDescriptor {{"
    );
    out.push_str("    __kiln::describe(host, vec![\n");
    for export in exports {
        let _ = writeln!(
            out,
            "        __kiln::entry({:?}, __kiln::create::<crate::{}>),",
            export.path(),
            export.path()
        );
    }
    out.push_str("    ])\n}\n");

    out
}
