//! Source collection for one compile cycle.
//!
//! Every cycle reads the whole directory again: plugins may reference each
//! other, so the unit is always compiled as a whole.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use super::CompileError;
use crate::utils::is_temp_file;

/// Names the generated crate root already uses.
const RESERVED_MODULES: &[&str] = &["prelude", "host", "__kiln"];

/// Strict and reserved keywords; neither can name a module.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// One plugin source file, read at cycle start.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: PathBuf,
    /// Module the file is mounted as in the generated crate
    pub module_name: String,
    pub content: String,
}

/// Read every `*.{extension}` file directly under `dir`, sorted by path.
///
/// Sorting fixes discovery order for the whole cycle.
pub fn collect_sources(dir: &Path, extension: &str) -> Result<Vec<SourceUnit>, CompileError> {
    let entries = fs::read_dir(dir).map_err(|err| CompileError::Io(dir.to_path_buf(), err))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, extension) && !is_temp_file(path))
        .collect();
    paths.sort();

    let mut taken = FxHashSet::default();
    let mut units = Vec::with_capacity(paths.len());
    for path in paths {
        let content =
            fs::read_to_string(&path).map_err(|err| CompileError::Io(path.clone(), err))?;
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unit");
        let module_name = unique_module_name(stem, &mut taken);
        units.push(SourceUnit {
            path,
            module_name,
            content,
        });
    }

    Ok(units)
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Turn a file stem into a Rust module identifier.
///
/// `zig-zag flee` -> `zig_zag_flee`, `2d` -> `_2d`, `type` -> `_type`
pub fn sanitize_module_name(stem: &str) -> String {
    let mut name: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() {
        name.push_str("unit");
    }
    if name.starts_with(|c: char| c.is_ascii_digit())
        || KEYWORDS.contains(&name.as_str())
        || name == "_"
    {
        name.insert(0, '_');
    }
    if RESERVED_MODULES.contains(&name.as_str()) {
        name.push_str("_mod");
    }
    name
}

fn unique_module_name(stem: &str, taken: &mut FxHashSet<String>) -> String {
    let base = sanitize_module_name(stem);
    let mut name = base.clone();
    let mut n = 2;
    while !taken.insert(name.clone()) {
        name = format!("{base}_{n}");
        n += 1;
    }
    name
}
