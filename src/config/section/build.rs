//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! rustc = "rustc"        # Compiler executable ($RUSTC is used when unset)
//! out_dir = ".kiln"      # Artifact directory (relative to the config root)
//! opt_level = "0"        # Passed as `-C opt-level`
//! edition = "2021"       # Edition of behaviour sources
//! extra_args = []        # Appended to the rustc command line
//!
//! [build.diagnostics]
//! show_warnings = false  # Initial state of the `w` toggle
//! max_errors = 10        # Max errors to display (unset = unlimited)
//! max_warnings = 10      # Max warnings to display (unset = unlimited)
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::compiler::resolve_rustc;
use crate::config::{ConfigDiagnostics, FieldPath};

const OPT_LEVELS: &[&str] = &["0", "1", "2", "3", "s", "z"];
const EDITIONS: &[&str] = &["2015", "2018", "2021", "2024"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Compiler executable. `None` falls back to `$RUSTC`, then `rustc`.
    pub rustc: Option<String>,

    /// Where generations are compiled. Absolute after loading.
    pub out_dir: PathBuf,

    pub opt_level: String,

    pub edition: String,

    pub extra_args: Vec<String>,

    pub diagnostics: DiagnosticsConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            rustc: None,
            out_dir: ".kiln".into(),
            opt_level: "0".into(),
            edition: "2021".into(),
            extra_args: Vec::new(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl BuildConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !OPT_LEVELS.contains(&self.opt_level.as_str()) {
            diag.error_with_hint(
                FieldPath::new("build.opt_level"),
                format!("unknown opt-level `{}`", self.opt_level),
                format!("expected one of {}", OPT_LEVELS.join(", ")),
            );
        }
        if !EDITIONS.contains(&self.edition.as_str()) {
            diag.error_with_hint(
                FieldPath::new("build.edition"),
                format!("unknown edition `{}`", self.edition),
                format!("expected one of {}", EDITIONS.join(", ")),
            );
        }

        let rustc = resolve_rustc(self.rustc.as_deref());
        if which::which(&rustc).is_err() {
            diag.error_with_hint(
                FieldPath::new("build.rustc"),
                format!("`{}` not found", rustc.display()),
                "install a Rust toolchain or set `build.rustc`",
            );
        }
    }
}

/// `[build.diagnostics]`: what the compilation report shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Initial state of the runtime warning toggle.
    pub show_warnings: bool,

    /// Maximum errors to display (None = unlimited).
    pub max_errors: Option<usize>,

    /// Maximum warnings to display (None = unlimited).
    pub max_warnings: Option<usize>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            show_warnings: false,
            max_errors: Some(10),
            max_warnings: Some(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_build_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.rustc, None);
        assert_eq!(config.build.out_dir.to_str(), Some(".kiln"));
        assert_eq!(config.build.opt_level, "0");
        assert_eq!(config.build.edition, "2021");
        assert!(!config.build.diagnostics.show_warnings);
        assert_eq!(config.build.diagnostics.max_errors, Some(10));
    }

    #[test]
    fn test_build_section() {
        let config = test_parse_config(
            r#"
[build]
rustc = "/opt/rust/bin/rustc"
opt_level = "2"
extra_args = ["-C", "debuginfo=0"]

[build.diagnostics]
show_warnings = true
max_errors = 1
"#,
        );
        assert_eq!(config.build.rustc.as_deref(), Some("/opt/rust/bin/rustc"));
        assert_eq!(config.build.opt_level, "2");
        assert_eq!(config.build.extra_args, ["-C", "debuginfo=0"]);
        assert!(config.build.diagnostics.show_warnings);
        assert_eq!(config.build.diagnostics.max_errors, Some(1));
        assert_eq!(config.build.diagnostics.max_warnings, Some(10));
    }

    #[test]
    fn test_invalid_levels_reported() {
        let config = BuildConfig {
            rustc: Some("/definitely/not/a/rustc".into()),
            opt_level: "fast".into(),
            edition: "2019".into(),
            ..BuildConfig::default()
        };

        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);

        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["build.opt_level", "build.edition", "build.rustc"]);
    }
}
