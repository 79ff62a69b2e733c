//! Project configuration management for `kiln.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build] and [build.diagnostics]
//! │   ├── host       # [host]
//! │   └── watch      # [watch]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # KilnConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section               | Purpose                                      |
//! |-----------------------|----------------------------------------------|
//! | `[watch]`             | Behaviour directory, extension, debounce     |
//! | `[build]`             | rustc executable, artifacts, flags           |
//! | `[build.diagnostics]` | Warning toggle and report truncation         |
//! | `[host]`              | Frame loop rate                              |
//!
//! A missing `kiln.toml` is not an error: every key has a default, so a bare
//! directory of behaviours works out of the box.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{BuildConfig, DiagnosticsConfig, HostConfig, WatchConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config};

use crate::{
    cli::{Cli, Commands},
    debug, log,
    utils::path::normalize_path,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KilnConfig {
    /// CLI arguments reference (internal use only)
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Watched directory settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Compiler settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Frame loop settings
    #[serde(default)]
    pub host: HostConfig,
}

impl KilnConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file; the project root is the
    /// config file's parent directory, or cwd when no file exists.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        Self::load_from(cli, &cwd)
    }

    /// `load` with an explicit starting directory.
    pub fn load_from(cli: &'static Cli, cwd: &Path) -> Result<Self> {
        let (config_path, exists) = Self::resolve_config_path(cli, cwd);

        let mut config = if exists && !cli.is_init() {
            Self::from_path(&config_path)?
        } else {
            if !cli.is_init() {
                debug!("config"; "no {} found, using defaults", cli.config.display());
            }
            Self::default()
        };

        config.config_path = config_path;
        config.cli = Some(cli);
        config.finalize(cli, cwd);

        // Init writes the config file; nothing to validate yet
        if !cli.is_init() {
            config.validate()?;
        }

        Ok(config)
    }

    /// Resolve config file path based on command.
    fn resolve_config_path(cli: &Cli, cwd: &Path) -> (PathBuf, bool) {
        match &cli.command {
            Commands::Init { name } => {
                let root = name.as_ref().map_or_else(|| cwd.to_path_buf(), |n| cwd.join(n));
                let path = root.join(&cli.config);
                let exists = path.exists();
                (path, exists)
            }
            _ => match find_config_file(cwd, &cli.config) {
                Some(path) => (path, true),
                None => (cwd.join(&cli.config), false),
            },
        }
    }

    /// Finalize configuration after loading.
    fn finalize(&mut self, cli: &Cli, cwd: &Path) {
        let root = match &cli.command {
            Commands::Init { name: Some(name) } => cwd.join(name),
            Commands::Init { name: None } => cwd.to_path_buf(),
            _ => self
                .config_path
                .parent()
                .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf),
        };

        self.apply_command_options(cli);
        self.normalize_paths(&root);
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        let mut diag = ConfigDiagnostics::new();
        for field in fields {
            diag.warn(FieldPath::new("unknown"), field.clone());
        }
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        diag.print_warnings();
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Get path relative to the project root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        Self::update_option(&mut self.watch.dir, cli.dir.as_ref());

        if let Some(args) = cli.run_args() {
            crate::logger::set_verbose(args.verbose);
            Self::update_option(
                &mut self.build.diagnostics.show_warnings,
                args.warnings.as_ref(),
            );
        }

        if let Commands::Watch { fps, .. } = &cli.command {
            Self::update_option(&mut self.host.fps, fps.as_ref());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Normalize all paths relative to root directory.
    fn normalize_paths(&mut self, root: &Path) {
        let root = normalize_path(root);
        self.config_path = normalize_path(&self.config_path);

        self.watch.dir = normalize_path(&root.join(&self.watch.dir));
        self.build.out_dir = normalize_path(&root.join(&self.build.out_dir));
        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.watch.validate(&mut diag);
        self.build.validate(&mut diag);
        self.host.validate(&mut diag);

        if self.watch.dir == self.build.out_dir {
            diag.error_with_hint(
                FieldPath::new("build.out_dir"),
                "artifact directory must differ from the watched directory",
                "keep the default `.kiln`",
            );
        }

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config snippet.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> KilnConfig {
    let (parsed, ignored) = KilnConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
