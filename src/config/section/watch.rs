//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! dir = "behaviours"    # Watched directory (relative to the config root)
//! extension = "rs"      # Source file extension
//! debounce_ms = 200     # Quiet window before a rebuild starts
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directory holding behaviour sources. Absolute after loading.
    pub dir: PathBuf,

    /// Extension of source files, without the dot.
    pub extension: String,

    /// Debounce window in milliseconds.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            dir: "behaviours".into(),
            extension: "rs".into(),
            debounce_ms: 200,
        }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let ext = &self.extension;
        if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
            diag.error_with_hint(
                FieldPath::new("watch.extension"),
                format!("invalid extension `{ext}`"),
                "use a bare extension such as \"rs\"",
            );
        }
        if self.debounce_ms == 0 {
            diag.error(
                FieldPath::new("watch.debounce_ms"),
                "debounce window must be at least 1 ms",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_watch_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.watch.dir.to_str(), Some("behaviours"));
        assert_eq!(config.watch.extension, "rs");
        assert_eq!(config.watch.debounce().as_millis(), 200);
    }

    #[test]
    fn test_watch_custom() {
        let config = test_parse_config(
            "[watch]\ndir = \"scripts\"\nextension = \"kiln\"\ndebounce_ms = 50",
        );
        assert_eq!(config.watch.dir.to_str(), Some("scripts"));
        assert_eq!(config.watch.extension, "kiln");
        assert_eq!(config.watch.debounce_ms, 50);
    }

    #[test]
    fn test_watch_validation() {
        let config = test_parse_config("[watch]\nextension = \".rs\"\ndebounce_ms = 0");

        let mut diag = crate::config::ConfigDiagnostics::new();
        config.watch.validate(&mut diag);
        assert_eq!(diag.errors().len(), 2);
    }
}
