//! Embedded static resources for kiln.
//!
//! # Module Structure
//!
//! - `plugin` - Source injected into every generated behaviour crate
//! - `init` - Files written by `kiln init`

pub mod plugin {
    /// `prelude`, `host` and the hidden ABI glue, mounted at the crate root.
    pub const PRELUDE: &str = include_str!("plugin/prelude.rs");

    /// Exported entry symbol of every generated library.
    pub const ENTRY_SYMBOL: &str = "kiln_module";
}

pub mod init {
    const CONFIG_TOML: &str = include_str!("init/kiln.toml");

    /// `kiln.toml` for a project watching `watch_dir` (root-relative, `/`-separated).
    pub fn config_toml(watch_dir: &str) -> String {
        CONFIG_TOML.replace("__WATCH_DIR__", watch_dir)
    }

    /// Sample behaviour written next to a fresh config.
    pub const SAMPLE_BEHAVIOUR: &str = include_str!("../../demos/behaviours/seek.rs");
    pub const SAMPLE_FILE: &str = "seek.rs";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_template_renders_dir() {
        let toml = init::config_toml("agents");
        assert!(toml.contains(r#"dir = "agents""#));
        assert!(!toml.contains("__WATCH_DIR__"));
    }

    #[test]
    fn test_prelude_declares_capability_surface() {
        assert!(plugin::PRELUDE.contains("pub trait Behaviour"));
        assert!(plugin::PRELUDE.contains("pub mod host"));
        assert!(plugin::PRELUDE.contains("pub const ABI_VERSION: u32 = 1;"));
    }

    #[test]
    fn test_sample_behaviour_is_discoverable() {
        assert!(init::SAMPLE_BEHAVIOUR.contains("impl Behaviour for Seek"));
    }
}
