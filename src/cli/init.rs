//! Project initialization.
//!
//! Writes `kiln.toml`, the behaviour directory with a sample behaviour, and
//! an ignore entry for build artifacts.

use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

use crate::config::KilnConfig;
use crate::embed::init::{SAMPLE_BEHAVIOUR, SAMPLE_FILE, config_toml};
use crate::log;

/// Initialization mode determines validation rules.
#[derive(Debug, Clone, Copy)]
pub enum InitMode {
    /// `kiln init` - initialize in current directory (no kiln.toml yet)
    CurrentDir,
    /// `kiln init <name>` - create new subdirectory (must not exist)
    NewDir,
}

pub fn new_project(config: &KilnConfig, has_name: bool) -> Result<()> {
    let root = config.get_root();
    let mode = if has_name {
        InitMode::NewDir
    } else {
        InitMode::CurrentDir
    };
    validate_target(root, &config.config_path, mode)?;

    fs::create_dir_all(&config.watch.dir)
        .with_context(|| format!("failed to create `{}`", config.watch.dir.display()))?;

    let watch_dir = relative_str(config, &config.watch.dir);
    write_file(&config.config_path, &config_toml(&watch_dir))?;

    let sample = config.watch.dir.join(SAMPLE_FILE);
    if !sample.exists() {
        write_file(&sample, SAMPLE_BEHAVIOUR)?;
    }

    write_ignore(root, &relative_str(config, &config.build.out_dir))?;

    log!("init"; "project initialized in {}", root.display());
    log!("init"; "run `kiln watch` and edit {}/{}", watch_dir, SAMPLE_FILE);
    Ok(())
}

/// Validate target directory for initialization.
///
/// # Rules
/// - `CurrentDir`: no config file yet
/// - `NewDir`: directory must not exist
fn validate_target(root: &Path, config_path: &Path, mode: InitMode) -> Result<()> {
    match mode {
        InitMode::CurrentDir => {
            if config_path.exists() {
                bail!(
                    "'{}' already exists.\n\
                     Use `kiln init <name>` to create in a new subdirectory.",
                    config_path.display()
                );
            }
        }
        InitMode::NewDir => {
            if root.exists() {
                bail!(
                    "Directory '{}' already exists.\n\
                     Choose a different name or remove the existing directory.",
                    root.display()
                );
            }
        }
    }
    Ok(())
}

/// Path relative to the project root, `/`-separated for the config file.
fn relative_str(config: &KilnConfig, path: &Path) -> String {
    config
        .root_relative(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("failed to write `{}`", path.display()))
}

/// Add the artifact directory to `.gitignore` unless already listed.
fn write_ignore(root: &Path, out_dir: &str) -> Result<()> {
    let path = root.join(".gitignore");
    let entry = format!("/{out_dir}/");
    let existing = fs::read_to_string(&path).unwrap_or_default();
    if existing.lines().any(|line| line.trim() == entry) {
        return Ok(());
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&entry);
    content.push('\n');
    write_file(&path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(root: &Path) -> KilnConfig {
        let mut config = KilnConfig::default();
        config.root = root.to_path_buf();
        config.config_path = root.join("kiln.toml");
        config.watch.dir = root.join("behaviours");
        config.build.out_dir = root.join(".kiln");
        config
    }

    #[test]
    fn test_init_writes_project() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());

        new_project(&config, false).unwrap();

        let written = fs::read_to_string(temp.path().join("kiln.toml")).unwrap();
        let parsed = crate::config::test_parse_config(&written);
        assert_eq!(parsed.watch.dir, Path::new("behaviours"));
        assert!(temp.path().join("behaviours/seek.rs").exists());
        assert_eq!(
            fs::read_to_string(temp.path().join(".gitignore")).unwrap(),
            "/.kiln/\n"
        );
    }

    #[test]
    fn test_init_refuses_existing_config() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        fs::write(&config.config_path, "").unwrap();

        assert!(new_project(&config, false).is_err());
    }

    #[test]
    fn test_init_new_dir_must_not_exist() {
        let temp = TempDir::new().unwrap();
        assert!(validate_target(temp.path(), &temp.path().join("kiln.toml"), InitMode::NewDir).is_err());

        let fresh = temp.path().join("game");
        assert!(validate_target(&fresh, &fresh.join("kiln.toml"), InitMode::NewDir).is_ok());
    }

    #[test]
    fn test_ignore_entry_appended_once() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".gitignore"), "target").unwrap();

        write_ignore(temp.path(), ".kiln").unwrap();
        write_ignore(temp.path(), ".kiln").unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join(".gitignore")).unwrap(),
            "target\n/.kiln/\n"
        );
    }
}
