//! `rustc` backend: compiles the generated crate root to a `cdylib` and loads it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::codegen::crate_root;
use super::diagnostic::{Diagnostic, has_errors, parse_rustc_output};
use super::module::CompiledModule;
use super::{BuildOutput, CompileUnit, Toolchain};
use crate::config::BuildConfig;
use crate::debug;

/// Prefix of per-generation artifact directories (`g1`, `g2`, ...).
const GENERATION_DIR_PREFIX: char = 'g';

#[derive(Debug)]
pub struct RustcToolchain {
    rustc: PathBuf,
    out_dir: PathBuf,
    opt_level: String,
    edition: String,
    extra_args: Vec<String>,
}

impl RustcToolchain {
    /// Backend for `config`, with stale generations of a previous run removed.
    pub fn new(config: &BuildConfig) -> Self {
        let toolchain = Self {
            rustc: resolve_rustc(config.rustc.as_deref()),
            out_dir: config.out_dir.clone(),
            opt_level: config.opt_level.clone(),
            edition: config.edition.clone(),
            extra_args: config.extra_args.clone(),
        };
        toolchain.prune(|_| true);
        toolchain
    }

    fn generation_dir(&self, generation: u64) -> PathBuf {
        self.out_dir
            .join(format!("{GENERATION_DIR_PREFIX}{generation}"))
    }

    fn library_name(generation: u64) -> String {
        format!(
            "{}kiln_unit_g{generation}{}",
            std::env::consts::DLL_PREFIX,
            std::env::consts::DLL_SUFFIX
        )
    }

    fn compile(&self, unit: &CompileUnit, dir: &Path) -> BuildOutput {
        let root = dir.join("unit.rs");
        let library = dir.join(Self::library_name(unit.generation));

        let written = fs::create_dir_all(dir).and_then(|()| {
            fs::write(
                &root,
                crate_root(unit.generation, unit.sources, unit.exports),
            )
        });
        if let Err(err) = written {
            return BuildOutput::failed(Diagnostic::error(format!(
                "cannot write `{}`: {err}",
                root.display()
            )));
        }

        let mut cmd = Command::new(&self.rustc);
        cmd.arg("--edition")
            .arg(&self.edition)
            .args(["--crate-type", "cdylib"])
            .arg("--crate-name")
            .arg(format!("kiln_unit_g{}", unit.generation))
            .args(["--error-format", "json"])
            .arg("-C")
            .arg(format!("opt-level={}", self.opt_level))
            .arg("-o")
            .arg(&library)
            .args(&self.extra_args)
            .arg(&root);

        debug!("build"; "{:?}", cmd);

        let output = match cmd.output() {
            Ok(output) => output,
            Err(err) => {
                return BuildOutput::failed(Diagnostic::error(format!(
                    "failed to run `{}`: {err}",
                    self.rustc.display()
                )));
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut diagnostics = parse_rustc_output(&stderr);

        if !output.status.success() && !has_errors(&diagnostics) {
            let detail = stderr.trim();
            diagnostics.push(Diagnostic::error(if detail.is_empty() {
                format!("`{}` exited with {}", self.rustc.display(), output.status)
            } else {
                format!("`{}` exited with {}: {detail}", self.rustc.display(), output.status)
            }));
        }

        if has_errors(&diagnostics) {
            return BuildOutput {
                module: None,
                diagnostics,
            };
        }

        match CompiledModule::load(unit.generation, &library) {
            Ok(module) => BuildOutput {
                module: Some(module),
                diagnostics,
            },
            Err(err) => {
                diagnostics.push(Diagnostic::error(err.to_string()));
                BuildOutput {
                    module: None,
                    diagnostics,
                }
            }
        }
    }

    /// Remove generation directories matching `doomed`, best-effort.
    fn prune(&self, doomed: impl Fn(u64) -> bool) {
        let Ok(entries) = fs::read_dir(&self.out_dir) else {
            return;
        };
        for entry in entries.filter_map(Result::ok) {
            let name = entry.file_name();
            let Some(generation) = name
                .to_str()
                .and_then(|n| n.strip_prefix(GENERATION_DIR_PREFIX))
                .and_then(|n| n.parse::<u64>().ok())
            else {
                continue;
            };
            if doomed(generation) {
                // Mapped libraries may refuse removal on some platforms
                let _ = fs::remove_dir_all(entry.path());
            }
        }
    }
}

impl Toolchain for RustcToolchain {
    fn build(&self, unit: &CompileUnit) -> BuildOutput {
        let dir = self.generation_dir(unit.generation);
        let output = self.compile(unit, &dir);
        if output.module.is_none() {
            let _ = fs::remove_dir_all(&dir);
        }
        output
    }

    fn retire(&self, live_generation: u64) {
        self.prune(|generation| generation < live_generation);
    }
}

/// Compiler executable: configured value, then `$RUSTC`, then `rustc` on `PATH`.
///
/// Falls back to the bare name when lookup fails; spawning then reports it.
pub fn resolve_rustc(configured: Option<&str>) -> PathBuf {
    let name = configured
        .map(|c| shellexpand::tilde(c).into_owned())
        .or_else(|| std::env::var("RUSTC").ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "rustc".to_string());
    which::which(&name).unwrap_or_else(|_| PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::host::abi::advance_frame;
    use tempfile::TempDir;

    fn rustc_available() -> bool {
        which::which(resolve_rustc(None)).is_ok()
    }

    fn toolchain(out_dir: &Path) -> RustcToolchain {
        RustcToolchain::new(&BuildConfig {
            out_dir: out_dir.to_path_buf(),
            ..BuildConfig::default()
        })
    }

    const COUNTER: &str = r#"
use crate::prelude::*;

#[derive(Default)]
pub struct Counter {
    ticks: u64,
}

impl Behaviour for Counter {
    fn initialize(&mut self) {
        host::log("counter ready");
    }

    fn update(&mut self) {
        self.ticks += 1;
        if self.ticks == 2 {
            panic!("second tick");
        }
    }
}
"#;

    #[test]
    fn test_compiles_loads_and_isolates_panics() {
        if !rustc_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("counter.rs"), COUNTER).unwrap();

        let tc = toolchain(&temp.path().join("out"));
        let result = compile(&tc, &src, "rs", 1);
        assert!(!has_errors(&result.diagnostics), "{:?}", result.diagnostics);

        let module = result.module.unwrap();
        assert!(module.library_path().unwrap().starts_with(temp.path()));
        let export = &module.exports()[0];
        assert_eq!(export.name, "counter::Counter");

        let mut instance = export.construct().unwrap();
        instance.initialize().unwrap();
        advance_frame(0.016);
        instance.update().unwrap();
        assert!(instance.update().is_err());
    }

    #[test]
    fn test_compile_error_reports_location_and_cleans_up() {
        if !rustc_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(
            src.join("broken.rs"),
            "pub fn speed() -> f32 {\n    missing_value\n}\n",
        )
        .unwrap();

        let out = temp.path().join("out");
        let tc = toolchain(&out);
        let result = compile(&tc, &src, "rs", 4);

        assert!(result.module.is_none());
        let error = result.diagnostics.iter().find(|d| d.is_error()).unwrap();
        let loc = error.location.as_ref().unwrap();
        assert!(loc.file.ends_with("broken.rs"));
        assert_eq!(loc.line, 2);
        assert!(!out.join("g4").exists());
    }

    #[test]
    fn test_missing_compiler_is_a_diagnostic() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir(&src).unwrap();

        let tc = RustcToolchain::new(&BuildConfig {
            rustc: Some("/definitely/not/a/rustc".into()),
            out_dir: temp.path().join("out"),
            ..BuildConfig::default()
        });
        let result = compile(&tc, &src, "rs", 1);

        assert!(result.module.is_none());
        assert!(result.diagnostics[0].message.contains("failed to run"));
    }

    #[test]
    fn test_retire_prunes_older_generations() {
        let temp = TempDir::new().unwrap();
        let tc = toolchain(temp.path());
        for n in [1, 2, 3] {
            fs::create_dir_all(tc.generation_dir(n)).unwrap();
        }
        fs::create_dir_all(temp.path().join("keep")).unwrap();

        tc.retire(3);
        assert!(!tc.generation_dir(1).exists());
        assert!(!tc.generation_dir(2).exists());
        assert!(tc.generation_dir(3).exists());
        assert!(temp.path().join("keep").exists());
    }

    #[test]
    fn test_resolve_rustc_prefers_config() {
        let resolved = resolve_rustc(Some("/opt/custom/rustc"));
        assert_eq!(resolved, PathBuf::from("/opt/custom/rustc"));
    }
}
