//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Hot-reload host for Rust behaviour plugins
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Behaviour directory (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    /// Config file path (default: kiln.toml)
    #[arg(short = 'C', long, default_value = "kiln.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create kiln.toml and a sample behaviour
    #[command(visible_alias = "i")]
    Init {
        /// Project directory (relative to current directory)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        name: Option<PathBuf>,
    },

    /// Compile the behaviour directory once and report
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        run_args: RunArgs,

        /// Run this many frames against the built set before exiting
        #[arg(short = 'n', long, default_value_t = 0)]
        frames: u64,
    },

    /// Watch the behaviour directory and hot-reload on change
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        run_args: RunArgs,

        /// Frame loop rate
        #[arg(short, long)]
        fps: Option<u32>,
    },
}

/// Shared arguments for Build and Watch commands
#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Show compiler warnings (toggle with `w` while watching)
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub warnings: Option<bool>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }

    pub fn run_args(&self) -> Option<&RunArgs> {
        match &self.command {
            Commands::Build { run_args, .. } | Commands::Watch { run_args, .. } => Some(run_args),
            Commands::Init { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kiln").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_watch_alias_and_flags() {
        let cli = parse(&["w", "--fps", "30", "-w", "-V"]);
        match &cli.command {
            Commands::Watch { run_args, fps } => {
                assert_eq!(*fps, Some(30));
                assert_eq!(run_args.warnings, Some(true));
                assert!(run_args.verbose);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("kiln.toml"));
    }

    #[test]
    fn test_warnings_explicit_false() {
        let cli = parse(&["build", "--warnings", "false"]);
        assert_eq!(cli.run_args().unwrap().warnings, Some(false));
    }

    #[test]
    fn test_global_options() {
        let cli = parse(&["-d", "scripts", "-C", "game.toml", "build", "-n", "5"]);
        assert_eq!(cli.dir, Some(PathBuf::from("scripts")));
        assert_eq!(cli.config, PathBuf::from("game.toml"));
        assert!(matches!(cli.command, Commands::Build { frames: 5, .. }));
    }

    #[test]
    fn test_init_has_no_run_args() {
        let cli = parse(&["init", "game"]);
        assert!(cli.is_init());
        assert!(cli.run_args().is_none());
    }
}
