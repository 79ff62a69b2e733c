//! Kiln - hot-reload host for Rust behaviour plugins.

mod actor;
mod cli;
mod compiler;
mod config;
mod core;
mod embed;
mod host;
mod logger;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{KilnConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(KilnConfig::load(cli)?);

    match &cli.command {
        Commands::Init { name } => cli::init::new_project(&config, name.is_some()),
        Commands::Build { frames, .. } => cli::build::build_once(&config, *frames),
        Commands::Watch { .. } => cli::watch::watch(config),
    }
}
