//! Command-line interface module.

mod args;
pub mod build;
pub mod console;
pub mod init;
pub mod watch;

pub use args::{Cli, Commands};
