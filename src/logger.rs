//! Logging utilities with colored output and status display.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `WatchStatus` for the single-block cycle status in watch mode
//! - `print_report` for the per-cycle compilation result
//!
//! # Example
//!
//! ```ignore
//! log!("build"; "compiling {} files", count);
//! debug!("watch"; "event: {:?}", kind);
//! status_success("generation 3 live with 2 behaviours");
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::{OwoColorize, Stream::Stdout};
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    path::Path,
    sync::LazyLock,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::compiler::{Diagnostic, Severity};
use crate::config::DiagnosticsConfig;
use crate::host::BuildReport;
use crate::utils::plural_count;

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    write_lines(&[format!("{prefix} {message}")]);
}

/// Write lines below the status block; the block is not overwritten later.
fn write_lines(lines: &[String]) {
    // Lock order: status, then stdout
    let mut status = WATCH_STATUS.lock();
    let mut stdout = stdout().lock();

    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    for line in lines {
        writeln!(stdout, "{line}").ok();
    }
    stdout.flush().ok();

    status.last_lines = 0;
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "build" => prefix.bright_blue().bold().to_string(),
        "watch" | "load" => prefix.bright_green().bold().to_string(),
        "plugin" => prefix.bright_magenta().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Watch Status (single block with overwrite)
// ============================================================================

/// Single-block status display for watch mode
///
/// Each cycle outcome overwrites the previous one, keeping the terminal
/// clean. Any `log!` line printed in between pins the previous block.
///
/// # Example
///
/// ```ignore
/// let mut status = WatchStatus::new();
/// status.success("generation 2 live with 1 behaviour");
/// status.error("compilation failed (1 error), keeping generation 2", "");
/// ```
pub struct WatchStatus {
    /// Lines of previous output to clear
    last_lines: usize,
}

/// Global watch status display shared by the host and the console.
static WATCH_STATUS: LazyLock<Mutex<WatchStatus>> =
    LazyLock::new(|| Mutex::new(WatchStatus::new()));

impl WatchStatus {
    pub const fn new() -> Self {
        Self { last_lines: 0 }
    }

    /// Display success message (✓ prefix, green).
    pub fn success(&mut self, message: &str) {
        self.display(format!("{}", "✓".green()), message);
    }

    /// Display error message (✗ prefix, red) with optional detail.
    pub fn error(&mut self, summary: &str, detail: &str) {
        let message = if detail.is_empty() {
            summary.to_string()
        } else {
            format!("{summary}\n{detail}")
        };
        self.display(format!("{}", "✗".red()), &message);
    }

    /// Display warning message (⚠ prefix, yellow) with detail.
    pub fn warning(&mut self, detail: &str) {
        self.display(format!("{}", "⚠".yellow()), detail);
    }

    fn display(&mut self, symbol: String, message: &str) {
        let mut stdout = stdout().lock();

        if self.last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let lines = self.last_lines as u16;
            execute!(stdout, cursor::MoveUp(lines)).ok();
            execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        }

        writeln!(stdout, "{}", status_line(&clock(), &symbol, message)).ok();
        stdout.flush().ok();

        self.last_lines = line_count(message);
    }
}

fn clock() -> String {
    crate::utils::date::DateTimeUtc::now().to_clock()
}

fn status_line(clock: &str, symbol: &str, message: &str) -> String {
    let timestamp = format!("[{clock}]");
    let timestamp = timestamp.if_supports_color(Stdout, |t| t.dimmed());
    if symbol.is_empty() {
        format!("{timestamp} {message}")
    } else {
        format!("{timestamp} {symbol} {message}")
    }
}

/// Terminal lines taken by `message`.
fn line_count(message: &str) -> usize {
    message.matches('\n').count() + 1
}

/// Global watch status: success
pub fn status_success(message: &str) {
    WATCH_STATUS.lock().success(message);
}

/// Global watch status: error
pub fn status_error(summary: &str, detail: &str) {
    WATCH_STATUS.lock().error(summary, detail);
}

/// Global watch status: warning
pub fn status_warning(detail: &str) {
    WATCH_STATUS.lock().warning(detail);
}

// ============================================================================
// Compilation report
// ============================================================================

/// Print the result of one compile cycle.
///
/// Warnings appear only while the runtime toggle is on; truncation limits
/// come from `[build.diagnostics]`.
pub fn print_report(report: &BuildReport, root: &Path) {
    let config = crate::config::cfg();
    let lines = render_report(
        report,
        root,
        crate::core::show_warnings(),
        &config.build.diagnostics,
        is_verbose(),
    );
    write_lines(&lines);
}

/// Lines `print_report` writes: the timestamped header, then diagnostics.
///
/// Colors follow the stdout color choice (`--color`).
pub fn render_report(
    report: &BuildReport,
    root: &Path,
    show_warnings: bool,
    limits: &DiagnosticsConfig,
    verbose: bool,
) -> Vec<String> {
    let errors: Vec<&Diagnostic> = report.displayed(false).collect();
    let warnings: Vec<&Diagnostic> = report
        .displayed(show_warnings)
        .filter(|d| !d.is_error())
        .collect();

    let header = format!(
        "Compilation result (UTC {})",
        report.finished_at.to_timestamp()
    );
    let mut lines = vec![header.if_supports_color(Stdout, |t| t.bold()).to_string()];
    render_group(&mut lines, &errors, limits.max_errors, root, verbose);
    render_group(&mut lines, &warnings, limits.max_warnings, root, verbose);
    lines
}

fn render_group(
    lines: &mut Vec<String>,
    diagnostics: &[&Diagnostic],
    limit: Option<usize>,
    root: &Path,
    verbose: bool,
) {
    let shown = limit.unwrap_or(usize::MAX).min(diagnostics.len());

    for diag in &diagnostics[..shown] {
        let text = diag.display_in(root);
        lines.push(match diag.severity {
            Severity::Error => text.if_supports_color(Stdout, |t| t.red()).to_string(),
            Severity::Warning => text.if_supports_color(Stdout, |t| t.yellow()).to_string(),
        });
        if verbose && let Some(rendered) = &diag.rendered {
            lines.extend(
                rendered
                    .trim_end()
                    .lines()
                    .map(|l| l.if_supports_color(Stdout, |t| t.dimmed()).to_string()),
            );
        }
    }

    let hidden = diagnostics.len() - shown;
    if hidden > 0 {
        let noun = diagnostics[0].severity.label();
        let summary = format!("... and {} more", plural_count(hidden, noun));
        lines.push(summary.if_supports_color(Stdout, |t| t.dimmed()).to_string());
    }
}

// ============================================================================
// Tests
// ============================================================================
