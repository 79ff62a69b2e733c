//! Compile diagnostics and `rustc --error-format=json` decoding.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Diagnostic severity. Only `Error` blocks a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// Source position of a diagnostic (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

/// A single compiler message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Lint or error code (`E0425`, `unused_variables`)
    pub code: Option<String>,
    pub message: String,
    pub location: Option<Location>,
    /// Full compiler rendering with source snippet, when available
    pub rendered: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            location: None,
            rendered: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(message)
        }
    }

    pub fn at(mut self, file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        self.location = Some(Location {
            file: file.into(),
            line,
            column,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// One-line form with the location shown relative to `root`.
    pub fn display_in(&self, root: &Path) -> String {
        let head = match &self.code {
            Some(code) => format!("{}[{}]", self.severity.label(), code),
            None => self.severity.label().to_string(),
        };
        match &self.location {
            Some(loc) => format!(
                "{}:{}:{}: {}: {}",
                crate::utils::display_relative(&loc.file, root),
                loc.line,
                loc.column,
                head,
                self.message
            ),
            None => format!("{}: {}", head, self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_in(Path::new("")))
    }
}

/// Whether any diagnostic blocks the build.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

// ============================================================================
// rustc JSON
// ============================================================================

#[derive(Deserialize)]
struct RustcMessage {
    #[serde(rename = "$message_type", default)]
    message_type: Option<String>,
    message: String,
    #[serde(default)]
    code: Option<RustcCode>,
    level: String,
    #[serde(default)]
    spans: Vec<RustcSpan>,
    #[serde(default)]
    rendered: Option<String>,
}

#[derive(Deserialize)]
struct RustcCode {
    code: String,
}

#[derive(Deserialize)]
struct RustcSpan {
    file_name: String,
    line_start: usize,
    column_start: usize,
    is_primary: bool,
}

/// Decode rustc's stderr (one JSON object per line).
///
/// Lines that are not JSON diagnostics are skipped; callers decide what a
/// failing exit status without any error diagnostic means.
pub fn parse_rustc_output(stderr: &str) -> Vec<Diagnostic> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .filter_map(|line| serde_json::from_str::<RustcMessage>(line).ok())
        .filter_map(into_diagnostic)
        .collect()
}

fn into_diagnostic(msg: RustcMessage) -> Option<Diagnostic> {
    if msg.message_type.as_deref().is_some_and(|t| t != "diagnostic") {
        return None;
    }

    let severity = match msg.level.as_str() {
        "error" | "error: internal compiler error" => Severity::Error,
        "warning" => Severity::Warning,
        _ => return None,
    };

    // Trailing summaries ("aborting due to 2 previous errors", "2 warnings emitted")
    if msg.spans.is_empty()
        && (msg.message.starts_with("aborting due to") || msg.message.ends_with("emitted"))
    {
        return None;
    }

    let location = msg
        .spans
        .iter()
        .find(|span| span.is_primary)
        .or_else(|| msg.spans.first())
        .map(|span| Location {
            file: PathBuf::from(&span.file_name),
            line: span.line_start,
            column: span.column_start,
        });

    Some(Diagnostic {
        severity,
        code: msg.code.map(|c| c.code),
        message: msg.message,
        location,
        rendered: msg.rendered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNRESOLVED: &str = r#"{"$message_type":"diagnostic","message":"cannot find value `speed` in this scope","code":{"code":"E0425","explanation":null},"level":"error","spans":[{"file_name":"/w/seek.rs","byte_start":10,"byte_end":15,"line_start":12,"line_end":12,"column_start":9,"column_end":14,"is_primary":true,"text":[],"label":null,"suggested_replacement":null,"suggestion_applicability":null,"expansion":null}],"children":[],"rendered":"error[E0425]: cannot find value `speed` in this scope\n"}"#;

    const UNUSED: &str = r#"{"$message_type":"diagnostic","message":"unused variable: `x`","code":{"code":"unused_variables","explanation":null},"level":"warning","spans":[{"file_name":"/w/wander.rs","byte_start":0,"byte_end":1,"line_start":3,"line_end":3,"column_start":13,"column_end":14,"is_primary":true,"text":[],"label":null,"suggested_replacement":null,"suggestion_applicability":null,"expansion":null}],"children":[],"rendered":"warning: unused variable: `x`\n"}"#;

    const ABORTING: &str = r#"{"$message_type":"diagnostic","message":"aborting due to 1 previous error","code":null,"level":"error","spans":[],"children":[],"rendered":"error: aborting due to 1 previous error\n\n"}"#;

    const EXPLAIN: &str = r#"{"$message_type":"diagnostic","message":"For more information about this error, try `rustc --explain E0425`.","code":null,"level":"failure-note","spans":[],"children":[],"rendered":"For more information about this error, try `rustc --explain E0425`.\n"}"#;

    #[test]
    fn test_parse_error_with_location() {
        let diags = parse_rustc_output(UNRESOLVED);
        assert_eq!(diags.len(), 1);

        let diag = &diags[0];
        assert!(diag.is_error());
        assert_eq!(diag.code.as_deref(), Some("E0425"));
        let loc = diag.location.as_ref().unwrap();
        assert_eq!(loc.file, PathBuf::from("/w/seek.rs"));
        assert_eq!((loc.line, loc.column), (12, 9));
    }

    #[test]
    fn test_parse_skips_summaries_and_notes() {
        let stderr = [UNUSED, UNRESOLVED, ABORTING, EXPLAIN].join("\n");
        let diags = parse_rustc_output(&stderr);

        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[1].severity, Severity::Error);
    }

    #[test]
    fn test_parse_ignores_plain_text() {
        let stderr = format!("note: some linker chatter\n{UNUSED}\n\n");
        let diags = parse_rustc_output(&stderr);
        assert_eq!(diags.len(), 1);
        assert!(!has_errors(&diags));
    }

    #[test]
    fn test_display_relative_location() {
        let diag = parse_rustc_output(UNRESOLVED).remove(0);
        assert_eq!(
            diag.display_in(Path::new("/w")),
            "seek.rs:12:9: error[E0425]: cannot find value `speed` in this scope"
        );
    }

    #[test]
    fn test_display_without_location() {
        let diag = Diagnostic::warning("nothing to see");
        assert_eq!(diag.to_string(), "warning: nothing to see");
    }
}
