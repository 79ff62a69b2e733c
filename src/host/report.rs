//! Per-cycle diagnostic report handed to the display layer.

use crate::compiler::{Diagnostic, Severity};
use crate::utils::date::DateTimeUtc;

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub generation: u64,
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
    /// When the cycle finished compiling
    pub finished_at: DateTimeUtc,
}

impl BuildReport {
    pub fn new(generation: u64, success: bool, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            generation,
            success,
            diagnostics,
            finished_at: DateTimeUtc::now(),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Diagnostics to show. Warnings are filtered out unless enabled;
    /// they never affect `success`.
    pub fn displayed(&self, show_warnings: bool) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| show_warnings || d.is_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_hidden_unless_enabled() {
        let report = BuildReport::new(
            1,
            true,
            vec![Diagnostic::warning("w1"), Diagnostic::warning("w2")],
        );

        assert!(report.success);
        assert_eq!(report.count(Severity::Warning), 2);
        assert_eq!(report.displayed(false).count(), 0);
        assert_eq!(report.displayed(true).count(), 2);
    }

    #[test]
    fn test_errors_always_displayed() {
        let report = BuildReport::new(
            2,
            false,
            vec![Diagnostic::error("e"), Diagnostic::warning("w")],
        );

        let shown: Vec<_> = report.displayed(false).map(|d| d.message.as_str()).collect();
        assert_eq!(shown, ["e"]);
        assert_eq!(report.count(Severity::Error), 1);
    }
}
