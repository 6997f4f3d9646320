//! Style pollution checks and the strict-mode decision
//!
//! A run moves through a fixed sequence of phases:
//!
//! ```text
//! Open -> Writing -> StyleCheck -> Pass | StrictFail -> Closed
//! ```
//!
//! Degradations found while writing are only collected. They are judged
//! once, in `StyleCheck`, and become errors (strict) or warnings (lenient).
//! A failed strict run still goes through `Closed`.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::{ComposeError, Result};

/// Phase of a composition run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Document opened, baseline styles captured
    Open,
    /// Buffer flushes and table writes
    Writing,
    /// Final snapshot and diff
    StyleCheck,
    /// No blocking degradation
    Pass,
    /// Strict mode found a degradation
    StrictFail,
    /// Document saved and closed, or abandoned after an error
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Open => "OPEN",
            Phase::Writing => "WRITING",
            Phase::StyleCheck => "STYLE_CHECK",
            Phase::Pass => "PASS",
            Phase::StrictFail => "STRICT_FAIL",
            Phase::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

impl Phase {
    /// Whether `self -> next` is a legal transition
    pub fn can_advance_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Open, Writing)
                | (Writing, StyleCheck)
                | (StyleCheck, Pass)
                | (StyleCheck, StrictFail)
                | (Pass, Closed)
                | (StrictFail, Closed)
                | (Open, Closed)
                | (Writing, Closed)
                | (StyleCheck, Closed)
        )
    }
}

/// Tracks the phase of one run
#[derive(Debug, Clone)]
pub struct RunState {
    phase: Phase,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self { phase: Phase::Open }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to `next`, rejecting out-of-order transitions
    pub fn advance(&mut self, next: Phase) -> Result<()> {
        if !self.phase.can_advance_to(next) {
            return Err(ComposeError::Phase {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }
}

/// Difference between the baseline and final style inventories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollutionReport {
    /// Styles present after writing but not before (sorted)
    pub polluting_styles: Vec<String>,
    /// Baseline styles never applied (baseline order)
    pub unused_baseline_styles: Vec<String>,
}

impl PollutionReport {
    /// Compute both differences by style name
    pub fn compute(baseline: &[String], final_styles: &[String], used: &BTreeSet<String>) -> Self {
        let base: HashSet<&str> = baseline.iter().map(String::as_str).collect();

        let polluting_styles = final_styles
            .iter()
            .filter(|s| !base.contains(s.as_str()))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut seen = HashSet::new();
        let unused_baseline_styles = baseline
            .iter()
            .filter(|s| !used.contains(s.as_str()) && seen.insert(s.as_str()))
            .cloned()
            .collect();

        Self {
            polluting_styles,
            unused_baseline_styles,
        }
    }

    /// Check if writing added any style
    pub fn is_polluted(&self) -> bool {
        !self.polluting_styles.is_empty()
    }
}

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fails the run
    Error,
    /// Reported, run still succeeds
    Warning,
}

/// Kind of composition degradation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// New styles appeared in the document
    Pollution,
    /// A table was rendered as text
    TableFallback,
    /// Lists exist but no native list style was applied
    ListFallback,
    /// Paragraphs failed to insert or style
    ParagraphErrors,
}

/// One finding of the style check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub degradation: Degradation,
    pub message: String,
}

/// Result of the style check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, severity: Severity, degradation: Degradation, message: String) {
        self.issues.push(ValidationIssue {
            severity,
            degradation,
            message,
        });
    }

    /// Check if any issue fails the run
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Messages of the given severity
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.issues
            .iter()
            .filter(|i| i.severity == severity)
            .map(|i| i.message.clone())
            .collect()
    }

    /// Single aggregated failure reason, if any issue is an error
    pub fn failure_reason(&self) -> Option<String> {
        let errors = self.messages(Severity::Error);
        if errors.is_empty() {
            None
        } else {
            Some(format!("Strict mode violation: {}", errors.join("; ")))
        }
    }
}

/// Everything the style check looks at
#[derive(Debug, Clone, Copy)]
pub struct Findings<'a> {
    pub pollution: &'a PollutionReport,
    pub table_fallback_count: usize,
    pub list_blocks: usize,
    pub list_style_used: bool,
    pub paragraph_errors: usize,
}

/// Judges degradations once, at the end of writing
#[derive(Debug, Clone, Copy)]
pub struct StyleCheck {
    strict: bool,
}

impl StyleCheck {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn validate(&self, findings: &Findings<'_>) -> ValidationResult {
        let severity = if self.strict {
            Severity::Error
        } else {
            Severity::Warning
        };
        let mut result = ValidationResult::new();

        if findings.pollution.is_polluted() {
            result.add(
                severity,
                Degradation::Pollution,
                format!(
                    "Style pollution: {} style(s) not in template: {}",
                    findings.pollution.polluting_styles.len(),
                    findings.pollution.polluting_styles.join(", ")
                ),
            );
        }
        if findings.table_fallback_count > 0 {
            result.add(
                severity,
                Degradation::TableFallback,
                format!(
                    "{} table(s) fell back to text rendering",
                    findings.table_fallback_count
                ),
            );
        }
        if findings.list_blocks > 0 && !findings.list_style_used {
            result.add(
                severity,
                Degradation::ListFallback,
                format!(
                    "{} list(s) written without a native list style",
                    findings.list_blocks
                ),
            );
        }
        if findings.paragraph_errors > 0 {
            result.add(
                severity,
                Degradation::ParagraphErrors,
                format!(
                    "{} paragraph(s) could not be written or styled",
                    findings.paragraph_errors
                ),
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut state = RunState::new();
        for next in [Phase::Writing, Phase::StyleCheck, Phase::StrictFail, Phase::Closed] {
            state.advance(next).unwrap();
        }
        assert_eq!(state.phase(), Phase::Closed);
    }

    #[test]
    fn test_rejects_skipping_style_check() {
        let mut state = RunState::new();
        state.advance(Phase::Writing).unwrap();
        let err = state.advance(Phase::Pass).unwrap_err();
        assert_eq!(err.to_string(), "Invalid phase transition: WRITING -> PASS");
        assert_eq!(state.phase(), Phase::Writing);
    }

    #[test]
    fn test_closed_is_terminal() {
        let mut state = RunState::new();
        state.advance(Phase::Closed).unwrap();
        assert!(state.advance(Phase::Writing).is_err());
        assert!(!Phase::Closed.can_advance_to(Phase::Closed));
    }

    #[test]
    fn test_pollution_is_set_difference() {
        let baseline = names(&["Body", "Title", "Heading"]);
        let final_styles = names(&["Zeta", "Body", "Title", "Heading", "Body 1", "Zeta"]);
        let used: BTreeSet<String> = ["Body".to_string()].into_iter().collect();

        let report = PollutionReport::compute(&baseline, &final_styles, &used);
        assert_eq!(report.polluting_styles, vec!["Body 1", "Zeta"]);
        assert_eq!(report.unused_baseline_styles, vec!["Title", "Heading"]);
        assert!(report.is_polluted());
    }

    #[test]
    fn test_pollution_independent_of_order() {
        let baseline = names(&["Body"]);
        let used = BTreeSet::new();
        let a = PollutionReport::compute(&baseline, &names(&["Body", "X", "Y"]), &used);
        let b = PollutionReport::compute(&baseline, &names(&["Y", "Body", "X"]), &used);
        assert_eq!(a, b);
    }

    #[test]
    fn test_removed_styles_are_not_pollution() {
        let report = PollutionReport::compute(&names(&["Body", "Old"]), &names(&["Body"]), &BTreeSet::new());
        assert!(!report.is_polluted());
    }

    fn findings(report: &PollutionReport, tables: usize) -> Findings<'_> {
        Findings {
            pollution: report,
            table_fallback_count: tables,
            list_blocks: 0,
            list_style_used: false,
            paragraph_errors: 0,
        }
    }

    #[test]
    fn test_lenient_downgrades_to_warnings() {
        let report = PollutionReport::default();
        let result = StyleCheck::new(false).validate(&findings(&report, 1));
        assert!(!result.has_errors());
        assert_eq!(
            result.messages(Severity::Warning),
            vec!["1 table(s) fell back to text rendering"]
        );
        assert_eq!(result.failure_reason(), None);
    }

    #[test]
    fn test_strict_aggregates_every_issue() {
        let report = PollutionReport {
            polluting_styles: names(&["Body 1"]),
            unused_baseline_styles: vec![],
        };
        let mut f = findings(&report, 2);
        f.list_blocks = 1;
        f.paragraph_errors = 3;

        let result = StyleCheck::new(true).validate(&f);
        assert_eq!(result.issues.len(), 4);
        let reason = result.failure_reason().unwrap();
        assert!(reason.contains("Body 1"));
        assert!(reason.contains("2 table(s)"));
        assert!(reason.contains("1 list(s)"));
        assert!(reason.contains("3 paragraph(s)"));
    }

    #[test]
    fn test_native_list_use_clears_list_finding() {
        let report = PollutionReport::default();
        let mut f = findings(&report, 0);
        f.list_blocks = 2;
        f.list_style_used = true;
        assert!(StyleCheck::new(true).validate(&f).issues.is_empty());
    }
}
