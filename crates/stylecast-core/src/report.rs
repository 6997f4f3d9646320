//! Serializable run summary
//!
//! Field names follow the camelCase JSON shape consumed by automation;
//! `parseStats` keeps the extractor's own snake_case keys.

use serde::{Deserialize, Serialize};
use stylecast_ast::ParseStats;

/// What the compositor wrote and what it found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriteResult {
    pub headings_written: usize,
    pub paragraphs_written: usize,
    pub lists_written: usize,
    pub tables_written: usize,
    pub table_fallback_count: usize,
    pub paragraph_errors: usize,
    pub warnings: Vec<String>,
    /// Sorted
    pub styles_used: Vec<String>,
    /// Sorted
    pub polluting_styles: Vec<String>,
    /// Baseline order
    pub unused_baseline_styles: Vec<String>,
    pub list_style_used: bool,
}

/// Report of one conversion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub tool_version: String,
    pub input: String,
    pub output: String,
    pub template: String,
    pub strict: bool,
    pub parse_stats: ParseStats,
    pub write_result: WriteResult,
    pub elapsed_seconds: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunSummary {
    /// Start a summary; counts are filled in as the run progresses
    pub fn new(
        tool_version: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
        template: impl Into<String>,
        strict: bool,
    ) -> Self {
        Self {
            tool_version: tool_version.into(),
            input: input.into(),
            output: output.into(),
            template: template.into(),
            strict,
            parse_stats: ParseStats::default(),
            write_result: WriteResult::default(),
            elapsed_seconds: 0.0,
            success: false,
            error: None,
        }
    }

    /// Mark the run failed
    pub fn fail(&mut self, error: impl Into<String>) {
        self.success = false;
        self.error = Some(error.into());
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
