//! Extraction statistics and warning classification
//!
//! Extraction never fails hard: problems with the source archive are
//! reported as warning strings. A small closed set of those warnings means
//! the source could not be read at all; callers promote them to fatal
//! errors in strict mode even when the block stream is merely empty.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Aggregate statistics produced alongside a block stream
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseStats {
    /// Heading counts keyed by `title`, `subtitle` or `level_N`
    pub headings: BTreeMap<String, usize>,
    /// Body paragraphs seen (including blank ones that were not emitted)
    pub paragraphs: usize,
    /// List counts by kind
    pub lists: ListCounts,
    /// Table count and largest dimensions
    pub tables: TableStats,
    /// Warning strings, in the order they were raised
    pub warnings: Vec<String>,
    /// Page/section breaks dropped because breaks were not preserved
    pub dropped_breaks: usize,
}

/// List counts by kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListCounts {
    pub bulleted: usize,
    pub numbered: usize,
}

/// Table statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableStats {
    pub count: usize,
    pub max_rows: usize,
    pub max_cols: usize,
}

impl ParseStats {
    /// Count one heading under the given key
    pub fn count_heading(&mut self, key: impl Into<String>) {
        *self.headings.entry(key.into()).or_insert(0) += 1;
    }

    /// Record a table's dimensions
    pub fn record_table(&mut self, rows: usize, cols: usize) {
        self.tables.count += 1;
        self.tables.max_rows = self.tables.max_rows.max(rows);
        self.tables.max_cols = self.tables.max_cols.max(cols);
    }

    /// Append a warning
    pub fn warn(&mut self, warning: impl fmt::Display) {
        self.warnings.push(warning.to_string());
    }

    /// Total number of heading-like blocks (title and subtitle included)
    pub fn heading_total(&self) -> usize {
        self.headings.values().sum()
    }

    /// Severe warnings among the recorded ones
    pub fn severe_warnings(&self) -> Vec<&str> {
        self.warnings
            .iter()
            .map(String::as_str)
            .filter(|w| is_severe_warning(w))
            .collect()
    }
}

/// Warnings raised while extracting a source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// The source is not a ZIP archive
    InvalidArchive,
    /// The source path does not exist
    FileNotFound,
    /// The archive has no `word/document.xml`
    MissingDocumentPart,
    /// `word/document.xml` has no body element
    MissingBody,
    /// A part could not be read from the archive
    UnreadablePart { part: String, detail: String },
    /// A part is not well-formed XML
    MalformedPart { part: String, detail: String },
    /// Breaks were found but not preserved
    DroppedBreaks(usize),
}

impl ParseWarning {
    /// Whether this warning means no content could be extracted
    pub fn is_severe(&self) -> bool {
        match self {
            ParseWarning::InvalidArchive
            | ParseWarning::FileNotFound
            | ParseWarning::MissingDocumentPart
            | ParseWarning::MissingBody => true,
            ParseWarning::MalformedPart { part, .. } => part == DOCUMENT_PART,
            ParseWarning::UnreadablePart { part, .. } => part == DOCUMENT_PART,
            ParseWarning::DroppedBreaks(_) => false,
        }
    }
}

const DOCUMENT_PART: &str = "document.xml";

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::InvalidArchive => f.write_str("Invalid ZIP file structure"),
            ParseWarning::FileNotFound => f.write_str("File not found"),
            ParseWarning::MissingDocumentPart => {
                f.write_str("No word/document.xml found - invalid DOCX")
            }
            ParseWarning::MissingBody => f.write_str("No body element found in document"),
            ParseWarning::UnreadablePart { part, detail } => {
                write!(f, "Error reading {}: {}", part, detail)
            }
            ParseWarning::MalformedPart { part, detail } => {
                write!(f, "Malformed {}: {}", part, detail)
            }
            ParseWarning::DroppedBreaks(n) => write!(
                f,
                "Dropped {} page/section break(s). Use --preserve-breaks to convert to blank paragraphs.",
                n
            ),
        }
    }
}

/// Prefixes of the severe warning strings (closed set)
const SEVERE_PREFIXES: &[&str] = &[
    "Invalid ZIP file structure",
    "File not found",
    "No word/document.xml found",
    "No body element found",
    "Malformed document.xml",
    "Error reading document.xml",
];

/// Classify a warning string, including ones produced by external extractors
pub fn is_severe_warning(warning: &str) -> bool {
    SEVERE_PREFIXES.iter().any(|p| warning.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_classification() {
        let severe = [
            ParseWarning::InvalidArchive,
            ParseWarning::FileNotFound,
            ParseWarning::MissingDocumentPart,
            ParseWarning::MissingBody,
            ParseWarning::MalformedPart {
                part: "document.xml".into(),
                detail: "unexpected EOF".into(),
            },
        ];
        for w in &severe {
            assert!(w.is_severe());
            assert!(is_severe_warning(&w.to_string()), "{}", w);
        }

        let mild = [
            ParseWarning::DroppedBreaks(2),
            ParseWarning::MalformedPart {
                part: "styles.xml".into(),
                detail: "bad".into(),
            },
        ];
        for w in &mild {
            assert!(!w.is_severe());
            assert!(!is_severe_warning(&w.to_string()), "{}", w);
        }
    }

    #[test]
    fn test_record_table_tracks_maxima() {
        let mut stats = ParseStats::default();
        stats.record_table(3, 5);
        stats.record_table(10, 2);
        assert_eq!(stats.tables.count, 2);
        assert_eq!(stats.tables.max_rows, 10);
        assert_eq!(stats.tables.max_cols, 5);
    }

    #[test]
    fn test_heading_counts() {
        let mut stats = ParseStats::default();
        stats.count_heading("title");
        stats.count_heading("level_1");
        stats.count_heading("level_1");
        assert_eq!(stats.headings["level_1"], 2);
        assert_eq!(stats.heading_total(), 3);
    }

    #[test]
    fn test_severe_warnings_filter() {
        let mut stats = ParseStats::default();
        stats.warn(ParseWarning::DroppedBreaks(1));
        stats.warn(ParseWarning::MissingBody);
        assert_eq!(stats.severe_warnings(), vec!["No body element found in document"]);
    }

    #[test]
    fn test_dropped_breaks_message() {
        assert_eq!(
            ParseWarning::DroppedBreaks(3).to_string(),
            "Dropped 3 page/section break(s). Use --preserve-breaks to convert to blank paragraphs."
        );
    }
}
