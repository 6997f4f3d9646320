//! Block-level elements of the extracted document stream
//!
//! A block stream is the style-agnostic description of a source document.
//! It carries semantics (title, heading level, list kind) but no style
//! names; the compositor decides which template style each block receives.

use serde::{Deserialize, Serialize};

/// Block-level content element
///
/// Serialized internally tagged by `"type"`, e.g.
/// `{"type": "heading", "level": 2, "text": "Scope"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    /// Document title
    Title { text: String },
    /// Document subtitle
    Subtitle { text: String },
    /// A section heading (level 1 is the highest)
    Heading { level: u32, text: String },
    /// A body paragraph; empty text is kept as vertical spacing
    Paragraph { text: String },
    /// An ordered or unordered list
    List {
        ordered: bool,
        items: Vec<ListItem>,
    },
    /// A table as rows of cell strings; rows may be jagged
    Table { rows: Vec<Vec<String>> },
    /// A page or section break
    Break,
}

/// A single list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Item text
    pub text: String,
    /// Nesting level (0-based)
    #[serde(default)]
    pub level: u32,
}

impl ListItem {
    /// Create a list item at the given nesting level
    pub fn new(text: impl Into<String>, level: u32) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }
}

impl Block {
    /// Create a paragraph block
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph { text: text.into() }
    }

    /// Create a heading block; level 0 is raised to 1
    pub fn heading(level: u32, text: impl Into<String>) -> Self {
        Block::Heading {
            level: level.max(1),
            text: text.into(),
        }
    }

    /// Create a title block
    pub fn title(text: impl Into<String>) -> Self {
        Block::Title { text: text.into() }
    }

    /// Create a subtitle block
    pub fn subtitle(text: impl Into<String>) -> Self {
        Block::Subtitle { text: text.into() }
    }

    /// Short kind name, matching the serialized `"type"` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Title { .. } => "title",
            Block::Subtitle { .. } => "subtitle",
            Block::Heading { .. } => "heading",
            Block::Paragraph { .. } => "paragraph",
            Block::List { .. } => "list",
            Block::Table { .. } => "table",
            Block::Break => "break",
        }
    }

    /// Text payload of a single-text block
    ///
    /// Breaks report an empty payload; lists and tables have none.
    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Title { text }
            | Block::Subtitle { text }
            | Block::Heading { text, .. }
            | Block::Paragraph { text } => Some(text),
            Block::Break => Some(""),
            Block::List { .. } | Block::Table { .. } => None,
        }
    }

    /// Number of columns of a table block (longest row)
    pub fn table_columns(&self) -> Option<usize> {
        match self {
            Block::Table { rows } => Some(rows.iter().map(Vec::len).max().unwrap_or(0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_floor() {
        assert_eq!(
            Block::heading(0, "Intro"),
            Block::Heading {
                level: 1,
                text: "Intro".to_string()
            }
        );
    }

    #[test]
    fn test_block_json_shape() {
        let block = Block::heading(2, "Scope");
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, r#"{"type":"heading","level":2,"text":"Scope"}"#);

        let brk: Block = serde_json::from_str(r#"{"type":"break"}"#).unwrap();
        assert_eq!(brk, Block::Break);
    }

    #[test]
    fn test_list_item_level_defaults_to_zero() {
        let block: Block = serde_json::from_str(
            r#"{"type":"list","ordered":false,"items":[{"text":"a"},{"text":"b","level":1}]}"#,
        )
        .unwrap();
        match block {
            Block::List { ordered, items } => {
                assert!(!ordered);
                assert_eq!(items[0].level, 0);
                assert_eq!(items[1].level, 1);
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_table_columns_jagged() {
        let table = Block::Table {
            rows: vec![
                vec!["a".into()],
                vec!["b".into(), "c".into(), "d".into()],
                vec![],
            ],
        };
        assert_eq!(table.table_columns(), Some(3));
        assert_eq!(Block::paragraph("x").table_columns(), None);
    }

    #[test]
    fn test_text_payloads() {
        assert_eq!(Block::paragraph("").text(), Some(""));
        assert_eq!(Block::Break.text(), Some(""));
        assert_eq!(Block::Table { rows: vec![] }.text(), None);
        assert_eq!(Block::title("Doc").kind(), "title");
    }
}
