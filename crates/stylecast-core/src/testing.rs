//! In-memory document surface for tests
//!
//! `MockSurface` keeps paragraphs, styles and tables in plain vectors and
//! lets tests switch capabilities off, inject failures and count the work
//! each call performs against the document.

use std::cell::Cell;
use std::collections::HashSet;
use std::io;

use crate::error::{SurfaceError, SurfaceResult};
use crate::surface::DocumentSurface;
use crate::table::column_index;

/// A paragraph held by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockParagraph {
    pub text: String,
    pub style: Option<String>,
}

/// Mock implementation of [`DocumentSurface`]
#[derive(Debug, Default)]
pub struct MockSurface {
    styles: Vec<String>,
    paragraphs: Vec<MockParagraph>,
    tables: Vec<Vec<Vec<String>>>,
    cell_log: Vec<(String, usize)>,
    append_disabled: bool,
    split_on_append: bool,
    merge_on_append: bool,
    body_rewrite_disabled: bool,
    failing_styles: HashSet<usize>,
    table_creation_fails: bool,
    table_removal_fails: bool,
    cells_before_failure: Option<usize>,
    pollution: Option<String>,
    append_calls: usize,
    work: Cell<usize>,
    saved: bool,
    closed: bool,
}

impl MockSurface {
    /// Create an empty document whose template defines `styles`
    pub fn new<I, S>(styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            styles: styles.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Seed unstyled boilerplate paragraphs
    pub fn with_paragraphs<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paragraphs.extend(texts.into_iter().map(|t| MockParagraph {
            text: t.into(),
            style: None,
        }));
        self
    }

    /// Make `append_text` unsupported
    pub fn disable_append(&mut self) {
        self.append_disabled = true;
    }

    /// Start every append with an extra empty paragraph
    pub fn split_on_append(&mut self) {
        self.split_on_append = true;
    }

    /// Join the first appended line onto the last existing paragraph
    pub fn merge_on_append(&mut self) {
        self.merge_on_append = true;
    }

    /// Make `body_text` and `set_body_text` unsupported
    pub fn disable_body_rewrite(&mut self) {
        self.body_rewrite_disabled = true;
    }

    /// Fail styling of the paragraph at `index`
    pub fn fail_style_at(&mut self, index: usize) {
        self.failing_styles.insert(index);
    }

    /// Fail every `create_table`
    pub fn fail_table_creation(&mut self) {
        self.table_creation_fails = true;
    }

    /// Fail every `remove_table`
    pub fn fail_table_removal(&mut self) {
        self.table_removal_fails = true;
    }

    /// Let `n` cell writes succeed, then fail the rest
    pub fn fail_cells_after(&mut self, n: usize) {
        self.cells_before_failure = Some(n);
    }

    /// Add `name` to the style list the first time any style is applied
    pub fn pollute_on_first_style(&mut self, name: impl Into<String>) {
        self.pollution = Some(name.into());
    }

    /// Define an extra style directly
    pub fn add_style(&mut self, name: impl Into<String>) {
        self.styles.push(name.into());
    }

    pub fn paragraphs(&self) -> &[MockParagraph] {
        &self.paragraphs
    }

    pub fn paragraph_texts(&self) -> Vec<&str> {
        self.paragraphs.iter().map(|p| p.text.as_str()).collect()
    }

    pub fn tables(&self) -> &[Vec<Vec<String>>] {
        &self.tables
    }

    /// Every `(column, row)` written, in call order
    pub fn cell_addresses(&self) -> &[(String, usize)] {
        &self.cell_log
    }

    /// Number of successful `append_text` calls
    pub fn append_calls(&self) -> usize {
        self.append_calls
    }

    /// Paragraph-sized units of work done so far
    pub fn work(&self) -> usize {
        self.work.get()
    }

    pub fn reset_work(&self) {
        self.work.set(0);
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn charge(&self, units: usize) {
        self.work.set(self.work.get() + units);
    }

    fn ensure_open(&self) -> SurfaceResult<()> {
        if self.closed {
            Err(SurfaceError::Closed)
        } else {
            Ok(())
        }
    }
}

fn injected(what: &str) -> SurfaceError {
    SurfaceError::backend(io::Error::other(format!("injected failure: {}", what)))
}

impl DocumentSurface for MockSurface {
    type Style = String;
    type Table = usize;

    fn paragraph_style_names(&self) -> SurfaceResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self.styles.clone())
    }

    fn style(&mut self, name: &str) -> SurfaceResult<String> {
        self.ensure_open()?;
        self.styles
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| SurfaceError::UnknownStyle(name.to_string()))
    }

    fn paragraph_count(&self) -> SurfaceResult<usize> {
        self.ensure_open()?;
        self.charge(1);
        Ok(self.paragraphs.len())
    }

    fn append_text(&mut self, text: &str) -> SurfaceResult<()> {
        self.ensure_open()?;
        if self.append_disabled {
            return Err(SurfaceError::Unsupported("append_text"));
        }
        if self.split_on_append {
            self.paragraphs.push(MockParagraph {
                text: String::new(),
                style: None,
            });
        }
        let mut lines = text.split('\n').peekable();
        if self.merge_on_append {
            if let (Some(last), Some(first)) = (self.paragraphs.last_mut(), lines.peek()) {
                last.text.push_str(first);
                lines.next();
            }
        }
        for line in lines {
            self.paragraphs.push(MockParagraph {
                text: line.to_string(),
                style: None,
            });
            self.charge(1);
        }
        self.append_calls += 1;
        Ok(())
    }

    fn body_text(&self) -> SurfaceResult<String> {
        self.ensure_open()?;
        if self.body_rewrite_disabled {
            return Err(SurfaceError::Unsupported("body_text"));
        }
        self.charge(self.paragraphs.len());
        Ok(self
            .paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn set_body_text(&mut self, text: &str) -> SurfaceResult<()> {
        self.ensure_open()?;
        if self.body_rewrite_disabled {
            return Err(SurfaceError::Unsupported("set_body_text"));
        }
        let lines: Vec<&str> = text.split('\n').collect();
        self.paragraphs.truncate(lines.len());
        for (i, line) in lines.iter().enumerate() {
            match self.paragraphs.get_mut(i) {
                Some(p) => p.text = line.to_string(),
                None => self.paragraphs.push(MockParagraph {
                    text: line.to_string(),
                    style: None,
                }),
            }
        }
        self.charge(lines.len());
        Ok(())
    }

    fn set_paragraph_style(&mut self, index: usize, style: &String) -> SurfaceResult<()> {
        self.ensure_open()?;
        self.charge(1);
        let count = self.paragraphs.len();
        if self.failing_styles.contains(&index) {
            return Err(injected("paragraph style"));
        }
        let paragraph = self
            .paragraphs
            .get_mut(index)
            .ok_or(SurfaceError::ParagraphOutOfRange { index, count })?;
        paragraph.style = Some(style.clone());
        if let Some(extra) = self.pollution.take() {
            if !self.styles.contains(&extra) {
                self.styles.push(extra);
            }
        }
        Ok(())
    }

    fn create_table(&mut self, rows: usize, columns: usize) -> SurfaceResult<usize> {
        self.ensure_open()?;
        if self.table_creation_fails {
            return Err(injected("create table"));
        }
        self.tables.push(vec![vec![String::new(); columns]; rows]);
        self.charge(rows);
        Ok(self.tables.len() - 1)
    }

    fn set_cell(
        &mut self,
        table: &usize,
        column: &str,
        row: usize,
        text: &str,
    ) -> SurfaceResult<()> {
        self.ensure_open()?;
        if let Some(remaining) = self.cells_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(injected("set cell"));
            }
            *remaining -= 1;
        }
        let out_of_range = || SurfaceError::CellOutOfRange {
            column: column.to_string(),
            row,
        };
        let col = column_index(column).ok_or_else(out_of_range)?;
        let cell = self
            .tables
            .get_mut(*table)
            .and_then(|t| t.get_mut(row.checked_sub(1)?))
            .and_then(|r| r.get_mut(col))
            .ok_or_else(out_of_range)?;
        *cell = text.to_string();
        self.cell_log.push((column.to_string(), row));
        self.charge(1);
        Ok(())
    }

    /// Handles of tables created later shift down by one
    fn remove_table(&mut self, table: usize) -> SurfaceResult<()> {
        self.ensure_open()?;
        if self.table_removal_fails {
            return Err(injected("remove table"));
        }
        if table >= self.tables.len() {
            return Err(SurfaceError::UnknownTable);
        }
        self.tables.remove(table);
        self.charge(1);
        Ok(())
    }

    fn save(&mut self) -> SurfaceResult<()> {
        self.ensure_open()?;
        self.saved = true;
        Ok(())
    }

    fn close(&mut self) -> SurfaceResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_splits_lines() {
        let mut mock = MockSurface::new(["Body"]);
        mock.append_text("a\nb").unwrap();
        assert_eq!(mock.paragraph_count().unwrap(), 2);
        assert_eq!(mock.work(), 3);
    }

    #[test]
    fn test_closed_surface_rejects_calls() {
        let mut mock = MockSurface::new(["Body"]);
        mock.close().unwrap();
        assert!(mock.is_closed());
        assert!(matches!(mock.append_text("x"), Err(SurfaceError::Closed)));
    }

    #[test]
    fn test_pollution_injection() {
        let mut mock = MockSurface::new(["Body"]).with_paragraphs(["p"]);
        mock.pollute_on_first_style("Body 1");
        mock.set_paragraph_style(0, &"Body".to_string()).unwrap();
        assert_eq!(mock.paragraph_style_names().unwrap(), vec!["Body", "Body 1"]);
    }
}
