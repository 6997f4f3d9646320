//! DOCX-backed document editing surface
//!
//! [`DocxSurface`] opens a copy of a template and implements
//! [`DocumentSurface`] on top of its `word/document.xml`. It only ever
//! references styles the copy already defines; it never adds style
//! definitions of its own.

use std::path::{Path, PathBuf};

use stylecast_core::table::column_index;
use stylecast_core::{DocumentSurface, SurfaceError, SurfaceResult};
use tracing::debug;

use crate::archive::{OoxmlArchive, DOCUMENT_PART};
use crate::body::{BodyNode, BodyPart, BodyParagraph, NativeTable};
use crate::error::{OoxmlError, Result};
use crate::styles::StyleSheet;

/// Handle to a paragraph style: the style ID resolved from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleId(String);

impl StyleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Handle to a table created through the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef(usize);

/// A live DOCX document
#[derive(Debug)]
pub struct DocxSurface {
    archive: OoxmlArchive,
    body: BodyPart,
    /// Node position of every top-level paragraph, in body order
    paragraphs: Vec<usize>,
    table_style: Option<String>,
    path: Option<PathBuf>,
    closed: bool,
}

impl DocxSurface {
    /// Open a DOCX/DOTX file; `save` writes back to the same path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let archive = OoxmlArchive::open(path)?;
        let mut surface = Self::from_archive(archive)?;
        surface.path = Some(path.to_path_buf());
        Ok(surface)
    }

    /// Wrap an unpacked archive; call [`Self::with_path`] before saving
    pub fn from_archive(archive: OoxmlArchive) -> Result<Self> {
        let xml = String::from_utf8_lossy(archive.document_xml()?).into_owned();
        let body = BodyPart::parse(&xml)?;
        let table_style = match archive.styles_xml() {
            Some(styles) => StyleSheet::parse(styles)?
                .table_grid_style()
                .map(str::to_string),
            None => None,
        };
        let mut surface = Self {
            archive,
            body,
            paragraphs: Vec::new(),
            table_style,
            path: None,
            closed: false,
        };
        surface.reindex();
        debug!(
            "Opened document: {} body paragraphs, table style {:?}",
            surface.paragraphs.len(),
            surface.table_style
        );
        Ok(surface)
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Current `document.xml` as it would be saved
    pub fn document_xml(&self) -> String {
        self.body.render()
    }

    /// The underlying archive with the current body written back
    pub fn into_archive(mut self) -> OoxmlArchive {
        let xml = self.body.render();
        self.archive.set_string(DOCUMENT_PART, xml);
        self.archive
    }

    fn reindex(&mut self) {
        self.paragraphs = self
            .body
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, BodyNode::Paragraph(_)))
            .map(|(i, _)| i)
            .collect();
    }

    fn ensure_open(&self) -> SurfaceResult<()> {
        if self.closed {
            Err(SurfaceError::Closed)
        } else {
            Ok(())
        }
    }

    fn stylesheet(&self) -> Result<StyleSheet> {
        match self.archive.styles_xml() {
            Some(xml) => StyleSheet::parse(xml),
            None => Ok(StyleSheet::default()),
        }
    }

    fn paragraph_mut(&mut self, index: usize) -> SurfaceResult<&mut BodyParagraph> {
        let count = self.paragraphs.len();
        let node = self
            .paragraphs
            .get(index)
            .copied()
            .ok_or(SurfaceError::ParagraphOutOfRange { index, count })?;
        match self.body.nodes_mut().get_mut(node) {
            Some(BodyNode::Paragraph(p)) => Ok(p),
            _ => Err(SurfaceError::ParagraphOutOfRange { index, count }),
        }
    }

    fn push_paragraph(&mut self, text: &str) {
        self.body.push_paragraph(BodyParagraph::new(text));
        self.paragraphs.push(self.body.nodes().len() - 1);
    }
}

impl DocumentSurface for DocxSurface {
    type Style = StyleId;
    type Table = TableRef;

    fn paragraph_style_names(&self) -> SurfaceResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self.stylesheet()?.paragraph_style_names())
    }

    fn style(&mut self, name: &str) -> SurfaceResult<StyleId> {
        self.ensure_open()?;
        self.stylesheet()?
            .find_paragraph_style(name)
            .map(|s| StyleId(s.id.clone()))
            .ok_or_else(|| OoxmlError::StyleNotFound(name.to_string()).into())
    }

    fn paragraph_count(&self) -> SurfaceResult<usize> {
        self.ensure_open()?;
        Ok(self.paragraphs.len())
    }

    fn append_text(&mut self, text: &str) -> SurfaceResult<()> {
        self.ensure_open()?;
        for line in text.split('\n') {
            self.push_paragraph(line);
        }
        Ok(())
    }

    fn body_text(&self) -> SurfaceResult<String> {
        self.ensure_open()?;
        let lines: Vec<&str> = self
            .body
            .nodes()
            .iter()
            .filter_map(|n| match n {
                BodyNode::Paragraph(p) => Some(p.text.as_str()),
                _ => None,
            })
            .collect();
        Ok(lines.join("\n"))
    }

    fn set_body_text(&mut self, text: &str) -> SurfaceResult<()> {
        self.ensure_open()?;
        let mut lines = text.split('\n');
        let mut keep = vec![true; self.body.nodes().len()];

        for &node in &self.paragraphs {
            let Some(BodyNode::Paragraph(p)) = self.body.nodes_mut().get_mut(node) else {
                continue;
            };
            match lines.next() {
                Some(line) if line == p.text => {}
                Some(line) => {
                    p.text = line.to_string();
                    p.raw = None;
                }
                None => keep[node] = false,
            }
        }

        if keep.iter().any(|k| !k) {
            let mut flags = keep.into_iter();
            self.body
                .nodes_mut()
                .retain(|_| flags.next().unwrap_or(true));
            self.reindex();
        }
        for line in lines {
            self.push_paragraph(line);
        }
        Ok(())
    }

    fn set_paragraph_style(&mut self, index: usize, style: &StyleId) -> SurfaceResult<()> {
        self.ensure_open()?;
        let paragraph = self.paragraph_mut(index)?;
        if paragraph.style_id.as_deref() != Some(style.as_str()) {
            paragraph.style_id = Some(style.0.clone());
            paragraph.raw = None;
        }
        Ok(())
    }

    fn create_table(&mut self, rows: usize, columns: usize) -> SurfaceResult<TableRef> {
        self.ensure_open()?;
        let table = NativeTable::new(rows, columns, self.table_style.clone());
        Ok(TableRef(self.body.push_table(table)))
    }

    fn set_cell(
        &mut self,
        table: &TableRef,
        column: &str,
        row: usize,
        text: &str,
    ) -> SurfaceResult<()> {
        self.ensure_open()?;
        let out_of_range = || SurfaceError::CellOutOfRange {
            column: column.to_string(),
            row,
        };
        let col = column_index(column).ok_or_else(out_of_range)?;
        let cell = self
            .body
            .table_mut(table.0)
            .and_then(|t| t.cells.get_mut(row.checked_sub(1)?))
            .and_then(|r| r.get_mut(col))
            .ok_or_else(out_of_range)?;
        *cell = text.to_string();
        Ok(())
    }

    fn remove_table(&mut self, table: TableRef) -> SurfaceResult<()> {
        self.ensure_open()?;
        if self.body.remove_table(table.0) {
            Ok(())
        } else {
            Err(SurfaceError::UnknownTable)
        }
    }

    fn save(&mut self) -> SurfaceResult<()> {
        self.ensure_open()?;
        let path = self
            .path
            .clone()
            .ok_or_else(|| OoxmlError::MissingFile("destination path".to_string()))?;
        let xml = self.body.render();
        self.archive.set_string(DOCUMENT_PART, xml);
        if self.archive.mark_as_document() {
            debug!("Converted template content type to document");
        }
        self.archive.write_to_file(&path)?;
        debug!("Saved {}", path.display());
        Ok(())
    }

    fn close(&mut self) -> SurfaceResult<()> {
        self.closed = true;
        Ok(())
    }
}
