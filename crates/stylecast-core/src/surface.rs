//! Capability contract of a live document editing surface
//!
//! The compositor never owns document state. It issues commands against a
//! [`DocumentSurface`] and reads back counts and style names, so the same
//! engine drives a DOCX archive or an in-memory mock.

use crate::error::SurfaceResult;

/// A live, mutable document instance
///
/// Paragraph indices are 0-based and count top-level body paragraphs only.
/// Table rows are 1-based and columns use spreadsheet letters
/// (see [`crate::table::column_letters`]).
pub trait DocumentSurface {
    /// Opaque handle to a paragraph style
    type Style: Clone;
    /// Opaque handle to a table created by [`Self::create_table`]
    type Table;

    /// Names of the paragraph styles currently defined, in document order
    fn paragraph_style_names(&self) -> SurfaceResult<Vec<String>>;

    /// Look up a style handle by name
    fn style(&mut self, name: &str) -> SurfaceResult<Self::Style>;

    /// Number of paragraphs in the body
    fn paragraph_count(&self) -> SurfaceResult<usize>;

    /// Append text at the end of the body
    ///
    /// Each `\n` separated line becomes one new paragraph. Surfaces without
    /// a bulk insertion primitive return [`crate::SurfaceError::Unsupported`].
    fn append_text(&mut self, text: &str) -> SurfaceResult<()>;

    /// Whole body text, one line per paragraph
    fn body_text(&self) -> SurfaceResult<String>;

    /// Replace the body text, one paragraph per line
    fn set_body_text(&mut self, text: &str) -> SurfaceResult<()>;

    /// Assign a style to the paragraph at `index`
    fn set_paragraph_style(&mut self, index: usize, style: &Self::Style) -> SurfaceResult<()>;

    /// Create a table at the end of the body
    fn create_table(&mut self, rows: usize, columns: usize) -> SurfaceResult<Self::Table>;

    /// Set the text of one cell
    fn set_cell(
        &mut self,
        table: &Self::Table,
        column: &str,
        row: usize,
        text: &str,
    ) -> SurfaceResult<()>;

    /// Take a table created by [`Self::create_table`] out of the body
    fn remove_table(&mut self, table: Self::Table) -> SurfaceResult<()>;

    /// Persist the document
    fn save(&mut self) -> SurfaceResult<()>;

    /// Release the document; later calls fail with `Closed`
    fn close(&mut self) -> SurfaceResult<()>;
}
