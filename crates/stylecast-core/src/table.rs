//! Native table writing with a plain-text fallback
//!
//! Cells are addressed with spreadsheet column letters, so there is no
//! limit on the number of columns. Rows are populated in chunks to bound
//! the cost of a single burst of surface calls.

use std::thread;

use tracing::{debug, warn};

use crate::error::SurfaceResult;
use crate::options::ComposeOptions;
use crate::surface::DocumentSurface;

/// Spreadsheet-style column letters for a 0-based index
///
/// `0 -> A`, `25 -> Z`, `26 -> AA`, `701 -> ZZ`, `702 -> AAA`.
pub fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index;
    loop {
        letters.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    letters.into_iter().map(char::from).collect()
}

/// Inverse of [`column_letters`]; `None` for anything but `A`-`Z`
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut acc: usize = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        let digit = (ch as u8 - b'A') as usize + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    Some(acc - 1)
}

/// Render rows as `| a | b |` lines
pub fn render_text_table(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|c| one_line(c)).collect();
            format!("| {} |", cells.join(" | "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn one_line(cell: &str) -> String {
    cell.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// How a table ended up in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    /// Written as a native table
    Native,
    /// Written as text rows; carries the native failure
    Fallback { reason: String },
    /// Nothing to write (no cells)
    Empty,
    /// Neither the native table nor the text rendering could be written
    Lost { reason: String },
}

/// Writes table blocks through a [`DocumentSurface`]
#[derive(Debug, Clone)]
pub struct TableWriter {
    chunk_rows: usize,
    pause: std::time::Duration,
}

impl TableWriter {
    /// Create a writer from run options
    pub fn new(options: &ComposeOptions) -> Self {
        Self {
            chunk_rows: options.effective_table_chunk_rows(),
            pause: options.table_chunk_pause,
        }
    }

    /// Write one table, falling back to text rows on any native failure
    pub fn write<S: DocumentSurface>(&self, surface: &mut S, rows: &[Vec<String>]) -> TableOutcome {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return TableOutcome::Empty;
        }

        let table = match surface.create_table(rows.len(), columns) {
            Ok(table) => table,
            Err(e) => return Self::write_text(surface, rows, columns, e.to_string()),
        };

        match self.populate(surface, &table, rows, columns) {
            Ok(()) => {
                if let Err(e) = surface.append_text("") {
                    debug!("No blank line after table: {}", e);
                }
                TableOutcome::Native
            }
            Err(native) => {
                // The text rows replace the partly filled table
                let reason = match surface.remove_table(table) {
                    Ok(()) => native.to_string(),
                    Err(e) => {
                        warn!("Partial table could not be removed: {}", e);
                        format!(
                            "{}; the partly filled native table could not be removed ({}) and precedes the text rows",
                            native, e
                        )
                    }
                };
                Self::write_text(surface, rows, columns, reason)
            }
        }
    }

    fn write_text<S: DocumentSurface>(
        surface: &mut S,
        rows: &[Vec<String>],
        columns: usize,
        reason: String,
    ) -> TableOutcome {
        warn!(
            "Native table ({}x{}) failed, writing text rows: {}",
            rows.len(),
            columns,
            reason
        );
        let text = format!("{}\n", render_text_table(rows));
        match surface.append_text(&text) {
            Ok(()) => TableOutcome::Fallback { reason },
            Err(e) => TableOutcome::Lost {
                reason: format!("{}; text fallback failed: {}", reason, e),
            },
        }
    }

    fn populate<S: DocumentSurface>(
        &self,
        surface: &mut S,
        table: &S::Table,
        rows: &[Vec<String>],
        columns: usize,
    ) -> SurfaceResult<()> {
        let letters: Vec<String> = (0..columns).map(column_letters).collect();
        let chunks = rows.len().div_ceil(self.chunk_rows);

        for (chunk_no, chunk) in rows.chunks(self.chunk_rows).enumerate() {
            let first_row = chunk_no * self.chunk_rows;
            for (offset, row) in chunk.iter().enumerate() {
                for (col, cell) in row.iter().enumerate() {
                    surface.set_cell(table, &letters[col], first_row + offset + 1, cell)?;
                }
            }
            debug!(
                "Table rows {}-{} of {} populated",
                first_row + 1,
                first_row + chunk.len(),
                rows.len()
            );
            if chunk_no + 1 < chunks && !self.pause.is_zero() {
                thread::sleep(self.pause);
            }
        }
        Ok(())
    }
}
