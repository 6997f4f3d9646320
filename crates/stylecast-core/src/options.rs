//! Per-run composition options

use std::time::Duration;

/// Default number of paragraphs per bulk insertion
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default number of table rows populated per chunk
pub const DEFAULT_TABLE_CHUNK_ROWS: usize = 50;

/// Options controlling one composition run
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeOptions {
    /// Paragraphs buffered before a flush (minimum 1)
    pub batch_size: usize,
    /// Turn every degradation into a failure
    pub strict: bool,
    /// Prefix saturated headings with `H<level>: `
    pub prefix_deep_headings: bool,
    /// Rows populated per table chunk (minimum 1)
    pub table_chunk_rows: usize,
    /// Pause between table chunks
    pub table_chunk_pause: Duration,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            strict: false,
            prefix_deep_headings: false,
            table_chunk_rows: DEFAULT_TABLE_CHUNK_ROWS,
            table_chunk_pause: Duration::ZERO,
        }
    }
}

impl ComposeOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enable or disable strict mode
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enable or disable `H<level>: ` prefixes on saturated headings
    pub fn with_prefix_deep_headings(mut self, enabled: bool) -> Self {
        self.prefix_deep_headings = enabled;
        self
    }

    /// Set the table chunk size
    pub fn with_table_chunk_rows(mut self, rows: usize) -> Self {
        self.table_chunk_rows = rows;
        self
    }

    /// Set the pause between table chunks
    pub fn with_table_chunk_pause(mut self, pause: Duration) -> Self {
        self.table_chunk_pause = pause;
        self
    }

    /// Batch size actually used (never zero)
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    /// Table chunk size actually used (never zero)
    pub fn effective_table_chunk_rows(&self) -> usize {
        self.table_chunk_rows.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ComposeOptions::default();
        assert_eq!(opts.batch_size, 50);
        assert_eq!(opts.table_chunk_rows, 50);
        assert!(!opts.strict);
        assert!(!opts.prefix_deep_headings);
        assert_eq!(opts.table_chunk_pause, Duration::ZERO);
    }

    #[test]
    fn test_zero_sizes_are_clamped() {
        let opts = ComposeOptions::new()
            .with_batch_size(0)
            .with_table_chunk_rows(0);
        assert_eq!(opts.effective_batch_size(), 1);
        assert_eq!(opts.effective_table_chunk_rows(), 1);
    }
}
