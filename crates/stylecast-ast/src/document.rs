//! Extracted document: block stream plus statistics
//!
//! This is the hand-off value between the structural extractor and the
//! compositor. It can also be read from JSON, so an external extractor can
//! feed the compositor directly.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::Block;
use crate::stats::ParseStats;

/// A complete extraction result
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Content blocks in document order
    pub blocks: Vec<Block>,
    /// Aggregate statistics
    #[serde(default)]
    pub stats: ParseStats,
}

/// Errors reading a serialized block stream
#[derive(Error, Debug)]
pub enum StreamError {
    /// Error reading the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON does not match the block schema
    #[error("Invalid block stream: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractedDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from blocks with empty statistics
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            stats: ParseStats::default(),
        }
    }

    /// Parse a JSON block stream
    pub fn from_json(json: &str) -> Result<Self, StreamError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON block stream from a file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self, StreamError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, StreamError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add a block
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Check if the stream has no blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether any block is a list
    pub fn has_lists(&self) -> bool {
        self.blocks.iter().any(|b| matches!(b, Block::List { .. }))
    }
}
