//! Error types for the composition engine

use thiserror::Error;

use crate::validation::Phase;

/// Errors raised by a document editing surface
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// The surface does not offer this primitive
    #[error("Operation not supported by this surface: {0}")]
    Unsupported(&'static str),

    /// Paragraph index past the end of the body
    #[error("Paragraph {index} out of range (document has {count})")]
    ParagraphOutOfRange { index: usize, count: usize },

    /// The style name is not defined in the document
    #[error("Style not found: {0}")]
    UnknownStyle(String),

    /// Cell address outside the table
    #[error("Cell {column}{row} is outside the table")]
    CellOutOfRange { column: String, row: usize },

    /// The table handle does not refer to a table in the body
    #[error("Table is not part of the document")]
    UnknownTable,

    /// The document handle was already closed
    #[error("Document is closed")]
    Closed,

    /// Failure inside the backend driving the document
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl SurfaceError {
    /// Wrap any backend error
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SurfaceError::Backend(Box::new(err))
    }
}

/// Errors that abort a composition run
#[derive(Error, Debug)]
pub enum ComposeError {
    /// A surface call outside the per-paragraph isolation boundary failed
    #[error("Document surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// The run state machine was driven out of order
    #[error("Invalid phase transition: {from} -> {to}")]
    Phase { from: Phase, to: Phase },
}

/// Result type alias for surface operations
pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;

/// Result type alias for composition
pub type Result<T> = std::result::Result<T, ComposeError>;
