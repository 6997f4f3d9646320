//! stylecast-ast - Block stream definitions
//!
//! This crate provides the intermediate representation exchanged between
//! the structural extractor and the compositor: an ordered stream of
//! style-agnostic [`Block`]s plus [`ParseStats`].

pub mod block;
pub mod document;
pub mod stats;

pub use block::{Block, ListItem};
pub use document::{ExtractedDocument, StreamError};
pub use stats::{is_severe_warning, ListCounts, ParseStats, ParseWarning, TableStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
