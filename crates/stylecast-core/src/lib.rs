//! stylecast-core - Template-faithful document composition
//!
//! Replays a style-agnostic block stream into a live document using only
//! the paragraph styles its template already defines, then reports any
//! styles that appeared during writing.
//!
//! # Example
//!
//! With the `test-support` feature enabled:
//!
//! ```ignore
//! use stylecast_ast::Block;
//! use stylecast_core::testing::MockSurface;
//! use stylecast_core::{ComposeOptions, Compositor};
//!
//! let mut surface = MockSurface::new(["Body", "Title", "Heading", "Heading 2"]);
//! let blocks = vec![Block::title("Doc"), Block::heading(1, "A"), Block::heading(5, "B")];
//!
//! let outcome = Compositor::new(ComposeOptions::default())
//!     .compose(&mut surface, blocks)
//!     .unwrap();
//!
//! assert!(outcome.success);
//! assert!(outcome.write_result.polluting_styles.is_empty());
//! ```

pub mod compose;
pub mod error;
pub mod options;
pub mod report;
pub mod resolver;
pub mod surface;
pub mod table;
pub mod validation;
pub mod writer;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use compose::{ComposeOutcome, Compositor};
pub use error::{ComposeError, Result, SurfaceError, SurfaceResult};
pub use options::ComposeOptions;
pub use report::{RunSummary, WriteResult};
pub use resolver::{ListStyleAvailability, ResolvedStyles, StyleInventory, StyleMap};
pub use surface::DocumentSurface;
pub use table::{column_index, column_letters, TableOutcome, TableWriter};
pub use validation::{Phase, PollutionReport, StyleCheck, ValidationResult};
pub use writer::{BatchedWriter, StyleCache, WriteTally};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
