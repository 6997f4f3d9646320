//! # stylecast-ooxml
//!
//! OOXML (Office Open XML) access for stylecast.
//!
//! This crate provides functionality to:
//! - Read and write DOCX/DOTX packages
//! - Parse style and numbering definitions
//! - Extract a block stream from a source DOCX
//! - Edit a template copy through [`DocxSurface`]
//!
//! ## Example: Extracting a Document
//!
//! ```no_run
//! use stylecast_ooxml::DocxExtractor;
//!
//! let extracted = DocxExtractor::new().extract_file("source.docx");
//! for warning in extracted.stats.severe_warnings() {
//!     eprintln!("{}", warning);
//! }
//! println!("{} blocks", extracted.len());
//! ```

pub mod archive;
pub mod body;
pub mod error;
pub mod extract;
pub mod numbering;
pub mod styles;
pub mod surface;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod xml;

pub use archive::OoxmlArchive;
pub use error::{OoxmlError, Result};
pub use extract::DocxExtractor;
pub use numbering::Numbering;
pub use styles::{Style, StyleRole, StyleSheet, StyleType};
pub use surface::{DocxSurface, StyleId, TableRef};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
