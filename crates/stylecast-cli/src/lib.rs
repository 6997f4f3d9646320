//! stylecast CLI - Command-line interface library
//!
//! Wires the extractor, the compositor and the DOCX surface into one
//! conversion run:
//! - Settings: optional `stylecast.toml` merged under command-line flags
//! - Lock: single-writer advisory lock around the whole run
//! - Publish: staged template copy swapped into place only on success
//!
//! # Library Usage
//!
//! ```ignore
//! use clap::Parser;
//! use stylecast_cli::{run, Cli};
//!
//! let cli = Cli::parse_from(["stylecast", "in.docx", "-o", "out.docx", "-t", "corp.dotx"]);
//! let code = run(&cli)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Compose a source document into a corporate template
//! stylecast report.docx -o final.docx -t corporate.dotx --strict
//!
//! # Pre-extracted block stream, summary on stdout
//! stylecast blocks.json -o final.docx -t corporate.dotx --summary -
//! ```

pub mod app;
pub mod config;
pub mod lock;
pub mod publish;

pub use app::{run, run_cli, Cli};
pub use config::Settings;
pub use lock::{LockError, LockMode, RunLock};
pub use publish::{FsOps, PublishError, StagedOutput, StdFs};
