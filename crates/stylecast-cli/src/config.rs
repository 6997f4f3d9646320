//! Configuration Settings
//!
//! Optional `stylecast.toml` read from the working directory (or the path
//! given with `--config`). Every section is optional; command-line flags
//! override whatever the file sets.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stylecast_core::options::{DEFAULT_BATCH_SIZE, DEFAULT_TABLE_CHUNK_ROWS};
use stylecast_core::ComposeOptions;

use crate::lock::LockMode;

/// File names looked up in the working directory when no `--config` is given
pub const CONFIG_CANDIDATES: [&str; 2] = ["stylecast.toml", ".stylecast.toml"];

/// Top-level settings structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Composition settings
    pub compose: ComposeSettings,
    /// Run lock settings
    pub lock: LockSettings,
    /// Source extraction settings
    pub extract: ExtractSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load from `path`, or from the first candidate in the working directory
    ///
    /// An explicit path must exist. Any file found must parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Self::read(path)
            }
            None => {
                for candidate in CONFIG_CANDIDATES {
                    let candidate = Path::new(candidate);
                    if candidate.is_file() {
                        return Self::read(candidate);
                    }
                }
                Ok(Self::default())
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Composition options described by the `[compose]` section
    pub fn compose_options(&self) -> ComposeOptions {
        let compose = &self.compose;
        ComposeOptions::new()
            .with_batch_size(compose.batch_size)
            .with_strict(compose.strict)
            .with_prefix_deep_headings(compose.prefix_deep_headings)
            .with_table_chunk_rows(compose.table_chunk_rows)
            .with_table_chunk_pause(Duration::from_millis(compose.table_chunk_pause_ms))
    }
}

/// `[compose]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComposeSettings {
    /// Paragraphs per bulk insertion
    pub batch_size: usize,
    /// Fail the run on any degradation
    pub strict: bool,
    /// Prefix saturated headings with `H<level>: `
    pub prefix_deep_headings: bool,
    /// Table rows populated per chunk
    pub table_chunk_rows: usize,
    /// Pause between table chunks, in milliseconds
    pub table_chunk_pause_ms: u64,
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            strict: false,
            prefix_deep_headings: false,
            table_chunk_rows: DEFAULT_TABLE_CHUNK_ROWS,
            table_chunk_pause_ms: 0,
        }
    }
}

/// `[lock]` section
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LockSettings {
    pub mode: LockMode,
    /// Lock file; defaults to `stylecast.lock` in the system temp directory
    pub path: Option<PathBuf>,
}

/// `[extract]` section
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ExtractSettings {
    /// Turn page/section breaks into blank paragraphs
    pub preserve_breaks: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.compose_options(), ComposeOptions::default());
    }

    #[test]
    fn test_partial_sections() {
        let settings = Settings::from_toml_str(
            r#"
[compose]
strict = true
table_chunk_pause_ms = 25

[lock]
mode = "nonblocking"
"#,
        )
        .unwrap();

        assert!(settings.compose.strict);
        assert_eq!(settings.compose.batch_size, 50);
        assert_eq!(settings.lock.mode, LockMode::Nonblocking);
        assert!(settings.lock.path.is_none());
        assert!(!settings.extract.preserve_breaks);

        let options = settings.compose_options();
        assert!(options.strict);
        assert_eq!(options.table_chunk_pause, Duration::from_millis(25));
    }

    #[test]
    fn test_lock_modes() {
        for (text, mode) in [
            ("blocking", LockMode::Blocking),
            ("nonblocking", LockMode::Nonblocking),
            ("disabled", LockMode::Disabled),
        ] {
            let settings = Settings::from_toml_str(&format!("[lock]\nmode = \"{}\"", text)).unwrap();
            assert_eq!(settings.lock.mode, mode);
        }
        assert!(Settings::from_toml_str("[lock]\nmode = \"sometimes\"").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[extract]\npreserve_breaks = true\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert!(settings.extract.preserve_breaks);

        let missing = dir.path().join("missing.toml");
        let err = Settings::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));

        fs::write(&path, "[compose]\nbatch_size = \"many\"\n").unwrap();
        assert!(Settings::load(Some(&path)).is_err());
    }
}
