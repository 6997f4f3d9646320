//! Staged output and atomic publication
//!
//! A run composes into a temporary copy of the template created next to
//! the destination. Only a successful run moves that copy into place; an
//! existing destination is first set aside as a backup and put back if
//! the swap fails, so the destination is either fully replaced or left
//! byte-for-byte as it was.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use thiserror::Error;
use tracing::{debug, warn};

/// Suffix appended to the destination name while it is set aside
pub const BACKUP_SUFFIX: &str = ".stylecast-backup";

/// Filesystem primitives used by publication
pub trait FsOps {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// [`FsOps`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl FsOps for StdFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Errors staging or publishing the output
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Output file already exists: {} (use --overwrite to replace it)", dest.display())]
    Exists { dest: PathBuf },

    #[error("Cannot stage a copy of {} in {}: {source}", template.display(), dir.display())]
    Stage {
        template: PathBuf,
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot set aside existing {}: {source}", dest.display())]
    Backup {
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Publishing {} failed; previous file restored: {source}", dest.display())]
    Swap {
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Publishing {} failed and the previous file could not be restored; it is kept at {}: {source}",
        dest.display(),
        backup.display()
    )]
    Restore {
        dest: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `<dest>.stylecast-backup`
pub fn backup_path(dest: &Path) -> PathBuf {
    let mut name: OsString = dest.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// A template copy being composed; removed on drop unless published
#[derive(Debug)]
pub struct StagedOutput {
    path: TempPath,
    dest: PathBuf,
}

impl StagedOutput {
    /// Copy `template` to a temporary file in the destination directory
    pub fn create(template: &Path, dest: &Path) -> Result<Self, PublishError> {
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let stage_err = |source| PublishError::Stage {
            template: template.to_path_buf(),
            dir: dir.clone(),
            source,
        };

        let path = tempfile::Builder::new()
            .prefix(".stylecast-")
            .suffix(".docx")
            .tempfile_in(&dir)
            .map_err(stage_err)?
            .into_temp_path();
        fs::copy(template, &path).map_err(stage_err)?;
        debug!("Staged {} at {}", template.display(), path.display());

        Ok(Self {
            path,
            dest: dest.to_path_buf(),
        })
    }

    /// Where the staged copy lives
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn destination(&self) -> &Path {
        &self.dest
    }

    /// Move the staged copy onto the destination
    ///
    /// An existing destination is only replaced when `overwrite` is set.
    pub fn publish(self, fs: &impl FsOps, overwrite: bool) -> Result<PathBuf, PublishError> {
        let dest = self.dest.clone();
        let backup = backup_path(&dest);
        let had_previous = dest.exists();
        if had_previous && !overwrite {
            return Err(PublishError::Exists { dest });
        }

        if had_previous {
            fs.rename(&dest, &backup)
                .map_err(|source| PublishError::Backup {
                    dest: dest.clone(),
                    source,
                })?;
            debug!("Set aside {} as {}", dest.display(), backup.display());
        }

        if let Err(source) = fs.rename(&self.path, &dest) {
            if !had_previous {
                return Err(PublishError::Swap { dest, source });
            }
            return match fs.rename(&backup, &dest) {
                Ok(()) => Err(PublishError::Swap { dest, source }),
                Err(restore) => {
                    warn!("Restoring {} failed: {}", dest.display(), restore);
                    Err(PublishError::Restore {
                        dest,
                        backup,
                        source,
                    })
                }
            };
        }

        if had_previous {
            if let Err(e) = fs.remove_file(&backup) {
                warn!("Could not remove backup {}: {}", backup.display(), e);
            }
        }
        debug!("Published {}", dest.display());
        Ok(dest)
    }

    /// Drop the staged copy without publishing
    pub fn discard(self) {
        let path = self.path.to_path_buf();
        if let Err(e) = self.path.close() {
            warn!("Could not remove staged copy {}: {}", path.display(), e);
        }
    }
}
