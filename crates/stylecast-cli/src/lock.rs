//! Single-writer run lock
//!
//! An advisory exclusive lock on a well-known file serialises conversion
//! runs across processes. The lock is held by [`RunLock`] and released
//! when it is dropped, on every exit path.

use std::fs::{File, OpenOptions, TryLockError};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Lock file name inside the system temp directory
pub const DEFAULT_LOCK_FILE: &str = "stylecast.lock";

/// Default lock location shared by every run on this machine
pub fn default_lock_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_LOCK_FILE)
}

/// How a run acquires the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Wait until the lock is free
    #[default]
    Blocking,
    /// Fail at once if another run holds the lock
    Nonblocking,
    /// No lock; concurrent runs are not serialised
    Disabled,
}

/// Errors acquiring the run lock
#[derive(Debug, Error)]
pub enum LockError {
    #[error(
        "Another stylecast run is active (lock held on {}). Wait for it to finish, or run without --lock-nonblocking to queue behind it",
        path.display()
    )]
    Busy { path: PathBuf },

    #[error("Cannot acquire lock {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A held run lock
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Lock `path`, waiting for other runs to finish
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let file = open(path)?;
        file.lock().map_err(|source| LockError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Acquired run lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Lock `path`, failing with [`LockError::Busy`] if it is held
    pub fn try_acquire(path: &Path) -> Result<Self, LockError> {
        let file = open(path)?;
        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(LockError::Busy {
                    path: path.to_path_buf(),
                })
            }
            Err(TryLockError::Error(source)) => {
                return Err(LockError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
        debug!("Acquired run lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Acquire according to `mode`; `None` when locking is disabled
    ///
    /// In blocking mode `on_wait` is called once if the lock is held
    /// by another run before waiting for it.
    pub fn for_mode(
        mode: LockMode,
        path: &Path,
        on_wait: impl FnOnce(),
    ) -> Result<Option<Self>, LockError> {
        match mode {
            LockMode::Disabled => Ok(None),
            LockMode::Nonblocking => Self::try_acquire(path).map(Some),
            LockMode::Blocking => match Self::try_acquire(path) {
                Err(LockError::Busy { .. }) => {
                    on_wait();
                    Self::acquire(path).map(Some)
                }
                other => other.map(Some),
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!("Unlocking {} failed: {}", self.path.display(), e);
        }
        debug!("Released run lock {}", self.path.display());
    }
}

fn open(path: &Path) -> Result<File, LockError> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(|source| LockError::Io {
            path: path.to_path_buf(),
            source,
        })
}
