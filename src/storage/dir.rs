//! Data directory management
//!
//! Owns the on-disk layout and the process-level `LOCK`:
//!
//! ```text
//! <data_dir>/
//! ├─ LOCK            # Advisory lock, one process per directory
//! ├─ wal.log         # Write-ahead log
//! └─ snapshot.arb    # Latest checkpoint
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{ArborError, Result};

const LOCK_FILE: &str = "LOCK";
const WAL_FILE: &str = "wal.log";
const SNAPSHOT_FILE: &str = "snapshot.arb";

/// Interval between attempts to take a busy lock
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// An opened data directory holding the exclusive lock.
///
/// The lock is released when this value is dropped.
#[derive(Debug)]
pub struct StoreDir {
    path: PathBuf,
    _lock_file: File,
}

impl StoreDir {
    /// Open or create a data directory, waiting up to `timeout` for another
    /// holder of the lock to let go.
    ///
    /// Fails with `StoreUnavailable` if the lock stays taken.
    pub fn open(path: &Path, timeout: Duration) -> Result<Self> {
        fs::create_dir_all(path)?;

        if !path.is_dir() {
            return Err(ArborError::Config(format!(
                "data path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        let deadline = Instant::now() + timeout;
        loop {
            match lock_file.try_lock_exclusive() {
                Ok(()) => break,
                Err(e) if Instant::now() >= deadline => {
                    return Err(ArborError::StoreUnavailable(format!(
                        "{} is locked by another process ({}), gave up after {}ms",
                        path.display(),
                        e,
                        timeout.as_millis()
                    )));
                }
                Err(_) => thread::sleep(LOCK_RETRY_INTERVAL),
            }
        }

        tracing::debug!("Locked data directory {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn wal_path(&self) -> PathBuf {
        self.path.join(WAL_FILE)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.path.join(SNAPSHOT_FILE)
    }
}
