//! WAL Writer
//!
//! Appends committed transactions to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{ArborError, Result};

use super::{Operation, WalEntry};

/// Writes entries to the WAL file
pub struct WalWriter {
    path: PathBuf,
    file: File,
    /// LSN the next append receives
    next_lsn: u64,
    /// Bytes currently in the file
    size: u64,
    sync_strategy: WalSyncStrategy,
    /// Entries appended since the last fsync
    uncommitted: usize,
    /// A failed append could not be rolled back; the tail is untrusted
    poisoned: bool,
}

impl WalWriter {
    /// Open or create a WAL file, continuing from `next_lsn`
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy, next_lsn: u64) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let size = file.seek(SeekFrom::End(0))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            next_lsn: next_lsn.max(1),
            size,
            sync_strategy,
            uncommitted: 0,
            poisoned: false,
        })
    }

    /// Append one transaction's operations, returning its LSN.
    ///
    /// If the write or its fsync fails, the file is cut back to its previous
    /// length and the LSN is not consumed, so a failed transaction never
    /// reaches replay. When that cut fails too the writer refuses further
    /// appends until the log is truncated.
    pub fn append(&mut self, ops: Vec<Operation>) -> Result<u64> {
        if self.poisoned {
            return Err(ArborError::StoreUnavailable(
                "WAL tail could not be rolled back after a failed append".to_string(),
            ));
        }

        let entry = WalEntry::new(self.next_lsn, ops);
        let frame = entry.serialize()?;
        let start = self.size;

        let should_sync = match self.sync_strategy {
            WalSyncStrategy::EveryCommit => true,
            WalSyncStrategy::EveryNCommits { count } => self.uncommitted + 1 >= count,
        };

        let written = self.write_frame(&frame).and_then(|()| {
            if should_sync {
                self.file.sync_data()?;
            }
            Ok(())
        });
        if let Err(e) = written {
            tracing::warn!("WAL append failed at LSN {}: {}", entry.lsn, e);
            self.undo_append(start);
            return Err(e);
        }

        self.size = start + frame.len() as u64;
        self.next_lsn += 1;
        self.uncommitted = if should_sync { 0 } else { self.uncommitted + 1 };

        Ok(entry.lsn)
    }

    /// Cut the file back to `start` after a failed append
    fn undo_append(&mut self, start: u64) {
        let restored = self
            .file
            .set_len(start)
            .and_then(|()| self.file.seek(SeekFrom::Start(start)).map(|_| ()));
        if let Err(e) = restored {
            tracing::error!("WAL rollback to {} bytes failed, refusing appends: {}", start, e);
            self.poisoned = true;
        }
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.file.write_all(frame)?;
        self.file.flush()?;
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Discard every entry (after a checkpoint made them redundant).
    /// LSNs keep counting up.
    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.sync_all()?;
        self.size = 0;
        self.uncommitted = 0;
        self.poisoned = false;
        Ok(())
    }

    /// LSN the next append will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Current file size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Entries appended but not yet fsynced
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
