//! Store Module
//!
//! The store handle: owns the locked data directory, the current version
//! of the bucket tree, and the single writer slot.
//!
//! ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
//!
//! - **Readers** clone the current `Arc<Tree>` under a read lock held only
//!   for the pointer copy. A reader keeps that version for its whole life,
//!   so it never sees a commit that lands after it started.
//! - **The writer** holds `writer` (which owns the WAL) for the lifetime of
//!   its `WriteTxn`. Waiting for it is bounded by
//!   `Config::writer_lock_timeout_ms`; there is no other application lock.
//! - **Commit** appends to the WAL, syncs, then swaps in the new tree.
//!
//! ## Startup
//! 1. Lock the data directory (bounded wait)
//! 2. Load the latest snapshot, if any
//! 3. Recover the WAL and replay entries newer than the snapshot
//! 4. Checkpoint recovered entries and truncate the WAL

use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{ArborError, Result};
use crate::storage::{SnapshotBuilder, SnapshotInfo, SnapshotReader, StoreDir};
use crate::tree::Tree;
use crate::txn::{ReadTxn, TxMode, Txn, WriteTxn};
use crate::wal::{WalRecovery, WalWriter};

/// State guarded by the writer lock
pub(crate) struct Writer {
    pub(crate) wal: WalWriter,
    /// LSN of the last committed transaction
    pub(crate) last_lsn: u64,
}

/// Handle on an open store
pub struct Store {
    config: Config,
    dir: StoreDir,
    /// Latest committed version of the tree
    current: RwLock<Arc<Tree>>,
    /// The single writer slot; holding it is holding the write transaction
    writer: Mutex<Writer>,
}

impl Store {
    /// Open or create a store with the given config
    pub fn open(config: Config) -> Result<Self> {
        let dir = StoreDir::open(&config.data_dir, config.lock_timeout())?;
        let snapshot_path = dir.snapshot_path();
        let wal_path = dir.wal_path();

        // Step 1: Load the last checkpoint
        let (mut tree, checkpoint_lsn) = if snapshot_path.exists() {
            let snapshot = SnapshotReader::open(&snapshot_path)?;
            let lsn = snapshot.last_lsn();
            (snapshot.into_tree(), lsn)
        } else {
            (Tree::new(), 0)
        };

        // Step 2: Replay commits made after it
        let mut last_lsn = checkpoint_lsn;
        let mut wal_has_entries = false;

        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    "WAL recovery: {} entries recovered, {} corrupted, last_lsn={}",
                    recovery.entries_recovered,
                    recovery.entries_corrupted,
                    recovery.last_lsn
                );
            }

            let mut replayed = 0u64;
            for entry in entries {
                wal_has_entries = true;
                if entry.lsn <= checkpoint_lsn {
                    continue; // Already folded into the snapshot
                }
                for op in &entry.ops {
                    tree.apply(op).map_err(|e| {
                        ArborError::WalCorruption(format!("replaying LSN {}: {}", entry.lsn, e))
                    })?;
                }
                last_lsn = entry.lsn;
                replayed += 1;
            }

            if replayed > 0 {
                tracing::info!("Replayed {} transactions on top of LSN {}", replayed, checkpoint_lsn);
            }
        }

        let mut wal = WalWriter::open(&wal_path, config.wal_sync_strategy, last_lsn + 1)?;

        // Step 3: Make recovered data durable in the snapshot, then drop the log
        if wal_has_entries {
            if last_lsn > checkpoint_lsn {
                SnapshotBuilder::write_tree(&snapshot_path, &tree, last_lsn)?;
            }
            wal.truncate()?;
        }

        tracing::debug!(
            "Opened store at {} ({} buckets, last_lsn={})",
            dir.path().display(),
            tree.bucket_count(),
            last_lsn
        );

        Ok(Self {
            config,
            dir,
            current: RwLock::new(Arc::new(tree)),
            writer: Mutex::new(Writer { wal, last_lsn }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Start a read-only transaction on the latest committed version
    pub fn begin_read(&self) -> ReadTxn {
        ReadTxn::new(Arc::clone(&self.current.read()))
    }

    /// Start the read-write transaction.
    ///
    /// Waits at most `writer_lock_timeout_ms` for the current writer to
    /// finish, then fails with `StoreUnavailable`.
    pub fn begin_write(&self) -> Result<WriteTxn<'_>> {
        let timeout = self.config.writer_lock_timeout();
        let writer = self.writer.try_lock_for(timeout).ok_or_else(|| {
            ArborError::StoreUnavailable(format!(
                "write lock busy for {}ms",
                timeout.as_millis()
            ))
        })?;

        let tree = Tree::clone(&self.current.read());
        Ok(WriteTxn::new(self, writer, tree))
    }

    /// Start a transaction of the given mode
    pub fn begin(&self, mode: TxMode) -> Result<Txn<'_>> {
        match mode {
            TxMode::ReadOnly => Ok(Txn::Read(self.begin_read())),
            TxMode::ReadWrite => Ok(Txn::Write(self.begin_write()?)),
        }
    }

    /// Run `f` in a read-only transaction
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ReadTxn) -> Result<T>,
    {
        let tx = self.begin_read();
        let result = f(&tx);
        tx.close();
        result
    }

    /// Run `f` in a read-write transaction: commit if it returns `Ok`,
    /// roll back if it returns `Err`
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteTxn<'_>) -> Result<T>,
    {
        let mut tx = self.begin_write()?;
        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }

    // =========================================================================
    // Commit & Checkpoint (called with the writer lock held)
    // =========================================================================

    /// Make `tree` the version new readers see
    pub(crate) fn publish(&self, tree: Arc<Tree>) {
        *self.current.write() = tree;
    }

    pub(crate) fn should_checkpoint(&self, writer: &Writer) -> bool {
        writer.wal.size() >= self.config.checkpoint_bytes
    }

    /// Write `tree` as the snapshot and empty the WAL
    pub(crate) fn checkpoint_locked(&self, writer: &mut Writer, tree: &Tree) -> Result<SnapshotInfo> {
        let info = SnapshotBuilder::write_tree(&self.dir.snapshot_path(), tree, writer.last_lsn)?;
        writer.wal.truncate()?;

        tracing::info!(
            "Checkpoint at LSN {}: {} buckets, {} entries, {} bytes",
            info.last_lsn,
            info.bucket_count,
            info.entry_count,
            info.file_size
        );

        Ok(info)
    }

    /// Force a checkpoint now. No-op when the WAL is empty.
    pub fn checkpoint(&self) -> Result<Option<SnapshotInfo>> {
        let timeout = self.config.writer_lock_timeout();
        let mut writer = self.writer.try_lock_for(timeout).ok_or_else(|| {
            ArborError::StoreUnavailable(format!(
                "write lock busy for {}ms",
                timeout.as_millis()
            ))
        })?;

        if writer.wal.size() == 0 {
            return Ok(None);
        }

        let tree = Arc::clone(&self.current.read());
        self.checkpoint_locked(&mut writer, &tree).map(Some)
    }

    /// Close the store gracefully
    ///
    /// Checkpoints outstanding commits and syncs the WAL. The directory
    /// lock is released when the store is dropped.
    pub fn close(self) -> Result<()> {
        self.checkpoint()?;
        self.writer.lock().wal.sync()?;
        tracing::debug!("Closed store at {}", self.dir.path().display());
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of buckets in the latest committed version, including the root
    pub fn bucket_count(&self) -> usize {
        self.current.read().bucket_count()
    }

    /// LSN of the last committed transaction.
    /// Blocks while a write transaction is open.
    pub fn last_lsn(&self) -> u64 {
        self.writer.lock().last_lsn
    }

    /// Current WAL size in bytes. Blocks while a write transaction is open.
    pub fn wal_size(&self) -> u64 {
        self.writer.lock().wal.size()
    }
}
