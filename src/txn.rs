//! Transactions
//!
//! [`ReadTxn`] is a frozen version of the tree. [`WriteTxn`] is a private
//! working copy plus the store's writer slot; its changes become visible
//! all at once on [`WriteTxn::commit`], and dropping it without committing
//! discards them and frees the slot.

use std::sync::Arc;

use parking_lot::MutexGuard;

use crate::bucket::{self, BucketHandle, BucketPath, Step};
use crate::error::Result;
use crate::store::{Store, Writer};
use crate::tree::{BucketId, Tree};
use crate::wal::Operation;

/// Transaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// Read access shared by every kind of transaction
pub trait Transaction {
    /// The version of the tree this transaction sees
    fn tree(&self) -> &Tree;

    fn mode(&self) -> TxMode;

    /// Resolve an existing bucket
    fn resolve(&self, path: &BucketPath) -> Result<BucketHandle> {
        bucket::resolve(self.tree(), path)
    }
}

// =============================================================================
// Read-only
// =============================================================================

/// A read-only transaction: a consistent snapshot as of its start
pub struct ReadTxn {
    tree: Arc<Tree>,
}

impl ReadTxn {
    pub(crate) fn new(tree: Arc<Tree>) -> Self {
        Self { tree }
    }

    /// End the transaction, releasing its snapshot
    pub fn close(self) {}
}

impl Transaction for ReadTxn {
    fn tree(&self) -> &Tree {
        &self.tree
    }

    fn mode(&self) -> TxMode {
        TxMode::ReadOnly
    }
}

// =============================================================================
// Read-write
// =============================================================================

/// The read-write transaction. At most one exists per store at a time.
pub struct WriteTxn<'a> {
    store: &'a Store,
    writer: MutexGuard<'a, Writer>,
    tree: Tree,
    /// Operations applied so far, in order
    ops: Vec<Operation>,
}

impl<'a> WriteTxn<'a> {
    pub(crate) fn new(store: &'a Store, writer: MutexGuard<'a, Writer>, tree: Tree) -> Self {
        tracing::trace!("Began write transaction after LSN {}", writer.last_lsn);
        Self {
            store,
            writer,
            tree,
            ops: Vec::new(),
        }
    }

    /// Resolve a bucket, creating missing segments when `create_missing`
    /// is set
    pub fn resolve_with(&mut self, path: &BucketPath, create_missing: bool) -> Result<BucketHandle> {
        if !create_missing {
            return bucket::resolve(&self.tree, path);
        }

        let mut current = crate::tree::ROOT_BUCKET;
        for (depth, segment) in path.segments().iter().enumerate() {
            let at = path.prefix(depth + 1);
            current = match bucket::step(&self.tree, current, segment, &at)? {
                Step::Bucket(id) => id,
                Step::Missing => self.create_child(current, segment)?,
            };
        }

        Ok(BucketHandle {
            id: current,
            path: path.clone(),
        })
    }

    /// Create an empty bucket `name` under `parent`, returning its id
    pub(crate) fn create_child(&mut self, parent: BucketId, name: &str) -> Result<BucketId> {
        let id = self.tree.next_id();
        self.apply(Operation::CreateBucket {
            parent,
            name: name.as_bytes().to_vec(),
            id,
        })?;
        Ok(id)
    }

    /// Apply an operation to the working tree and record it for the WAL
    pub(crate) fn apply(&mut self, op: Operation) -> Result<()> {
        self.tree.apply(&op)?;
        self.ops.push(op);
        Ok(())
    }

    /// Number of operations applied so far
    pub fn pending_ops(&self) -> usize {
        self.ops.len()
    }

    /// Make every change durable and visible.
    ///
    /// The WAL entry is written (and synced, per the sync strategy) before
    /// the new tree is published. If the append fails nothing is published
    /// and the transaction is rolled back.
    pub fn commit(self) -> Result<()> {
        let WriteTxn {
            store,
            mut writer,
            tree,
            ops,
        } = self;

        if ops.is_empty() {
            tracing::trace!("Committed empty write transaction");
            return Ok(());
        }

        let op_count = ops.len();
        let lsn = writer.wal.append(ops)?;
        writer.last_lsn = lsn;

        let tree = Arc::new(tree);
        store.publish(Arc::clone(&tree));
        tracing::debug!("Committed LSN {} ({} operations)", lsn, op_count);

        // The commit is already durable; a failed checkpoint only delays
        // WAL truncation until the next one.
        if store.should_checkpoint(&writer) {
            if let Err(e) = store.checkpoint_locked(&mut writer, &tree) {
                tracing::warn!("Checkpoint after LSN {} failed: {}", lsn, e);
            }
        }

        Ok(())
    }

    /// Discard every change and release the writer slot
    pub fn rollback(self) {
        tracing::debug!("Rolled back write transaction ({} operations)", self.ops.len());
    }
}

impl Transaction for WriteTxn<'_> {
    fn tree(&self) -> &Tree {
        &self.tree
    }

    fn mode(&self) -> TxMode {
        TxMode::ReadWrite
    }
}

// =============================================================================
// Either
// =============================================================================

/// A transaction of either mode, as returned by `Store::begin`
pub enum Txn<'a> {
    Read(ReadTxn),
    Write(WriteTxn<'a>),
}

impl Txn<'_> {
    /// Commit a read-write transaction or release a read-only one
    pub fn close(self) -> Result<()> {
        match self {
            Txn::Read(tx) => {
                tx.close();
                Ok(())
            }
            Txn::Write(tx) => tx.commit(),
        }
    }
}

impl Transaction for Txn<'_> {
    fn tree(&self) -> &Tree {
        match self {
            Txn::Read(tx) => tx.tree(),
            Txn::Write(tx) => tx.tree(),
        }
    }

    fn mode(&self) -> TxMode {
        match self {
            Txn::Read(_) => TxMode::ReadOnly,
            Txn::Write(_) => TxMode::ReadWrite,
        }
    }
}
