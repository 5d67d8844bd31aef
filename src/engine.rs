//! Engine Module
//!
//! The entry point the transport layer calls: one method per request
//! kind, each running in its own short transaction.
//!
//! ## Responsibilities
//! - Route protocol commands to the listing, scan and mutation engines
//! - Open a read-only transaction for reads, the write transaction for
//!   mutations, and close it on every path
//! - Apply request defaults (scan limit, page size cap)
//! - Log failures with the operation and path

use std::path::Path;

use crate::bucket::BucketPath;
use crate::config::Config;
use crate::error::{ArborError, Result};
use crate::listing::{self, Page, PageRequest};
use crate::mutation;
use crate::protocol::{Command, Reply};
use crate::scan::{self, ScanEntry};
use crate::store::Store;
use crate::tree::Child;
use crate::txn::Transaction;

/// The bucket browsing and editing engine
pub struct Engine {
    store: Store,
}

impl Engine {
    /// Open or create an engine with the given config
    pub fn open(config: Config) -> Result<Self> {
        Ok(Self {
            store: Store::open(config)?,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Ok(Self {
            store: Store::open_path(path)?,
        })
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Result<Reply> {
        match command {
            Command::Ping => Ok(Reply::Pong),
            Command::List {
                path,
                page_token,
                page_size,
            } => {
                let request = PageRequest {
                    page_token,
                    page_size: page_size.map(|n| n as usize),
                };
                self.list(&path, &request).map(Reply::Listing)
            }
            Command::CreateBucket { path } => self.create_bucket(&path).map(|_| Reply::Done),
            Command::Put { path, key, value } => self.put(&path, &key, &value).map(|_| Reply::Done),
            Command::Get { path, key } => self.get(&path, &key).map(Reply::Value),
            Command::DeleteKey { path, key } => self.delete_key(&path, &key).map(|_| Reply::Done),
            Command::DeleteBucket { path } => self.delete_bucket(&path).map(|_| Reply::Done),
            Command::PrefixScan {
                path,
                prefix,
                limit,
            } => self
                .scan_prefix(&path, &prefix, limit.map(|n| n as usize))
                .map(Reply::Entries),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// List the buckets and keys directly under `path`
    ///
    /// Requested page sizes are capped at `max_page_size`.
    pub fn list(&self, path: &BucketPath, request: &PageRequest) -> Result<Page> {
        let max_page_size = self.store.config().max_page_size;
        let request = PageRequest {
            page_token: request.page_token.clone(),
            page_size: request
                .page_size
                .filter(|&n| n > 0)
                .map(|n| n.min(max_page_size)),
        };

        let result = self.store.view(|tx| {
            path.validate()?;
            let handle = tx.resolve(path)?;
            listing::list(tx.tree(), &handle, &request)
        });
        traced("list", path, result)
    }

    /// Get the value of `key` in the bucket at `path`
    pub fn get(&self, path: &BucketPath, key: &[u8]) -> Result<Vec<u8>> {
        let result = self.store.view(|tx| {
            path.validate()?;
            mutation::validate_key(key)?;
            let handle = tx.resolve(path)?;
            let node = tx.tree().node(handle.id);

            match node.and_then(|node| node.get(key)) {
                Some(Child::Value(value)) => Ok(value.to_vec()),
                Some(Child::Bucket(_)) | None => Err(ArborError::NotFound {
                    path: path.clone(),
                    key: mutation::display_key(key),
                }),
            }
        });
        traced("get", path, result)
    }

    /// Entries of the bucket at `path` whose key starts with `prefix`
    ///
    /// Without an explicit limit, `default_scan_limit` applies.
    pub fn scan_prefix(
        &self,
        path: &BucketPath,
        prefix: &[u8],
        limit: Option<usize>,
    ) -> Result<Vec<ScanEntry>> {
        let limit = limit
            .filter(|&n| n > 0)
            .or(self.store.config().default_scan_limit);

        let result = self.store.view(|tx| {
            path.validate()?;
            let handle = tx.resolve(path)?;
            scan::scan_prefix(tx.tree(), &handle, prefix, limit)
        });
        traced("prefix-scan", path, result)
    }

    /// Health check
    pub fn ping(&self) -> Reply {
        Reply::Pong
    }

    // =========================================================================
    // Mutations (one write transaction each)
    // =========================================================================

    /// Create the bucket at `path`, including missing ancestors
    pub fn create_bucket(&self, path: &BucketPath) -> Result<()> {
        let result = self
            .store
            .update(|tx| mutation::create_bucket(tx, path).map(|_| ()));
        traced("create-bucket", path, result)
    }

    /// Insert or overwrite `key` in the existing bucket at `path`
    pub fn put(&self, path: &BucketPath, key: &[u8], value: &[u8]) -> Result<()> {
        let result = self.store.update(|tx| mutation::put(tx, path, key, value));
        traced("put", path, result)
    }

    /// Delete `key` from the bucket at `path`; absent keys are fine
    pub fn delete_key(&self, path: &BucketPath, key: &[u8]) -> Result<()> {
        let result = self.store.update(|tx| mutation::delete_key(tx, path, key));
        traced("delete-key", path, result)
    }

    /// Delete the bucket at `path` and everything beneath it
    pub fn delete_bucket(&self, path: &BucketPath) -> Result<()> {
        let result = self.store.update(|tx| mutation::delete_bucket(tx, path));
        traced("delete-bucket", path, result)
    }

    // =========================================================================
    // Lifecycle & Accessors
    // =========================================================================

    /// Close the engine gracefully
    ///
    /// Checkpoints outstanding commits and syncs to disk
    pub fn close(self) -> Result<()> {
        self.store.close()
    }

    /// Get the underlying store
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        self.store.config()
    }
}

/// Log a failed operation with its path
fn traced<T>(op: &str, path: &BucketPath, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        tracing::debug!(op, path = %path, kind = ?e.kind(), "Operation failed: {}", e);
    }
    result
}
