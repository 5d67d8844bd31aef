//! Mutation Engine
//!
//! The four mutations, each applied to an open [`WriteTxn`]. They validate
//! against the transaction's working tree before recording anything, so a
//! failure leaves the transaction unchanged; the caller (normally
//! `Store::update`) then rolls it back.

use crate::bucket::{self, BucketHandle, BucketPath};
use crate::error::{ArborError, Result};
use crate::tree::Child;
use crate::txn::{Transaction, WriteTxn};
use crate::wal::Operation;

/// Create the bucket at `path` and any missing ancestors.
/// Succeeds without change if it already exists.
pub fn create_bucket(tx: &mut WriteTxn<'_>, path: &BucketPath) -> Result<BucketHandle> {
    path.validate()?;
    tx.resolve_with(path, true)
}

/// Insert or overwrite `key` in the existing bucket at `path`
pub fn put(tx: &mut WriteTxn<'_>, path: &BucketPath, key: &[u8], value: &[u8]) -> Result<()> {
    let handle = key_bucket(tx, path, key)?;

    if bucket::node(tx.tree(), &handle)?.get(key).is_some_and(Child::is_bucket) {
        return Err(ArborError::InvalidKey(format!(
            "{} names a bucket in {}",
            display_key(key),
            path
        )));
    }

    tx.apply(Operation::Put {
        bucket: handle.id,
        key: key.to_vec(),
        value: value.to_vec(),
    })
}

/// Remove `key` from the bucket at `path`; a missing key is not an error
pub fn delete_key(tx: &mut WriteTxn<'_>, path: &BucketPath, key: &[u8]) -> Result<()> {
    let handle = key_bucket(tx, path, key)?;

    match bucket::node(tx.tree(), &handle)?.get(key) {
        None => Ok(()),
        Some(Child::Bucket(_)) => Err(ArborError::InvalidKey(format!(
            "{} names a bucket in {}, use delete-bucket",
            display_key(key),
            path
        ))),
        Some(Child::Value(_)) => tx.apply(Operation::DeleteKey {
            bucket: handle.id,
            key: key.to_vec(),
        }),
    }
}

/// Remove the bucket at `path` with everything beneath it
pub fn delete_bucket(tx: &mut WriteTxn<'_>, path: &BucketPath) -> Result<()> {
    path.validate()?;
    let (parent_path, name) = path
        .split_last()
        .ok_or_else(|| ArborError::InvalidKey("cannot delete the database root".to_string()))?;

    // Report a missing ancestor against the full target path
    let parent = tx.resolve_with(&parent_path, false).map_err(|e| match e {
        ArborError::BucketNotFound { resolved, .. } => ArborError::BucketNotFound {
            path: path.clone(),
            resolved,
        },
        other => other,
    })?;

    match bucket::node(tx.tree(), &parent)?.get(name.as_bytes()) {
        Some(Child::Bucket(_)) => tx.apply(Operation::DeleteBucket {
            parent: parent.id,
            name: name.as_bytes().to_vec(),
        }),
        Some(Child::Value(_)) => Err(ArborError::NotABucket { path: path.clone() }),
        None => Err(ArborError::BucketNotFound {
            path: path.clone(),
            resolved: parent_path,
        }),
    }
}

/// Validate a key and resolve the (non-root) bucket that holds it
fn key_bucket(tx: &WriteTxn<'_>, path: &BucketPath, key: &[u8]) -> Result<BucketHandle> {
    path.validate()?;
    validate_key(key)?;
    if path.is_root() {
        return Err(ArborError::InvalidKey(
            "the database root holds only buckets".to_string(),
        ));
    }
    tx.resolve(path)
}

/// Keys are opaque but never empty
pub fn validate_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(ArborError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}

/// Human-readable form of a key for error messages
pub(crate) fn display_key(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(text) => format!("{:?}", text),
        Err(_) => format!("0x{}", hex::encode(key)),
    }
}
