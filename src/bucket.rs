//! Bucket paths and path resolution
//!
//! A [`BucketPath`] names a location in the bucket tree, root to leaf. The
//! resolver walks it one segment at a time inside a transaction and yields
//! a [`BucketHandle`] on the bucket it lands on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ArborError, Result};
use crate::tree::{BucketId, BucketNode, Child, Tree, ROOT_BUCKET};

/// Separator used by the textual form of a path
pub const PATH_SEPARATOR: char = '/';

/// Root-to-leaf sequence of bucket names; empty means the database root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketPath(Vec<String>);

impl BucketPath {
    /// The database root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from segments, rejecting empty names and names
    /// containing the separator
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = Self(segments.into_iter().map(Into::into).collect());
        path.validate()?;
        Ok(path)
    }

    /// Parse "a/b/c". Leading and trailing separators are ignored, so "" and
    /// "/" both name the root.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim_matches(PATH_SEPARATOR);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::new(trimmed.split(PATH_SEPARATOR))
    }

    /// Check every segment is a legal bucket name
    pub fn validate(&self) -> Result<()> {
        for segment in &self.0 {
            if segment.is_empty() {
                return Err(ArborError::InvalidKey(format!(
                    "empty bucket name in path {}",
                    self
                )));
            }
            if segment.contains(PATH_SEPARATOR) {
                return Err(ArborError::InvalidKey(format!(
                    "bucket name {:?} contains '{}'",
                    segment, PATH_SEPARATOR
                )));
            }
        }
        Ok(())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// This path extended by one segment
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// The first `len` segments
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Split into the parent path and the final segment; `None` at the root
    pub fn split_last(&self) -> Option<(Self, &str)> {
        let (last, parent) = self.0.split_last()?;
        Some((Self(parent.to_vec()), last.as_str()))
    }
}

impl fmt::Display for BucketPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", PATH_SEPARATOR)?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", PATH_SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// A resolved bucket inside one transaction.
///
/// The id stays valid across transactions until the bucket is deleted, but
/// a handle only guarantees the bucket exists in the transaction that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketHandle {
    pub id: BucketId,
    pub path: BucketPath,
}

impl BucketHandle {
    pub fn root() -> Self {
        Self {
            id: ROOT_BUCKET,
            path: BucketPath::root(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_BUCKET
    }
}

/// What the resolver found for one segment
pub(crate) enum Step {
    Bucket(BucketId),
    Missing,
}

/// Look up `name` under `parent`, rejecting keys
pub(crate) fn step(tree: &Tree, parent: BucketId, name: &str, at: &BucketPath) -> Result<Step> {
    let node = tree.node(parent).ok_or_else(|| {
        ArborError::Storage(format!("bucket id {} vanished during resolution", parent))
    })?;

    match node.get(name.as_bytes()) {
        Some(Child::Bucket(id)) => Ok(Step::Bucket(*id)),
        Some(Child::Value(_)) => Err(ArborError::NotABucket { path: at.clone() }),
        None => Ok(Step::Missing),
    }
}

/// Resolve an existing bucket.
///
/// Fails with `BucketNotFound` (carrying the prefix that did resolve) when a
/// segment is missing, and with `NotABucket` when a segment names a key.
pub fn resolve(tree: &Tree, path: &BucketPath) -> Result<BucketHandle> {
    let mut current = ROOT_BUCKET;

    for (depth, segment) in path.segments().iter().enumerate() {
        let at = path.prefix(depth + 1);
        match step(tree, current, segment, &at)? {
            Step::Bucket(id) => current = id,
            Step::Missing => {
                return Err(ArborError::BucketNotFound {
                    path: path.clone(),
                    resolved: path.prefix(depth),
                })
            }
        }
    }

    Ok(BucketHandle {
        id: current,
        path: path.clone(),
    })
}

/// The node behind a handle produced in this tree
pub(crate) fn node<'t>(tree: &'t Tree, handle: &BucketHandle) -> Result<&'t BucketNode> {
    tree.node(handle.id).ok_or_else(|| {
        ArborError::Storage(format!(
            "bucket {} (id {}) missing from its transaction",
            handle.path, handle.id
        ))
    })
}
