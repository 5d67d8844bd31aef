//! Bucket nodes
//!
//! A node holds the direct children of one bucket in a single ordered
//! namespace: every name maps either to a value or to a child bucket id.

use std::collections::btree_map::{self, BTreeMap};
use std::ops::Bound;

use bytes::Bytes;

/// Stable identity of a bucket, allocated once and never reused
pub type BucketId = u64;

/// The implicit root bucket of every store
pub const ROOT_BUCKET: BucketId = 0;

/// A named child inside a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// A nested bucket
    Bucket(BucketId),

    /// A key's value
    Value(Bytes),
}

impl Child {
    pub fn is_bucket(&self) -> bool {
        matches!(self, Child::Bucket(_))
    }
}

/// The children of one bucket, sorted by unsigned byte order of their names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketNode {
    children: BTreeMap<Vec<u8>, Child>,
}

impl BucketNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &[u8]) -> Option<&Child> {
        self.children.get(name)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// All children in ascending name order
    pub fn iter(&self) -> btree_map::Iter<'_, Vec<u8>, Child> {
        self.children.iter()
    }

    /// Children whose name is greater than or equal to `start`
    pub fn seek(&self, start: &[u8]) -> btree_map::Range<'_, Vec<u8>, Child> {
        self.children
            .range::<[u8], _>((Bound::Included(start), Bound::Unbounded))
    }

    /// Children whose name is strictly greater than `after`
    pub fn after(&self, after: &[u8]) -> btree_map::Range<'_, Vec<u8>, Child> {
        self.children
            .range::<[u8], _>((Bound::Excluded(after), Bound::Unbounded))
    }

    pub(crate) fn insert(&mut self, name: Vec<u8>, child: Child) -> Option<Child> {
        self.children.insert(name, child)
    }

    pub(crate) fn remove(&mut self, name: &[u8]) -> Option<Child> {
        self.children.remove(name)
    }
}
