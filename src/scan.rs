//! Prefix Scanner
//!
//! Range scan over the keys of exactly one bucket: seek to the first name
//! `>= prefix`, then walk forward while names still start with the prefix.
//! Sub-buckets inside the range are skipped, never descended into.

use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::bucket::{self, BucketHandle};
use crate::error::Result;
use crate::tree::{BucketNode, Child, Tree};

/// A key and its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Borrowing iterator over the entries of one bucket whose key starts
/// with a prefix, in ascending key order
pub struct PrefixIter<'a> {
    range: btree_map::Range<'a, Vec<u8>, Child>,
    prefix: &'a [u8],
    done: bool,
}

impl<'a> PrefixIter<'a> {
    pub fn new(node: &'a BucketNode, prefix: &'a [u8]) -> Self {
        Self {
            range: node.seek(prefix),
            prefix,
            done: false,
        }
    }
}

impl<'a> Iterator for PrefixIter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let Some((name, child)) = self.range.next() else {
                self.done = true;
                break;
            };

            // Sorted order: the first non-match ends the run
            if !name.starts_with(self.prefix) {
                self.done = true;
                break;
            }

            if let Child::Value(value) = child {
                return Some((name.as_slice(), value.as_ref()));
            }
        }
        None
    }
}

/// Collect up to `limit` entries of `handle`'s bucket whose key starts
/// with `prefix`. An empty prefix matches every key; `None` means no cap.
pub fn scan_prefix(
    tree: &Tree,
    handle: &BucketHandle,
    prefix: &[u8],
    limit: Option<usize>,
) -> Result<Vec<ScanEntry>> {
    let node = bucket::node(tree, handle)?;

    let entries = PrefixIter::new(node, prefix)
        .take(limit.unwrap_or(usize::MAX))
        .map(|(key, value)| ScanEntry {
            key: key.to_vec(),
            value: value.to_vec(),
        })
        .collect();

    Ok(entries)
}
