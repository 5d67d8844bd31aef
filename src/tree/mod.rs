//! Bucket Tree Module
//!
//! In-memory image of the whole database: an arena of bucket nodes
//! addressed by [`BucketId`].
//!
//! ## Responsibilities
//! - Give every bucket a stable id independent of transaction lifetime
//! - Apply logged operations (live commits and WAL replay share one path)
//! - Cheap copy-on-write clones for write transactions
//!
//! ## Data Structure Choice
//! Nodes sit behind `Arc`, so cloning a `Tree` copies one pointer per
//! bucket. A write transaction only deep-copies the nodes it touches
//! (`Arc::make_mut`), and readers keep the previous version alive for as
//! long as they hold it.

mod node;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{ArborError, Result};
use crate::wal::Operation;

pub use node::{BucketId, BucketNode, Child, ROOT_BUCKET};

/// Arena of bucket nodes; the root bucket always exists
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: BTreeMap<BucketId, Arc<BucketNode>>,
    next_id: BucketId,
}

impl Tree {
    /// Create a tree holding only the empty root bucket
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(ROOT_BUCKET, Arc::new(BucketNode::new()));
        Self {
            nodes,
            next_id: ROOT_BUCKET + 1,
        }
    }

    /// Rebuild a tree from checkpointed nodes
    pub(crate) fn from_parts(nodes: BTreeMap<BucketId, BucketNode>, next_id: BucketId) -> Result<Self> {
        if !nodes.contains_key(&ROOT_BUCKET) {
            return Err(ArborError::Storage("Checkpoint has no root bucket".to_string()));
        }
        if let Some(&max_id) = nodes.keys().next_back() {
            if max_id >= next_id {
                return Err(ArborError::Storage(format!(
                    "Checkpoint bucket id {} not below next id {}",
                    max_id, next_id
                )));
            }
        }

        // Every bucket must be reachable from the root through exactly one parent
        let mut seen = BTreeSet::from([ROOT_BUCKET]);
        let mut pending = vec![ROOT_BUCKET];
        while let Some(id) = pending.pop() {
            let node = nodes.get(&id).ok_or_else(|| {
                ArborError::Storage(format!("Checkpoint references missing bucket {}", id))
            })?;
            for (_, child) in node.iter() {
                if let Child::Bucket(child_id) = child {
                    if !seen.insert(*child_id) {
                        return Err(ArborError::Storage(format!(
                            "Checkpoint links bucket {} more than once",
                            child_id
                        )));
                    }
                    pending.push(*child_id);
                }
            }
        }
        if seen.len() != nodes.len() {
            return Err(ArborError::Storage(format!(
                "Checkpoint has {} unreachable buckets",
                nodes.len() - seen.len()
            )));
        }

        Ok(Self {
            nodes: nodes.into_iter().map(|(id, node)| (id, Arc::new(node))).collect(),
            next_id,
        })
    }

    /// Look up a bucket node by id
    pub fn node(&self, id: BucketId) -> Option<&BucketNode> {
        self.nodes.get(&id).map(|n| n.as_ref())
    }

    /// Id the next created bucket will receive
    pub fn next_id(&self) -> BucketId {
        self.next_id
    }

    /// Number of buckets, including the root
    pub fn bucket_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = (BucketId, &BucketNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node.as_ref()))
    }

    /// Apply one logged operation.
    ///
    /// Operations are pre-validated by the mutation layer, so a failure here
    /// means the log and the tree disagree.
    pub fn apply(&mut self, op: &Operation) -> Result<()> {
        match op {
            Operation::CreateBucket { parent, name, id } => {
                if self.nodes.contains_key(id) {
                    return Err(inconsistent(format!("bucket id {} already exists", id)));
                }
                let node = self.node_mut(*parent)?;
                if node.get(name).is_some() {
                    return Err(inconsistent(format!(
                        "name {:?} already taken in bucket {}",
                        String::from_utf8_lossy(name),
                        parent
                    )));
                }
                node.insert(name.clone(), Child::Bucket(*id));
                self.nodes.insert(*id, Arc::new(BucketNode::new()));
                self.next_id = self.next_id.max(id + 1);
            }
            Operation::Put { bucket, key, value } => {
                let node = self.node_mut(*bucket)?;
                if node.get(key).is_some_and(Child::is_bucket) {
                    return Err(inconsistent(format!(
                        "put over sub-bucket {:?} in bucket {}",
                        String::from_utf8_lossy(key),
                        bucket
                    )));
                }
                node.insert(key.clone(), Child::Value(Bytes::from(value.clone())));
            }
            Operation::DeleteKey { bucket, key } => {
                let node = self.node_mut(*bucket)?;
                if node.get(key).is_some_and(Child::is_bucket) {
                    return Err(inconsistent(format!(
                        "delete-key on sub-bucket {:?} in bucket {}",
                        String::from_utf8_lossy(key),
                        bucket
                    )));
                }
                node.remove(key);
            }
            Operation::DeleteBucket { parent, name } => {
                let node = self.node_mut(*parent)?;
                match node.get(name) {
                    Some(Child::Bucket(id)) => {
                        let id = *id;
                        node.remove(name);
                        self.remove_subtree(id);
                    }
                    _ => {
                        return Err(inconsistent(format!(
                            "no sub-bucket {:?} in bucket {}",
                            String::from_utf8_lossy(name),
                            parent
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    /// Mutable access to a node, copying it first if a reader still shares it
    fn node_mut(&mut self, id: BucketId) -> Result<&mut BucketNode> {
        self.nodes
            .get_mut(&id)
            .map(Arc::make_mut)
            .ok_or_else(|| inconsistent(format!("bucket id {} does not exist", id)))
    }

    /// Drop a bucket node and every node beneath it
    fn remove_subtree(&mut self, id: BucketId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                pending.extend(node.iter().filter_map(|(_, child)| match child {
                    Child::Bucket(child_id) => Some(*child_id),
                    Child::Value(_) => None,
                }));
            }
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

fn inconsistent(message: String) -> ArborError {
    ArborError::Storage(format!("Inconsistent operation: {}", message))
}
