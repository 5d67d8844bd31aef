//! Snapshot Reader
//!
//! Loads a snapshot file back into a bucket tree, validating its
//! structure and checksum.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use bytes::{Buf, Bytes};

use crate::error::{ArborError, Result};
use crate::tree::{BucketId, BucketNode, Child, Tree};

use super::{FOOTER_SIZE, HEADER_SIZE, KIND_BUCKET, KIND_VALUE, MAGIC, VERSION};

/// A snapshot loaded into memory
pub struct SnapshotReader {
    tree: Tree,
    last_lsn: u64,
}

impl SnapshotReader {
    /// Open and fully decode a snapshot
    pub fn open(path: &Path) -> Result<Self> {
        let data = Bytes::from(fs::read(path)?);

        if data.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(ArborError::Storage(format!(
                "Snapshot too short: {} bytes",
                data.len()
            )));
        }

        // Read and validate header
        let mut header = data.slice(..HEADER_SIZE);
        if &header[0..4] != MAGIC {
            return Err(ArborError::Storage(format!(
                "Invalid snapshot magic: expected ARBR, got {:?}",
                &header[0..4]
            )));
        }
        header.advance(4);

        let version = header.get_u16_le();
        if version != VERSION {
            return Err(ArborError::Storage(format!(
                "Unsupported snapshot version: {}",
                version
            )));
        }

        let last_lsn = header.get_u64_le();
        let next_id = header.get_u64_le();
        let bucket_count = header.get_u64_le();

        // Footer carries the body checksum
        let body_end = data.len() - FOOTER_SIZE;
        let mut footer = data.slice(body_end..);
        let expected_crc = footer.get_u32_le();

        let mut body = data.slice(HEADER_SIZE..body_end);
        let actual_crc = crc32fast::hash(&body);
        if actual_crc != expected_crc {
            return Err(ArborError::Storage(format!(
                "Snapshot CRC mismatch: expected {:08x}, got {:08x}",
                expected_crc, actual_crc
            )));
        }

        let mut nodes = BTreeMap::new();
        for _ in 0..bucket_count {
            let (id, node) = read_bucket(&mut body)?;
            if nodes.insert(id, node).is_some() {
                return Err(ArborError::Storage(format!(
                    "Snapshot lists bucket {} twice",
                    id
                )));
            }
        }

        if body.has_remaining() {
            return Err(ArborError::Storage(format!(
                "Snapshot has {} trailing body bytes",
                body.remaining()
            )));
        }

        let tree = Tree::from_parts(nodes, next_id)?;
        Ok(Self { tree, last_lsn })
    }

    /// Last WAL LSN contained in this snapshot
    pub fn last_lsn(&self) -> u64 {
        self.last_lsn
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }
}

/// Decode one bucket record
fn read_bucket(body: &mut Bytes) -> Result<(BucketId, BucketNode)> {
    let id = take_u64(body)?;
    let child_count = take_u32(body)?;

    let mut node = BucketNode::new();
    for _ in 0..child_count {
        need(body, 9)?;
        let kind = body.get_u8();
        let name_len = body.get_u32_le() as usize;
        let payload_len = body.get_u32_le() as usize;

        need(body, name_len + payload_len)?;
        let name = body.split_to(name_len).to_vec();
        let payload = body.split_to(payload_len);

        let child = match kind {
            KIND_VALUE => Child::Value(payload),
            KIND_BUCKET if payload_len == 8 => {
                let mut payload = payload;
                Child::Bucket(payload.get_u64_le())
            }
            _ => {
                return Err(ArborError::Storage(format!(
                    "Bad child record in bucket {}: kind {} with {} payload bytes",
                    id, kind, payload_len
                )))
            }
        };

        if node.insert(name, child).is_some() {
            return Err(ArborError::Storage(format!(
                "Duplicate child name in bucket {}",
                id
            )));
        }
    }

    Ok((id, node))
}

fn need(body: &Bytes, len: usize) -> Result<()> {
    if body.remaining() < len {
        return Err(ArborError::Storage(format!(
            "Snapshot body truncated: need {} bytes, have {}",
            len,
            body.remaining()
        )));
    }
    Ok(())
}

fn take_u64(body: &mut Bytes) -> Result<u64> {
    need(body, 8)?;
    Ok(body.get_u64_le())
}

fn take_u32(body: &mut Bytes) -> Result<u32> {
    need(body, 4)?;
    Ok(body.get_u32_le())
}
