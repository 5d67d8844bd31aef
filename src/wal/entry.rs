//! WAL Entry definitions
//!
//! One entry is one committed transaction: every operation it applied, in
//! order, under a single LSN.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{ArborError, Result};
use crate::tree::BucketId;

/// Frame header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Largest payload a single entry may carry (256 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 256 * 1024 * 1024;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// Timestamp (unix millis) when the transaction committed
    pub timestamp: u64,

    /// The operations the transaction applied
    pub ops: Vec<Operation>,
}

/// Operations that can be logged.
///
/// Buckets are addressed by id rather than path so replay does not depend
/// on name resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create bucket `id` named `name` under `parent`
    CreateBucket {
        parent: BucketId,
        name: Vec<u8>,
        id: BucketId,
    },

    /// Insert or overwrite a key
    Put {
        bucket: BucketId,
        key: Vec<u8>,
        value: Vec<u8>,
    },

    /// Remove a key if present
    DeleteKey { bucket: BucketId, key: Vec<u8> },

    /// Remove a child bucket and everything beneath it
    DeleteBucket { parent: BucketId, name: Vec<u8> },
}

/// The serialized part of an entry (LSN lives in the frame header)
#[derive(Deserialize)]
struct Payload {
    timestamp: u64,
    ops: Vec<Operation>,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    timestamp: u64,
    ops: &'a [Operation],
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, ops: Vec<Operation>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self { lsn, timestamp, ops }
    }

    /// Serialize to a full frame: [LSN][CRC][Len][Data]
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(&PayloadRef {
            timestamp: self.timestamp,
            ops: &self.ops,
        })?;

        if payload.len() > MAX_PAYLOAD_SIZE as usize {
            return Err(ArborError::Serialization(format!(
                "WAL entry too large: {} bytes (max {})",
                payload.len(),
                MAX_PAYLOAD_SIZE
            )));
        }

        let crc = Self::compute_crc(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&self.lsn.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&payload);

        Ok(frame)
    }

    /// Rebuild an entry from its header fields and payload bytes,
    /// verifying the checksum
    pub fn deserialize(lsn: u64, crc: u32, payload: &[u8]) -> Result<Self> {
        let actual = Self::compute_crc(payload);
        if actual != crc {
            return Err(ArborError::WalCorruption(format!(
                "CRC mismatch at LSN {}: expected {:08x}, got {:08x}",
                lsn, crc, actual
            )));
        }

        let decoded: Payload = bincode::deserialize(payload).map_err(|e| {
            ArborError::WalCorruption(format!("Undecodable entry at LSN {}: {}", lsn, e))
        })?;

        Ok(Self {
            lsn,
            timestamp: decoded.timestamp,
            ops: decoded.ops,
        })
    }

    pub fn compute_crc(payload: &[u8]) -> u32 {
        crc32fast::hash(payload)
    }
}
