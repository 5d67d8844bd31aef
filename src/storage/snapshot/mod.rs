//! Snapshot Module
//!
//! A checkpoint of the whole bucket tree, tagged with the last WAL LSN it
//! contains.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Header (30 bytes)                                           │
//! │   Magic: "ARBR" (4) | Version: u16 (2) | LastLSN: u64 (8)   │
//! │   NextBucketId: u64 (8) | BucketCount: u64 (8)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Body (variable), one record per bucket in id order          │
//! │   [BucketId: u64][ChildCount: u32]                          │
//! │   then per child, in name order:                            │
//! │   [Kind: u8][NameLen: u32][PayloadLen: u32][Name][Payload]  │
//! │   (Kind 0 = value, payload is the value bytes;              │
//! │    Kind 1 = bucket, payload is the child id as u64)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Footer (8 bytes)                                            │
//! │   BodyCRC: u32 (4) | Padding (4)                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//! All integers are little-endian. The file is written beside its final
//! name and renamed into place, so a reader sees either the old or the new
//! checkpoint.

mod builder;
mod reader;

use std::path::PathBuf;

pub use builder::SnapshotBuilder;
pub use reader::SnapshotReader;

// =============================================================================
// Shared Constants (used by builder and reader)
// =============================================================================

/// Magic bytes identifying an ArborKV snapshot file
pub(crate) const MAGIC: &[u8; 4] = b"ARBR";

/// Current snapshot format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + LastLSN (8) + NextId (8) + Count (8)
pub(crate) const HEADER_SIZE: usize = 30;

/// Footer size: BodyCRC (4) + Padding (4)
pub(crate) const FOOTER_SIZE: usize = 8;

pub(crate) const KIND_VALUE: u8 = 0;
pub(crate) const KIND_BUCKET: u8 = 1;

/// Metadata about a written snapshot
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    /// Path to the snapshot file
    pub path: PathBuf,
    /// Last WAL LSN folded into this snapshot
    pub last_lsn: u64,
    /// Number of buckets, including the root
    pub bucket_count: u64,
    /// Number of key/value entries across all buckets
    pub entry_count: u64,
    /// File size in bytes
    pub file_size: u64,
}
