//! Snapshot Builder
//!
//! Serializes a bucket tree into a new snapshot file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{ArborError, Result};
use crate::tree::{BucketId, BucketNode, Child, Tree};

use super::{SnapshotInfo, KIND_BUCKET, KIND_VALUE, MAGIC, VERSION};

/// Builder for writing a snapshot, one bucket at a time
pub struct SnapshotBuilder {
    /// Final file path
    path: PathBuf,
    /// Temporary path written until `finish`
    tmp_path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    last_lsn: u64,
    /// Buckets promised in the header
    expected_buckets: u64,
    buckets_written: u64,
    entry_count: u64,
    /// Running CRC hasher for the body
    body_hasher: crc32fast::Hasher,
}

impl SnapshotBuilder {
    /// Write a whole tree as the snapshot at `path`
    pub fn write_tree(path: &Path, tree: &Tree, last_lsn: u64) -> Result<SnapshotInfo> {
        let mut builder = Self::new(path, last_lsn, tree.next_id(), tree.bucket_count() as u64)?;
        for (id, node) in tree.nodes() {
            builder.add_bucket(id, node)?;
        }
        builder.finish()
    }

    /// Create a builder; writes the header immediately.
    ///
    /// Exactly `bucket_count` calls to `add_bucket` must follow.
    pub fn new(path: &Path, last_lsn: u64, next_id: BucketId, bucket_count: u64) -> Result<Self> {
        let tmp_path = path.with_extension("arb.tmp");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;

        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&last_lsn.to_le_bytes())?;
        writer.write_all(&next_id.to_le_bytes())?;
        writer.write_all(&bucket_count.to_le_bytes())?;

        Ok(Self {
            path: path.to_path_buf(),
            tmp_path,
            writer,
            last_lsn,
            expected_buckets: bucket_count,
            buckets_written: 0,
            entry_count: 0,
            body_hasher: crc32fast::Hasher::new(),
        })
    }

    /// Add one bucket record with all its children
    pub fn add_bucket(&mut self, id: BucketId, node: &BucketNode) -> Result<()> {
        self.write_body(&id.to_le_bytes())?;
        self.write_body(&field_len(node.len(), "child count")?.to_le_bytes())?;

        for (name, child) in node.iter() {
            match child {
                Child::Value(value) => {
                    self.entry_count += 1;
                    self.write_child(KIND_VALUE, name, value)?;
                }
                Child::Bucket(child_id) => {
                    self.write_child(KIND_BUCKET, name, &child_id.to_le_bytes())?;
                }
            }
        }

        self.buckets_written += 1;
        Ok(())
    }

    /// Internal: write one child record
    fn write_child(&mut self, kind: u8, name: &[u8], payload: &[u8]) -> Result<()> {
        let name_len = field_len(name.len(), "name length")?;
        let payload_len = field_len(payload.len(), "value length")?;
        self.write_body(&[kind])?;
        self.write_body(&name_len.to_le_bytes())?;
        self.write_body(&payload_len.to_le_bytes())?;
        self.write_body(name)?;
        self.write_body(payload)
    }

    /// Internal: write body bytes and accumulate CRC
    fn write_body(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.body_hasher.update(bytes);
        Ok(())
    }

    /// Finish: write the footer, sync, and move the file into place
    pub fn finish(mut self) -> Result<SnapshotInfo> {
        if self.buckets_written != self.expected_buckets {
            return Err(ArborError::Storage(format!(
                "Snapshot promised {} buckets, wrote {}",
                self.expected_buckets, self.buckets_written
            )));
        }

        let body_crc = self.body_hasher.finalize();
        self.writer.write_all(&body_crc.to_le_bytes())?;
        self.writer.write_all(&[0u8; 4])?; // Padding for alignment
        self.writer.flush()?;

        let file = self.writer.into_inner().map_err(|e| {
            ArborError::Storage(format!("Failed to flush snapshot: {}", e))
        })?;
        file.sync_all()?;
        let file_size = file.metadata()?.len();
        drop(file);

        fs::rename(&self.tmp_path, &self.path)?;
        if let Some(dir) = self.path.parent() {
            // Persist the rename itself; not every platform can open a directory
            if let Ok(dir) = File::open(dir) {
                let _ = dir.sync_all();
            }
        }

        Ok(SnapshotInfo {
            path: self.path,
            last_lsn: self.last_lsn,
            bucket_count: self.buckets_written,
            entry_count: self.entry_count,
            file_size,
        })
    }
}

/// Narrow a length to the u32 the record format stores
fn field_len(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        ArborError::Storage(format!("Snapshot {} {} exceeds u32::MAX", what, len))
    })
}
