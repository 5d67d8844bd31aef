//! WAL Recovery
//!
//! Handles crash recovery by reading back every intact committed
//! transaction.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{ArborError, Result};

use super::{WalEntry, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of damaged frames found (recovery stops at the first one)
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the WAL was truncated (damaged tail removed)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read entries in order until end of file
    /// 2. Stop at the first torn or corrupted frame; a transaction after a
    ///    damaged one may depend on it, so nothing past it is trusted
    /// 3. Truncate the file at the end of the last intact entry
    /// 4. Return the intact entries in order
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let (entries, result, valid_len) = Self::scan(path)?;

        if result.was_truncated {
            tracing::warn!(
                "WAL {} damaged after LSN {}, truncating to {} bytes",
                path.display(),
                result.last_lsn,
                valid_len
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without modifying it.
    /// `was_truncated` reports whether `recover` would cut the file.
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let (_, result, _) = Self::scan(path)?;
        Ok(result)
    }

    /// Read the intact prefix, returning it with its byte length
    fn scan(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult, u64)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut valid_len = 0;
        let mut result = RecoveryResult {
            entries_recovered: 0,
            entries_corrupted: 0,
            last_lsn: 0,
            was_truncated: false,
        };

        loop {
            match reader.next_entry() {
                Ok(Some(entry)) if entry.lsn <= result.last_lsn => {
                    tracing::debug!(
                        "WAL scan stopped: LSN {} after {}",
                        entry.lsn,
                        result.last_lsn
                    );
                    result.entries_corrupted += 1;
                    result.was_truncated = true;
                    break;
                }
                Ok(Some(entry)) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    valid_len = reader.position();
                    entries.push(entry);
                }
                Ok(None) => break,
                Err(ArborError::WalCorruption(reason)) => {
                    tracing::debug!("WAL scan stopped: {}", reason);
                    result.entries_corrupted += 1;
                    result.was_truncated = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok((entries, result, valid_len))
    }
}
