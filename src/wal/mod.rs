//! Write-Ahead Log (WAL) Module
//!
//! Provides durability for committed transactions through append-only
//! logging.
//!
//! ## Responsibilities
//! - Append one entry per committed write transaction
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering against checkpoints
//! - Crash recovery and replay
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Entry 1                                      │
//! │ ┌─────────┬─────────┬─────────┬────────────┐ │
//! │ │ LSN (8) │ CRC (4) │ Len (4) │ Data       │ │
//! │ └─────────┴─────────┴─────────┴────────────┘ │
//! ├──────────────────────────────────────────────┤
//! │ Entry 2                                      │
//! │ ...                                          │
//! └──────────────────────────────────────────────┘
//! ```
//! Data is bincode of `{ timestamp, ops }`; the CRC covers Data only.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{WalEntry, Operation, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use writer::WalWriter;
pub use reader::{WalReader, WalIterator};
pub use recovery::{WalRecovery, RecoveryResult};
