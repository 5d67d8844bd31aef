//! # ArborKV
//!
//! An embedded key-value store organised as a tree of named buckets:
//! - Buckets addressed by paths, holding keys and nested buckets
//! - Paged listings, ordered prefix scans and transactional edits
//! - Write-Ahead Logging (WAL) plus snapshot checkpoints for durability
//! - Single-writer/multi-reader transactions over immutable tree snapshots
//! - TCP-based client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 TCP Server / CLI Client                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │        (Listing / Prefix Scan / Mutation routing)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Store + Transactions                        │
//! │     (ReadTxn: Arc<Tree> snapshot, WriteTxn: writer lock)     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  Snapshot   │
//!   │  (Append)   │          │ (Checkpoint)│
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod tree;
pub mod wal;
pub mod storage;
pub mod store;
pub mod txn;

pub mod bucket;
pub mod listing;
pub mod scan;
pub mod mutation;

pub mod protocol;
pub mod network;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ArborError, ErrorKind, Result};
pub use config::Config;
pub use bucket::{BucketHandle, BucketPath};
pub use engine::Engine;
pub use store::Store;
pub use txn::{ReadTxn, Transaction, TxMode, Txn, WriteTxn};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ArborKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
