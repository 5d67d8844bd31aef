//! Storage Module
//!
//! Persistent layout of a store: the locked data directory and the
//! checkpoint (snapshot) file.
//!
//! ## Responsibilities
//! - One process per data directory (advisory `LOCK`)
//! - Serialize the full bucket tree at checkpoints
//! - Load the latest checkpoint on startup
//!
//! The WAL (see [`crate::wal`]) holds every commit made since the last
//! checkpoint; startup loads the snapshot and replays the newer WAL
//! entries on top of it.

mod dir;
mod snapshot;

pub use dir::StoreDir;
pub use snapshot::{SnapshotBuilder, SnapshotInfo, SnapshotReader};
