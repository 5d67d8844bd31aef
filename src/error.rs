//! Error types for ArborKV
//!
//! Provides a unified error type for all operations, plus the coarse
//! [`ErrorKind`] every core operation reports to callers.

use thiserror::Error;

use crate::bucket::BucketPath;

/// Result type alias using ArborError
pub type Result<T> = std::result::Result<T, ArborError>;

/// Unified error type for ArborKV operations
#[derive(Debug, Error)]
pub enum ArborError {
    // -------------------------------------------------------------------------
    // Bucket / Key Errors
    // -------------------------------------------------------------------------
    #[error("Bucket not found: {path} (resolved up to '{resolved}')")]
    BucketNotFound {
        path: BucketPath,
        resolved: BucketPath,
    },

    #[error("Not a bucket: {path} names a key")]
    NotABucket { path: BucketPath },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Key not found: {key} in {path}")]
    NotFound { path: BucketPath, key: String },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server returned {status}: {message}")]
    Remote { status: String, message: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for ArborError {
    fn from(err: bincode::Error) -> Self {
        ArborError::Serialization(err.to_string())
    }
}

/// The failure kinds a core operation can report.
///
/// Infrastructure failures (I/O, corruption, encoding) all surface as
/// `StoreUnavailable`: the request cannot be served by this store right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    StoreUnavailable,
    BucketNotFound,
    NotABucket,
    InvalidKey,
    NotFound,
}

impl ArborError {
    /// Classify this error into one of the core failure kinds
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArborError::BucketNotFound { .. } => ErrorKind::BucketNotFound,
            ArborError::NotABucket { .. } => ErrorKind::NotABucket,
            ArborError::InvalidKey(_) => ErrorKind::InvalidKey,
            ArborError::NotFound { .. } => ErrorKind::NotFound,
            ArborError::StoreUnavailable(_)
            | ArborError::Io(_)
            | ArborError::WalCorruption(_)
            | ArborError::Storage(_)
            | ArborError::Serialization(_)
            | ArborError::Protocol(_)
            | ArborError::Remote { .. }
            | ArborError::Config(_) => ErrorKind::StoreUnavailable,
        }
    }
}
