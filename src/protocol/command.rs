//! Command definitions
//!
//! Represents requests from clients.

use serde::{Deserialize, Serialize};

use crate::bucket::BucketPath;
use crate::listing::PageToken;

/// Command types (the frame's first byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Ping = 0x01,
    List = 0x02,
    CreateBucket = 0x03,
    Put = 0x04,
    Get = 0x05,
    DeleteKey = 0x06,
    DeleteBucket = 0x07,
    PrefixScan = 0x08,
}

impl CommandType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(CommandType::Ping),
            0x02 => Some(CommandType::List),
            0x03 => Some(CommandType::CreateBucket),
            0x04 => Some(CommandType::Put),
            0x05 => Some(CommandType::Get),
            0x06 => Some(CommandType::DeleteKey),
            0x07 => Some(CommandType::DeleteBucket),
            0x08 => Some(CommandType::PrefixScan),
            _ => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Health check
    Ping,

    /// List the buckets and keys directly under `path`
    List {
        path: BucketPath,
        page_token: Option<PageToken>,
        page_size: Option<u32>,
    },

    /// Create a bucket (and missing ancestors)
    CreateBucket { path: BucketPath },

    /// Put a key-value pair into an existing bucket
    Put {
        path: BucketPath,
        key: Vec<u8>,
        value: Vec<u8>,
    },

    /// Get a value by key
    Get { path: BucketPath, key: Vec<u8> },

    /// Delete a key
    DeleteKey { path: BucketPath, key: Vec<u8> },

    /// Delete a bucket and everything beneath it
    DeleteBucket { path: BucketPath },

    /// Entries whose key starts with `prefix`
    PrefixScan {
        path: BucketPath,
        prefix: Vec<u8>,
        limit: Option<u32>,
    },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Ping => CommandType::Ping,
            Command::List { .. } => CommandType::List,
            Command::CreateBucket { .. } => CommandType::CreateBucket,
            Command::Put { .. } => CommandType::Put,
            Command::Get { .. } => CommandType::Get,
            Command::DeleteKey { .. } => CommandType::DeleteKey,
            Command::DeleteBucket { .. } => CommandType::DeleteBucket,
            Command::PrefixScan { .. } => CommandType::PrefixScan,
        }
    }

    /// Short operation name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::List { .. } => "list",
            Command::CreateBucket { .. } => "create-bucket",
            Command::Put { .. } => "put",
            Command::Get { .. } => "get",
            Command::DeleteKey { .. } => "delete-key",
            Command::DeleteBucket { .. } => "delete-bucket",
            Command::PrefixScan { .. } => "prefix-scan",
        }
    }
}
