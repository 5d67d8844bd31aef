//! Response definitions
//!
//! Represents responses to clients.

use serde::{Deserialize, Serialize};

use crate::error::{ArborError, ErrorKind, Result};
use crate::listing::Page;
use crate::scan::ScanEntry;

use super::codec::MAX_PAYLOAD_SIZE;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Error = 0x02,
    BucketNotFound = 0x03,
    NotABucket = 0x04,
    InvalidKey = 0x05,
    StoreUnavailable = 0x06,
}

impl Status {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Status::Ok),
            0x01 => Some(Status::NotFound),
            0x02 => Some(Status::Error),
            0x03 => Some(Status::BucketNotFound),
            0x04 => Some(Status::NotABucket),
            0x05 => Some(Status::InvalidKey),
            0x06 => Some(Status::StoreUnavailable),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::NotFound => "NOT_FOUND",
            Status::Error => "ERROR",
            Status::BucketNotFound => "BUCKET_NOT_FOUND",
            Status::NotABucket => "NOT_A_BUCKET",
            Status::InvalidKey => "INVALID_KEY",
            Status::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }
}

impl From<ErrorKind> for Status {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => Status::NotFound,
            ErrorKind::BucketNotFound => Status::BucketNotFound,
            ErrorKind::NotABucket => Status::NotABucket,
            ErrorKind::InvalidKey => Status::InvalidKey,
            ErrorKind::StoreUnavailable => Status::StoreUnavailable,
        }
    }
}

/// Successful result of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Answer to `Ping`
    Pong,

    /// A mutation was applied
    Done,

    /// Answer to `Get`
    Value(Vec<u8>),

    /// Answer to `List`
    Listing(Page),

    /// Answer to `PrefixScan`
    Entries(Vec<ScanEntry>),
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (encoded `Reply` for OK, message otherwise)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response carrying `reply`
    ///
    /// A reply that would not fit in one frame fails with `StoreUnavailable`,
    /// so the client gets an error status instead of a dropped session.
    pub fn ok(reply: &Reply) -> Result<Self> {
        let payload = bincode::serialize(reply)?;
        if payload.len() > MAX_PAYLOAD_SIZE as usize {
            return Err(ArborError::StoreUnavailable(format!(
                "reply too large: {} bytes (max {})",
                payload.len(),
                MAX_PAYLOAD_SIZE
            )));
        }
        Ok(Self {
            status: Status::Ok,
            payload: Some(payload),
        })
    }

    /// Create an error response
    pub fn error(status: Status, message: &str) -> Self {
        Self {
            status,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Map an engine result onto the wire
    pub fn from_result(result: Result<Reply>) -> Self {
        match result.and_then(|reply| Self::ok(&reply)) {
            Ok(response) => response,
            Err(e) => Self::error(Status::from(e.kind()), &e.to_string()),
        }
    }

    /// Decode the reply of an OK response; any other status becomes
    /// `ArborError::Remote`
    pub fn into_reply(self) -> Result<Reply> {
        let payload = self.payload.unwrap_or_default();
        match self.status {
            Status::Ok => Ok(bincode::deserialize(&payload)?),
            status => Err(ArborError::Remote {
                status: status.name().to_string(),
                message: String::from_utf8_lossy(&payload).into_owned(),
            }),
        }
    }
}
