//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (V1 - Framed bincode)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: PING
//! - 0x02: LIST           - path, page token, page size
//! - 0x03: CREATE_BUCKET  - path
//! - 0x04: PUT            - path, key, value
//! - 0x05: GET            - path, key
//! - 0x06: DELETE_KEY     - path, key
//! - 0x07: DELETE_BUCKET  - path
//! - 0x08: PREFIX_SCAN    - path, prefix, limit
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND
//! - 0x02: ERROR
//! - 0x03: BUCKET_NOT_FOUND
//! - 0x04: NOT_A_BUCKET
//! - 0x05: INVALID_KEY
//! - 0x06: STORE_UNAVAILABLE

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Reply, Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
