//! Client
//!
//! Blocking client for the ArborKV protocol, used by the CLI and tests.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::bucket::BucketPath;
use crate::error::{ArborError, Result};
use crate::listing::{Page, PageRequest};
use crate::protocol::{read_response, write_command, Command, Reply};
use crate::scan::ScanEntry;

/// A connection to an ArborKV server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send a command and wait for its reply
    pub fn call(&mut self, command: &Command) -> Result<Reply> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)?.into_reply()
    }

    pub fn ping(&mut self) -> Result<()> {
        match self.call(&Command::Ping)? {
            Reply::Pong => Ok(()),
            other => Err(unexpected("ping", &other)),
        }
    }

    pub fn list(&mut self, path: &BucketPath, request: &PageRequest) -> Result<Page> {
        let command = Command::List {
            path: path.clone(),
            page_token: request.page_token.clone(),
            page_size: request.page_size.map(|n| n.min(u32::MAX as usize) as u32),
        };
        match self.call(&command)? {
            Reply::Listing(page) => Ok(page),
            other => Err(unexpected("list", &other)),
        }
    }

    pub fn create_bucket(&mut self, path: &BucketPath) -> Result<()> {
        self.expect_done("create-bucket", Command::CreateBucket { path: path.clone() })
    }

    pub fn put(&mut self, path: &BucketPath, key: &[u8], value: &[u8]) -> Result<()> {
        self.expect_done(
            "put",
            Command::Put {
                path: path.clone(),
                key: key.to_vec(),
                value: value.to_vec(),
            },
        )
    }

    pub fn get(&mut self, path: &BucketPath, key: &[u8]) -> Result<Vec<u8>> {
        let command = Command::Get {
            path: path.clone(),
            key: key.to_vec(),
        };
        match self.call(&command)? {
            Reply::Value(value) => Ok(value),
            other => Err(unexpected("get", &other)),
        }
    }

    pub fn delete_key(&mut self, path: &BucketPath, key: &[u8]) -> Result<()> {
        self.expect_done(
            "delete-key",
            Command::DeleteKey {
                path: path.clone(),
                key: key.to_vec(),
            },
        )
    }

    pub fn delete_bucket(&mut self, path: &BucketPath) -> Result<()> {
        self.expect_done("delete-bucket", Command::DeleteBucket { path: path.clone() })
    }

    pub fn scan_prefix(
        &mut self,
        path: &BucketPath,
        prefix: &[u8],
        limit: Option<u32>,
    ) -> Result<Vec<ScanEntry>> {
        let command = Command::PrefixScan {
            path: path.clone(),
            prefix: prefix.to_vec(),
            limit,
        };
        match self.call(&command)? {
            Reply::Entries(entries) => Ok(entries),
            other => Err(unexpected("prefix-scan", &other)),
        }
    }

    fn expect_done(&mut self, op: &str, command: Command) -> Result<()> {
        match self.call(&command)? {
            Reply::Done => Ok(()),
            other => Err(unexpected(op, &other)),
        }
    }
}

fn unexpected(op: &str, reply: &Reply) -> ArborError {
    ArborError::Protocol(format!("Unexpected reply to {}: {:?}", op, reply))
}
