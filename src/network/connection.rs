//! Connection Session
//!
//! Serves one client: read a command frame, run it on the engine, write the
//! response, until the peer goes away.

use std::io::{self, BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{ArborError, Result};
use crate::protocol::{read_command, write_response, Command, Response, Status};

/// What reading the next frame produced
enum Incoming {
    Command(Command),
    /// Peer closed the socket or stayed idle past the read timeout
    Closed,
    /// Unreadable frame; the session answers once and ends
    Malformed(ArborError),
}

/// One client session on its own thread
pub struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    engine: Arc<Engine>,
    peer: Option<SocketAddr>,
    /// Commands answered so far
    served: u64,
}

impl Connection {
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        let peer = stream.peer_addr().ok();
        stream.set_nodelay(true)?;
        let inbound = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(inbound),
            writer: BufWriter::new(stream),
            engine,
            peer,
            served: 0,
        })
    }

    /// Apply socket timeouts in milliseconds; 0 leaves that direction unbounded
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let as_timeout = |ms: u64| (ms > 0).then(|| Duration::from_millis(ms));
        self.reader.get_ref().set_read_timeout(as_timeout(read_ms))?;
        self.writer.get_ref().set_write_timeout(as_timeout(write_ms))?;
        Ok(())
    }

    /// Run the session to completion.
    ///
    /// A clean disconnect or idle timeout returns `Ok`; a malformed frame or
    /// a failed write returns the error after the session is over.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!(peer = %self.peer_label(), "Session started");

        let outcome = self.serve_until_closed();

        tracing::debug!(
            peer = %self.peer_label(),
            served = self.served,
            "Session ended"
        );
        outcome
    }

    fn serve_until_closed(&mut self) -> Result<()> {
        loop {
            let command = match self.next_incoming() {
                Incoming::Command(command) => command,
                Incoming::Closed => return Ok(()),
                Incoming::Malformed(e) => {
                    tracing::warn!(peer = %self.peer_label(), "Rejecting frame: {}", e);
                    // Best effort: the peer may already be gone
                    let _ = self.send(&Response::error(Status::Error, &e.to_string()));
                    return Err(e);
                }
            };

            let op = command.name();
            let response = Response::from_result(self.engine.execute(command));
            tracing::trace!(peer = %self.peer_label(), op, status = response.status.name());

            match self.send(&response) {
                Ok(()) => self.served += 1,
                Err(ArborError::Io(ref e)) if peer_left(e) => return Ok(()),
                Err(e) => {
                    tracing::warn!(peer = %self.peer_label(), "Reply to {} failed: {}", op, e);
                    return Err(e);
                }
            }
        }
    }

    fn next_incoming(&mut self) -> Incoming {
        match read_command(&mut self.reader) {
            Ok(command) => Incoming::Command(command),
            Err(ArborError::Io(ref e)) if peer_left(e) || idle(e) => Incoming::Closed,
            Err(e) => Incoming::Malformed(e),
        }
    }

    fn send(&mut self, response: &Response) -> Result<()> {
        write_response(&mut self.writer, response)
    }

    fn peer_label(&self) -> String {
        self.peer
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

fn peer_left(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

/// Read timeout expired (reported as TimedOut on Windows)
fn idle(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
