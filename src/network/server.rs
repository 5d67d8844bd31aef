//! TCP Server
//!
//! Accepts connections and serves each on its own session thread. A
//! crossbeam `WaitGroup` tracks the sessions so shutdown can drain them.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{ArborError, Result};
use crate::protocol::{write_response, Response, Status};

use super::Connection;

/// How often the accept loop checks for shutdown while idle
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// TCP server for ArborKV
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: Option<TcpListener>,
    shutdown: Arc<AtomicBool>,
    /// Sessions currently open
    active: Arc<AtomicUsize>,
}

impl Server {
    /// Create a new server with the given config and engine
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        Self {
            config,
            engine,
            listener: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bind the listen address, returning the bound address
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(&self.config.listen_addr)?;
        // Non-blocking accept so the loop can observe shutdown
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Flag that stops `run` when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Start the server (blocking until shutdown)
    ///
    /// Every accepted connection gets its own session thread, up to
    /// `max_connections`. After shutdown is requested, `run` returns once
    /// the open sessions have ended.
    pub fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind()?;
        }
        let listener = self
            .listener
            .take()
            .ok_or_else(|| ArborError::Config("listener not bound".to_string()))?;

        tracing::info!(
            "Listening on {} (max {} connections)",
            listener.local_addr()?,
            self.config.max_connections
        );

        let sessions = WaitGroup::new();
        let result = self.accept_loop(&listener, &sessions);

        let open = self.active.load(Ordering::SeqCst);
        if open > 0 {
            tracing::info!("Waiting for {} open sessions to end", open);
        }
        sessions.wait();

        result
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn accept_loop(&self, listener: &TcpListener, sessions: &WaitGroup) -> Result<()> {
        while !self.shutdown.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    // Accepted sockets inherit non-blocking on some platforms
                    stream.set_nonblocking(false)?;
                    self.dispatch(stream, peer, sessions);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::error!("Accept failed: {}", e);
                    return Err(e.into());
                }
            }
        }

        tracing::info!("Shutdown requested, no longer accepting connections");
        Ok(())
    }

    /// Start a session thread for `stream`, or turn it away when at capacity
    fn dispatch(&self, mut stream: TcpStream, peer: SocketAddr, sessions: &WaitGroup) {
        let Some(slot) = SessionSlot::claim(&self.active, self.config.max_connections) else {
            tracing::warn!("Rejecting {}: {} connections open", peer, self.config.max_connections);
            let _ = write_response(
                &mut stream,
                &Response::error(Status::StoreUnavailable, "too many connections"),
            );
            return;
        };

        let engine = Arc::clone(&self.engine);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);
        let session = sessions.clone();

        let spawned = thread::Builder::new()
            .name(format!("arborkv-session-{}", peer))
            .spawn(move || {
                serve(stream, &engine, read_ms, write_ms);
                drop(slot);
                drop(session);
            });

        // On failure the closure is dropped, releasing the slot and the socket
        if let Err(e) = spawned {
            tracing::warn!("Failed to start session for {}: {}", peer, e);
        }
    }
}

/// One counted connection; the count drops when the slot does
struct SessionSlot {
    active: Arc<AtomicUsize>,
}

impl SessionSlot {
    fn claim(active: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        if active.fetch_add(1, Ordering::SeqCst) >= max {
            active.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(Self {
            active: Arc::clone(active),
        })
    }
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Run one connection to completion on its session thread
fn serve(stream: TcpStream, engine: &Arc<Engine>, read_ms: u64, write_ms: u64) {
    let mut connection = match Connection::new(stream, Arc::clone(engine)) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Failed to set up connection: {}", e);
            return;
        }
    };

    if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
        tracing::warn!("Failed to set timeouts for {:?}: {}", connection.peer_addr(), e);
        return;
    }

    if let Err(e) = connection.handle() {
        tracing::debug!("Connection {:?} ended with error: {}", connection.peer_addr(), e);
    }
}
