//! End-to-end tests: a live server on an ephemeral port driven by Client
//!
//! These tests verify:
//! - Every command works over the wire
//! - Error kinds arrive as the matching status
//! - Several clients can be served at once
//! - Malformed frames get an error response
//! - Idle connections do not block new clients
//! - Replies too large for one frame come back as an error status

use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use arborkv::bucket::BucketPath;
use arborkv::config::Config;
use arborkv::engine::Engine;
use arborkv::error::ArborError;
use arborkv::listing::PageRequest;
use arborkv::network::{Client, Server};
use arborkv::protocol::{read_response, Status};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct TestServer {
    addr: SocketAddr,
    shutdown: Arc<std::sync::atomic::AtomicBool>,
    handle: Option<JoinHandle<()>>,
    _temp: TempDir,
}

impl TestServer {
    fn start() -> Self {
        let temp = TempDir::new().unwrap();
        let config = Config::builder()
            .data_dir(temp.path())
            .listen_addr("127.0.0.1:0")
            .build();
        let engine = Arc::new(Engine::open(config.clone()).unwrap());

        let mut server = Server::new(config, engine);
        let addr = server.bind().unwrap();
        let shutdown = server.shutdown_handle();
        let handle = thread::spawn(move || server.run().unwrap());

        Self {
            addr,
            shutdown,
            handle: Some(handle),
            _temp: temp,
        }
    }

    fn client(&self) -> Client {
        Client::connect(self.addr).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn path(text: &str) -> BucketPath {
    BucketPath::parse(text).unwrap()
}

fn remote_status(result: arborkv::Result<impl std::fmt::Debug>) -> String {
    match result {
        Err(ArborError::Remote { status, .. }) => status,
        other => panic!("Expected remote error, got {:?}", other),
    }
}

// =============================================================================
// End-to-End Tests
// =============================================================================

#[test]
fn test_every_command_over_tcp() {
    let server = TestServer::start();
    let mut client = server.client();

    client.ping().unwrap();
    client.create_bucket(&path("users/active")).unwrap();
    client.put(&path("users/active"), b"alice", b"admin").unwrap();
    client.put(&path("users/active"), b"alan", b"guest").unwrap();
    client.put(&path("users/active"), b"bob", b"guest").unwrap();

    assert_eq!(client.get(&path("users/active"), b"alice").unwrap(), b"admin");

    let scanned = client.scan_prefix(&path("users/active"), b"al", None).unwrap();
    let keys: Vec<_> = scanned.iter().map(|e| e.key.clone()).collect();
    assert_eq!(keys, vec![b"alan".to_vec(), b"alice".to_vec()]);

    let page = client.list(&path("users/active"), &PageRequest::first(2)).unwrap();
    assert_eq!(page.items.len(), 2);
    let token = page.next_page_token.unwrap();
    let rest = client
        .list(&path("users/active"), &PageRequest::after(token, 2))
        .unwrap();
    assert_eq!(rest.items.len(), 1);
    assert!(rest.next_page_token.is_none());

    client.delete_key(&path("users/active"), b"bob").unwrap();
    client.delete_bucket(&path("users")).unwrap();
    assert!(client
        .list(&BucketPath::root(), &PageRequest::all())
        .unwrap()
        .items
        .is_empty());
}

#[test]
fn test_errors_map_to_status() {
    let server = TestServer::start();
    let mut client = server.client();
    client.create_bucket(&path("a")).unwrap();
    client.put(&path("a"), b"leaf", b"v").unwrap();

    assert_eq!(remote_status(client.get(&path("a"), b"ghost")), "NOT_FOUND");
    assert_eq!(
        remote_status(client.get(&path("missing"), b"k")),
        "BUCKET_NOT_FOUND"
    );
    assert_eq!(
        remote_status(client.delete_bucket(&path("a/leaf"))),
        "NOT_A_BUCKET"
    );
    assert_eq!(remote_status(client.put(&path("a"), b"", b"v")), "INVALID_KEY");

    // The connection stays usable after errors
    client.ping().unwrap();
}

#[test]
fn test_multiple_clients() {
    let server = TestServer::start();
    server.client().create_bucket(&path("shared")).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let mut client = server.client();
            thread::spawn(move || {
                for i in 0..10 {
                    let key = format!("c{}-{}", t, i);
                    client.put(&path("shared"), key.as_bytes(), b"v").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut client = server.client();
    let entries = client.scan_prefix(&path("shared"), b"c", Some(100)).unwrap();
    assert_eq!(entries.len(), 40);
}

#[test]
fn test_malformed_frame_gets_error() {
    let server = TestServer::start();
    let mut stream = TcpStream::connect(server.addr).unwrap();

    // Unknown command type with an empty payload
    stream.write_all(&[0x7F, 0, 0, 0, 0]).unwrap();
    stream.flush().unwrap();

    let response = read_response(&mut stream).unwrap();
    assert_eq!(response.status, Status::Error);
}

#[test]
fn test_idle_connections_do_not_block_new_clients() {
    let server = TestServer::start();

    // Connected but silent; dropped before the server so their sessions end
    let idle: Vec<TcpStream> = (0..16)
        .map(|_| TcpStream::connect(server.addr).unwrap())
        .collect();

    let mut client = server.client();
    client.ping().unwrap();
    client.create_bucket(&path("busy")).unwrap();

    drop(client);
    drop(idle);
}

#[test]
fn test_oversized_reply_keeps_session_open() {
    let server = TestServer::start();
    let mut client = server.client();
    client.create_bucket(&path("blobs")).unwrap();

    let value = vec![0xABu8; 6 * 1024 * 1024];
    for key in [b"a", b"b", b"c"] {
        client.put(&path("blobs"), key, &value).unwrap();
    }

    // Three 6 MiB values do not fit in one reply frame
    assert_eq!(
        remote_status(client.scan_prefix(&path("blobs"), b"", None)),
        "STORE_UNAVAILABLE"
    );

    // Same connection still answers
    client.ping().unwrap();
    assert_eq!(client.get(&path("blobs"), b"a").unwrap().len(), value.len());
}
