//! Configuration for ArborKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for an ArborKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── LOCK             (exclusive process lock)
    ///     ├── wal.log          (write-ahead log of committed transactions)
    ///     └── snapshot.arb     (latest checkpoint of the bucket tree)
    pub data_dir: PathBuf,

    /// How long `Store::open` waits for another process to release `LOCK`
    pub lock_timeout_ms: u64,

    /// WAL size (bytes) after which a commit triggers a checkpoint
    pub checkpoint_bytes: u64,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Transaction Configuration
    // -------------------------------------------------------------------------
    /// How long `begin_write` waits for the writer lock
    pub writer_lock_timeout_ms: u64,

    /// Result cap for prefix scans that do not name their own limit
    pub default_scan_limit: Option<usize>,

    /// Largest page a listing will return in one call
    pub max_page_size: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every committed transaction (durable commits)
    EveryCommit,

    /// fsync after N committed transactions.
    /// A crash can lose up to N-1 acknowledged commits.
    EveryNCommits { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./arborkv_data"),
            lock_timeout_ms: 2000,
            checkpoint_bytes: 4 * 1024 * 1024, // 4 MB
            wal_sync_strategy: WalSyncStrategy::EveryCommit,
            writer_lock_timeout_ms: 2000,
            default_scan_limit: Some(4096),
            max_page_size: 1000,
            listen_addr: "127.0.0.1:8080".to_string(),
            max_connections: 1024,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn writer_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.writer_lock_timeout_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set how long to wait for the directory lock (in milliseconds)
    pub fn lock_timeout_ms(mut self, ms: u64) -> Self {
        self.config.lock_timeout_ms = ms;
        self
    }

    /// Set the WAL size that triggers a checkpoint (in bytes)
    pub fn checkpoint_bytes(mut self, bytes: u64) -> Self {
        self.config.checkpoint_bytes = bytes;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set how long to wait for the writer lock (in milliseconds)
    pub fn writer_lock_timeout_ms(mut self, ms: u64) -> Self {
        self.config.writer_lock_timeout_ms = ms;
        self
    }

    /// Set the default prefix scan cap (`None` = unbounded)
    pub fn default_scan_limit(mut self, limit: Option<usize>) -> Self {
        self.config.default_scan_limit = limit;
        self
    }

    /// Set the largest listing page
    pub fn max_page_size(mut self, size: usize) -> Self {
        self.config.max_page_size = size;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the socket read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the socket write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
