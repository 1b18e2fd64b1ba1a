//! Configuration for frostkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::codec::MAX_DATABASES;

/// Main configuration for a frostkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory of the primary ordered store
    pub data_dir: PathBuf,

    /// Options used when opening the primary store
    pub store: StoreOptions,

    // -------------------------------------------------------------------------
    // Keyspace Configuration
    // -------------------------------------------------------------------------
    /// Number of numbered databases (ids `0..databases`); values outside
    /// `1..=MAX_DATABASES` are clamped when the engine opens
    pub databases: usize,

    /// Mirror in-memory mutations into the store
    pub persistence: bool,

    // -------------------------------------------------------------------------
    // Replay Configuration
    // -------------------------------------------------------------------------
    /// Records between two calls of the replay progress hook
    pub replay_yield_interval: u64,

    // -------------------------------------------------------------------------
    // Backup Configuration
    // -------------------------------------------------------------------------
    /// Records per batch written into the backup store
    pub backup_batch_size: usize,
}

/// How the ordered store is opened, read and written
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Create the store if the directory holds none
    pub create_if_missing: bool,

    /// Refuse to open a directory that already holds a store
    pub error_if_exists: bool,

    /// Snappy block compression
    pub compression: bool,

    /// Size of the engine's write buffer (in bytes)
    pub write_buffer_size: usize,

    /// Max files the engine keeps open
    pub max_open_files: i32,

    /// Populate the block cache on reads (off: scans are load-heavy)
    pub fill_cache: bool,

    /// fsync every write
    pub sync_writes: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            compression: true,
            write_buffer_size: 64 * 1024 * 1024, // 64 MB
            max_open_files: 500,
            fill_cache: false,
            sync_writes: false,
        }
    }
}

impl StoreOptions {
    /// Options for a backup target: must be a fresh directory
    pub fn for_backup(&self) -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: true,
            sync_writes: false,
            ..self.clone()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./frostkv_data"),
            store: StoreOptions::default(),
            databases: 16,
            persistence: true,
            replay_yield_interval: 1_000_000,
            backup_batch_size: 1_000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory of the primary store
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Replace the store options
    pub fn store_options(mut self, options: StoreOptions) -> Self {
        self.config.store = options;
        self
    }

    /// fsync every write to the primary store
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.store.sync_writes = sync;
        self
    }

    /// Set the number of databases, clamped to `1..=MAX_DATABASES`
    pub fn databases(mut self, count: usize) -> Self {
        self.config.databases = count.clamp(1, MAX_DATABASES);
        self
    }

    /// Enable or disable mirroring into the store
    pub fn persistence(mut self, enabled: bool) -> Self {
        self.config.persistence = enabled;
        self
    }

    /// Set the replay progress interval (in records)
    pub fn replay_yield_interval(mut self, records: u64) -> Self {
        self.config.replay_yield_interval = records.max(1);
        self
    }

    /// Set the backup batch size (in records)
    pub fn backup_batch_size(mut self, records: usize) -> Self {
        self.config.backup_batch_size = records.max(1);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
