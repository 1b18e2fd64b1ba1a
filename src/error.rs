//! Error types for frostkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::codec::{DbId, TypeTag};

/// Result type alias using FrostError
pub type Result<T> = std::result::Result<T, FrostError>;

/// Unified error type for frostkv operations
#[derive(Debug, Error)]
pub enum FrostError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    #[error("Failed to open store at {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Iterator error: {0}")]
    Iterator(String),

    // -------------------------------------------------------------------------
    // Key Format Errors
    // -------------------------------------------------------------------------
    #[error("Key name too long: {0} bytes (max 255)")]
    NameTooLong(usize),

    #[error("Unknown type tag 0x{tag:02x} in database {db}")]
    UnknownTypeTag { db: DbId, tag: u8 },

    #[error("Corrupt record: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Keyspace Errors
    // -------------------------------------------------------------------------
    #[error("Invalid database id: {0}")]
    InvalidDatabase(DbId),

    #[error("WRONGTYPE operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("No such key")]
    NoSuchKey,

    #[error("Value is not a valid float")]
    NotAFloat,

    // -------------------------------------------------------------------------
    // Freeze/Melt Errors
    // -------------------------------------------------------------------------
    #[error("Key is frozen")]
    KeyFrozen,

    #[error("Key is already frozen as {0:?}")]
    AlreadyFrozen(TypeTag),

    #[error("Key is not frozen")]
    NotFrozen,

    // -------------------------------------------------------------------------
    // Backup Errors
    // -------------------------------------------------------------------------
    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Persistence is off")]
    PersistenceOff,

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl FrostError {
    /// Errors after which the process must not keep serving: the store could
    /// not be opened, or its on-disk format is not one this build understands.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FrostError::Open { .. } | FrostError::UnknownTypeTag { .. } | FrostError::Corruption(_)
        )
    }
}

impl From<rocksdb::Error> for FrostError {
    fn from(err: rocksdb::Error) -> Self {
        FrostError::Store(err.into_string())
    }
}
