//! Store Module
//!
//! The embedded ordered key-value engine, seen as a black box, and the
//! handle the rest of the crate uses to reach it.
//!
//! ## Responsibilities
//! - Point reads and writes, atomic batches
//! - Ordered iteration with seek, and a terminal error check
//! - Open/close lifecycle with fixed read and write options
//! - Operation counter and mirror suspension
//!
//! ## Backends
//! - [`RocksStore`]: RocksDB on disk
//! - [`MemoryStore`]: ordered map in memory, with copy-on-write snapshots

mod handle;
mod memory;
mod rocks;

pub use handle::{EngineHandle, SuspendGuard};
pub use memory::MemoryStore;
pub use rocks::RocksStore;

use crate::error::Result;

/// An ordered key-value store
///
/// Keys iterate in bytewise order. Iterators are point-in-time views: writes
/// issued after an iterator was created are not required to show up in it.
pub trait OrderedStore: Send + Sync {
    /// Read one key
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Write one key
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove one key (absent keys are not an error)
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Apply every operation of the batch, or none of them
    fn write(&self, batch: WriteBatch) -> Result<()>;

    /// Create an iterator; it starts unpositioned
    fn iter(&self) -> Box<dyn StoreIterator + '_>;

    /// Push buffered writes to durable storage
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Cursor over an [`OrderedStore`]
pub trait StoreIterator {
    fn seek_to_first(&mut self);

    /// Position at the first key `>= key`
    fn seek(&mut self, key: &[u8]);

    fn valid(&self) -> bool;

    fn next(&mut self);

    fn key(&self) -> Option<&[u8]>;

    fn value(&self) -> Option<&[u8]>;

    /// Error that ended the iteration early, if any
    ///
    /// An iterator that stops being valid may have reached the end or may
    /// have failed; only this check tells the two apart.
    fn status(&self) -> Result<()>;
}

/// One operation inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Ordered list of puts and deletes applied atomically
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Delete { key: key.into() });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}
