//! Engine handle
//!
//! Owns the open store for the lifetime of the process, counts persisted
//! mutations and carries the mirror on/off state.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::StoreOptions;
use crate::error::Result;
use crate::mirror::Mirror;

use super::{OrderedStore, RocksStore};

/// The one open ordered store of a process
///
/// ## Concurrency
/// - `store`: shared (`Arc`) with the backup worker, which only reads it
/// - `ops` / `mirroring`: atomics; only the main path writes them
pub struct EngineHandle {
    store: Arc<dyn OrderedStore>,

    /// Logical mutations persisted so far (observability only)
    ops: AtomicU64,

    /// When false, mirror calls are no-ops
    mirroring: AtomicBool,
}

impl EngineHandle {
    /// Open the RocksDB store at `path`
    pub fn open(path: &Path, options: &StoreOptions) -> Result<Self> {
        let store = RocksStore::open(path, options)?;
        tracing::info!(path = %path.display(), "opened store");
        Ok(Self::with_store(Arc::new(store)))
    }

    /// Wrap an already open store
    pub fn with_store(store: Arc<dyn OrderedStore>) -> Self {
        Self {
            store,
            ops: AtomicU64::new(0),
            mirroring: AtomicBool::new(true),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn OrderedStore> {
        &self.store
    }

    /// Translator for in-memory mutations
    pub fn mirror(&self) -> Mirror<'_> {
        Mirror::new(self)
    }

    /// Logical mutations persisted so far
    pub fn op_count(&self) -> u64 {
        self.ops.load(Ordering::Relaxed)
    }

    pub(crate) fn record_op(&self) {
        self.ops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_mirroring(&self) -> bool {
        self.mirroring.load(Ordering::SeqCst)
    }

    /// Turn mirroring on or off
    pub fn set_mirroring(&self, enabled: bool) {
        self.mirroring.store(enabled, Ordering::SeqCst);
    }

    /// Turn mirroring off until the guard drops, then restore the prior state
    pub fn suspend(&self) -> SuspendGuard<'_> {
        let prior = self.mirroring.swap(false, Ordering::SeqCst);
        SuspendGuard {
            handle: self,
            prior,
        }
    }

    /// Flush and release the store
    ///
    /// The store itself closes once the last `Arc` (a running backup may
    /// hold one) is dropped.
    pub fn close(self) -> Result<()> {
        self.store.flush()?;
        tracing::info!(ops = self.op_count(), "closed store");
        Ok(())
    }
}

/// Restores the mirroring state captured by [`EngineHandle::suspend`]
pub struct SuspendGuard<'a> {
    handle: &'a EngineHandle,
    prior: bool,
}

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        self.handle.mirroring.store(self.prior, Ordering::SeqCst);
    }
}
