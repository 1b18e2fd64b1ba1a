//! In-memory ordered store
//!
//! BTreeMap behind a RwLock. The map is held in an `Arc` and written through
//! `Arc::make_mut`, so an iterator keeps the version it was created on while
//! writers move on to a private copy.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{FrostError, Result};

use super::{BatchOp, OrderedStore, StoreIterator, WriteBatch};

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// Sentinel for "no iterator fault injected"
const NO_FAULT: usize = usize::MAX;

/// Ordered store kept entirely in memory
///
/// Also supports fault injection, which is how the logged-and-continue and
/// abort paths of the layers above are exercised.
pub struct MemoryStore {
    data: RwLock<Arc<Map>>,
    fail_writes: AtomicBool,
    /// Iterators fail after yielding this many entries
    iterator_fault_after: AtomicUsize,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Arc::new(BTreeMap::new())),
            fail_writes: AtomicBool::new(false),
            iterator_fault_after: AtomicUsize::new(NO_FAULT),
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of every key/value pair, in key order
    pub fn entries(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Make every subsequent put/delete/batch fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make iterators created from now on stop with an error after yielding
    /// `entries` entries; `None` clears the fault
    pub fn fail_iterators_after(&self, entries: Option<usize>) {
        self.iterator_fault_after
            .store(entries.unwrap_or(NO_FAULT), Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FrostError::Store("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderedStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_writable()?;
        let mut data = self.data.write();
        Arc::make_mut(&mut data).insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.check_writable()?;
        let mut data = self.data.write();
        Arc::make_mut(&mut data).remove(key);
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.check_writable()?;
        let mut data = self.data.write();
        let map = Arc::make_mut(&mut data);
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    map.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn iter(&self) -> Box<dyn StoreIterator + '_> {
        let fault_after = match self.iterator_fault_after.load(Ordering::SeqCst) {
            NO_FAULT => None,
            n => Some(n),
        };
        Box::new(MemoryIterator {
            snapshot: Arc::clone(&self.data.read()),
            current: None,
            yielded: 0,
            fault_after,
            failed: false,
        })
    }
}

/// Iterator over one version of a [`MemoryStore`]
struct MemoryIterator {
    snapshot: Arc<Map>,
    current: Option<(Vec<u8>, Vec<u8>)>,
    yielded: usize,
    fault_after: Option<usize>,
    failed: bool,
}

impl MemoryIterator {
    fn position(&mut self, entry: Option<(&Vec<u8>, &Vec<u8>)>) {
        if self.fault_after.is_some_and(|limit| self.yielded >= limit) {
            self.failed = true;
            self.current = None;
            return;
        }
        self.current = entry.map(|(k, v)| (k.clone(), v.clone()));
        if self.current.is_some() {
            self.yielded += 1;
        }
    }
}

impl StoreIterator for MemoryIterator {
    fn seek_to_first(&mut self) {
        let snapshot = Arc::clone(&self.snapshot);
        self.position(snapshot.iter().next());
    }

    fn seek(&mut self, key: &[u8]) {
        let snapshot = Arc::clone(&self.snapshot);
        self.position(
            snapshot
                .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
                .next(),
        );
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) {
        let Some((key, _)) = self.current.take() else {
            return;
        };
        let snapshot = Arc::clone(&self.snapshot);
        self.position(
            snapshot
                .range::<[u8], _>((Bound::Excluded(key.as_slice()), Bound::Unbounded))
                .next(),
        );
    }

    fn key(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(k, _)| k.as_slice())
    }

    fn value(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(_, v)| v.as_slice())
    }

    fn status(&self) -> Result<()> {
        if self.failed {
            return Err(FrostError::Iterator("injected iterator fault".to_string()));
        }
        Ok(())
    }
}
