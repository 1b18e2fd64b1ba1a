//! Replay Module
//!
//! Rebuilds the in-memory keyspace from the store at startup.
//!
//! ## Phases
//! 1. Open the store
//! 2. Scan the frozen markers of every database into the Frozen Index
//! 3. Scan the whole keyspace in order, applying each record through
//!    [`Keyspace`], skipping markers and frozen names
//!
//! Mirroring is suspended for the whole replay and restored afterwards,
//! whatever the outcome.

mod apply;

pub use apply::apply_record;

use std::fs;
use std::time::{Duration, Instant};

use crate::codec::{decode_head, decode_record, DbId, TypeTag};
use crate::config::Config;
use crate::dataset::Keyspace;
use crate::error::{FrostError, Result};
use crate::store::EngineHandle;
use crate::tier::FrozenIndex;

/// Where a replay currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    Closed,
    Opening,
    ScanningFrozenIndex,
    Replaying,
    Done,
    Failed,
}

/// Handed to the host hook every `replay_yield_interval` records
#[derive(Debug, Clone, Copy)]
pub struct ReplayProgress {
    pub records: u64,
    pub elapsed: Duration,
}

/// Outcome of a complete replay
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    /// Records read from the store, markers included
    pub records: u64,

    /// Records applied to the keyspace
    pub applied: u64,

    /// Records skipped because their name is frozen
    pub skipped_frozen: u64,

    /// Marker records passed over by the main scan
    pub frozen_markers: u64,

    pub strings: u64,
    pub hashes: u64,
    pub sets: u64,
    pub zsets: u64,

    /// Names loaded into the Frozen Index
    pub frozen_indexed: u64,

    pub elapsed: Duration,
}

impl ReplayReport {
    fn count_record(&mut self, tag: TypeTag) {
        let per_type = match tag {
            TypeTag::String => &mut self.strings,
            TypeTag::Hash => &mut self.hashes,
            TypeTag::Set => &mut self.sets,
            TypeTag::SortedSet => &mut self.zsets,
            TypeTag::FrozenMarker => {
                self.frozen_markers += 1;
                return;
            }
        };
        *per_type += 1;
        self.applied += 1;
    }
}

/// Drives one replay through its phases
pub struct Replayer {
    yield_interval: u64,
    state: ReplayState,
}

impl Replayer {
    pub fn new(config: &Config) -> Self {
        Self {
            yield_interval: config.replay_yield_interval.max(1),
            state: ReplayState::Closed,
        }
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    /// Open, scan the frozen markers, then replay
    ///
    /// The index is filled before the main scan, so frozen names are skipped
    /// from the very first record.
    pub fn run<K: Keyspace + ?Sized>(
        &mut self,
        config: &Config,
        index: &mut FrozenIndex,
        keyspace: &mut K,
        hook: &mut dyn FnMut(&ReplayProgress),
    ) -> Result<(EngineHandle, ReplayReport)> {
        let handle = self.open(config)?;
        let frozen = self.scan_frozen(&handle, index, keyspace.databases())?;
        let mut report = self.replay(&handle, index, keyspace, hook)?;
        report.frozen_indexed = frozen;
        Ok((handle, report))
    }

    /// Phase 1: open the store at `config.data_dir`
    pub fn open(&mut self, config: &Config) -> Result<EngineHandle> {
        self.state = ReplayState::Opening;
        let opened = fs::create_dir_all(&config.data_dir)
            .map_err(|e| FrostError::Open {
                path: config.data_dir.display().to_string(),
                reason: e.to_string(),
            })
            .and_then(|()| EngineHandle::open(&config.data_dir, &config.store));
        self.settle(opened)
    }

    /// Phase 2: load the frozen markers of databases `0..databases`
    ///
    /// Counts past the last one-byte id stop at it.
    pub fn scan_frozen(&mut self, handle: &EngineHandle, index: &mut FrozenIndex, databases: usize) -> Result<u64> {
        self.state = ReplayState::ScanningFrozenIndex;
        let scanned = (0..=DbId::MAX).take(databases).try_fold(0u64, |total, db| -> Result<u64> {
            let loaded = index.load_db(handle.store().as_ref(), db)?;
            if loaded > 0 {
                tracing::debug!(db, frozen = loaded, "loaded frozen markers");
            }
            Ok(total + loaded as u64)
        });
        self.settle(scanned)
    }

    /// Phase 3: apply every record of the store to `keyspace`
    pub fn replay<K: Keyspace + ?Sized>(
        &mut self,
        handle: &EngineHandle,
        index: &FrozenIndex,
        keyspace: &mut K,
        hook: &mut dyn FnMut(&ReplayProgress),
    ) -> Result<ReplayReport> {
        self.state = ReplayState::Replaying;
        let _suspended = handle.suspend();
        let replayed = self.scan(handle, index, keyspace, hook);
        let report = self.settle(replayed)?;
        self.state = ReplayState::Done;

        tracing::info!(
            records = report.records,
            applied = report.applied,
            skipped_frozen = report.skipped_frozen,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "replay complete"
        );
        Ok(report)
    }

    fn scan<K: Keyspace + ?Sized>(
        &self,
        handle: &EngineHandle,
        index: &FrozenIndex,
        keyspace: &mut K,
        hook: &mut dyn FnMut(&ReplayProgress),
    ) -> Result<ReplayReport> {
        let started = Instant::now();
        let store = handle.store();
        let mut iter = store.iter();
        let mut report = ReplayReport::default();
        let mut current_db: Option<DbId> = None;

        iter.seek_to_first();
        while iter.valid() {
            let (Some(key), Some(value)) = (iter.key(), iter.value()) else {
                break;
            };

            let (db, _, _) = decode_head(key)?;
            if current_db != Some(db) {
                if usize::from(db) >= keyspace.databases() {
                    tracing::warn!(db, "stored database id is out of range");
                    return Err(FrostError::InvalidDatabase(db));
                }
                tracing::debug!(db, "replaying database");
                current_db = Some(db);
            }

            let record = decode_record(key, value)?;
            report.records += 1;

            let tag = record.tag();
            if tag != TypeTag::FrozenMarker && index.contains(db, record.name()) {
                report.skipped_frozen += 1;
            } else {
                apply_record(keyspace, &record)?;
                report.count_record(tag);
            }

            if report.records % self.yield_interval == 0 {
                let progress = ReplayProgress {
                    records: report.records,
                    elapsed: started.elapsed(),
                };
                tracing::info!(records = progress.records, "replay in progress");
                hook(&progress);
            }
            iter.next();
        }

        if let Err(e) = iter.status() {
            tracing::warn!(records = report.records, error = %e, "replay scan ended early");
            return Err(e);
        }

        report.elapsed = started.elapsed();
        Ok(report)
    }

    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.state = ReplayState::Failed;
            if e.is_fatal() {
                tracing::error!(error = %e, "replay failed");
            }
        }
        result
    }
}
