//! Backup Module
//!
//! Online copy of the whole store into a fresh store directory.
//!
//! ## Procedure
//! 1. Open a new store at the target (an existing store there is an error)
//! 2. Iterate the source from its first key, writing batches of
//!    `batch_size` records
//! 3. Check the iterator status
//! 4. Write `BACKUP.log` (temp file + rename)
//!
//! The source iterator is a point-in-time view, so writes landing during
//! the copy may or may not be in the backup. Any failure leaves the target
//! without a manifest.
//!
//! ## Threading
//! [`start`] runs the procedure on a named worker thread that shares the
//! source store through an `Arc` and reports on a channel.

mod manifest;

pub use manifest::{unix_now, Manifest, MANIFEST_FILE, TEMP_MANIFEST_FILE};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, TryRecvError};

use crate::config::{Config, StoreOptions};
use crate::error::{FrostError, Result};
use crate::store::{OrderedStore, RocksStore, WriteBatch};

/// How a backup runs
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Records per batch written into the target
    pub batch_size: usize,

    /// Base options for the target store
    pub store: StoreOptions,
}

impl BackupOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.backup_batch_size,
            store: config.store.clone(),
        }
    }
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Outcome of a successful backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub target: PathBuf,
    pub records: u64,
    pub batches: u64,
    pub manifest: Manifest,
}

/// Copy every record of `source` into `target`
///
/// Returns `(records, batches)`.
pub fn copy_into(source: &dyn OrderedStore, target: &dyn OrderedStore, batch_size: usize) -> Result<(u64, u64)> {
    let batch_size = batch_size.max(1);
    let mut iter = source.iter();
    let mut batch = WriteBatch::new();
    let mut records = 0;
    let mut batches = 0;

    iter.seek_to_first();
    while iter.valid() {
        let (Some(key), Some(value)) = (iter.key(), iter.value()) else {
            break;
        };
        batch.put(key, value);
        records += 1;

        if batch.len() >= batch_size {
            target.write(std::mem::take(&mut batch))?;
            batches += 1;
        }
        iter.next();
    }
    iter.status()?;

    if !batch.is_empty() {
        target.write(batch)?;
        batches += 1;
    }
    Ok((records, batches))
}

/// Run a complete backup of `source` into `target` on the calling thread
pub fn run(source: &dyn OrderedStore, target: &Path, options: &BackupOptions) -> Result<BackupReport> {
    let start = unix_now();
    tracing::info!(target = %target.display(), "backup started");

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let store = RocksStore::open(target, &options.store.for_backup())
        .map_err(|e| FrostError::Backup(format!("cannot open backup target: {}", e)))?;

    let (records, batches) = copy_into(source, &store, options.batch_size)?;
    store.flush()?;
    drop(store);

    let manifest = Manifest::new(start, unix_now());
    manifest.write_atomic(target)?;

    tracing::info!(
        target = %target.display(),
        records,
        batches,
        cost = manifest.cost(),
        "backup finished"
    );
    Ok(BackupReport {
        target: target.to_path_buf(),
        records,
        batches,
        manifest,
    })
}

/// Start a backup on a background thread
pub fn start(source: Arc<dyn OrderedStore>, target: PathBuf, options: BackupOptions) -> Result<BackupHandle> {
    let (tx, rx) = channel::bounded(1);
    let worker_target = target.clone();

    let worker = thread::Builder::new()
        .name("frostkv-backup".into())
        .spawn(move || {
            let outcome = run(source.as_ref(), &worker_target, &options);
            if let Err(e) = &outcome {
                tracing::error!(target = %worker_target.display(), error = %e, "backup failed");
            }
            let _ = tx.send(outcome);
        })?;

    Ok(BackupHandle {
        target,
        outcome: rx,
        worker: Some(worker),
    })
}

/// A backup running on its worker thread
pub struct BackupHandle {
    target: PathBuf,
    outcome: Receiver<Result<BackupReport>>,
    worker: Option<JoinHandle<()>>,
}

impl BackupHandle {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Whether the worker has finished (its outcome may not be taken yet)
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Block until the backup ends
    pub fn wait(mut self) -> Result<BackupReport> {
        let outcome = self.outcome.recv().unwrap_or_else(|_| Err(worker_lost()));
        self.join();
        outcome
    }

    /// The outcome, if the backup has ended; it is handed out once
    pub fn try_outcome(&mut self) -> Option<Result<BackupReport>> {
        match self.outcome.try_recv() {
            Ok(outcome) => {
                self.join();
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) if self.worker.is_some() => {
                self.join();
                Some(Err(worker_lost()))
            }
            Err(TryRecvError::Disconnected) => None,
        }
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!(target = %self.target.display(), "backup worker panicked");
            }
        }
    }
}

fn worker_lost() -> FrostError {
    FrostError::Backup("backup worker exited without reporting".into())
}
