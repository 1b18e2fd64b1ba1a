//! Mirror Module
//!
//! Translates in-memory mutations into store writes.
//!
//! ## Responsibilities
//! - Build the collection head once per call
//! - One plain put/delete for a single member, one atomic batch otherwise
//! - Clear a collection / flush a database by prefix scan
//! - Count one operation per call, however many keys it touched
//!
//! ## Error Policy
//! The in-memory mutation has already happened when these run; the store is
//! a mirror, not the source of truth. A failed put, delete, batch or scan is
//! logged with its operation context and the call still completes. Only an
//! over-long key name is reported, and it is rejected before any write.

mod flush;
mod hash;
mod set;
mod string;
mod zset;

use crate::codec::{encode_head, DbId, TypeTag};
use crate::error::Result;
use crate::store::{EngineHandle, WriteBatch};

/// Mutation translator bound to one [`EngineHandle`]
pub struct Mirror<'a> {
    handle: &'a EngineHandle,
}

impl<'a> Mirror<'a> {
    pub(crate) fn new(handle: &'a EngineHandle) -> Self {
        Self { handle }
    }

    /// Remove every record of the collection `(db, tag, key)`
    ///
    /// Strings are a single key; member types are a prefix scan that stops
    /// at the first key outside the collection.
    fn clear(&self, name: &'static str, db: DbId, tag: TypeTag, key: &[u8]) -> Result<()> {
        if !self.active() {
            return Ok(());
        }
        let head = encode_head(db, tag, key)?;
        let op = Op::new(name, db, key);

        if tag.has_members() {
            let removed = self.delete_prefix(op, &head);
            tracing::debug!(op = op.name, db, removed, "cleared collection");
        } else {
            self.delete(op, &head);
        }
        self.handle.record_op();
        Ok(())
    }

    // =========================================================================
    // Shared Write Paths
    // =========================================================================

    fn active(&self) -> bool {
        self.handle.is_mirroring()
    }

    fn put(&self, op: Op<'_>, record: &[u8], value: &[u8]) {
        if let Err(e) = self.handle.store().put(record, value) {
            tracing::warn!(op = op.name, db = op.db, key = %op.key.escape_ascii(), error = %e, "store put failed");
        }
    }

    fn delete(&self, op: Op<'_>, record: &[u8]) {
        if let Err(e) = self.handle.store().delete(record) {
            tracing::warn!(op = op.name, db = op.db, key = %op.key.escape_ascii(), error = %e, "store delete failed");
        }
    }

    fn write(&self, op: Op<'_>, batch: WriteBatch) {
        let len = batch.len();
        if let Err(e) = self.handle.store().write(batch) {
            tracing::warn!(
                op = op.name,
                db = op.db,
                key = %op.key.escape_ascii(),
                batch = len,
                error = %e,
                "store batch write failed"
            );
        }
    }

    /// Delete every key starting with `prefix`; returns how many were deleted
    fn delete_prefix(&self, op: Op<'_>, prefix: &[u8]) -> u64 {
        let store = self.handle.store();
        let mut iter = store.iter();
        let mut removed = 0;

        if prefix.is_empty() {
            iter.seek_to_first();
        } else {
            iter.seek(prefix);
        }
        while iter.valid() {
            let Some(record) = iter.key() else { break };
            if !record.starts_with(prefix) {
                break;
            }
            match store.delete(record) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(
                    op = op.name,
                    db = op.db,
                    key = %op.key.escape_ascii(),
                    record = %record.escape_ascii(),
                    error = %e,
                    "store delete failed"
                ),
            }
            iter.next();
        }
        if let Err(e) = iter.status() {
            tracing::warn!(
                op = op.name,
                db = op.db,
                key = %op.key.escape_ascii(),
                removed,
                error = %e,
                "store iterator failed"
            );
        }
        removed
    }
}

/// Context of one translator call, carried into its failure logs
#[derive(Debug, Clone, Copy)]
struct Op<'k> {
    name: &'static str,

    /// `None` for calls spanning every database
    db: Option<DbId>,

    /// Collection name the call works on (empty for flushes)
    key: &'k [u8],
}

impl<'k> Op<'k> {
    fn new(name: &'static str, db: DbId, key: &'k [u8]) -> Self {
        Self {
            name,
            db: Some(db),
            key,
        }
    }

    fn all_databases(name: &'static str) -> Self {
        Self {
            name,
            db: None,
            key: &[],
        }
    }
}
