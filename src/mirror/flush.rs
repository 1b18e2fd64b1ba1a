//! Database flushes

use crate::codec::{db_prefix, DbId};

use super::{Mirror, Op};

impl Mirror<'_> {
    /// `FLUSHDB`: delete every record whose head carries `db`
    ///
    /// Frozen markers and the records of frozen collections go too.
    pub fn flush_db(&self, db: DbId) {
        if !self.active() {
            return;
        }
        let removed = self.delete_prefix(Op::new("flushdb", db, &[]), &db_prefix(db));
        self.handle.record_op();
        tracing::info!(db, removed, "flushed database from store");
    }

    /// `FLUSHALL`: delete every record
    pub fn flush_all(&self) {
        if !self.active() {
            return;
        }
        let removed = self.delete_prefix(Op::all_databases("flushall"), &[]);
        self.handle.record_op();
        tracing::info!(removed, "flushed all databases from store");
    }
}
