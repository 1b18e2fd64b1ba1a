//! Record application
//!
//! One persisted record becomes one call on the [`Keyspace`]. Replay and
//! melt share this path.

use crate::codec::Record;
use crate::dataset::Keyspace;
use crate::error::Result;

/// Apply one decoded record to the keyspace
///
/// Frozen markers carry no data and are accepted without a call.
pub fn apply_record<K: Keyspace + ?Sized>(keyspace: &mut K, record: &Record) -> Result<()> {
    match record {
        Record::String { db, name, value } => keyspace.string_set(*db, name, value),
        Record::HashField {
            db,
            name,
            field,
            value,
        } => keyspace.hash_set(*db, name, field, value),
        Record::SetMember { db, name, member } => keyspace.set_add(*db, name, member),
        Record::ZsetMember {
            db,
            name,
            member,
            score,
        } => keyspace.zset_add(*db, name, member, *score),
        Record::FrozenMarker { .. } => Ok(()),
    }
}
