//! Tier Module
//!
//! Moves whole collections between memory and the store.
//!
//! ## Operations
//! - `freeze`: evict a collection from memory, keep it in the store, mark it
//! - `melt`: drop the mark and rebuild the collection from its records
//! - `freezed`: list frozen names matching a glob
//!
//! ## Freeze Protocol
//! ```text
//!   memory: evict(db, key) ──► store: put [db]['f'][len][key] = [tag] ──► index: insert
//!                 ▲                            │
//!                 └────── restore on failure ──┘
//! ```
//! The collection's own records are never touched: the mirror already holds
//! them, and melt reads them back.

mod index;
mod pattern;

pub use index::FrozenIndex;
pub use pattern::glob_match;

use crate::codec::{decode_record, encode_head, DbId, TypeTag};
use crate::dataset::Keyspace;
use crate::error::{FrostError, Result};
use crate::replay::apply_record;
use crate::store::EngineHandle;

/// What a melt brought back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeltReport {
    pub tag: TypeTag,
    pub records: u64,
}

/// Evict the collection at `(db, key)` and mark it frozen
///
/// Returns the type the key was frozen as.
pub fn freeze<K: Keyspace + ?Sized>(
    handle: &EngineHandle,
    index: &mut FrozenIndex,
    keyspace: &mut K,
    db: DbId,
    key: &[u8],
) -> Result<TypeTag> {
    if !handle.is_mirroring() {
        return Err(FrostError::PersistenceOff);
    }
    if let Some(tag) = index.get(db, key) {
        return Err(FrostError::AlreadyFrozen(tag));
    }
    if usize::from(db) >= keyspace.databases() {
        return Err(FrostError::InvalidDatabase(db));
    }
    let marker = encode_head(db, TypeTag::FrozenMarker, key)?;

    let tag = keyspace.type_of(db, key).ok_or(FrostError::NoSuchKey)?;
    let collection = keyspace.evict(db, key).ok_or(FrostError::NoSuchKey)?;

    if let Err(e) = handle.store().put(&marker, &[tag.as_byte()]) {
        tracing::warn!(db, error = %e, "frozen marker write failed, restoring collection");
        keyspace.restore(db, key.to_vec(), collection);
        return Err(e);
    }

    index.insert(db, key.to_vec(), tag);
    handle.record_op();
    tracing::debug!(db, tag = tag.name(), "froze key");
    Ok(tag)
}

/// Unmark `(db, key)` and rebuild its collection in memory
///
/// The marker goes first; a reconstruction failure afterwards is returned
/// as is and whatever was applied stays applied.
pub fn melt<K: Keyspace + ?Sized>(
    handle: &EngineHandle,
    index: &mut FrozenIndex,
    keyspace: &mut K,
    db: DbId,
    key: &[u8],
) -> Result<MeltReport> {
    if !handle.is_mirroring() {
        return Err(FrostError::PersistenceOff);
    }
    let tag = index.get(db, key).ok_or(FrostError::NotFrozen)?;
    let marker = encode_head(db, TypeTag::FrozenMarker, key)?;

    handle.store().delete(&marker)?;
    index.remove(db, key);
    handle.record_op();

    let _suspended = handle.suspend();
    let records = reconstruct(handle, keyspace, db, tag, key)?;
    tracing::debug!(db, tag = tag.name(), records, "melted key");
    Ok(MeltReport { tag, records })
}

fn reconstruct<K: Keyspace + ?Sized>(
    handle: &EngineHandle,
    keyspace: &mut K,
    db: DbId,
    tag: TypeTag,
    key: &[u8],
) -> Result<u64> {
    let head = encode_head(db, tag, key)?;
    let store = handle.store();

    if !tag.has_members() {
        return match store.get(&head)? {
            Some(value) => {
                apply_record(keyspace, &decode_record(&head, &value)?)?;
                Ok(1)
            }
            None => Ok(0),
        };
    }

    let mut iter = store.iter();
    let mut records = 0;
    iter.seek(&head);
    while iter.valid() {
        let (Some(k), Some(v)) = (iter.key(), iter.value()) else {
            break;
        };
        if !k.starts_with(&head) {
            break;
        }
        apply_record(keyspace, &decode_record(k, v)?)?;
        records += 1;
        iter.next();
    }
    iter.status()?;
    Ok(records)
}

/// Freeze each key in turn; failures are logged and skipped
///
/// Returns how many keys were frozen.
pub fn freeze_keys<K, N>(handle: &EngineHandle, index: &mut FrozenIndex, keyspace: &mut K, db: DbId, keys: &[N]) -> u64
where
    K: Keyspace + ?Sized,
    N: AsRef<[u8]>,
{
    let mut frozen = 0;
    for key in keys {
        match freeze(handle, index, keyspace, db, key.as_ref()) {
            Ok(_) => frozen += 1,
            Err(e) => tracing::warn!(db, key = %String::from_utf8_lossy(key.as_ref()), error = %e, "freeze skipped"),
        }
    }
    frozen
}

/// Melt each key in turn; failures are logged and skipped
///
/// Returns how many keys were melted.
pub fn melt_keys<K, N>(handle: &EngineHandle, index: &mut FrozenIndex, keyspace: &mut K, db: DbId, keys: &[N]) -> u64
where
    K: Keyspace + ?Sized,
    N: AsRef<[u8]>,
{
    let mut melted = 0;
    for key in keys {
        match melt(handle, index, keyspace, db, key.as_ref()) {
            Ok(_) => melted += 1,
            Err(e) => tracing::warn!(db, key = %String::from_utf8_lossy(key.as_ref()), error = %e, "melt skipped"),
        }
    }
    melted
}

/// Frozen names of `db` matching `pattern`, with their types
pub fn freezed(index: &FrozenIndex, db: DbId, pattern: &[u8]) -> Vec<(Vec<u8>, TypeTag)> {
    index.matching(db, pattern)
}
