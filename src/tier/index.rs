//! Frozen Index

use std::collections::BTreeMap;

use crate::codec::{decode_record, tag_prefix, DbId, Record, TypeTag};
use crate::error::{FrostError, Result};
use crate::store::OrderedStore;

use super::pattern::glob_match;

/// Names currently frozen, per database, with the type they were frozen as
///
/// A name in the index has no live in-memory collection. The index is only
/// ever rebuilt from the marker records; it is not persisted by itself.
#[derive(Debug, Clone, Default)]
pub struct FrozenIndex {
    dbs: BTreeMap<DbId, BTreeMap<Vec<u8>, TypeTag>>,
}

impl FrozenIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frozen names across every database
    pub fn len(&self) -> usize {
        self.dbs.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dbs.values().all(BTreeMap::is_empty)
    }

    pub fn contains(&self, db: DbId, name: &[u8]) -> bool {
        self.get(db, name).is_some()
    }

    /// Type the name was frozen as
    pub fn get(&self, db: DbId, name: &[u8]) -> Option<TypeTag> {
        self.dbs.get(&db)?.get(name).copied()
    }

    pub fn insert(&mut self, db: DbId, name: Vec<u8>, tag: TypeTag) -> Option<TypeTag> {
        self.dbs.entry(db).or_default().insert(name, tag)
    }

    pub fn remove(&mut self, db: DbId, name: &[u8]) -> Option<TypeTag> {
        let names = self.dbs.get_mut(&db)?;
        let tag = names.remove(name);
        if names.is_empty() {
            self.dbs.remove(&db);
        }
        tag
    }

    /// Forget every frozen name of one database (`FLUSHDB`)
    pub fn clear_db(&mut self, db: DbId) {
        self.dbs.remove(&db);
    }

    pub fn clear(&mut self) {
        self.dbs.clear();
    }

    /// Frozen names of one database whose name matches the glob `pattern`,
    /// in name order
    pub fn matching(&self, db: DbId, pattern: &[u8]) -> Vec<(Vec<u8>, TypeTag)> {
        let Some(names) = self.dbs.get(&db) else {
            return Vec::new();
        };
        names
            .iter()
            .filter(|(name, _)| glob_match(pattern, name))
            .map(|(name, tag)| (name.clone(), *tag))
            .collect()
    }

    /// Add every frozen marker of `db` found in the store
    ///
    /// Returns how many markers were read. Markers of one database sort
    /// contiguously under `[db]['f']`, so the scan stops at the first key
    /// outside that prefix.
    pub fn load_db(&mut self, store: &dyn OrderedStore, db: DbId) -> Result<usize> {
        let prefix = tag_prefix(db, TypeTag::FrozenMarker);
        let mut iter = store.iter();
        let mut loaded = 0;

        iter.seek(&prefix);
        while iter.valid() {
            let (Some(key), Some(value)) = (iter.key(), iter.value()) else {
                break;
            };
            if !key.starts_with(&prefix) {
                break;
            }
            match decode_record(key, value)? {
                Record::FrozenMarker { name, tag, .. } => {
                    self.insert(db, name.to_vec(), tag);
                    loaded += 1;
                }
                other => {
                    return Err(FrostError::Corruption(format!(
                        "{} record found under the frozen marker prefix",
                        other.tag().name()
                    )));
                }
            }
            iter.next();
        }
        iter.status()?;
        Ok(loaded)
    }
}
