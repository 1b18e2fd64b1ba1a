//! Numbered in-memory databases

use std::collections::{HashMap, HashSet};

use crate::codec::{DbId, TypeTag, MAX_DATABASES};
use crate::error::{FrostError, Result};

use super::{Keyspace, SortedSet, Value};

type Db = HashMap<Vec<u8>, Value>;

/// All databases of the in-memory server
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    dbs: Vec<Db>,
}

impl Dataset {
    /// Create `databases` empty databases, clamped to `1..=MAX_DATABASES`
    pub fn new(databases: usize) -> Self {
        Self {
            dbs: (0..databases.clamp(1, MAX_DATABASES)).map(|_| Db::new()).collect(),
        }
    }

    fn db(&self, db: DbId) -> Result<&Db> {
        self.dbs
            .get(db as usize)
            .ok_or(FrostError::InvalidDatabase(db))
    }

    fn db_mut(&mut self, db: DbId) -> Result<&mut Db> {
        self.dbs
            .get_mut(db as usize)
            .ok_or(FrostError::InvalidDatabase(db))
    }

    pub fn get(&self, db: DbId, key: &[u8]) -> Result<Option<&Value>> {
        Ok(self.db(db)?.get(key))
    }

    pub fn insert(&mut self, db: DbId, key: Vec<u8>, value: Value) -> Result<Option<Value>> {
        Ok(self.db_mut(db)?.insert(key, value))
    }

    pub fn remove(&mut self, db: DbId, key: &[u8]) -> Result<Option<Value>> {
        Ok(self.db_mut(db)?.remove(key))
    }

    /// Number of keys in one database
    pub fn len(&self, db: DbId) -> Result<usize> {
        Ok(self.db(db)?.len())
    }

    /// Whether every database is empty
    pub fn is_empty(&self) -> bool {
        self.dbs.iter().all(HashMap::is_empty)
    }

    pub fn clear(&mut self, db: DbId) -> Result<()> {
        self.db_mut(db)?.clear();
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.dbs.iter_mut().for_each(HashMap::clear);
    }

    /// Drop `key` if its collection became empty
    pub fn remove_if_empty(&mut self, db: DbId, key: &[u8]) -> Result<()> {
        let db = self.db_mut(db)?;
        if db.get(key).is_some_and(Value::is_empty) {
            db.remove(key);
        }
        Ok(())
    }

    // =========================================================================
    // Typed Access
    // =========================================================================

    pub fn hash(&self, db: DbId, key: &[u8]) -> Result<Option<&HashMap<Vec<u8>, Vec<u8>>>> {
        match self.get(db, key)? {
            None => Ok(None),
            Some(Value::Hash(h)) => Ok(Some(h)),
            Some(_) => Err(FrostError::WrongType),
        }
    }

    pub fn set(&self, db: DbId, key: &[u8]) -> Result<Option<&HashSet<Vec<u8>>>> {
        match self.get(db, key)? {
            None => Ok(None),
            Some(Value::Set(s)) => Ok(Some(s)),
            Some(_) => Err(FrostError::WrongType),
        }
    }

    pub fn zset(&self, db: DbId, key: &[u8]) -> Result<Option<&SortedSet>> {
        match self.get(db, key)? {
            None => Ok(None),
            Some(Value::SortedSet(z)) => Ok(Some(z)),
            Some(_) => Err(FrostError::WrongType),
        }
    }

    /// Hash at `key`, created empty when missing
    pub fn hash_mut(&mut self, db: DbId, key: &[u8]) -> Result<&mut HashMap<Vec<u8>, Vec<u8>>> {
        match self.entry(db, key, || Value::Hash(HashMap::new()))? {
            Value::Hash(h) => Ok(h),
            _ => Err(FrostError::WrongType),
        }
    }

    /// Set at `key`, created empty when missing
    pub fn set_mut(&mut self, db: DbId, key: &[u8]) -> Result<&mut HashSet<Vec<u8>>> {
        match self.entry(db, key, || Value::Set(HashSet::new()))? {
            Value::Set(s) => Ok(s),
            _ => Err(FrostError::WrongType),
        }
    }

    /// Sorted set at `key`, created empty when missing
    pub fn zset_mut(&mut self, db: DbId, key: &[u8]) -> Result<&mut SortedSet> {
        match self.entry(db, key, || Value::SortedSet(SortedSet::new()))? {
            Value::SortedSet(z) => Ok(z),
            _ => Err(FrostError::WrongType),
        }
    }

    /// Existing hash/set/sorted set at `key` for removals; never creates
    pub fn existing_mut(&mut self, db: DbId, key: &[u8]) -> Result<Option<&mut Value>> {
        Ok(self.db_mut(db)?.get_mut(key))
    }

    fn entry(&mut self, db: DbId, key: &[u8], empty: impl FnOnce() -> Value) -> Result<&mut Value> {
        Ok(self
            .db_mut(db)?
            .entry(key.to_vec())
            .or_insert_with(empty))
    }
}

impl Keyspace for Dataset {
    type Collection = Value;

    fn databases(&self) -> usize {
        self.dbs.len()
    }

    fn type_of(&self, db: DbId, key: &[u8]) -> Option<TypeTag> {
        self.dbs.get(db as usize)?.get(key).map(Value::tag)
    }

    fn string_set(&mut self, db: DbId, key: &[u8], value: &[u8]) -> Result<()> {
        match self.db(db)?.get(key) {
            None | Some(Value::Str(_)) => {}
            Some(_) => return Err(FrostError::WrongType),
        }
        self.db_mut(db)?.insert(key.to_vec(), Value::Str(value.to_vec()));
        Ok(())
    }

    fn hash_set(&mut self, db: DbId, key: &[u8], field: &[u8], value: &[u8]) -> Result<()> {
        self.hash_mut(db, key)?.insert(field.to_vec(), value.to_vec());
        Ok(())
    }

    fn set_add(&mut self, db: DbId, key: &[u8], member: &[u8]) -> Result<()> {
        self.set_mut(db, key)?.insert(member.to_vec());
        Ok(())
    }

    fn zset_add(&mut self, db: DbId, key: &[u8], member: &[u8], score: f64) -> Result<()> {
        self.zset_mut(db, key)?.insert(member.to_vec(), score);
        Ok(())
    }

    fn evict(&mut self, db: DbId, key: &[u8]) -> Option<Value> {
        self.dbs.get_mut(db as usize)?.remove(key)
    }

    fn restore(&mut self, db: DbId, key: Vec<u8>, collection: Value) {
        if let Some(db) = self.dbs.get_mut(db as usize) {
            db.insert(key, collection);
        }
    }
}
