//! Dataset Module
//!
//! The in-memory side: numbered databases of strings, hashes, sets and
//! sorted sets.
//!
//! ## Responsibilities
//! - Hold the live collections (the source of truth while running)
//! - Expose one mutation interface, [`Keyspace`], shared by the command
//!   path, replay and melt
//! - Evict and restore whole collections for freeze

mod db;
mod zset;

pub use db::Dataset;
pub use zset::{ScoreBound, SortedSet};

use std::collections::{HashMap, HashSet};

use crate::codec::{DbId, TypeTag};
use crate::error::Result;

/// The mutation interface replay and melt rebuild collections through
///
/// Each call applies one persisted record. Implementations reject calls that
/// hit a key of another type with `WrongType` and unknown databases with
/// `InvalidDatabase`.
pub trait Keyspace {
    /// A whole collection, as moved out by `evict`
    type Collection;

    /// Number of databases; valid ids are `0..databases()`
    fn databases(&self) -> usize;

    /// Type of the live collection at `key`, if any
    fn type_of(&self, db: DbId, key: &[u8]) -> Option<TypeTag>;

    fn string_set(&mut self, db: DbId, key: &[u8], value: &[u8]) -> Result<()>;

    fn hash_set(&mut self, db: DbId, key: &[u8], field: &[u8], value: &[u8]) -> Result<()>;

    fn set_add(&mut self, db: DbId, key: &[u8], member: &[u8]) -> Result<()>;

    fn zset_add(&mut self, db: DbId, key: &[u8], member: &[u8], score: f64) -> Result<()>;

    /// Remove the collection at `key` from memory and hand it over
    fn evict(&mut self, db: DbId, key: &[u8]) -> Option<Self::Collection>;

    /// Put an evicted collection back
    fn restore(&mut self, db: DbId, key: Vec<u8>, collection: Self::Collection);
}

/// A live collection
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(Vec<u8>),
    Hash(HashMap<Vec<u8>, Vec<u8>>),
    Set(HashSet<Vec<u8>>),
    SortedSet(SortedSet),
}

impl Value {
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Str(_) => TypeTag::String,
            Value::Hash(_) => TypeTag::Hash,
            Value::Set(_) => TypeTag::Set,
            Value::SortedSet(_) => TypeTag::SortedSet,
        }
    }

    /// Collections are dropped once their last member is removed
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Str(_) => false,
            Value::Hash(h) => h.is_empty(),
            Value::Set(s) => s.is_empty(),
            Value::SortedSet(z) => z.is_empty(),
        }
    }
}
