//! Engine Module
//!
//! The context object that ties the layers together.
//!
//! ## Responsibilities
//! - Open the store and replay it into the in-memory dataset
//! - Execute commands: mutate memory first, then mirror into the store
//! - Keep frozen keys out of reach of the data commands
//! - Run freeze, melt and background backups
//!
//! ## Concurrency Model
//! All methods that touch the dataset take `&mut self`; the main path is
//! single threaded. The only other thread is a running backup, which holds
//! its own `Arc` of the store and only reads it.

use std::sync::Arc;

use crate::backup::{self, BackupHandle, BackupOptions};
use crate::codec::{format_score, DbId, TypeTag, ZsetMember, MAX_NAME_LEN};
use crate::config::Config;
use crate::dataset::{Dataset, Keyspace, ScoreBound, Value};
use crate::error::{FrostError, Result};
use crate::mirror::Mirror;
use crate::protocol::{Command, Reply};
use crate::replay::{ReplayProgress, ReplayReport, Replayer};
use crate::store::{EngineHandle, OrderedStore};
use crate::tier::{self, FrozenIndex};

/// The durability and tiering engine
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// The open store and its mirror state
    handle: EngineHandle,

    /// Names evicted to the store
    index: FrozenIndex,

    /// Live collections
    dataset: Dataset,

    /// Outcome of the startup replay
    replay: ReplayReport,

    /// Backup started by the last `BACKUP`, until its outcome is taken
    backup: Option<BackupHandle>,
}

impl Engine {
    /// Open the store at `config.data_dir` and replay it
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_hook(config, &mut |_: &ReplayProgress| {})
    }

    /// Like [`Engine::open`], calling `hook` every `replay_yield_interval`
    /// replayed records
    pub fn open_with_hook(config: Config, hook: &mut dyn FnMut(&ReplayProgress)) -> Result<Self> {
        let mut dataset = Dataset::new(config.databases);
        let mut index = FrozenIndex::new();
        let (handle, replay) = Replayer::new(&config).run(&config, &mut index, &mut dataset, hook)?;
        Ok(Self::assemble(config, handle, index, dataset, replay))
    }

    /// Replay an already open store
    pub fn with_store(config: Config, store: Arc<dyn OrderedStore>) -> Result<Self> {
        let handle = EngineHandle::with_store(store);
        let mut dataset = Dataset::new(config.databases);
        let mut index = FrozenIndex::new();

        let mut replayer = Replayer::new(&config);
        let frozen = replayer.scan_frozen(&handle, &mut index, dataset.databases())?;
        let mut replay = replayer.replay(&handle, &index, &mut dataset, &mut |_: &ReplayProgress| {})?;
        replay.frozen_indexed = frozen;
        Ok(Self::assemble(config, handle, index, dataset, replay))
    }

    fn assemble(config: Config, handle: EngineHandle, index: FrozenIndex, dataset: Dataset, replay: ReplayReport) -> Self {
        handle.set_mirroring(config.persistence);
        if !config.persistence {
            tracing::info!("persistence is off, mutations stay in memory");
        }
        Self {
            config,
            handle,
            index,
            dataset,
            replay,
            backup: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn frozen_index(&self) -> &FrozenIndex {
        &self.index
    }

    pub fn replay_report(&self) -> &ReplayReport {
        &self.replay
    }

    /// Logical mutations mirrored into the store since open
    pub fn op_count(&self) -> u64 {
        self.handle.op_count()
    }

    pub fn backup_in_progress(&self) -> bool {
        self.backup.as_ref().is_some_and(|b| !b.is_finished())
    }

    /// Hand over the last started backup, finished or not
    pub fn take_backup(&mut self) -> Option<BackupHandle> {
        self.backup.take()
    }

    // =========================================================================
    // Command Execution
    // =========================================================================

    /// Execute one command against database `db`
    pub fn execute(&mut self, db: DbId, command: Command) -> Result<Reply> {
        if usize::from(db) >= self.dataset.databases() {
            return Err(FrostError::InvalidDatabase(db));
        }
        for key in command.keys() {
            if key.len() > MAX_NAME_LEN {
                return Err(FrostError::NameTooLong(key.len()));
            }
            if self.index.contains(db, key) {
                return Err(FrostError::KeyFrozen);
            }
        }
        tracing::debug!(db, command = command.name(), "execute");

        match command {
            Command::Ping => Ok(Reply::Status("PONG".into())),

            // -----------------------------------------------------------------
            // Keys and Strings
            // -----------------------------------------------------------------
            Command::Get { key } => match self.dataset.get(db, &key)? {
                None => Ok(Reply::nil()),
                Some(Value::Str(value)) => Ok(Reply::bulk(value.clone())),
                Some(_) => Err(FrostError::WrongType),
            },
            Command::Set { key, value } => {
                let mirror = self.handle.mirror();
                let previous = self.dataset.insert(db, key.clone(), Value::Str(value.clone()))?;
                if let Some(old) = previous.filter(|v| v.tag() != TypeTag::String) {
                    drop_mirrored(&mirror, db, &old, &key)?;
                }
                mirror.string_set(db, &key, &value)?;
                Ok(Reply::ok())
            }
            Command::Del { keys } => {
                let mirror = self.handle.mirror();
                let mut removed = 0;
                for key in &keys {
                    if let Some(old) = self.dataset.remove(db, key)? {
                        drop_mirrored(&mirror, db, &old, key)?;
                        removed += 1;
                    }
                }
                Ok(Reply::count(removed))
            }
            Command::Type { key } => {
                let name = self.dataset.type_of(db, &key).map_or("none", TypeTag::name);
                Ok(Reply::Status(name.into()))
            }
            Command::DbSize => Ok(Reply::count(self.dataset.len(db)?)),

            // -----------------------------------------------------------------
            // Hashes
            // -----------------------------------------------------------------
            Command::HSet { key, field, value } => {
                let hash = self.dataset.hash_mut(db, &key)?;
                let added = hash.insert(field.clone(), value.clone()).is_none();
                self.handle.mirror().hash_set(db, &key, &field, &value)?;
                Ok(Reply::Integer(i64::from(added)))
            }
            Command::HMSet { key, fields } => {
                let hash = self.dataset.hash_mut(db, &key)?;
                for (field, value) in &fields {
                    hash.insert(field.clone(), value.clone());
                }
                self.handle.mirror().hash_set_many(db, &key, &fields)?;
                Ok(Reply::ok())
            }
            Command::HGet { key, field } => {
                let value = self.dataset.hash(db, &key)?.and_then(|h| h.get(&field));
                Ok(Reply::Bulk(value.cloned()))
            }
            Command::HGetAll { key } => {
                let mut pairs: Vec<_> = self.dataset.hash(db, &key)?.into_iter().flatten().collect();
                pairs.sort();
                Ok(Reply::Array(
                    pairs
                        .into_iter()
                        .flat_map(|(f, v)| [Reply::bulk(f.clone()), Reply::bulk(v.clone())])
                        .collect(),
                ))
            }
            Command::HDel { key, fields } => {
                if self.dataset.hash(db, &key)?.is_none() {
                    return Ok(Reply::count(0));
                }
                let hash = self.dataset.hash_mut(db, &key)?;
                let removed: Vec<&Vec<u8>> = fields.iter().filter(|f| hash.remove(*f).is_some()).collect();
                if !removed.is_empty() {
                    self.handle.mirror().hash_del(db, &key, &removed)?;
                }
                self.dataset.remove_if_empty(db, &key)?;
                Ok(Reply::count(removed.len()))
            }

            // -----------------------------------------------------------------
            // Sets
            // -----------------------------------------------------------------
            Command::SAdd { key, members } => {
                let set = self.dataset.set_mut(db, &key)?;
                let added: Vec<&Vec<u8>> = members.iter().filter(|m| set.insert((*m).clone())).collect();
                if !added.is_empty() {
                    self.handle.mirror().set_add(db, &key, &added)?;
                }
                Ok(Reply::count(added.len()))
            }
            Command::SRem { key, members } => {
                if self.dataset.set(db, &key)?.is_none() {
                    return Ok(Reply::count(0));
                }
                let set = self.dataset.set_mut(db, &key)?;
                let removed: Vec<&Vec<u8>> = members.iter().filter(|m| set.remove(*m)).collect();
                if !removed.is_empty() {
                    self.handle.mirror().set_rem(db, &key, &removed)?;
                }
                self.dataset.remove_if_empty(db, &key)?;
                Ok(Reply::count(removed.len()))
            }
            Command::SMembers { key } => {
                let mut members: Vec<_> = self.dataset.set(db, &key)?.into_iter().flatten().collect();
                members.sort();
                Ok(Reply::Array(members.into_iter().map(|m| Reply::bulk(m.clone())).collect()))
            }

            // -----------------------------------------------------------------
            // Sorted Sets
            // -----------------------------------------------------------------
            Command::ZAdd { key, entries } => {
                let zset = self.dataset.zset_mut(db, &key)?;
                let mut added = 0;
                for (score, member) in &entries {
                    if zset.insert(member.clone(), *score) {
                        added += 1;
                    }
                }
                let pairs: Vec<(&[u8], f64)> = entries.iter().map(|(s, m)| (m.as_slice(), *s)).collect();
                self.handle.mirror().zset_add(db, &key, &pairs)?;
                Ok(Reply::count(added))
            }
            Command::ZIncrBy { key, increment, member } => {
                let current = self.dataset.zset(db, &key)?.and_then(|z| z.score(&member));
                let score = current.unwrap_or(0.0) + increment;
                if score.is_nan() {
                    return Err(FrostError::NotAFloat);
                }
                self.dataset.zset_mut(db, &key)?.insert(member.clone(), score);
                self.handle.mirror().zset_add_one(db, &key, &member, score)?;
                Ok(Reply::bulk(format_score(score)))
            }
            Command::ZRem { key, members } => {
                if self.dataset.zset(db, &key)?.is_none() {
                    return Ok(Reply::count(0));
                }
                let zset = self.dataset.zset_mut(db, &key)?;
                let removed: Vec<ZsetMember<'_>> = members
                    .iter()
                    .filter(|m| zset.remove(m))
                    .map(|m| ZsetMember::Bytes(m))
                    .collect();
                if !removed.is_empty() {
                    self.handle.mirror().zset_rem(db, &key, &removed)?;
                }
                self.dataset.remove_if_empty(db, &key)?;
                Ok(Reply::count(removed.len()))
            }
            Command::ZRemRangeByScore { key, min, max } => self.zrem_range_by_score(db, &key, min, max),
            Command::ZScore { key, member } => {
                let score = self.dataset.zset(db, &key)?.and_then(|z| z.score(&member));
                Ok(Reply::Bulk(score.map(|s| format_score(s).into_bytes())))
            }
            Command::ZRange {
                key,
                start,
                stop,
                with_scores,
            } => {
                let Some(zset) = self.dataset.zset(db, &key)? else {
                    return Ok(Reply::Array(Vec::new()));
                };
                let mut items = Vec::new();
                for (member, score) in zset.range(start, stop) {
                    items.push(Reply::bulk(member));
                    if with_scores {
                        items.push(Reply::bulk(format_score(score)));
                    }
                }
                Ok(Reply::Array(items))
            }

            // -----------------------------------------------------------------
            // Databases
            // -----------------------------------------------------------------
            Command::FlushDb => {
                self.dataset.clear(db)?;
                self.index.clear_db(db);
                self.handle.mirror().flush_db(db);
                Ok(Reply::ok())
            }
            Command::FlushAll => {
                self.dataset.clear_all();
                self.index.clear();
                self.handle.mirror().flush_all();
                Ok(Reply::ok())
            }

            // -----------------------------------------------------------------
            // Tiering and Backup
            // -----------------------------------------------------------------
            Command::Freeze { keys } => {
                self.require_persistence()?;
                let frozen = tier::freeze_keys(&self.handle, &mut self.index, &mut self.dataset, db, &keys);
                Ok(Reply::Integer(frozen as i64))
            }
            Command::Melt { keys } => {
                self.require_persistence()?;
                let melted = tier::melt_keys(&self.handle, &mut self.index, &mut self.dataset, db, &keys);
                Ok(Reply::Integer(melted as i64))
            }
            Command::Freezed { pattern } => {
                let listing = tier::freezed(&self.index, db, &pattern)
                    .into_iter()
                    .map(|(name, tag)| Reply::Array(vec![Reply::bulk(name), Reply::Status(tag.name().into())]))
                    .collect();
                Ok(Reply::Array(listing))
            }
            Command::Backup { target } => {
                self.require_persistence()?;
                if self.backup_in_progress() {
                    return Err(FrostError::Backup("a backup is already running".into()));
                }
                let handle = backup::start(
                    Arc::clone(self.handle.store()),
                    target,
                    BackupOptions::from_config(&self.config),
                )?;
                self.backup = Some(handle);
                Ok(Reply::Status("Background backup started".into()))
            }
        }
    }

    fn zrem_range_by_score(&mut self, db: DbId, key: &[u8], min: ScoreBound, max: ScoreBound) -> Result<Reply> {
        let Some(zset) = self.dataset.existing_mut(db, key)? else {
            return Ok(Reply::count(0));
        };
        let Value::SortedSet(zset) = zset else {
            return Err(FrostError::WrongType);
        };
        let removed = zset.remove_range_by_score(min, max);
        if !removed.is_empty() {
            let members: Vec<ZsetMember<'_>> = removed.iter().map(|m| ZsetMember::Bytes(m)).collect();
            self.handle.mirror().zset_rem(db, key, &members)?;
        }
        self.dataset.remove_if_empty(db, key)?;
        Ok(Reply::count(removed.len()))
    }

    fn require_persistence(&self) -> Result<()> {
        if !self.config.persistence {
            return Err(FrostError::PersistenceOff);
        }
        Ok(())
    }

    // =========================================================================
    // Tiering
    // =========================================================================

    /// Freeze one key; see [`tier::freeze`]
    pub fn freeze(&mut self, db: DbId, key: &[u8]) -> Result<TypeTag> {
        self.require_persistence()?;
        tier::freeze(&self.handle, &mut self.index, &mut self.dataset, db, key)
    }

    /// Melt one key; see [`tier::melt`]
    pub fn melt(&mut self, db: DbId, key: &[u8]) -> Result<tier::MeltReport> {
        self.require_persistence()?;
        tier::melt(&self.handle, &mut self.index, &mut self.dataset, db, key)
    }

    /// Run a backup to `target` and wait for it
    pub fn backup_blocking(&mut self, target: &std::path::Path) -> Result<backup::BackupReport> {
        self.require_persistence()?;
        backup::run(
            self.handle.store().as_ref(),
            target,
            &BackupOptions::from_config(&self.config),
        )
    }

    /// Wait for a running backup, then flush and release the store
    pub fn close(mut self) -> Result<()> {
        if let Some(backup) = self.backup.take() {
            if let Err(e) = backup.wait() {
                tracing::warn!(error = %e, "backup running at close failed");
            }
        }
        self.handle.close()
    }
}

/// Delete the stored records of a collection just removed from memory
fn drop_mirrored(mirror: &Mirror<'_>, db: DbId, old: &Value, key: &[u8]) -> Result<()> {
    match old {
        Value::Str(_) => mirror.string_del(db, key),
        Value::Hash(_) => mirror.hash_clear(db, key),
        Value::Set(_) => mirror.set_clear(db, key),
        Value::SortedSet(_) => mirror.zset_clear(db, key),
    }
}
