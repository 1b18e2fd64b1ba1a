//! Tests for Engine
//!
//! These tests verify:
//! - Command semantics over every value type
//! - Every mutation survives a reopen of the store
//! - Overwriting a collection with a string drops its records
//! - Deleting a key of any type drops its records
//! - Database flushes stay inside their database
//! - Database and key-length validation
//! - Engine lifecycle (open/close, persistence off)

use std::sync::Arc;

use frostkv::codec::TypeTag;
use frostkv::config::Config;
use frostkv::dataset::Keyspace;
use frostkv::engine::Engine;
use frostkv::protocol::{Command, Reply};
use frostkv::store::MemoryStore;
use frostkv::FrostError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path()).build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn args(parts: &[&str]) -> Command {
    let words: Vec<Vec<u8>> = parts.iter().map(|p| p.as_bytes().to_vec()).collect();
    Command::parse(&words).unwrap()
}

fn run(engine: &mut Engine, parts: &[&str]) -> Reply {
    engine.execute(0, args(parts)).unwrap()
}

fn bulks(items: &[&str]) -> Reply {
    Reply::Array(items.iter().map(|i| Reply::bulk(*i)).collect())
}

// =============================================================================
// Strings and Keys
// =============================================================================

#[test]
fn test_engine_set_get() {
    let (_temp, mut engine) = setup_temp_engine();

    assert_eq!(run(&mut engine, &["SET", "hello", "world"]), Reply::ok());
    assert_eq!(run(&mut engine, &["GET", "hello"]), Reply::bulk("world"));
    assert_eq!(run(&mut engine, &["GET", "missing"]), Reply::nil());
}

#[test]
fn test_engine_ping() {
    let (_temp, mut engine) = setup_temp_engine();
    assert_eq!(run(&mut engine, &["PING"]), Reply::Status("PONG".into()));
}

#[test]
fn test_engine_del_counts_existing_keys() {
    let (_temp, mut engine) = setup_temp_engine();

    run(&mut engine, &["SET", "a", "1"]);
    run(&mut engine, &["SADD", "b", "x"]);

    assert_eq!(run(&mut engine, &["DEL", "a", "b", "c"]), Reply::Integer(2));
    assert_eq!(run(&mut engine, &["DBSIZE"]), Reply::Integer(0));
}

#[test]
fn test_engine_type_and_dbsize() {
    let (_temp, mut engine) = setup_temp_engine();

    run(&mut engine, &["SET", "s", "v"]);
    run(&mut engine, &["HSET", "h", "f", "v"]);
    run(&mut engine, &["SADD", "set", "m"]);
    run(&mut engine, &["ZADD", "z", "1", "m"]);

    for (key, name) in [("s", "string"), ("h", "hash"), ("set", "set"), ("z", "zset"), ("nope", "none")] {
        assert_eq!(run(&mut engine, &["TYPE", key]), Reply::Status(name.into()));
    }
    assert_eq!(run(&mut engine, &["DBSIZE"]), Reply::Integer(4));
}

#[test]
fn test_engine_wrong_type() {
    let (_temp, mut engine) = setup_temp_engine();

    run(&mut engine, &["SET", "s", "v"]);
    assert!(matches!(
        engine.execute(0, args(&["HSET", "s", "f", "v"])),
        Err(FrostError::WrongType)
    ));
    run(&mut engine, &["SADD", "set", "m"]);
    assert!(matches!(
        engine.execute(0, args(&["GET", "set"])),
        Err(FrostError::WrongType)
    ));
}

// =============================================================================
// Collections
// =============================================================================

#[test]
fn test_engine_hash_commands() {
    let (_temp, mut engine) = setup_temp_engine();

    assert_eq!(run(&mut engine, &["HSET", "user", "name", "ada"]), Reply::Integer(1));
    assert_eq!(run(&mut engine, &["HSET", "user", "name", "grace"]), Reply::Integer(0));
    assert_eq!(run(&mut engine, &["HMSET", "user", "lang", "en", "age", "36"]), Reply::ok());
    assert_eq!(run(&mut engine, &["HGET", "user", "name"]), Reply::bulk("grace"));
    assert_eq!(
        run(&mut engine, &["HGETALL", "user"]),
        bulks(&["age", "36", "lang", "en", "name", "grace"])
    );

    assert_eq!(run(&mut engine, &["HDEL", "user", "age", "missing"]), Reply::Integer(1));
    assert_eq!(run(&mut engine, &["HDEL", "user", "lang", "name"]), Reply::Integer(2));
    assert_eq!(run(&mut engine, &["TYPE", "user"]), Reply::Status("none".into()));
}

#[test]
fn test_engine_set_commands() {
    let (_temp, mut engine) = setup_temp_engine();

    assert_eq!(run(&mut engine, &["SADD", "tags", "b", "a", "b"]), Reply::Integer(2));
    assert_eq!(run(&mut engine, &["SADD", "tags", "a", "c"]), Reply::Integer(1));
    assert_eq!(run(&mut engine, &["SMEMBERS", "tags"]), bulks(&["a", "b", "c"]));
    assert_eq!(run(&mut engine, &["SREM", "tags", "a", "z"]), Reply::Integer(1));
    assert_eq!(run(&mut engine, &["SMEMBERS", "nope"]), Reply::Array(vec![]));
}

#[test]
fn test_engine_sorted_set_commands() {
    let (_temp, mut engine) = setup_temp_engine();

    assert_eq!(run(&mut engine, &["ZADD", "board", "3", "cid", "1", "ann", "2", "bob"]), Reply::Integer(3));
    assert_eq!(run(&mut engine, &["ZADD", "board", "0.5", "cid"]), Reply::Integer(0));
    assert_eq!(run(&mut engine, &["ZRANGE", "board", "0", "-1"]), bulks(&["cid", "ann", "bob"]));
    assert_eq!(
        run(&mut engine, &["ZRANGE", "board", "1", "1", "WITHSCORES"]),
        bulks(&["ann", "1"])
    );

    assert_eq!(run(&mut engine, &["ZINCRBY", "board", "0.25", "ann"]), Reply::bulk("1.25"));
    assert_eq!(run(&mut engine, &["ZINCRBY", "board", "4", "dan"]), Reply::bulk("4"));
    assert_eq!(run(&mut engine, &["ZSCORE", "board", "ann"]), Reply::bulk("1.25"));
    assert_eq!(run(&mut engine, &["ZSCORE", "board", "nobody"]), Reply::nil());

    assert_eq!(run(&mut engine, &["ZREMRANGEBYSCORE", "board", "(0.5", "2"]), Reply::Integer(2));
    assert_eq!(run(&mut engine, &["ZRANGE", "board", "0", "-1"]), bulks(&["cid", "dan"]));
    assert_eq!(run(&mut engine, &["ZREM", "board", "cid", "dan"]), Reply::Integer(2));
    assert_eq!(run(&mut engine, &["DBSIZE"]), Reply::Integer(0));
}

#[test]
fn test_engine_rejects_bad_scores() {
    let (_temp, mut engine) = setup_temp_engine();
    let words = vec![b"ZADD".to_vec(), b"z".to_vec(), b"abc".to_vec(), b"m".to_vec()];
    assert!(matches!(Command::parse(&words), Err(FrostError::NotAFloat)));

    run(&mut engine, &["ZADD", "z", "inf", "m"]);
    assert!(matches!(
        engine.execute(0, args(&["ZINCRBY", "z", "-inf", "m"])),
        Err(FrostError::NotAFloat)
    ));
}

// =============================================================================
// Persistence Across Reopen
// =============================================================================

#[test]
fn test_engine_state_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path()).build();

    let before = {
        let mut engine = Engine::open(config.clone()).unwrap();
        run(&mut engine, &["SET", "s", "v"]);
        run(&mut engine, &["HMSET", "h", "a", "1", "b", "2"]);
        run(&mut engine, &["HDEL", "h", "a"]);
        run(&mut engine, &["SADD", "set", "x", "y"]);
        run(&mut engine, &["SREM", "set", "y"]);
        run(&mut engine, &["ZADD", "z", "0.1", "m", "7", "n"]);
        run(&mut engine, &["ZINCRBY", "z", "1", "n"]);
        engine.execute(3, args(&["SET", "other", "db"])).unwrap();
        let before = engine.dataset().clone();
        engine.close().unwrap();
        before
    };

    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.dataset(), &before);
    assert_eq!(engine.replay_report().records, 6);
}

#[test]
fn test_engine_drop_without_close_keeps_data() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path()).build();

    {
        let mut engine = Engine::open(config.clone()).unwrap();
        run(&mut engine, &["SET", "key", "value"]);
        drop(engine);
    }

    let mut engine = Engine::open(config).unwrap();
    assert_eq!(run(&mut engine, &["GET", "key"]), Reply::bulk("value"));
}

#[test]
fn test_engine_set_over_collection_drops_old_records() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = Engine::with_store(Config::default(), store.clone()).unwrap();

    run(&mut engine, &["HMSET", "k", "a", "1", "b", "2"]);
    assert_eq!(store.len(), 2);

    run(&mut engine, &["SET", "k", "plain"]);
    assert_eq!(store.entries(), vec![(b"\x00c\x01k".to_vec(), b"plain".to_vec())]);

    let reopened = Engine::with_store(Config::default(), store).unwrap();
    assert_eq!(reopened.dataset().type_of(0, b"k"), Some(TypeTag::String));
}

#[test]
fn test_engine_del_drops_records_of_every_type() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = Engine::with_store(Config::default(), store.clone()).unwrap();

    run(&mut engine, &["SET", "s", "v"]);
    run(&mut engine, &["HMSET", "h", "a", "1", "b", "2"]);
    run(&mut engine, &["SADD", "set", "x", "y"]);
    run(&mut engine, &["ZADD", "z", "1", "m", "2", "n"]);
    run(&mut engine, &["SET", "keep", "v"]);
    assert_eq!(store.len(), 8);

    assert_eq!(run(&mut engine, &["DEL", "s", "h", "set", "z"]), Reply::count(4));
    assert_eq!(store.entries(), vec![(b"\x00c\x04keep".to_vec(), b"v".to_vec())]);
}

#[test]
fn test_engine_op_count() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = Engine::with_store(Config::default(), store).unwrap();

    run(&mut engine, &["SET", "a", "1"]);
    run(&mut engine, &["HMSET", "h", "f1", "v", "f2", "v"]);
    run(&mut engine, &["GET", "a"]);
    // Nothing to remove, nothing mirrored
    run(&mut engine, &["SREM", "missing", "x"]);

    assert_eq!(engine.op_count(), 2);
}

// =============================================================================
// Flushes
// =============================================================================

#[test]
fn test_engine_flushdb_keeps_other_databases() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = Engine::with_store(Config::default(), store.clone()).unwrap();

    for db in 0..3u8 {
        engine.execute(db, args(&["SET", "s", "v"])).unwrap();
        engine.execute(db, args(&["SADD", "set", "a", "b"])).unwrap();
    }
    engine.execute(1, args(&["FREEZE", "set"])).unwrap();

    engine.execute(1, Command::FlushDb).unwrap();

    assert_eq!(engine.dataset().len(1).unwrap(), 0);
    assert!(engine.frozen_index().is_empty());
    assert!(store.entries().iter().all(|(key, _)| key[0] != 1));
    assert_eq!(store.len(), 6);
    assert_eq!(engine.dataset().len(2).unwrap(), 2);
}

#[test]
fn test_engine_flushall() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = Engine::with_store(Config::default(), store.clone()).unwrap();

    engine.execute(0, args(&["SET", "a", "1"])).unwrap();
    engine.execute(15, args(&["ZADD", "z", "1", "m"])).unwrap();
    engine.execute(0, Command::FlushAll).unwrap();

    assert!(store.is_empty());
    assert!(engine.dataset().is_empty());
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_engine_invalid_database() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path()).databases(4).build();
    let mut engine = Engine::open(config).unwrap();

    assert!(matches!(
        engine.execute(4, args(&["GET", "k"])),
        Err(FrostError::InvalidDatabase(4))
    ));
    engine.execute(3, args(&["SET", "k", "v"])).unwrap();
}

#[test]
fn test_engine_name_too_long() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = Engine::with_store(Config::default(), store.clone()).unwrap();

    let name = vec![b'n'; 256];
    let err = engine
        .execute(0, Command::Set { key: name, value: b"v".to_vec() })
        .unwrap_err();

    assert!(matches!(err, FrostError::NameTooLong(256)));
    assert!(engine.dataset().is_empty());
    assert!(store.is_empty());

    let name = vec![b'n'; 255];
    engine
        .execute(0, Command::Set { key: name, value: b"v".to_vec() })
        .unwrap();
    assert_eq!(store.len(), 1);
}

// =============================================================================
// Close/Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mydb");

    let config = Config::builder().data_dir(&data_dir).build();
    let engine = Engine::open(config).unwrap();

    assert!(data_dir.exists());
    assert_eq!(engine.config().data_dir, data_dir);
    assert_eq!(engine.replay_report().records, 0);
}

#[test]
fn test_engine_store_is_locked_while_open() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path()).build();

    let engine = Engine::open(config.clone()).unwrap();
    assert!(matches!(Engine::open(config.clone()), Err(FrostError::Open { .. })));

    engine.close().unwrap();
    Engine::open(config).unwrap();
}

#[test]
fn test_engine_persistence_off_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let config = Config::builder().persistence(false).build();
    let mut engine = Engine::with_store(config, store.clone()).unwrap();

    run(&mut engine, &["SET", "a", "1"]);
    run(&mut engine, &["HSET", "h", "f", "v"]);

    assert_eq!(run(&mut engine, &["GET", "a"]), Reply::bulk("1"));
    assert!(store.is_empty());
    assert_eq!(engine.op_count(), 0);
}
