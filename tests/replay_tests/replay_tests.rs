//! Tests for startup replay
//!
//! These tests verify:
//! - Mirrored collections come back identical after reopening
//! - Frozen names are indexed and skipped
//! - Database counts past the one-byte id range stop at the last id
//! - Progress hook cadence
//! - Discrete errors for bad databases, unknown tags and scan failures
//! - Mirroring is restored whatever the outcome

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use frostkv::codec::TypeTag;
use frostkv::config::Config;
use frostkv::dataset::{Dataset, Keyspace, Value};
use frostkv::replay::{ReplayProgress, ReplayState, Replayer};
use frostkv::store::{EngineHandle, MemoryStore, OrderedStore};
use frostkv::tier::FrozenIndex;
use frostkv::{Command, Engine, FrostError, Reply};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_in(temp: &TempDir) -> Config {
    Config::builder().data_dir(temp.path()).build()
}

fn no_hook() -> impl FnMut(&ReplayProgress) {
    |_: &ReplayProgress| {}
}

fn replay_memory(store: Arc<MemoryStore>, config: &Config) -> (EngineHandle, FrozenIndex, Dataset, frostkv::Result<frostkv::replay::ReplayReport>) {
    let handle = EngineHandle::with_store(store);
    let mut index = FrozenIndex::new();
    let mut dataset = Dataset::new(config.databases);
    let mut replayer = Replayer::new(config);
    replayer.scan_frozen(&handle, &mut index, config.databases).unwrap();
    let report = replayer.replay(&handle, &index, &mut dataset, &mut no_hook());
    (handle, index, dataset, report)
}

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_hash_round_trip_through_rocksdb() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);

    let mut expected = HashMap::new();
    {
        let mut replayer = Replayer::new(&config);
        let handle = replayer.open(&config).unwrap();
        let fields: Vec<(Vec<u8>, Vec<u8>)> = (0..50)
            .map(|i| (format!("field{}", i).into_bytes(), format!("value{}", i).into_bytes()))
            .collect();
        handle.mirror().hash_set_many(3, b"profile", &fields).unwrap();
        handle.mirror().hash_set(3, b"profile", b"x=\x00y", b"binary").unwrap();
        expected.extend(fields);
        expected.insert(b"x=\x00y".to_vec(), b"binary".to_vec());
        handle.close().unwrap();
    }

    let mut index = FrozenIndex::new();
    let mut dataset = Dataset::new(config.databases);
    let mut replayer = Replayer::new(&config);
    let (_handle, report) = replayer.run(&config, &mut index, &mut dataset, &mut no_hook()).unwrap();

    assert_eq!(replayer.state(), ReplayState::Done);
    assert_eq!(report.records, 51);
    assert_eq!(report.hashes, 51);
    assert_eq!(dataset.hash(3, b"profile").unwrap(), Some(&expected));
}

#[test]
fn test_every_type_is_rebuilt() {
    let store = Arc::new(MemoryStore::new());
    {
        let handle = EngineHandle::with_store(store.clone());
        let mirror = handle.mirror();
        mirror.string_set(0, b"s", b"text").unwrap();
        mirror.set_add(0, b"set", &[&b"a"[..], &b"b"[..]]).unwrap();
        mirror.zset_add(1, b"z", &[(&b"m"[..], std::f64::consts::PI)]).unwrap();
    }

    let (_handle, _index, dataset, report) = replay_memory(store, &Config::default());
    let report = report.unwrap();

    assert_eq!((report.strings, report.sets, report.zsets), (1, 2, 1));
    assert_eq!(dataset.get(0, b"s").unwrap(), Some(&Value::Str(b"text".to_vec())));
    let set: HashSet<Vec<u8>> = [b"a".to_vec(), b"b".to_vec()].into_iter().collect();
    assert_eq!(dataset.set(0, b"set").unwrap(), Some(&set));
    let zset = dataset.zset(1, b"z").unwrap().unwrap();
    assert_eq!(zset.score(b"m"), Some(std::f64::consts::PI));
}

// =============================================================================
// Frozen Keys
// =============================================================================

#[test]
fn test_frozen_names_are_indexed_and_skipped() {
    let store = Arc::new(MemoryStore::new());
    {
        let handle = EngineHandle::with_store(store.clone());
        let mirror = handle.mirror();
        mirror.hash_set_many(2, b"cold", &[(&b"a"[..], &b"1"[..]), (&b"b"[..], &b"2"[..])]).unwrap();
        mirror.hash_set(2, b"warm", b"a", b"1").unwrap();
    }
    store.put(b"\x02f\x04cold", b"h").unwrap();

    let (_handle, index, dataset, report) = replay_memory(store, &Config::default());
    let report = report.unwrap();

    assert_eq!(index.get(2, b"cold"), Some(TypeTag::Hash));
    assert_eq!(report.skipped_frozen, 2);
    assert_eq!(report.frozen_markers, 1);
    assert_eq!(report.applied, 1);
    assert_eq!(dataset.type_of(2, b"cold"), None);
    assert_eq!(dataset.type_of(2, b"warm"), Some(TypeTag::Hash));
}

#[test]
fn test_frozen_scan_visits_each_database_once() {
    let store = Arc::new(MemoryStore::new());
    store.put(b"\x00f\x01a", b"s").unwrap();
    store.put(b"\xfff\x01k", b"h").unwrap();
    let handle = EngineHandle::with_store(store);
    let mut index = FrozenIndex::new();

    let loaded = Replayer::new(&Config::default())
        .scan_frozen(&handle, &mut index, 1_000)
        .unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(index.get(0, b"a"), Some(TypeTag::Set));
    assert_eq!(index.get(255, b"k"), Some(TypeTag::Hash));
}

#[test]
fn test_oversized_database_count_is_clamped() {
    let store = Arc::new(MemoryStore::new());
    store.put(b"\xfff\x01k", b"h").unwrap();
    store.put(b"\xffc\x01s", b"v").unwrap();
    let config = Config {
        databases: 1_000,
        ..Config::default()
    };

    let mut engine = Engine::with_store(config, store).unwrap();

    assert_eq!(engine.dataset().databases(), 256);
    assert_eq!(engine.replay_report().frozen_indexed, 1);
    assert_eq!(engine.frozen_index().get(255, b"k"), Some(TypeTag::Hash));
    assert_eq!(
        engine.execute(255, Command::Get { key: b"s".to_vec() }).unwrap(),
        Reply::bulk(b"v".to_vec())
    );
}

#[test]
fn test_zero_databases_still_opens_one() {
    let config = Config {
        databases: 0,
        ..Config::default()
    };
    let mut engine = Engine::with_store(config, Arc::new(MemoryStore::new())).unwrap();

    assert_eq!(engine.dataset().databases(), 1);
    assert_eq!(engine.execute(0, Command::Ping).unwrap(), Reply::Status("PONG".into()));
    assert!(matches!(
        engine.execute(1, Command::Ping),
        Err(FrostError::InvalidDatabase(1))
    ));
}

// =============================================================================
// Progress Hook
// =============================================================================

#[test]
fn test_hook_runs_every_interval() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..25u32 {
        store.put(format!("\x00c\x03k{:02}", i).as_bytes(), b"v").unwrap();
    }
    let config = Config::builder().replay_yield_interval(10).build();
    let handle = EngineHandle::with_store(store);
    let mut dataset = Dataset::new(config.databases);

    let mut seen = Vec::new();
    Replayer::new(&config)
        .replay(&handle, &FrozenIndex::new(), &mut dataset, &mut |p: &ReplayProgress| seen.push(p.records))
        .unwrap();

    assert_eq!(seen, vec![10, 20]);
    assert_eq!(dataset.len(0).unwrap(), 25);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_out_of_range_database_is_recoverable() {
    let store = Arc::new(MemoryStore::new());
    store.put(b"\x00c\x01a", b"1").unwrap();
    store.put(b"\x20c\x01b", b"2").unwrap();

    let config = Config::default();
    let (handle, _index, dataset, report) = replay_memory(store, &config);
    let err = report.unwrap_err();

    assert!(matches!(err, FrostError::InvalidDatabase(0x20)));
    assert!(!err.is_fatal());
    assert_eq!(dataset.len(0).unwrap(), 1);
    assert!(handle.is_mirroring());
}

#[test]
fn test_corrupt_record_is_fatal() {
    let store = Arc::new(MemoryStore::new());
    store.put(b"\x00z\x01k=m", b"not-a-score").unwrap();

    let (handle, _index, _dataset, report) = replay_memory(store, &Config::default());
    let err = report.unwrap_err();

    assert!(matches!(err, FrostError::Corruption(_)));
    assert!(err.is_fatal());
    assert!(handle.is_mirroring());
}

#[test]
fn test_scan_failure_is_reported() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..10u8 {
        store.put(&[0, b'c', 1, b'a' + i], b"v").unwrap();
    }
    store.fail_iterators_after(Some(4));

    let handle = EngineHandle::with_store(store);
    let mut dataset = Dataset::new(16);
    let mut replayer = Replayer::new(&Config::default());
    let err = replayer
        .replay(&handle, &FrozenIndex::new(), &mut dataset, &mut no_hook())
        .unwrap_err();

    assert!(matches!(err, FrostError::Iterator(_)));
    assert_eq!(replayer.state(), ReplayState::Failed);
    assert_eq!(dataset.len(0).unwrap(), 4);
}

#[test]
fn test_type_clash_stops_replay() {
    let store = Arc::new(MemoryStore::new());
    // Same name stored both as a string and as a hash
    store.put(b"\x00c\x01k", b"v").unwrap();
    store.put(b"\x00h\x01k=f", b"v").unwrap();

    let (_handle, _index, _dataset, report) = replay_memory(store, &Config::default());
    assert!(matches!(report.unwrap_err(), FrostError::WrongType));
}

#[test]
fn test_open_failure_is_fatal() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let config = Config::builder().data_dir(blocker.join("db")).build();
    let mut replayer = Replayer::new(&config);
    let err = replayer.open(&config).err().unwrap();

    assert!(matches!(err, FrostError::Open { .. }));
    assert!(err.is_fatal());
    assert_eq!(replayer.state(), ReplayState::Failed);
}
