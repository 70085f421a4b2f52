//! Tests for the sharded table
//!
//! These tests verify:
//! - Get/Put/Update/Delete semantics and return values
//! - Shard routing (FNV-1a) and shard count defaults
//! - Recovery-path helpers (`apply`, `restore`)
//! - Concurrent readers and writers

use std::sync::Arc;
use std::thread;

use ringkv::config::DEFAULT_SHARD_COUNT;
use ringkv::table::{fnv1a_64, shard_index, Table};
use ringkv::wal::WalRecord;

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_full_lifecycle() {
    let table = Table::new(10);

    assert_eq!(table.put("foo", b"bar").unwrap(), true);
    assert_eq!(table.get("foo"), Some(b"bar".to_vec()));

    assert_eq!(table.update("foo", b"baz").unwrap(), true);
    assert_eq!(table.get("foo"), Some(b"baz".to_vec()));

    assert_eq!(table.delete("foo").unwrap(), true);
    assert_eq!(table.get("foo"), None);

    assert_eq!(table.update("nope", b"x").unwrap(), false);
    assert_eq!(table.get("nope"), None);
}

#[test]
fn test_put_reports_created() {
    let table = Table::new(4);
    assert!(table.put("k", b"v1").unwrap());
    assert!(!table.put("k", b"v2").unwrap());
    assert_eq!(table.get("k"), Some(b"v2".to_vec()));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_delete_missing_key() {
    let table = Table::new(4);
    assert!(!table.delete("missing").unwrap());
    assert!(table.is_empty());
}

#[test]
fn test_empty_key_and_value() {
    let table = Table::new(4);
    assert!(table.put("", b"").unwrap());
    assert_eq!(table.get(""), Some(Vec::new()));
    assert!(table.update("", b"x").unwrap());
    assert_eq!(table.get(""), Some(b"x".to_vec()));
}

#[test]
fn test_values_are_copied() {
    let table = Table::new(4);
    let mut value = b"original".to_vec();
    table.put("k", &value).unwrap();
    value[0] = b'X';

    let mut read = table.get("k").unwrap();
    read[0] = b'Y';
    assert_eq!(table.get("k"), Some(b"original".to_vec()));
}

#[test]
fn test_in_memory_table_is_not_durable() {
    let table = Table::new(4);
    assert!(!table.is_durable());
}

// =============================================================================
// Sharding
// =============================================================================

#[test]
fn test_zero_shards_falls_back_to_default() {
    let table = Table::new(0);
    assert_eq!(table.shard_count(), DEFAULT_SHARD_COUNT);
    table.put("k", b"v").unwrap();
    assert_eq!(table.get("k"), Some(b"v".to_vec()));
}

#[test]
fn test_single_shard() {
    let table = Table::new(1);
    for i in 0..100 {
        table.put(&format!("k{}", i), b"v").unwrap();
    }
    table.read_locked(|snapshot| {
        assert_eq!(snapshot.shard_sizes(), vec![100]);
    });
}

#[test]
fn test_fnv1a_known_vectors() {
    assert_eq!(fnv1a_64(b""), 0xcbf2_9ce4_8422_2325);
    assert_eq!(fnv1a_64(b"a"), 0xaf63_dc4c_8601_ec8c);
    assert_eq!(fnv1a_64(b"foobar"), 0x8594_4171_f739_67e8);
}

#[test]
fn test_keys_land_in_routed_shard() {
    let table = Table::new(8);
    for i in 0..200 {
        table.put(&format!("key-{}", i), b"v").unwrap();
    }

    let mut expected = vec![0usize; 8];
    for i in 0..200 {
        expected[shard_index(&format!("key-{}", i), 8)] += 1;
    }

    table.read_locked(|snapshot| {
        assert_eq!(snapshot.shard_sizes(), expected);
        assert_eq!(snapshot.len(), 200);
        snapshot.check_invariants().unwrap();
    });
}

#[test]
fn test_snapshot_entries_sorted_per_shard() {
    let table = Table::new(3);
    for key in ["d", "a", "c", "b", "e", "f"] {
        table.put(key, key.as_bytes()).unwrap();
    }

    table.read_locked(|snapshot| {
        let mut keys: Vec<&str> = snapshot.entries().map(|(k, _)| k).collect();
        assert_eq!(keys.len(), 6);
        keys.sort_unstable();
        assert_eq!(keys, vec!["a", "b", "c", "d", "e", "f"]);
    });
}

// =============================================================================
// Recovery Helpers
// =============================================================================

#[test]
fn test_apply_records() {
    let table = Table::new(4);

    assert!(table.apply(WalRecord::put("a", b"1".to_vec())));
    assert!(!table.apply(WalRecord::put("a", b"2".to_vec())));
    assert!(table.apply(WalRecord::update("a", b"3".to_vec())));
    assert!(!table.apply(WalRecord::update("b", b"x".to_vec())));
    assert_eq!(table.get("a"), Some(b"3".to_vec()));
    assert_eq!(table.get("b"), None);

    assert!(table.apply(WalRecord::delete("a")));
    assert!(!table.apply(WalRecord::delete("a")));
    assert!(table.is_empty());
}

#[test]
fn test_restore_overwrites() {
    let table = Table::new(4);
    table.restore("k".to_string(), b"v1".to_vec());
    table.restore("k".to_string(), b"v2".to_vec());
    assert_eq!(table.get("k"), Some(b"v2".to_vec()));
    assert_eq!(table.len(), 1);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_writers_distinct_keys() {
    let table = Arc::new(Table::new(16));
    let mut handles = Vec::new();

    for t in 0..8 {
        let table = Arc::clone(&table);
        handles.push(thread::spawn(move || {
            for i in 0..500 {
                let key = format!("t{}-k{}", t, i);
                assert!(table.put(&key, key.as_bytes()).unwrap());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(table.len(), 8 * 500);
    assert_eq!(table.get("t3-k42"), Some(b"t3-k42".to_vec()));
    table.read_locked(|snapshot| snapshot.check_invariants().unwrap());
}

#[test]
fn test_readers_see_complete_values() {
    let table = Arc::new(Table::new(4));
    table.put("shared", &[0u8; 64]).unwrap();

    let writer = {
        let table = Arc::clone(&table);
        thread::spawn(move || {
            for round in 1..=200u8 {
                table.put("shared", &[round; 64]).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for _ in 0..500 {
                    let value = table.get("shared").unwrap();
                    assert_eq!(value.len(), 64);
                    assert!(value.iter().all(|b| *b == value[0]), "torn read");
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(table.get("shared"), Some(vec![200u8; 64]));
}

#[test]
fn test_concurrent_update_and_delete_same_key() {
    let table = Arc::new(Table::new(2));
    table.put("k", b"v").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let table = Arc::clone(&table);
            thread::spawn(move || table.delete("k").unwrap())
        })
        .collect();

    let deleted: usize = handles
        .into_iter()
        .map(|h| usize::from(h.join().unwrap()))
        .sum();
    assert_eq!(deleted, 1);
    assert!(!table.update("k", b"x").unwrap());
}
