//! Tests for the red-black tree
//!
//! These tests verify:
//! - Insert/overwrite/get/delete semantics
//! - In-order iteration
//! - Red-black invariants after random insert/delete sequences

use std::collections::BTreeMap;

use proptest::prelude::*;
use ringkv::tree::RbTree;

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_empty_tree() {
    let tree = RbTree::new();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.get("missing"), None);
    assert_eq!(tree.iter().count(), 0);
    assert_eq!(tree.check_invariants(), Ok(1));
}

#[test]
fn test_insert_and_get() {
    let mut tree = RbTree::new();
    assert!(tree.insert("b".to_string(), b"2".to_vec()));
    assert!(tree.insert("a".to_string(), b"1".to_vec()));
    assert!(tree.insert("c".to_string(), b"3".to_vec()));

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.get("a"), Some(&b"1"[..]));
    assert_eq!(tree.get("b"), Some(&b"2"[..]));
    assert_eq!(tree.get("c"), Some(&b"3"[..]));
    assert!(tree.contains_key("a"));
    assert!(!tree.contains_key("d"));
}

#[test]
fn test_insert_overwrites_existing() {
    let mut tree = RbTree::new();
    assert!(tree.insert("k".to_string(), b"old".to_vec()));
    assert!(!tree.insert("k".to_string(), b"new".to_vec()));

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get("k"), Some(&b"new"[..]));
}

#[test]
fn test_get_mut_replaces_value() {
    let mut tree = RbTree::new();
    tree.insert("k".to_string(), b"v1".to_vec());

    *tree.get_mut("k").unwrap() = b"v2".to_vec();
    assert_eq!(tree.get("k"), Some(&b"v2"[..]));
    assert!(tree.get_mut("absent").is_none());
}

#[test]
fn test_empty_key_and_value() {
    let mut tree = RbTree::new();
    assert!(tree.insert(String::new(), Vec::new()));
    assert_eq!(tree.get(""), Some(&[][..]));
    assert!(tree.delete(""));
    assert!(tree.is_empty());
}

#[test]
fn test_delete() {
    let mut tree = RbTree::new();
    for key in ["m", "f", "t", "a", "h", "p", "z"] {
        tree.insert(key.to_string(), key.as_bytes().to_vec());
    }

    assert!(tree.delete("f"));
    assert!(!tree.delete("f"));
    assert!(!tree.delete("missing"));

    assert_eq!(tree.len(), 6);
    assert_eq!(tree.get("f"), None);
    assert_eq!(tree.get("h"), Some(&b"h"[..]));
    tree.check_invariants().unwrap();
}

#[test]
fn test_delete_root_until_empty() {
    let mut tree = RbTree::new();
    for i in 0..64 {
        tree.insert(format!("key{:02}", i), vec![i as u8]);
    }

    for i in 0..64 {
        assert!(tree.delete(&format!("key{:02}", i)));
        tree.check_invariants().unwrap();
    }
    assert!(tree.is_empty());
}

#[test]
fn test_slots_reused_after_delete() {
    let mut tree = RbTree::new();
    for round in 0..3 {
        for i in 0..100 {
            tree.insert(format!("k{}", i), vec![round]);
        }
        for i in 0..100 {
            assert!(tree.delete(&format!("k{}", i)));
        }
        assert!(tree.is_empty());
    }
    tree.insert("again".to_string(), b"x".to_vec());
    assert_eq!(tree.get("again"), Some(&b"x"[..]));
}

// =============================================================================
// Iteration
// =============================================================================

#[test]
fn test_iter_in_key_order() {
    let mut tree = RbTree::new();
    for key in ["delta", "alpha", "echo", "charlie", "bravo"] {
        tree.insert(key.to_string(), key.len().to_string().into_bytes());
    }

    let keys: Vec<&str> = tree.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["alpha", "bravo", "charlie", "delta", "echo"]);

    let values: Vec<&[u8]> = (&tree).into_iter().map(|(_, v)| v).collect();
    assert_eq!(values[0], b"5");
}

#[test]
fn test_sequential_inserts_stay_balanced() {
    let mut tree = RbTree::new();
    for i in 0..10_000 {
        tree.insert(format!("{:08}", i), Vec::new());
    }

    let black_height = tree.check_invariants().unwrap();
    // height <= 2 * log2(n + 1) for a red-black tree
    assert!(black_height <= 15, "black height {}", black_height);
    assert_eq!(tree.len(), 10_000);
}

// =============================================================================
// Property Tests
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Insert(String, Vec<u8>),
    Delete(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // Small key space so deletes and overwrites hit existing keys
    let key = "[a-h]{1,2}";
    prop_oneof![
        (key, proptest::collection::vec(any::<u8>(), 0..8)).prop_map(|(k, v)| Op::Insert(k, v)),
        key.prop_map(Op::Delete),
    ]
}

proptest! {
    #[test]
    fn prop_matches_btreemap(ops in proptest::collection::vec(op_strategy(), 0..300)) {
        let mut tree = RbTree::new();
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let created = tree.insert(k.clone(), v.clone());
                    prop_assert_eq!(created, model.insert(k, v).is_none());
                }
                Op::Delete(k) => {
                    prop_assert_eq!(tree.delete(&k), model.remove(&k).is_some());
                }
            }
            prop_assert!(tree.check_invariants().is_ok(), "{:?}", tree.check_invariants());
        }

        prop_assert_eq!(tree.len(), model.len());
        let actual: Vec<(String, Vec<u8>)> = tree
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect();
        let expected: Vec<(String, Vec<u8>)> = model.into_iter().collect();
        prop_assert_eq!(actual, expected);
    }
}
