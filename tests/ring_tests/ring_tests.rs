//! Tests for the consistent hash ring
//!
//! These tests verify:
//! - Empty ring lookups fail
//! - Membership changes only move keys to/from the changed node
//! - Lookups are deterministic across ring instances
//! - Positions follow crc32("{i}-{node}")

use std::collections::HashMap;

use ringkv::error::KvError;
use ringkv::HashRing;

// =============================================================================
// Helper Functions
// =============================================================================

fn ring_with(nodes: &[&str], virtual_nodes: usize) -> HashRing {
    let mut ring = HashRing::new(virtual_nodes);
    for node in nodes {
        ring.add_node(node);
    }
    ring
}

fn assignments(ring: &HashRing, keys: &[String]) -> HashMap<String, String> {
    keys.iter()
        .map(|k| (k.clone(), ring.get_node(k).unwrap().to_string()))
        .collect()
}

fn sample_keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("user:{}", i)).collect()
}

// =============================================================================
// Basic Behavior
// =============================================================================

#[test]
fn test_empty_ring() {
    let ring = HashRing::new(10);
    assert!(ring.is_empty());
    assert!(matches!(ring.get_node("anything"), Err(KvError::EmptyRing)));
    assert!(ring.list_nodes().is_empty());
}

#[test]
fn test_single_node_owns_everything() {
    let ring = ring_with(&["solo"], 5);
    for key in sample_keys(100) {
        assert_eq!(ring.get_node(&key).unwrap(), "solo");
    }
}

#[test]
fn test_positions_per_node() {
    let ring = ring_with(&["a", "b"], 21);
    assert_eq!(ring.position_count(), 2 * 22);
    assert_eq!(ring.virtual_nodes(), 21);
}

#[test]
fn test_add_is_idempotent() {
    let mut ring = ring_with(&["a"], 3);
    ring.add_node("a");
    assert_eq!(ring.len(), 1);
    assert_eq!(ring.position_count(), 4);
}

#[test]
fn test_remove_unknown_is_noop() {
    let mut ring = ring_with(&["a"], 3);
    ring.remove_node("zzz");
    assert_eq!(ring.list_nodes(), vec!["a".to_string()]);
}

#[test]
fn test_remove_last_node_empties_ring() {
    let mut ring = ring_with(&["a"], 3);
    ring.remove_node("a");
    assert!(ring.is_empty());
    assert_eq!(ring.position_count(), 0);
    assert!(matches!(ring.get_node("k"), Err(KvError::EmptyRing)));
}

#[test]
fn test_list_nodes_sorted() {
    let ring = ring_with(&["charlie", "alpha", "bravo"], 2);
    assert_eq!(ring.list_nodes(), vec!["alpha", "bravo", "charlie"]);
    assert!(ring.contains("bravo"));
    assert!(!ring.contains("delta"));
}

#[test]
fn test_hash_is_crc32_ieee() {
    // CRC-32/IEEE check value
    assert_eq!(HashRing::hash("123456789"), 0xcbf4_3926);
}

#[test]
fn test_key_maps_to_next_position_clockwise() {
    let ring = ring_with(&["a", "b", "c"], 0);
    let mut positions: Vec<(u32, &str)> = ["a", "b", "c"]
        .iter()
        .map(|n| (HashRing::hash(&format!("0-{}", n)), *n))
        .collect();
    positions.sort_unstable();

    for key in sample_keys(200) {
        let hash = HashRing::hash(&key);
        let expected = positions
            .iter()
            .find(|(h, _)| *h >= hash)
            .unwrap_or(&positions[0])
            .1;
        assert_eq!(ring.get_node(&key).unwrap(), expected, "key {}", key);
    }
}

#[test]
fn test_insertion_order_does_not_matter() {
    let one = ring_with(&["a", "b", "c", "d"], 10);
    let two = ring_with(&["d", "b", "a", "c"], 10);
    let keys = sample_keys(500);
    assert_eq!(assignments(&one, &keys), assignments(&two, &keys));
}

// =============================================================================
// Membership Changes
// =============================================================================

#[test]
fn test_add_node_moves_keys_only_to_new_node() {
    let keys = sample_keys(5000);
    let mut ring = ring_with(&["n1", "n2", "n3"], 21);
    let before = assignments(&ring, &keys);

    ring.add_node("n4");
    let after = assignments(&ring, &keys);

    let mut moved = 0;
    for key in &keys {
        if before[key] != after[key] {
            assert_eq!(after[key], "n4", "key {} moved between old nodes", key);
            moved += 1;
        }
    }
    assert!(moved > 0, "new node received no keys");
    assert!(
        moved < keys.len() * 6 / 10,
        "too many keys moved: {} of {}",
        moved,
        keys.len()
    );
}

#[test]
fn test_remove_node_moves_only_its_keys() {
    let keys = sample_keys(5000);
    let mut ring = ring_with(&["n1", "n2", "n3", "n4"], 21);
    let before = assignments(&ring, &keys);

    ring.remove_node("n2");
    let after = assignments(&ring, &keys);

    for key in &keys {
        if before[key] != "n2" {
            assert_eq!(before[key], after[key], "key {} moved needlessly", key);
        } else {
            assert_ne!(after[key], "n2");
        }
    }
}

#[test]
fn test_add_then_remove_restores_mapping() {
    let keys = sample_keys(2000);
    let mut ring = ring_with(&["n1", "n2", "n3"], 21);
    let before = assignments(&ring, &keys);

    ring.add_node("n4");
    ring.remove_node("n4");

    assert_eq!(assignments(&ring, &keys), before);
}
