//! Consistent Hash Ring
//!
//! Maps keys to node identifiers so that membership changes only move the
//! keys adjacent to the added or removed positions.
//!
//! ## Layout
//! ```text
//!            0 ──────────────► u32::MAX
//!   ring:  [ (h0,"b") (h1,"a") (h2,"c") ... (hn,"a") ]   sorted by hash
//!   key ─► crc32(key) ─► first position >= hash (wrapping to index 0)
//! ```
//! Each node owns `virtual_nodes + 1` positions at `crc32("{i}-{node}")`.

use std::collections::BTreeSet;

use crate::error::{KvError, Result};

/// One point on the ring
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Position {
    hash: u32,
    node: String,
}

/// Consistent hashing ring with virtual nodes
#[derive(Debug, Clone)]
pub struct HashRing {
    virtual_nodes: usize,
    /// Sorted by (hash, node); equal hashes from different nodes both stay
    positions: Vec<Position>,
    nodes: BTreeSet<String>,
}

impl HashRing {
    /// Create an empty ring where each node gets `virtual_nodes + 1` positions
    pub fn new(virtual_nodes: usize) -> Self {
        Self {
            virtual_nodes,
            positions: Vec::new(),
            nodes: BTreeSet::new(),
        }
    }

    /// Hash used for keys and ring positions (CRC-32/IEEE)
    pub fn hash(data: &str) -> u32 {
        crc32fast::hash(data.as_bytes())
    }

    /// Add a node and its virtual positions; no-op if already present
    pub fn add_node(&mut self, node: &str) {
        if !self.nodes.insert(node.to_string()) {
            return;
        }

        self.positions.extend((0..=self.virtual_nodes).map(|i| Position {
            hash: Self::virtual_hash(i, node),
            node: node.to_string(),
        }));
        self.positions.sort_unstable();

        tracing::debug!(
            "Added node {} ({} positions, {} nodes on ring)",
            node,
            self.virtual_nodes + 1,
            self.nodes.len()
        );
    }

    /// Remove a node and its positions; no-op if absent
    pub fn remove_node(&mut self, node: &str) {
        if !self.nodes.remove(node) {
            return;
        }
        self.positions.retain(|p| p.node != node);
        tracing::debug!("Removed node {} ({} nodes on ring)", node, self.nodes.len());
    }

    /// Node owning `key`: the first position clockwise from the key's hash
    pub fn get_node(&self, key: &str) -> Result<&str> {
        if self.positions.is_empty() {
            return Err(KvError::EmptyRing);
        }

        let hash = Self::hash(key);
        let idx = self.positions.partition_point(|p| p.hash < hash);
        let idx = if idx == self.positions.len() { 0 } else { idx };
        Ok(&self.positions[idx].node)
    }

    /// Nodes currently on the ring, in sorted order
    pub fn list_nodes(&self) -> Vec<String> {
        self.nodes.iter().cloned().collect()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    /// Number of physical nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn virtual_nodes(&self) -> usize {
        self.virtual_nodes
    }

    /// Total number of positions on the ring
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    fn virtual_hash(index: usize, node: &str) -> u32 {
        Self::hash(&format!("{}-{}", index, node))
    }
}
