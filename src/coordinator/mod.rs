//! Coordinator
//!
//! Places keys on storage nodes with the consistent hash ring and forwards
//! each request to the owning node.
//!
//! ## Responsibilities
//! - Keep the ring and one client per node in step
//! - Route Get/Put/Update/Delete to `ring.get_node(key)`
//! - Reconnect lazily after a node connection breaks
//!
//! ```text
//!   GET foo ──► crc32("foo") ──► ring ──► "node-b" ──► Client(node-b)
//! ```

mod shell;

pub use shell::{run_shell, ShellCommand};

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::config::DEFAULT_VIRTUAL_NODES;
use crate::error::{KvError, Result};
use crate::network::Client;
use crate::ring::HashRing;

/// Default timeout when dialing a node
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Cluster membership as loaded from a JSON file
///
/// ```json
/// { "nodes": { "node-a": "127.0.0.1:7070" }, "virtual_nodes": 21 }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorConfig {
    /// Node id to `host:port`
    pub nodes: BTreeMap<String, String>,

    #[serde(default = "default_virtual_nodes")]
    pub virtual_nodes: usize,
}

fn default_virtual_nodes() -> usize {
    DEFAULT_VIRTUAL_NODES
}

impl CoordinatorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| KvError::Config(format!("{}: {}", path.display(), e)))
    }
}

struct NodeEntry {
    addr: String,
    client: Option<Client>,
}

/// Routes requests across storage nodes
pub struct Coordinator {
    ring: HashRing,
    nodes: HashMap<String, NodeEntry>,
    connect_timeout: Duration,
}

impl Coordinator {
    /// Empty coordinator; nodes are added with `add_node`
    pub fn new(virtual_nodes: usize) -> Self {
        Self {
            ring: HashRing::new(virtual_nodes),
            nodes: HashMap::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Connect to every node in `config`
    ///
    /// Fails if any node cannot be reached.
    pub fn connect(config: &CoordinatorConfig) -> Result<Self> {
        let mut coordinator = Self::new(config.virtual_nodes);
        for (id, addr) in &config.nodes {
            coordinator.add_node(id, addr)?;
        }
        Ok(coordinator)
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    /// Dial a node and place it on the ring
    ///
    /// Re-adding a known id replaces its address and connection.
    pub fn add_node(&mut self, id: &str, addr: &str) -> Result<()> {
        let client = Client::connect(addr, self.connect_timeout)?;
        tracing::info!("Connected to node {} at {}", id, addr);

        self.nodes.insert(
            id.to_string(),
            NodeEntry {
                addr: addr.to_string(),
                client: Some(client),
            },
        );
        self.ring.add_node(id);
        Ok(())
    }

    /// Take a node off the ring; returns whether it was known
    pub fn remove_node(&mut self, id: &str) -> bool {
        self.ring.remove_node(id);
        let removed = self.nodes.remove(id).is_some();
        if removed {
            tracing::info!("Removed node {}", id);
        }
        removed
    }

    /// Node ids with their addresses, sorted by id
    pub fn nodes(&self) -> Vec<(String, String)> {
        self.ring
            .list_nodes()
            .into_iter()
            .filter_map(|id| {
                let addr = self.nodes.get(&id)?.addr.clone();
                Some((id, addr))
            })
            .collect()
    }

    /// Id of the node owning `key`
    pub fn route(&self, key: &str) -> Result<String> {
        self.ring.get_node(key).map(str::to_string)
    }

    pub fn ring(&self) -> &HashRing {
        &self.ring
    }

    // =========================================================================
    // Routed operations
    // =========================================================================

    pub fn get(&mut self, key: &str) -> Result<(String, Option<Vec<u8>>)> {
        self.with_owner(key, |client| client.get(key))
    }

    /// Returns the owning node and whether the key was created
    pub fn put(&mut self, key: &str, value: &[u8]) -> Result<(String, bool)> {
        self.with_owner(key, |client| client.put(key, value))
    }

    /// Returns the owning node and whether the key existed
    pub fn update(&mut self, key: &str, value: &[u8]) -> Result<(String, bool)> {
        self.with_owner(key, |client| client.update(key, value))
    }

    /// Returns the owning node and whether the key existed
    pub fn delete(&mut self, key: &str) -> Result<(String, bool)> {
        self.with_owner(key, |client| client.delete(key))
    }

    fn with_owner<T>(
        &mut self,
        key: &str,
        op: impl FnOnce(&mut Client) -> Result<T>,
    ) -> Result<(String, T)> {
        let node_id = self.route(key)?;
        let timeout = self.connect_timeout;
        let entry = self
            .nodes
            .get_mut(&node_id)
            .ok_or_else(|| KvError::UnknownNode(node_id.clone()))?;

        let mut client = match entry.client.take() {
            Some(client) => client,
            None => {
                tracing::debug!("Reconnecting to node {} at {}", node_id, entry.addr);
                Client::connect(&entry.addr, timeout)?
            }
        };

        let result = op(&mut client);
        match &result {
            // the stream may be mid-frame; a fresh connection is dialed next time
            Err(e @ (KvError::Io(_) | KvError::Network(_) | KvError::Protocol(_))) => {
                tracing::warn!("Dropping connection to node {}: {}", node_id, e);
            }
            _ => entry.client = Some(client),
        }
        result.map(|value| (node_id, value))
    }
}
