//! # In-Memory Store
//!
//! A hierarchical key-store held in process memory. Behaves like a single
//! ZooKeeper session: child order is creation order, `create` fills in
//! missing ancestors, and every operation fails with
//! [`StoreError::ConnectionLoss`] unless the session is `Connected`.
//!
//! ## Node Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  nodes: BTreeMap<NodePath, MemoryNode>                                 │
//! │                                                                         │
//! │  "/"                      data: []        children: ["root"]           │
//! │  "/root"                  data: []        children: ["B"]              │
//! │  "/root/B"                data: []        children: ["blocks"]         │
//! │  "/root/B/blocks"         data: []        children: ["a", "b"]         │
//! │  "/root/B/blocks/a"       data: {"v":1}   children: []                 │
//! │  "/root/B/blocks/b"       data: {}        children: []                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Clones share the same tree, so a test can hand one clone to a session
//! and inspect the other.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info};
use zkconf_core::NodePath;

use crate::connection::{ConnectionState, StoreConnection};
use crate::error::{StoreError, StoreResult};

/// Capacity of the state-event channel.
const STATE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Default, Clone)]
struct MemoryNode {
    data: Vec<u8>,
    children: Vec<String>,
}

#[derive(Debug)]
struct Inner {
    nodes: BTreeMap<NodePath, MemoryNode>,
    state: Option<ConnectionState>,
    connect_count: u32,
    disconnect_count: u32,
    ensured: Vec<NodePath>,
}

/// In-memory [`StoreConnection`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<ConnectionState>,
}

impl MemoryStore {
    /// Creates an empty, disconnected store.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodePath::root(), MemoryNode::default());

        let (events, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);

        MemoryStore {
            inner: Arc::new(Mutex::new(Inner {
                nodes,
                state: None,
                connect_count: 0,
                disconnect_count: 0,
                ensured: Vec::new(),
            })),
            events,
        }
    }

    /// Forces a session state transition and publishes it.
    ///
    /// Used to simulate network blips (`Suspended`), expiry (`Lost`) and
    /// recovery (`Connected`).
    pub fn set_state(&self, state: ConnectionState) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.state = Some(state);
        }
        // No receivers is fine
        let _ = self.events.send(state);
    }

    /// Current session state, `None` if not connected.
    pub fn state(&self) -> Option<ConnectionState> {
        self.inner.lock().ok().and_then(|inner| inner.state)
    }

    /// Number of sessions actually opened (repeated connects are not counted).
    pub fn connect_count(&self) -> u32 {
        self.inner.lock().map(|i| i.connect_count).unwrap_or(0)
    }

    /// Number of sessions actually closed.
    pub fn disconnect_count(&self) -> u32 {
        self.inner.lock().map(|i| i.disconnect_count).unwrap_or(0)
    }

    /// Paths passed to `ensure_path`, in call order.
    pub fn ensured_paths(&self) -> Vec<NodePath> {
        self.inner
            .lock()
            .map(|i| i.ensured.clone())
            .unwrap_or_default()
    }

    /// Returns true if the node exists (ignores session state).
    pub fn exists(&self, path: &NodePath) -> bool {
        self.inner
            .lock()
            .map(|i| i.nodes.contains_key(path))
            .unwrap_or(false)
    }

    /// Raw payload of a node (ignores session state).
    pub fn raw(&self, path: &NodePath) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .ok()
            .and_then(|i| i.nodes.get(path).map(|n| n.data.clone()))
    }

    /// Locks the tree, failing unless the session is connected.
    fn connected(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        let inner = self.lock()?;
        match inner.state {
            Some(ConnectionState::Connected) => Ok(inner),
            Some(other) => Err(StoreError::ConnectionLoss(format!("session is {}", other))),
            None => Err(StoreError::ConnectionLoss("not connected".into())),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Internal("memory store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// Inserts `path` under its parent if missing. The parent must exist.
    fn insert_node(&mut self, path: &NodePath, data: Vec<u8>) {
        if let (Some(parent), Some(name)) = (path.parent(), path.name()) {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.push(name.to_string());
            }
        }
        self.nodes.insert(
            path.clone(),
            MemoryNode {
                data,
                children: Vec::new(),
            },
        );
    }

    /// Creates every missing ancestor of `path` (not `path` itself).
    fn create_ancestors(&mut self, path: &NodePath) {
        let chain = path.ancestors_and_self();
        for ancestor in chain.iter().take(chain.len().saturating_sub(1)) {
            if !self.nodes.contains_key(ancestor) {
                self.insert_node(ancestor, Vec::new());
            }
        }
    }
}

impl StoreConnection for MemoryStore {
    async fn connect(&self, address: &str, port: u16) -> StoreResult<()> {
        {
            let mut inner = self.lock()?;
            if inner.state.is_some() {
                debug!(%address, port, "Already connected, ignoring connect");
                return Ok(());
            }
            inner.state = Some(ConnectionState::Connected);
            inner.connect_count += 1;
        }

        info!(%address, port, "Memory store session opened");
        let _ = self.events.send(ConnectionState::Connected);
        Ok(())
    }

    async fn disconnect(&self) -> StoreResult<()> {
        {
            let mut inner = self.lock()?;
            if inner.state.take().is_none() {
                return Ok(());
            }
            inner.disconnect_count += 1;
        }

        info!("Memory store session closed");
        let _ = self.events.send(ConnectionState::Lost);
        Ok(())
    }

    async fn ensure_path(&self, path: &NodePath) -> StoreResult<()> {
        let mut inner = self.connected()?;
        inner.ensured.push(path.clone());
        inner.create_ancestors(path);
        if !inner.nodes.contains_key(path) {
            inner.insert_node(path, Vec::new());
        }
        Ok(())
    }

    async fn list_children(&self, path: &NodePath) -> StoreResult<Option<Vec<String>>> {
        let inner = self.connected()?;
        Ok(inner.nodes.get(path).map(|node| node.children.clone()))
    }

    async fn read(&self, path: &NodePath) -> StoreResult<Option<Vec<u8>>> {
        let inner = self.connected()?;
        Ok(inner.nodes.get(path).map(|node| node.data.clone()))
    }

    async fn create(&self, path: &NodePath, data: &[u8]) -> StoreResult<()> {
        let mut inner = self.connected()?;
        if inner.nodes.contains_key(path) {
            return Err(StoreError::node_exists(path.as_str()));
        }
        inner.create_ancestors(path);
        inner.insert_node(path, data.to_vec());
        debug!(path = %path, bytes = data.len(), "Created node");
        Ok(())
    }

    async fn update(&self, path: &NodePath, data: &[u8]) -> StoreResult<()> {
        let mut inner = self.connected()?;
        let node = inner
            .nodes
            .get_mut(path)
            .ok_or_else(|| StoreError::no_node(path.as_str()))?;
        node.data = data.to_vec();
        debug!(path = %path, bytes = data.len(), "Updated node");
        Ok(())
    }

    async fn delete_recursive(&self, path: &NodePath) -> StoreResult<()> {
        if path.is_root() {
            return Err(StoreError::InvalidOperation {
                path: path.to_string(),
                reason: "the root node cannot be deleted".into(),
            });
        }

        let mut inner = self.connected()?;
        if !inner.nodes.contains_key(path) {
            return Err(StoreError::no_node(path.as_str()));
        }

        inner.nodes.retain(|candidate, _| !path.contains(candidate));

        if let (Some(parent), Some(name)) = (path.parent(), path.name()) {
            if let Some(parent_node) = inner.nodes.get_mut(&parent) {
                parent_node.children.retain(|child| child != name);
            }
        }

        debug!(path = %path, "Deleted subtree");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionState> {
        self.events.subscribe()
    }
}
