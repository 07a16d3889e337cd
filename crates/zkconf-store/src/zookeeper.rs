//! # ZooKeeper Backend
//!
//! [`StoreConnection`] over the async `zookeeper-client` crate.
//!
//! ## Session State Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  zookeeper-client SessionState         ConnectionState                 │
//! │  ─────────────────────────────         ───────────────                 │
//! │  SyncConnected / ConnectedReadOnly  →  Connected                       │
//! │  Disconnected                       →  Suspended                       │
//! │  Expired / AuthFailed / Closed      →  Lost (watcher stops)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zkconf_core::NodePath;
use zookeeper_client as zk;

use crate::connection::{ConnectionState, StoreConnection};
use crate::error::{StoreError, StoreResult};

const STATE_CHANNEL_CAPACITY: usize = 16;

/// ZooKeeper-backed store connection.
pub struct ZkStore {
    client: Mutex<Option<zk::Client>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<ConnectionState>,
}

impl ZkStore {
    /// Creates a disconnected store. Call [`StoreConnection::connect`] next.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        ZkStore {
            client: Mutex::new(None),
            watcher: Mutex::new(None),
            events,
        }
    }

    /// Returns a handle to the live client.
    fn client(&self) -> StoreResult<zk::Client> {
        self.client
            .lock()
            .map_err(|_| StoreError::Internal("client lock poisoned".into()))?
            .clone()
            .ok_or_else(|| StoreError::ConnectionLoss("not connected".into()))
    }

    fn is_connected(&self) -> bool {
        self.client.lock().map(|c| c.is_some()).unwrap_or(false)
    }

    /// Creates `path` with `data`, treating NodeExists as success when
    /// `tolerate_existing` is set.
    async fn create_node(
        client: &zk::Client,
        path: &NodePath,
        data: &[u8],
        tolerate_existing: bool,
    ) -> StoreResult<()> {
        let options = zk::CreateMode::Persistent.with_acls(zk::Acls::anyone_all());
        match client.create(path.as_str(), data, &options).await {
            Ok(_) => Ok(()),
            Err(zk::Error::NodeExists) if tolerate_existing => Ok(()),
            Err(err) => Err(map_error(path, err)),
        }
    }

    async fn create_ancestors(client: &zk::Client, path: &NodePath) -> StoreResult<()> {
        let chain = path.ancestors_and_self();
        for ancestor in chain.iter().take(chain.len().saturating_sub(1)) {
            Self::create_node(client, ancestor, &[], true).await?;
        }
        Ok(())
    }
}

impl Default for ZkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ZkStore {
    fn drop(&mut self) {
        if let Ok(mut watcher) = self.watcher.lock() {
            if let Some(handle) = watcher.take() {
                handle.abort();
            }
        }
    }
}

fn map_error(path: &NodePath, err: zk::Error) -> StoreError {
    match err {
        zk::Error::NoNode => StoreError::no_node(path.as_str()),
        zk::Error::NodeExists => StoreError::node_exists(path.as_str()),
        zk::Error::ConnectionLoss | zk::Error::SessionExpired | zk::Error::ClientClosed => {
            StoreError::ConnectionLoss(err.to_string())
        }
        other => StoreError::Internal(other.to_string()),
    }
}

fn map_state(state: zk::SessionState) -> ConnectionState {
    match state {
        zk::SessionState::SyncConnected | zk::SessionState::ConnectedReadOnly => {
            ConnectionState::Connected
        }
        zk::SessionState::Disconnected => ConnectionState::Suspended,
        _ => ConnectionState::Lost,
    }
}

impl StoreConnection for ZkStore {
    async fn connect(&self, address: &str, port: u16) -> StoreResult<()> {
        if self.is_connected() {
            debug!(%address, port, "Already connected, ignoring connect");
            return Ok(());
        }

        let cluster = format!("{}:{}", address, port);
        info!(%cluster, "Connecting to ZooKeeper");

        let client = zk::Client::connect(&cluster)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let mut state_watcher = client.state_watcher();
        let events = self.events.clone();
        let watcher = tokio::spawn(async move {
            loop {
                let state = state_watcher.changed().await;
                let mapped = map_state(state);
                let _ = events.send(mapped);
                if mapped == ConnectionState::Lost {
                    debug!(?state, "ZooKeeper session terminated, watcher stopping");
                    break;
                }
            }
        });

        let mut slot = self
            .client
            .lock()
            .map_err(|_| StoreError::Internal("client lock poisoned".into()))?;
        if slot.is_some() {
            // Lost a connect race; keep the first session.
            watcher.abort();
            return Ok(());
        }
        *slot = Some(client);
        drop(slot);

        if let Ok(mut handle) = self.watcher.lock() {
            *handle = Some(watcher);
        }

        let _ = self.events.send(ConnectionState::Connected);
        info!(%cluster, "ZooKeeper session established");
        Ok(())
    }

    async fn disconnect(&self) -> StoreResult<()> {
        let client = self
            .client
            .lock()
            .map_err(|_| StoreError::Internal("client lock poisoned".into()))?
            .take();

        if client.is_none() {
            return Ok(());
        }
        drop(client);

        if let Ok(mut watcher) = self.watcher.lock() {
            if let Some(handle) = watcher.take() {
                handle.abort();
            }
        }

        let _ = self.events.send(ConnectionState::Lost);
        info!("ZooKeeper session closed");
        Ok(())
    }

    async fn ensure_path(&self, path: &NodePath) -> StoreResult<()> {
        let client = self.client()?;
        Self::create_ancestors(&client, path).await?;
        Self::create_node(&client, path, &[], true).await
    }

    async fn list_children(&self, path: &NodePath) -> StoreResult<Option<Vec<String>>> {
        let client = self.client()?;
        match client.list_children(path.as_str()).await {
            Ok(children) => Ok(Some(children)),
            Err(zk::Error::NoNode) => Ok(None),
            Err(err) => Err(map_error(path, err)),
        }
    }

    async fn read(&self, path: &NodePath) -> StoreResult<Option<Vec<u8>>> {
        let client = self.client()?;
        match client.get_data(path.as_str()).await {
            Ok((data, _stat)) => Ok(Some(data)),
            Err(zk::Error::NoNode) => Ok(None),
            Err(err) => Err(map_error(path, err)),
        }
    }

    async fn create(&self, path: &NodePath, data: &[u8]) -> StoreResult<()> {
        let client = self.client()?;
        Self::create_ancestors(&client, path).await?;
        Self::create_node(&client, path, data, false).await
    }

    async fn update(&self, path: &NodePath, data: &[u8]) -> StoreResult<()> {
        let client = self.client()?;
        client
            .set_data(path.as_str(), data, None)
            .await
            .map(|_| ())
            .map_err(|err| map_error(path, err))
    }

    async fn delete_recursive(&self, path: &NodePath) -> StoreResult<()> {
        if path.is_root() {
            return Err(StoreError::InvalidOperation {
                path: path.to_string(),
                reason: "the root node cannot be deleted".into(),
            });
        }

        let client = self.client()?;

        // Breadth-first walk, then delete deepest first.
        let mut subtree = vec![path.clone()];
        let mut cursor = 0;
        while cursor < subtree.len() {
            let current = subtree[cursor].clone();
            cursor += 1;
            match client.list_children(current.as_str()).await {
                Ok(children) => {
                    for child in children {
                        match current.join(&child) {
                            Ok(child_path) => subtree.push(child_path),
                            Err(e) => warn!(error = %e, "Skipping unaddressable child"),
                        }
                    }
                }
                Err(zk::Error::NoNode) if cursor > 1 => {}
                Err(err) => return Err(map_error(&current, err)),
            }
        }

        for node in subtree.iter().rev() {
            match client.delete(node.as_str(), None).await {
                Ok(()) => {}
                // A descendant vanished underneath us
                Err(zk::Error::NoNode) if node != path => {}
                Err(err) => return Err(map_error(node, err)),
            }
        }

        debug!(path = %path, nodes = subtree.len(), "Deleted subtree");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionState> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_mapping() {
        assert_eq!(map_state(zk::SessionState::SyncConnected), ConnectionState::Connected);
        assert_eq!(map_state(zk::SessionState::Disconnected), ConnectionState::Suspended);
        assert_eq!(map_state(zk::SessionState::Expired), ConnectionState::Lost);
    }

    #[test]
    fn test_error_mapping() {
        let path = NodePath::parse("/a").unwrap();
        assert!(map_error(&path, zk::Error::NoNode).is_not_found());
        assert!(matches!(
            map_error(&path, zk::Error::NodeExists),
            StoreError::NodeExists { .. }
        ));
        assert!(map_error(&path, zk::Error::ConnectionLoss).is_connection_error());
    }

    #[tokio::test]
    async fn test_operations_before_connect_fail() {
        let store = ZkStore::new();
        let err = store.read(&NodePath::parse("/a").unwrap()).await.unwrap_err();
        assert!(err.is_connection_error());
    }
}
