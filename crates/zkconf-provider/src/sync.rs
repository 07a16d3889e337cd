//! # Tree Sync
//!
//! Moves configuration trees between the store and [`Configuration`] values.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fetch(name)                                                            │
//! │    path = {root}/{shard(name)}/{name}                                  │
//! │    fetch_node(path) ──► Record ──► Configuration (+ provider data)     │
//! │                                                                         │
//! │  register(parent, sub, name)                                           │
//! │    path = {root}/{shard(parent)}/{parent}/{name}                       │
//! │    create, or update if the node exists                                │
//! │                                                                         │
//! │  save(config)    path = provider data, else top-level rule; update     │
//! │  remove(config)  path = provider data, else top-level rule; delete -r  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Absence
//! - fetch of a missing node yields an empty configuration
//! - save and remove of a missing node fail with `NoNode`
//!
//! Nothing is cached and nothing is retried: each call is a fresh round-trip
//! against the session's store.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;
use zkconf_core::{payload, Configuration, NodePath, ProviderData, Record};
use zkconf_store::StoreConnection;

use crate::error::ProviderResult;
use crate::session::StoreSession;

/// Store-backed read/write of configuration trees.
pub struct TreeSync<S: StoreConnection> {
    session: Arc<StoreSession<S>>,
}

impl<S: StoreConnection> TreeSync<S> {
    pub fn new(session: Arc<StoreSession<S>>) -> Self {
        TreeSync { session }
    }

    /// Returns the session this sync operates on.
    pub fn session(&self) -> &Arc<StoreSession<S>> {
        &self.session
    }

    // =========================================================================
    // Paths
    // =========================================================================

    /// `{root}/{shard(name)}/{name}`
    pub fn top_level_path(&self, name: &str) -> ProviderResult<NodePath> {
        Ok(self
            .session
            .root()
            .top_level(self.session.mappings(), name)?)
    }

    /// `{root}/{shard(parent)}/{parent}/{sub}`
    pub fn registered_path(&self, parent: &str, sub: &str) -> ProviderResult<NodePath> {
        Ok(self
            .session
            .root()
            .registered(self.session.mappings(), parent, sub)?)
    }

    /// The path a configuration is written to or removed from: its provider
    /// data when present, else the top-level path for its name.
    pub fn resolve_path(&self, config: &Configuration) -> ProviderResult<NodePath> {
        match config.provider_data() {
            Some(data) => Ok(data.path.clone()),
            None => self.top_level_path(config.name()),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Reads one node: a container if it has children, a leaf otherwise.
    ///
    /// Children of a container are read as leaves; grandchildren are not
    /// visited.
    pub async fn fetch_node(&self, path: &NodePath) -> ProviderResult<Record> {
        let store = self.session.store();
        let children = store.list_children(path).await?.unwrap_or_default();

        if children.is_empty() {
            let attributes = self.read_leaf(path).await?;
            debug!(path = %path, keys = attributes.len(), "Fetched leaf");
            return Ok(Record::Leaf {
                path: path.clone(),
                attributes,
            });
        }

        let mut records = Vec::with_capacity(children.len());
        for child in children {
            let child_path = path.join(&child)?;
            let attributes = self.read_leaf(&child_path).await?;
            records.push((
                child,
                Record::Leaf {
                    path: child_path,
                    attributes,
                },
            ));
        }

        debug!(path = %path, children = records.len(), "Fetched container");
        Ok(Record::Container {
            path: path.clone(),
            children: records,
        })
    }

    /// Reads and decodes a single payload. A missing node reads as empty.
    pub async fn read_leaf(&self, path: &NodePath) -> ProviderResult<Map<String, Value>> {
        let bytes = self.session.store().read(path).await?;
        Ok(payload::decode(path.as_str(), bytes.as_deref())?)
    }

    /// Fetches the top-level configuration `name`.
    pub async fn fetch(&self, name: &str, substitute: bool) -> ProviderResult<Configuration> {
        let path = self.top_level_path(name)?;
        let record = self.fetch_node(&path).await?;
        debug!(
            name,
            path = %record.path(),
            container = record.is_container(),
            "Fetched configuration"
        );
        Ok(record.into_configuration(name, substitute))
    }

    /// Fetches whatever lives at `path`, named after its last segment.
    pub async fn fetch_at(&self, path: &NodePath, substitute: bool) -> ProviderResult<Configuration> {
        let name = path.name().unwrap_or_default().to_string();
        let record = self.fetch_node(path).await?;
        Ok(record.into_configuration(&name, substitute))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Stores `sub` under `parent` as `name`, overwriting any existing node.
    ///
    /// `sub` is tagged with its new path, so a later `save` or `remove`
    /// targets the registered node.
    pub async fn register(
        &self,
        parent: &Configuration,
        sub: &mut Configuration,
        name: &str,
    ) -> ProviderResult<()> {
        let path = self.registered_path(parent.name(), name)?;
        sub.set_provider_data(ProviderData::leaf(path.clone()));

        let data = payload::encode(sub)?;
        self.session.store().create_or_update(&path, &data).await?;

        debug!(path = %path, bytes = data.len(), "Registered configuration");
        Ok(())
    }

    /// Overwrites the payload of an existing node.
    pub async fn save(&self, config: &Configuration) -> ProviderResult<()> {
        let path = self.resolve_path(config)?;
        let data = payload::encode(config)?;
        self.session.store().update(&path, &data).await?;

        debug!(path = %path, bytes = data.len(), "Saved configuration");
        Ok(())
    }

    /// Deletes the node and everything below it.
    pub async fn remove(&self, config: &Configuration) -> ProviderResult<()> {
        let path = self.resolve_path(config)?;
        self.session.store().delete_recursive(&path).await?;

        debug!(path = %path, "Removed configuration");
        Ok(())
    }
}
