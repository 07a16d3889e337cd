//! # Configuration Provider
//!
//! The load/save interface host applications call. [`ConfigurationProvider`]
//! is the seam; [`StoreConfigurationProvider`] implements it over a
//! [`StoreSession`] via [`TreeSync`].
//!
//! ## Construction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  static SESSION: SharedSession<ZkStore> = SharedSession::new();        │
//! │                                                                         │
//! │  provider A ──┐                                                         │
//! │               ├──► SESSION.get_or_open(..) ──► one StoreSession        │
//! │  provider B ──┘         (connects once)                                 │
//! │                                                                         │
//! │  on shutdown: SESSION.shutdown().await                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;
use tracing::debug;
use zkconf_core::Configuration;
use zkconf_store::StoreConnection;

use crate::config::ProviderSettings;
use crate::error::ProviderResult;
use crate::session::{NoOpListener, SessionListener, SharedSession, StoreSession};
use crate::sync::TreeSync;

// =============================================================================
// Provider Trait
// =============================================================================

/// Loads and persists named configurations.
pub trait ConfigurationProvider: Send + Sync {
    /// Loads the configuration `name`. Missing data yields an empty
    /// configuration, not an error.
    fn fetch(
        &self,
        name: &str,
        substitute: bool,
    ) -> impl Future<Output = ProviderResult<Configuration>> + Send;

    /// Stores `sub` as `name` beneath `parent`, creating or overwriting it.
    fn register(
        &self,
        parent: &Configuration,
        sub: &mut Configuration,
        name: &str,
    ) -> impl Future<Output = ProviderResult<()>> + Send;

    /// Persists an existing configuration.
    fn save(&self, config: &Configuration) -> impl Future<Output = ProviderResult<()>> + Send;

    /// Deletes a configuration and everything beneath it.
    fn remove(&self, config: &Configuration) -> impl Future<Output = ProviderResult<()>> + Send;
}

// =============================================================================
// Store-Backed Provider
// =============================================================================

/// Provider backed by the process-wide store session.
pub struct StoreConfigurationProvider<S: StoreConnection> {
    tree: TreeSync<S>,
}

impl<S: StoreConnection> StoreConfigurationProvider<S> {
    /// Creates a provider, opening the shared session if this is the first.
    pub async fn new<F>(
        shared: &SharedSession<S>,
        settings: &ProviderSettings,
        make_store: F,
    ) -> ProviderResult<Self>
    where
        F: FnOnce() -> S,
    {
        Self::with_listener(shared, settings, Arc::new(NoOpListener), make_store).await
    }

    /// Like [`new`](Self::new), with a listener for session state changes.
    /// The listener only takes effect if this call opens the session.
    pub async fn with_listener<F>(
        shared: &SharedSession<S>,
        settings: &ProviderSettings,
        listener: Arc<dyn SessionListener>,
        make_store: F,
    ) -> ProviderResult<Self>
    where
        F: FnOnce() -> S,
    {
        let session = shared.get_or_open(settings, listener, make_store).await?;
        debug!(session_id = %session.id(), "Configuration provider ready");
        Ok(Self::with_session(session))
    }

    /// Creates a provider over an already-open session.
    pub fn with_session(session: Arc<StoreSession<S>>) -> Self {
        StoreConfigurationProvider {
            tree: TreeSync::new(session),
        }
    }

    pub fn session(&self) -> &Arc<StoreSession<S>> {
        self.tree.session()
    }

    /// Path-level access for callers that address nodes directly.
    pub fn tree(&self) -> &TreeSync<S> {
        &self.tree
    }
}

impl<S: StoreConnection> ConfigurationProvider for StoreConfigurationProvider<S> {
    async fn fetch(&self, name: &str, substitute: bool) -> ProviderResult<Configuration> {
        self.tree.fetch(name, substitute).await
    }

    async fn register(
        &self,
        parent: &Configuration,
        sub: &mut Configuration,
        name: &str,
    ) -> ProviderResult<()> {
        self.tree.register(parent, sub, name).await
    }

    async fn save(&self, config: &Configuration) -> ProviderResult<()> {
        self.tree.save(config).await
    }

    async fn remove(&self, config: &Configuration) -> ProviderResult<()> {
        self.tree.remove(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MappingsSetting;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use uuid::Uuid;
    use zkconf_core::NodePath;
    use zkconf_store::{ConnectionState, MemoryStore};

    struct ChannelListener(mpsc::UnboundedSender<ConnectionState>);

    impl SessionListener for ChannelListener {
        fn on_state_change(&self, _session_id: Uuid, state: ConnectionState) {
            let _ = self.0.send(state);
        }
    }

    fn settings(mappings: &str) -> ProviderSettings {
        ProviderSettings {
            root_path: "/root".into(),
            mappings: MappingsSetting::Json(mappings.into()),
            ..Default::default()
        }
    }

    /// Generic caller, as a host application would write it.
    async fn copy_setting<P: ConfigurationProvider>(
        provider: &P,
        from: &str,
        to: &str,
        key: &str,
    ) -> ProviderResult<()> {
        let source = provider.fetch(from, true).await?;
        let mut target = provider.fetch(to, true).await?;
        if let Some(value) = source.get(key) {
            target.set(key, value.clone());
        }
        provider.save(&target).await
    }

    #[tokio::test]
    async fn test_providers_share_one_connection() {
        let shared: SharedSession<MemoryStore> = SharedSession::new();
        let store = MemoryStore::new();

        let first = StoreConfigurationProvider::new(
            &shared,
            &settings(r#"{"default": "B"}"#),
            || store.clone(),
        )
        .await
        .unwrap();
        let second = StoreConfigurationProvider::new(
            &shared,
            &settings(r#"{"default": "Z"}"#),
            || store.clone(),
        )
        .await
        .unwrap();

        assert_eq!(store.connect_count(), 1);
        assert!(Arc::ptr_eq(first.session(), second.session()));
        assert_eq!(
            second.tree().top_level_path("blocks").unwrap().as_str(),
            "/root/B/blocks"
        );
    }

    #[tokio::test]
    async fn test_listener_from_first_provider_only() {
        let shared: SharedSession<MemoryStore> = SharedSession::new();
        let store = MemoryStore::new();
        let (first_tx, mut first_rx) = mpsc::unbounded_channel();
        let (second_tx, mut second_rx) = mpsc::unbounded_channel();

        let _first = StoreConfigurationProvider::with_listener(
            &shared,
            &settings(r#"{"default": "B"}"#),
            Arc::new(ChannelListener(first_tx)),
            || store.clone(),
        )
        .await
        .unwrap();
        let _second = StoreConfigurationProvider::with_listener(
            &shared,
            &settings(r#"{"default": "B"}"#),
            Arc::new(ChannelListener(second_tx)),
            || store.clone(),
        )
        .await
        .unwrap();

        let connected = tokio::time::timeout(Duration::from_secs(1), first_rx.recv())
            .await
            .unwrap();
        assert_eq!(connected, Some(ConnectionState::Connected));

        store.set_state(ConnectionState::Suspended);
        let suspended = tokio::time::timeout(Duration::from_secs(1), first_rx.recv())
            .await
            .unwrap();
        assert_eq!(suspended, Some(ConnectionState::Suspended));

        // The second listener was dropped unused, so its channel is closed.
        assert_eq!(second_rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_provider_operations() {
        let shared: SharedSession<MemoryStore> = SharedSession::new();
        let store = MemoryStore::new();
        let provider = StoreConfigurationProvider::new(
            &shared,
            &settings(r#"{"modules": "A", "default": "B"}"#),
            || store.clone(),
        )
        .await
        .unwrap();

        let parent = Configuration::new("blocks");
        let mut sub = Configuration::new("simulate");
        sub.set("x", json!(1));
        provider.register(&parent, &mut sub, "simulate").await.unwrap();

        let blocks = provider.fetch("blocks", true).await.unwrap();
        assert!(blocks.provider_data().unwrap().is_container);
        assert_eq!(blocks.child("simulate").unwrap().get("x"), Some(&json!(1)));

        sub.set("x", json!(2));
        provider.save(&sub).await.unwrap();
        let blocks = provider.fetch("blocks", true).await.unwrap();
        assert_eq!(blocks.child("simulate").unwrap().get("x"), Some(&json!(2)));

        provider.remove(&blocks).await.unwrap();
        assert!(provider.fetch("blocks", true).await.unwrap().is_empty());
        assert!(provider.remove(&blocks).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_generic_caller() {
        let store = MemoryStore::new();
        let session = StoreSession::open(
            store.clone(),
            &settings(r#"{"modules": "A", "default": "B"}"#),
            Arc::new(NoOpListener),
        )
        .await
        .unwrap();
        let provider = StoreConfigurationProvider::with_session(Arc::new(session));

        store
            .create(&NodePath::parse("/root/A/modules").unwrap(), br#"{"level":"debug"}"#)
            .await
            .unwrap();
        store
            .create(&NodePath::parse("/root/B/blocks").unwrap(), b"{}")
            .await
            .unwrap();

        copy_setting(&provider, "modules", "blocks", "level").await.unwrap();

        let blocks = provider.fetch("blocks", true).await.unwrap();
        assert_eq!(blocks.get("level"), Some(&json!("debug")));
    }
}
