//! # Store Session
//!
//! The one coordination-service session a process holds, plus the cell that
//! hands it out.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Session Lifecycle                                │
//! │                                                                         │
//! │  SharedSession::get_or_open (first caller only)                        │
//! │       │                                                                 │
//! │       ├── 1. validate settings, parse mappings (fail fast)             │
//! │       ├── 2. subscribe to state events                                 │
//! │       ├── 3. connect(ip_address, port)                                 │
//! │       ├── 4. spawn state monitor ──► SessionListener                   │
//! │       └── 5. ensure_path(root_path)                                    │
//! │                                                                         │
//! │  every later caller ──► same Arc<StoreSession>, settings ignored       │
//! │                                                                         │
//! │  SharedSession::shutdown ──► StoreSession::close (disconnect once)     │
//! │  drop(StoreSession)      ──► state monitor aborted                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A process that never calls [`SharedSession::shutdown`] releases its
//! store session only when it exits.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zkconf_core::{NodePath, ShardMappings};
use zkconf_store::{ConnectionState, StoreConnection};

use crate::config::ProviderSettings;
use crate::error::ProviderResult;

// =============================================================================
// Session Listener
// =============================================================================

/// Receives session state transitions (e.g. to surface them in a UI or
/// health endpoint).
pub trait SessionListener: Send + Sync {
    /// Called for every state transition the store reports.
    fn on_state_change(&self, session_id: Uuid, state: ConnectionState);
}

/// Listener that ignores every transition.
pub struct NoOpListener;

impl SessionListener for NoOpListener {
    fn on_state_change(&self, _session_id: Uuid, _state: ConnectionState) {}
}

// =============================================================================
// Store Session
// =============================================================================

/// An open store session with the settings it was opened with.
pub struct StoreSession<S: StoreConnection> {
    /// Session identifier (for logs).
    id: Uuid,

    /// The connected store.
    store: S,

    /// Root path every configuration lives under.
    root: NodePath,

    /// Mapping table fixed at open time.
    mappings: ShardMappings,

    /// When the session was opened.
    opened_at: DateTime<Utc>,

    /// State monitor task.
    monitor: Mutex<Option<JoinHandle<()>>>,

    /// Set once `close` has run.
    closed: AtomicBool,
}

impl<S: StoreConnection> StoreSession<S> {
    /// Connects `store` and prepares the root path.
    pub async fn open(
        store: S,
        settings: &ProviderSettings,
        listener: Arc<dyn SessionListener>,
    ) -> ProviderResult<Self> {
        settings.validate()?;
        let mappings = settings.mappings.parse()?;
        let root = settings.root()?;
        let id = Uuid::new_v4();

        info!(
            session_id = %id,
            endpoint = %settings.endpoint(),
            root = %root,
            mappings = mappings.len(),
            default_shard = %mappings.default_shard(),
            "Opening store session"
        );

        let events = store.subscribe();
        store.connect(&settings.ip_address, settings.port).await?;

        let monitor = tokio::spawn(Self::monitor_states(id, events, listener));

        let session = StoreSession {
            id,
            store,
            root,
            mappings,
            opened_at: Utc::now(),
            monitor: Mutex::new(Some(monitor)),
            closed: AtomicBool::new(false),
        };

        if let Err(e) = session.store.ensure_path(&session.root).await {
            warn!(session_id = %id, error = %e, "Failed to prepare root path");
            if let Err(close_err) = session.close().await {
                debug!(session_id = %id, error = %close_err, "Disconnect after failed open");
            }
            return Err(e.into());
        }

        info!(session_id = %id, opened_at = %session.opened_at, "Store session ready");
        Ok(session)
    }

    /// Logs state transitions and forwards them to the listener.
    async fn monitor_states(
        id: Uuid,
        mut events: broadcast::Receiver<ConnectionState>,
        listener: Arc<dyn SessionListener>,
    ) {
        loop {
            match events.recv().await {
                Ok(state) => {
                    match state {
                        ConnectionState::Connected => {
                            info!(session_id = %id, state = %state, "Store session state changed")
                        }
                        ConnectionState::Suspended | ConnectionState::Lost => {
                            warn!(session_id = %id, state = %state, "Store session state changed")
                        }
                    }
                    listener.on_state_change(id, state);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(session_id = %id, skipped, "Missed store state events");
                }
                Err(RecvError::Closed) => {
                    debug!(session_id = %id, "State channel closed");
                    break;
                }
            }
        }
    }

    /// Disconnects the store. Later calls are no-ops.
    pub async fn close(&self) -> ProviderResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        info!(session_id = %self.id, "Closing store session");
        let result = self.store.disconnect().await;
        self.stop_monitor();
        result.map_err(Into::into)
    }

    fn stop_monitor(&self) {
        if let Ok(mut monitor) = self.monitor.lock() {
            if let Some(handle) = monitor.take() {
                handle.abort();
            }
        }
    }

    /// Returns the session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the root path.
    pub fn root(&self) -> &NodePath {
        &self.root
    }

    /// Returns the mapping table.
    pub fn mappings(&self) -> &ShardMappings {
        &self.mappings
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl<S: StoreConnection> Drop for StoreSession<S> {
    fn drop(&mut self) {
        self.stop_monitor();
    }
}

impl<S: StoreConnection> std::fmt::Debug for StoreSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSession")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("mappings", &self.mappings)
            .field("opened_at", &self.opened_at)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Shared Session
// =============================================================================

/// Holds the process-wide session. Can live in a `static`.
///
/// ```ignore
/// static SESSION: SharedSession<ZkStore> = SharedSession::new();
/// ```
pub struct SharedSession<S: StoreConnection> {
    cell: OnceCell<Arc<StoreSession<S>>>,
}

impl<S: StoreConnection> SharedSession<S> {
    pub const fn new() -> Self {
        SharedSession {
            cell: OnceCell::const_new(),
        }
    }

    /// Returns the session, opening it on first use.
    ///
    /// Only the first successful call connects; concurrent callers wait for
    /// it and share the result. `settings` and `make_store` are ignored once
    /// a session exists. A failed open leaves the cell empty.
    pub async fn get_or_open<F>(
        &self,
        settings: &ProviderSettings,
        listener: Arc<dyn SessionListener>,
        make_store: F,
    ) -> ProviderResult<Arc<StoreSession<S>>>
    where
        F: FnOnce() -> S,
    {
        if let Some(session) = self.cell.get() {
            debug!(session_id = %session.id(), "Reusing store session");
            return Ok(Arc::clone(session));
        }

        self.cell
            .get_or_try_init(|| async move {
                StoreSession::open(make_store(), settings, listener)
                    .await
                    .map(Arc::new)
            })
            .await
            .map(Arc::clone)
    }

    /// Returns the session if one has been opened.
    pub fn get(&self) -> Option<Arc<StoreSession<S>>> {
        self.cell.get().cloned()
    }

    /// Closes the session, if any.
    pub async fn shutdown(&self) -> ProviderResult<()> {
        match self.cell.get() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}

impl<S: StoreConnection> Default for SharedSession<S> {
    fn default() -> Self {
        Self::new()
    }
}
