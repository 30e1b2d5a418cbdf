//! Shared connections state.
//!
//! Process-wide store of the most recently persisted connections snapshot.
//! The workflow replaces the snapshot wholesale after a successful save; it is
//! never merged or partially updated. Readers either take a point-in-time
//! [`snapshot`](ConnectionsState::snapshot) or [`subscribe`](ConnectionsState::subscribe)
//! to observe replacements.

use crate::models::ConnectionConfig;

use parking_lot::RwLock;
use tokio::sync::watch;

/// Thread-safe holder of the persisted connections snapshot.
pub struct ConnectionsState {
    /// Latest persisted snapshot.
    connections: RwLock<Vec<ConnectionConfig>>,
    /// Broadcasts each replacement to subscribers.
    watch_tx: watch::Sender<Vec<ConnectionConfig>>,
}

impl ConnectionsState {
    /// Create an empty state.
    pub fn new() -> Self {
        let (watch_tx, _) = watch::channel(Vec::new());
        Self { connections: RwLock::new(Vec::new()), watch_tx }
    }

    /// Create a state pre-populated with a loaded snapshot.
    pub fn with_connections(connections: Vec<ConnectionConfig>) -> Self {
        let (watch_tx, _) = watch::channel(connections.clone());
        Self { connections: RwLock::new(connections), watch_tx }
    }

    /// Replace the snapshot wholesale and notify subscribers.
    pub fn replace(&self, connections: Vec<ConnectionConfig>) {
        tracing::debug!(count = connections.len(), "Replacing connections snapshot");
        *self.connections.write() = connections.clone();
        self.watch_tx.send_replace(connections);
    }

    /// Get a clone of the current snapshot.
    pub fn snapshot(&self) -> Vec<ConnectionConfig> {
        self.connections.read().clone()
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ConnectionConfig>> {
        self.watch_tx.subscribe()
    }

    /// Number of connections in the current snapshot.
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// Check if the current snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}

impl Default for ConnectionsState {
    fn default() -> Self {
        Self::new()
    }
}
