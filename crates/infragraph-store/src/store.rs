//! Store lifecycle and the shared in-memory graph handle.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::Serialize;

use infragraph_core::config::StoreConfig;
use infragraph_core::{Edge, Node};

/// Errors from graph store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store is not connected (state: {state:?})")]
    NotConnected { state: StoreState },

    #[error("Edge {edge_id} references missing node {missing}")]
    MissingEndpoint { edge_id: String, missing: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Lifecycle of a store instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    Uninitialized,
    Connected,
    Loaded,
    Closed,
}

impl StoreState {
    /// Whether data operations are permitted in this state.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Connected | Self::Loaded)
    }
}

/// Nodes and edges plus adjacency indexes, guarded by one lock.
#[derive(Debug)]
pub(crate) struct StoreInner {
    pub(crate) state: StoreState,
    pub(crate) nodes: BTreeMap<String, Node>,
    pub(crate) edges: BTreeMap<String, Edge>,
    /// node id → ids of edges leaving it
    pub(crate) outgoing: HashMap<String, BTreeSet<String>>,
    /// node id → ids of edges entering it
    pub(crate) incoming: HashMap<String, BTreeSet<String>>,
}

impl StoreInner {
    fn new() -> Self {
        Self {
            state: StoreState::Uninitialized,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
        }
    }
}

/// Thread-safe in-memory property graph.
///
/// This is the single point of access for all topology graph reads and
/// writes. Share it as `Arc<GraphStore>`; every method takes `&self`.
#[derive(Debug)]
pub struct GraphStore {
    config: StoreConfig,
    inner: RwLock<StoreInner>,
}

impl GraphStore {
    /// Create an unconnected store.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(StoreInner::new()),
        }
    }

    /// Create a store and connect it in one step.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let store = Self::new(config);
        store.connect()?;
        Ok(store)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn state(&self) -> StoreState {
        self.inner.read().state
    }

    /// Move to `Connected`. Already-open stores are left as they are.
    pub fn connect(&self) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.state.is_open() {
            inner.state = StoreState::Connected;
            tracing::info!(store = %self.config.name, "Graph store connected");
        }
        Ok(())
    }

    /// Move to `Closed`. Data is retained until an explicit clear.
    pub fn close(&self) {
        let mut inner = self.inner.write();
        inner.state = StoreState::Closed;
        tracing::info!(store = %self.config.name, "Graph store closed");
    }

    /// Mark the end of a load pass.
    pub fn mark_loaded(&self) -> Result<()> {
        let mut inner = self.write()?;
        inner.state = StoreState::Loaded;
        Ok(())
    }

    /// Acquire a read guard, failing if the store is not open.
    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, StoreInner>> {
        let inner = self.inner.read();
        if !inner.state.is_open() {
            return Err(StoreError::NotConnected { state: inner.state });
        }
        Ok(inner)
    }

    /// Acquire a write guard, failing if the store is not open.
    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, StoreInner>> {
        let inner = self.inner.write();
        if !inner.state.is_open() {
            return Err(StoreError::NotConnected { state: inner.state });
        }
        Ok(inner)
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let store = GraphStore::default();
        assert_eq!(store.state(), StoreState::Uninitialized);

        store.connect().unwrap();
        assert_eq!(store.state(), StoreState::Connected);

        store.mark_loaded().unwrap();
        assert_eq!(store.state(), StoreState::Loaded);

        // Connecting an open store does not reset it.
        store.connect().unwrap();
        assert_eq!(store.state(), StoreState::Loaded);

        store.close();
        assert_eq!(store.state(), StoreState::Closed);
    }

    #[test]
    fn test_operations_require_connection() {
        let store = GraphStore::default();
        assert!(matches!(
            store.mark_loaded(),
            Err(StoreError::NotConnected {
                state: StoreState::Uninitialized
            })
        ));

        store.connect().unwrap();
        store.close();
        assert!(matches!(
            store.read(),
            Err(StoreError::NotConnected {
                state: StoreState::Closed
            })
        ));
    }
}
