//! Application context: configuration plus the currently served store.
//!
//! Reloads build and load a fresh store, then swap it in. Engines created
//! before the swap keep answering from the store they were created with.

use std::sync::Arc;

use parking_lot::RwLock;

use infragraph_core::config::AppConfig;
use infragraph_core::LoadReport;
use infragraph_ingest::load_store;
use infragraph_store::GraphStore;

use crate::error::Result;
use crate::QueryEngine;

pub struct AppContext {
    config: AppConfig,
    store: RwLock<Arc<GraphStore>>,
}

impl AppContext {
    /// Load all configured sources into a new store.
    pub async fn bootstrap(config: AppConfig) -> Result<(Self, LoadReport)> {
        let (store, report) = load_store(&config).await?;
        let context = Self {
            config,
            store: RwLock::new(Arc::new(store)),
        };
        Ok((context, report))
    }

    /// The store currently being served.
    pub fn store(&self) -> Arc<GraphStore> {
        Arc::clone(&self.store.read())
    }

    /// A query engine over the current store.
    pub fn engine(&self) -> QueryEngine {
        QueryEngine::new(self.store()).with_config(self.config.query.clone())
    }

    /// Re-ingest every source into a new store and swap it in.
    ///
    /// On failure the current store stays in place.
    pub async fn reload(&self) -> Result<LoadReport> {
        let (store, report) = load_store(&self.config).await?;
        *self.store.write() = Arc::new(store);
        tracing::info!(
            load_id = %report.id.0,
            nodes = report.total_nodes,
            edges = report.total_edges,
            "Graph reloaded"
        );
        Ok(report)
    }
}
