//! infragraph-query: read-only queries over the topology graph.
//!
//! The [`QueryEngine`] answers dependency, impact, path and ownership
//! questions against a loaded [`GraphStore`]. The [`intent`] module maps
//! structured intent objects onto engine operations, and [`context`] holds
//! the swappable store used by the CLI.

pub mod blast;
pub mod context;
pub mod error;
pub mod intent;
pub mod resolve;
pub mod traversal;
pub mod types;

pub use context::AppContext;
pub use error::QueryError;
pub use intent::{IntentKind, IntentRequest, IntentResult};
pub use traversal::Direction;
pub use types::{BlastRadiusResult, GraphSchema, GraphSnapshot, GraphStats};

use std::sync::Arc;

use infragraph_core::config::QueryConfig;
use infragraph_core::{EdgeType, Node, NodeType, Properties};
use infragraph_store::GraphStore;

use crate::error::{QueryError as Error, Result};

/// Side-effect-free query operations over one store snapshot.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<GraphStore>,
    config: QueryConfig,
}

impl QueryEngine {
    /// Create an engine with default traversal limits.
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self {
            store,
            config: QueryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    // ── Lookups ──────────────────────────────────────────────────

    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        Ok(self.store.get_node(id)?)
    }

    /// Like [`Self::get_node`], but absence is an error.
    pub fn require_node(&self, id: &str) -> Result<Node> {
        self.get_node(id)?
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    pub fn get_nodes(
        &self,
        node_type: Option<NodeType>,
        filters: Option<&Properties>,
    ) -> Result<Vec<Node>> {
        Ok(self.store.get_nodes(node_type, filters)?)
    }

    /// Case-insensitive substring match on name or id, in id order.
    pub fn search_nodes(&self, text: &str) -> Result<Vec<Node>> {
        let needle = text.to_lowercase();
        Ok(self
            .store
            .get_nodes(None, None)?
            .into_iter()
            .filter(|n| {
                n.name.to_lowercase().contains(&needle) || n.id.to_lowercase().contains(&needle)
            })
            .collect())
    }

    // ── Traversals ───────────────────────────────────────────────

    /// Everything `id` depends on, transitively.
    ///
    /// Defaults: `max_depth` from configuration, and the dependency edge
    /// types (`owns` is only followed when asked for).
    pub fn downstream(
        &self,
        id: &str,
        max_depth: Option<usize>,
        edge_types: Option<&[EdgeType]>,
    ) -> Result<Vec<Node>> {
        self.closure(id, Direction::Downstream, max_depth, edge_types)
    }

    /// Everything that depends on `id`, transitively.
    pub fn upstream(
        &self,
        id: &str,
        max_depth: Option<usize>,
        edge_types: Option<&[EdgeType]>,
    ) -> Result<Vec<Node>> {
        self.closure(id, Direction::Upstream, max_depth, edge_types)
    }

    fn closure(
        &self,
        id: &str,
        direction: Direction,
        max_depth: Option<usize>,
        edge_types: Option<&[EdgeType]>,
    ) -> Result<Vec<Node>> {
        self.require_node(id)?;
        traversal::closure(
            &self.store,
            id,
            direction,
            max_depth.unwrap_or(self.config.max_depth),
            edge_types.unwrap_or(&EdgeType::DEPENDENCIES),
        )
    }

    /// Shortest undirected path from `from` to `to`, both inclusive.
    pub fn path(&self, from: &str, to: &str) -> Result<Vec<Node>> {
        self.require_node(from)?;
        self.require_node(to)?;
        traversal::shortest_path(&self.store, from, to, self.config.max_path_hops)
    }

    // ── Ownership ────────────────────────────────────────────────

    /// The team owning `id`, if any.
    pub fn get_owner(&self, id: &str) -> Result<Option<Node>> {
        let mut owners = self.owners_of(id)?;
        match owners.len() {
            0 => Ok(None),
            1 => Ok(owners.pop()),
            _ => Err(Error::AmbiguousOwner {
                node_id: id.to_string(),
                owners: owners.into_iter().map(|t| t.id).collect(),
            }),
        }
    }

    /// Every team with an `owns` edge to `id`, in edge id order.
    pub(crate) fn owners_of(&self, id: &str) -> Result<Vec<Node>> {
        self.require_node(id)?;

        let mut owners: Vec<Node> = Vec::new();
        for edge in self.store.incoming_edges(id)? {
            if edge.edge_type != EdgeType::Owns || owners.iter().any(|t| t.id == edge.source) {
                continue;
            }
            if let Some(team) = self.store.get_node(&edge.source)? {
                if team.node_type == NodeType::Team {
                    owners.push(team);
                }
            }
        }
        Ok(owners)
    }

    /// Nodes owned by the team `team:<team_name>`.
    pub fn get_nodes_owned_by_team(&self, team_name: &str) -> Result<Vec<Node>> {
        let team_id = NodeType::Team.node_id(team_name);
        self.require_node(&team_id)?;

        let mut owned = Vec::new();
        for edge in self.store.outgoing_edges(&team_id)? {
            if edge.edge_type != EdgeType::Owns {
                continue;
            }
            owned.push(self.require_node(&edge.target)?);
        }
        Ok(owned)
    }

    // ── Whole-graph views ────────────────────────────────────────

    pub fn get_graph_stats(&self) -> Result<GraphStats> {
        let nodes_by_type = self
            .store
            .count_by_type()?
            .into_iter()
            .map(|(t, count)| (t.as_str().to_string(), count))
            .collect();
        Ok(GraphStats {
            total_nodes: self.store.node_count()?,
            total_edges: self.store.edge_count()?,
            nodes_by_type,
        })
    }

    pub fn graph_snapshot(&self) -> Result<GraphSnapshot> {
        Ok(GraphSnapshot {
            nodes: self.store.get_nodes(None, None)?,
            edges: self.store.list_edges()?,
        })
    }

    /// Statistics and node names per type.
    pub fn graph_schema(&self) -> Result<GraphSchema> {
        let names = |node_type| -> Result<Vec<String>> {
            Ok(self
                .get_nodes(Some(node_type), None)?
                .into_iter()
                .map(|n| n.name)
                .collect())
        };
        Ok(GraphSchema {
            statistics: self.get_graph_stats()?,
            services: names(NodeType::Service)?,
            databases: names(NodeType::Database)?,
            caches: names(NodeType::Cache)?,
            teams: names(NodeType::Team)?,
        })
    }
}
