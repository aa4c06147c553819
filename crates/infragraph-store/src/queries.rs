//! Read operations for the topology graph.
//!
//! All list results are ordered by id so callers see stable output.

use std::collections::BTreeMap;

use infragraph_core::{Edge, Node, NodeType, Properties};

use crate::store::{GraphStore, Result, StoreInner};

impl GraphStore {
    // ── Single Node Lookups ──────────────────────────────────────

    /// Exact id lookup.
    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        Ok(self.read()?.nodes.get(id).cloned())
    }

    pub fn contains_node(&self, id: &str) -> Result<bool> {
        Ok(self.read()?.nodes.contains_key(id))
    }

    /// All nodes with exactly this name, regardless of type.
    pub fn find_nodes_by_name(&self, name: &str) -> Result<Vec<Node>> {
        let inner = self.read()?;
        Ok(inner
            .nodes
            .values()
            .filter(|n| n.name == name)
            .cloned()
            .collect())
    }

    // ── List Queries ─────────────────────────────────────────────

    /// Nodes narrowed by type and by exact property values (logical AND).
    pub fn get_nodes(
        &self,
        node_type: Option<NodeType>,
        filters: Option<&Properties>,
    ) -> Result<Vec<Node>> {
        let inner = self.read()?;
        Ok(inner
            .nodes
            .values()
            .filter(|n| node_type.map_or(true, |t| n.node_type == t))
            .filter(|n| filters.map_or(true, |f| matches_filters(n, f)))
            .cloned()
            .collect())
    }

    pub fn list_edges(&self) -> Result<Vec<Edge>> {
        Ok(self.read()?.edges.values().cloned().collect())
    }

    pub fn node_count(&self) -> Result<usize> {
        Ok(self.read()?.nodes.len())
    }

    pub fn edge_count(&self) -> Result<usize> {
        Ok(self.read()?.edges.len())
    }

    /// Node counts per type. Types with no nodes are omitted.
    pub fn count_by_type(&self) -> Result<BTreeMap<NodeType, usize>> {
        let inner = self.read()?;
        let mut counts = BTreeMap::new();
        for node in inner.nodes.values() {
            *counts.entry(node.node_type).or_insert(0) += 1;
        }
        Ok(counts)
    }

    // ── Neighbor Queries ─────────────────────────────────────────

    /// Edges leaving `id`, ordered by edge id.
    pub fn outgoing_edges(&self, id: &str) -> Result<Vec<Edge>> {
        let inner = self.read()?;
        Ok(collect_edges(&inner, inner.outgoing.get(id)))
    }

    /// Edges entering `id`, ordered by edge id.
    pub fn incoming_edges(&self, id: &str) -> Result<Vec<Edge>> {
        let inner = self.read()?;
        Ok(collect_edges(&inner, inner.incoming.get(id)))
    }
}

fn collect_edges(
    inner: &StoreInner,
    ids: Option<&std::collections::BTreeSet<String>>,
) -> Vec<Edge> {
    ids.into_iter()
        .flatten()
        .filter_map(|edge_id| inner.edges.get(edge_id).cloned())
        .collect()
}

fn matches_filters(node: &Node, filters: &Properties) -> bool {
    filters
        .iter()
        .all(|(key, expected)| node.properties.get(key) == Some(expected))
}
