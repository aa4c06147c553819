//! Write operations for the topology graph.
//!
//! Nodes use MERGE-style upsert: an existing node keeps its type and name and
//! has its properties merged key-by-key. Edges are first-write-wins: an
//! upsert of an existing edge id changes nothing.

use infragraph_core::{Edge, Node};

use crate::store::{GraphStore, Result, StoreError};

impl GraphStore {
    // ── Node Upserts ─────────────────────────────────────────────

    /// Insert a node, or merge its properties into the stored node with the same id.
    pub fn upsert_node(&self, node: &Node) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(existing) = inner.nodes.get_mut(&node.id) {
            existing.merge_properties(&node.properties);
            tracing::debug!(id = %node.id, keys = node.properties.len(), "Merged node properties");
            return Ok(());
        }

        inner.nodes.insert(node.id.clone(), node.clone());
        tracing::debug!(id = %node.id, "Inserted node");
        Ok(())
    }

    /// Upsert a batch of nodes in order.
    pub fn upsert_nodes(&self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            self.upsert_node(node)?;
        }
        Ok(())
    }

    // ── Edge Upserts ─────────────────────────────────────────────

    /// Insert an edge unless one with the same id already exists.
    ///
    /// Returns `true` if the edge was inserted. Both endpoints must already
    /// be stored.
    pub fn upsert_edge(&self, edge: &Edge) -> Result<bool> {
        let mut inner = self.write()?;
        if inner.edges.contains_key(&edge.id) {
            return Ok(false);
        }

        for endpoint in [&edge.source, &edge.target] {
            if !inner.nodes.contains_key(endpoint) {
                return Err(StoreError::MissingEndpoint {
                    edge_id: edge.id.clone(),
                    missing: endpoint.clone(),
                });
            }
        }

        inner
            .outgoing
            .entry(edge.source.clone())
            .or_default()
            .insert(edge.id.clone());
        inner
            .incoming
            .entry(edge.target.clone())
            .or_default()
            .insert(edge.id.clone());
        inner.edges.insert(edge.id.clone(), edge.clone());
        Ok(true)
    }

    // ── Deletes ──────────────────────────────────────────────────

    /// Remove a node and every edge touching it. Returns whether it existed.
    pub fn delete_node(&self, id: &str) -> Result<bool> {
        let mut inner = self.write()?;
        if inner.nodes.remove(id).is_none() {
            return Ok(false);
        }

        let mut touching: Vec<String> = Vec::new();
        if let Some(ids) = inner.outgoing.remove(id) {
            touching.extend(ids);
        }
        if let Some(ids) = inner.incoming.remove(id) {
            touching.extend(ids);
        }

        for edge_id in touching {
            if let Some(edge) = inner.edges.remove(&edge_id) {
                if let Some(ids) = inner.outgoing.get_mut(&edge.source) {
                    ids.remove(&edge_id);
                }
                if let Some(ids) = inner.incoming.get_mut(&edge.target) {
                    ids.remove(&edge_id);
                }
            }
        }

        tracing::debug!(id, "Deleted node");
        Ok(true)
    }

    /// Remove everything. A loaded store returns to `Connected`.
    pub fn clear(&self) -> Result<()> {
        let mut inner = self.write()?;
        inner.nodes.clear();
        inner.edges.clear();
        inner.outgoing.clear();
        inner.incoming.clear();
        inner.state = crate::StoreState::Connected;
        tracing::info!(store = %self.name(), "Graph store cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use infragraph_core::{EdgeType, NodeType};

    use super::*;

    fn connected() -> GraphStore {
        let store = GraphStore::default();
        store.connect().unwrap();
        store
    }

    fn calls(from: &str, to: &str) -> Edge {
        Edge::between(EdgeType::Calls, NodeType::Service, from, NodeType::Service, to)
    }

    #[test]
    fn test_upsert_node_twice_is_idempotent() {
        let store = connected();
        let node = Node::new(NodeType::Service, "api").with_property("port", 8080i64);

        store.upsert_node(&node).unwrap();
        store.upsert_node(&node).unwrap();

        assert_eq!(store.node_count().unwrap(), 1);
        assert_eq!(store.get_node("service:api").unwrap(), Some(node));
    }

    #[test]
    fn test_partial_upsert_preserves_properties() {
        let store = connected();
        store
            .upsert_node(
                &Node::new(NodeType::Service, "api")
                    .with_property("team", "platform")
                    .with_property("port", 8080i64),
            )
            .unwrap();
        store
            .upsert_node(&Node::new(NodeType::Service, "api").with_property("k8s_replicas", 3i64))
            .unwrap();

        let node = store.get_node("service:api").unwrap().unwrap();
        assert_eq!(node.properties.len(), 3);
        assert_eq!(node.property("team").and_then(|v| v.as_str()), Some("platform"));
        assert_eq!(node.property("k8s_replicas").and_then(|v| v.as_i64()), Some(3));
    }

    #[test]
    fn test_upsert_edge_first_write_wins() {
        let store = connected();
        store.upsert_node(&Node::new(NodeType::Service, "a")).unwrap();
        store.upsert_node(&Node::new(NodeType::Service, "b")).unwrap();

        let first = calls("a", "b").with_property("via", "compose");
        let second = calls("a", "b").with_property("via", "k8s_env");

        assert!(store.upsert_edge(&first).unwrap());
        assert!(!store.upsert_edge(&second).unwrap());

        let edges = store.list_edges().unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].properties["via"].as_str(), Some("compose"));
    }

    #[test]
    fn test_upsert_edge_rejects_missing_endpoint() {
        let store = connected();
        store.upsert_node(&Node::new(NodeType::Service, "a")).unwrap();

        let err = store.upsert_edge(&calls("a", "ghost")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::MissingEndpoint { ref missing, .. } if missing == "service:ghost"
        ));
        assert_eq!(store.edge_count().unwrap(), 0);
    }

    #[test]
    fn test_delete_node_removes_touching_edges() {
        let store = connected();
        for name in ["a", "b", "c"] {
            store.upsert_node(&Node::new(NodeType::Service, name)).unwrap();
        }
        store.upsert_edge(&calls("a", "b")).unwrap();
        store.upsert_edge(&calls("b", "c")).unwrap();
        store.upsert_edge(&calls("a", "c")).unwrap();

        assert!(store.delete_node("service:b").unwrap());
        assert!(!store.delete_node("service:b").unwrap());

        let edges = store.list_edges().unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].id, "edge:a-calls-c");
        assert!(store.outgoing_edges("service:a").unwrap().len() == 1);
        assert!(store.incoming_edges("service:c").unwrap().len() == 1);
    }

    #[test]
    fn test_clear_resets_to_connected() {
        let store = connected();
        store.upsert_node(&Node::new(NodeType::Team, "core")).unwrap();
        store.mark_loaded().unwrap();

        store.clear().unwrap();
        assert_eq!(store.node_count().unwrap(), 0);
        assert_eq!(store.state(), crate::StoreState::Connected);
    }

    #[test]
    fn test_writes_fail_when_closed() {
        let store = connected();
        store.close();
        let err = store.upsert_node(&Node::new(NodeType::Service, "a")).unwrap_err();
        assert!(matches!(err, StoreError::NotConnected { .. }));
    }
}
