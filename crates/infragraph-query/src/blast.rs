//! Blast radius computation.
//!
//! Combines the upstream and downstream closures of a node with the owners
//! of every node involved.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::types::BlastRadiusResult;
use crate::QueryEngine;

impl QueryEngine {
    /// Everything affected if `id` fails, and the teams that own it.
    pub fn blast_radius(&self, id: &str) -> Result<BlastRadiusResult> {
        let node = self.require_node(id)?;
        let upstream = self.upstream(id, None, None)?;
        let downstream = self.downstream(id, None, None)?;

        let affected: BTreeSet<&str> = std::iter::once(node.id.as_str())
            .chain(upstream.iter().map(|n| n.id.as_str()))
            .chain(downstream.iter().map(|n| n.id.as_str()))
            .collect();

        // Owners in discovery order: the node itself, then upstream, then downstream.
        // A node with several owners contributes all of them.
        let mut affected_teams = Vec::new();
        let mut seen_teams = BTreeSet::new();
        for member in std::iter::once(&node).chain(&upstream).chain(&downstream) {
            for team in self.owners_of(&member.id)? {
                if seen_teams.insert(team.id.clone()) {
                    affected_teams.push(team);
                }
            }
        }

        tracing::debug!(
            id,
            upstream = upstream.len(),
            downstream = downstream.len(),
            teams = affected_teams.len(),
            "Computed blast radius"
        );

        Ok(BlastRadiusResult {
            total_affected: affected.len(),
            node,
            upstream,
            downstream,
            affected_teams,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use infragraph_core::{Edge, EdgeType, Node, NodeType};
    use infragraph_store::GraphStore;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::QueryError;

    fn ids(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// gateway -> orders -> billing -> gateway (a cycle), orders -> ledger-db.
    fn build_cyclic_engine() -> QueryEngine {
        let store = GraphStore::default();
        store.connect().unwrap();
        store
            .upsert_nodes(&[
                Node::new(NodeType::Service, "gateway"),
                Node::new(NodeType::Service, "orders"),
                Node::new(NodeType::Service, "billing"),
                Node::new(NodeType::Database, "ledger-db"),
                Node::new(NodeType::Team, "commerce"),
                Node::new(NodeType::Team, "finance"),
            ])
            .unwrap();
        let svc = NodeType::Service;
        for edge in [
            Edge::between(EdgeType::Calls, svc, "gateway", svc, "orders"),
            Edge::between(EdgeType::Calls, svc, "orders", svc, "billing"),
            Edge::between(EdgeType::Calls, svc, "billing", svc, "gateway"),
            Edge::between(EdgeType::ReadsFrom, svc, "orders", NodeType::Database, "ledger-db"),
            Edge::between(EdgeType::Owns, NodeType::Team, "commerce", svc, "orders"),
            Edge::between(EdgeType::Owns, NodeType::Team, "commerce", svc, "gateway"),
            Edge::between(EdgeType::Owns, NodeType::Team, "finance", svc, "billing"),
        ] {
            store.upsert_edge(&edge).unwrap();
        }
        QueryEngine::new(Arc::new(store))
    }

    #[test]
    fn test_cycle_counts_each_node_once() {
        let engine = build_cyclic_engine();
        let result = engine.blast_radius("service:orders").unwrap();

        assert_eq!(ids(&result.upstream), vec!["service:gateway", "service:billing"]);
        assert_eq!(
            ids(&result.downstream),
            vec!["database:ledger-db", "service:billing", "service:gateway"]
        );
        // orders, gateway, billing, ledger-db
        assert_eq!(result.total_affected, 4);
    }

    #[test]
    fn test_affected_teams_in_discovery_order() {
        let engine = build_cyclic_engine();
        let result = engine.blast_radius("database:ledger-db").unwrap();

        assert!(result.downstream.is_empty());
        assert_eq!(
            ids(&result.affected_teams),
            vec!["team:commerce", "team:finance"]
        );
    }

    #[test]
    fn test_unowned_leaf() {
        let engine = build_cyclic_engine();
        let result = engine.blast_radius("team:finance").unwrap();

        assert!(result.upstream.is_empty());
        assert!(result.downstream.is_empty());
        assert!(result.affected_teams.is_empty());
        assert_eq!(result.total_affected, 1);
    }

    #[test]
    fn test_missing_node() {
        let engine = build_cyclic_engine();
        assert!(matches!(
            engine.blast_radius("service:nope"),
            Err(QueryError::NotFound { .. })
        ));
    }
}
