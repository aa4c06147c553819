//! Identifier resolution for loosely specified node and team references.

use infragraph_core::{Node, NodeType};

use crate::error::{QueryError, Result};
use crate::QueryEngine;

impl QueryEngine {
    /// Resolve a user-supplied identifier to a node id.
    ///
    /// Tried in order: the literal id, each type prefix, then a search
    /// taking the smallest matching id.
    pub fn resolve_node_id(&self, identifier: &str) -> Result<String> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(QueryError::NotFound { id: String::new() });
        }

        if self.store().contains_node(identifier)? {
            return Ok(identifier.to_string());
        }

        for node_type in NodeType::ALL {
            let candidate = node_type.node_id(identifier);
            if self.store().contains_node(&candidate)? {
                return Ok(candidate);
            }
        }

        // search_nodes is id-ordered, so the first hit is the smallest id.
        self.search_nodes(identifier)?
            .into_iter()
            .next()
            .map(|n| n.id)
            .ok_or_else(|| QueryError::NotFound {
                id: identifier.to_string(),
            })
    }

    /// Resolve a team reference such as `payments`, `@payments`,
    /// `team:payments` or `payments-team` to the team node.
    pub fn resolve_team(&self, reference: &str) -> Result<Node> {
        let name = normalize_team_name(reference);
        for candidate in team_candidates(name) {
            if let Some(node) = self.get_node(&candidate)? {
                return Ok(node);
            }
        }
        Err(QueryError::NotFound {
            id: NodeType::Team.node_id(name),
        })
    }
}

/// Strip a `team:` prefix and a leading `@`.
pub fn normalize_team_name(reference: &str) -> &str {
    let name = reference.trim();
    let name = name.strip_prefix("team:").unwrap_or(name);
    name.strip_prefix('@').unwrap_or(name)
}

/// Team ids to try for a normalized name, most specific first.
fn team_candidates(name: &str) -> Vec<String> {
    let mut candidates = vec![NodeType::Team.node_id(name)];
    if !name.ends_with("-team") {
        candidates.push(NodeType::Team.node_id(&format!("{name}-team")));
    }
    candidates
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use infragraph_store::GraphStore;

    use super::*;

    fn engine() -> QueryEngine {
        let store = GraphStore::default();
        store.connect().unwrap();
        store
            .upsert_nodes(&[
                Node::new(NodeType::Service, "payments"),
                Node::new(NodeType::Database, "payments"),
                Node::new(NodeType::Database, "orders-db"),
                Node::new(NodeType::Service, "order-api"),
                Node::new(NodeType::Team, "payments-team"),
                Node::new(NodeType::Team, "sre"),
            ])
            .unwrap();
        QueryEngine::new(Arc::new(store))
    }

    #[test]
    fn test_exact_id_wins() {
        let engine = engine();
        assert_eq!(engine.resolve_node_id("database:payments").unwrap(), "database:payments");
    }

    #[test]
    fn test_prefix_order() {
        let engine = engine();
        // service: is tried before database:
        assert_eq!(engine.resolve_node_id("payments").unwrap(), "service:payments");
        assert_eq!(engine.resolve_node_id("sre").unwrap(), "team:sre");
    }

    #[test]
    fn test_search_fallback_is_deterministic() {
        let engine = engine();
        // Both orders-db and order-api match; the smaller id wins.
        assert_eq!(engine.resolve_node_id("ORDER").unwrap(), "database:orders-db");
        assert!(matches!(
            engine.resolve_node_id("nothing-here"),
            Err(QueryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_team_normalization() {
        assert_eq!(normalize_team_name("team:payments"), "payments");
        assert_eq!(normalize_team_name(" @payments "), "payments");
        assert_eq!(normalize_team_name("sre"), "sre");

        let engine = engine();
        for reference in ["payments", "@payments", "team:payments-team", "payments-team"] {
            assert_eq!(engine.resolve_team(reference).unwrap().id, "team:payments-team");
        }
        assert_eq!(engine.resolve_team("@sre").unwrap().id, "team:sre");
        assert!(matches!(
            engine.resolve_team("ghosts"),
            Err(QueryError::NotFound { ref id }) if id == "team:ghosts"
        ));
    }
}
