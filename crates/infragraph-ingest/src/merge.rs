//! Graph persistence: apply a source batch to the store.

use std::collections::HashMap;

use infragraph_core::types::{edge_id, split_node_id};
use infragraph_core::{Diagnostic, Edge, EdgeType, LoadReport};
use infragraph_store::{GraphStore, StoreError};

use crate::connector::{Enrichment, SourceBatch};
use crate::error::Result;

/// Node id the batch proposed, mapped to the id it landed on in the store.
pub type IdRemap = HashMap<String, String>;

/// Upsert a batch's nodes, then apply its enrichments.
///
/// Returns the id remapping to apply to the batch's edges before they are
/// persisted.
pub fn merge_batch(
    store: &GraphStore,
    origin: &str,
    batch: &SourceBatch,
    report: &mut LoadReport,
) -> Result<IdRemap> {
    store.upsert_nodes(&batch.nodes)?;

    let mut remap = IdRemap::new();
    for enrichment in &batch.enrichments {
        match apply_enrichment(store, enrichment)? {
            Some(landed) => {
                if let Some(fallback) = &enrichment.fallback {
                    if fallback.id != landed {
                        remap.insert(fallback.id.clone(), landed);
                    }
                }
            }
            None => report.push(Diagnostic::UnmatchedEnrichment {
                source: origin.to_string(),
                name: enrichment.name.clone(),
            }),
        }
    }

    Ok(remap)
}

/// Apply one enrichment and return the id of the node it landed on.
///
/// Target order: the fallback's own id, then the smallest id among nodes
/// with the same name, then a freshly inserted fallback.
fn apply_enrichment(store: &GraphStore, enrichment: &Enrichment) -> Result<Option<String>> {
    let existing = match &enrichment.fallback {
        Some(fallback) => store.get_node(&fallback.id)?,
        None => None,
    };
    let existing = match existing {
        Some(node) => Some(node),
        None => store
            .find_nodes_by_name(&enrichment.name)?
            .into_iter()
            .min_by(|a, b| a.id.cmp(&b.id)),
    };

    if let Some(mut node) = existing {
        node.properties = enrichment.properties.clone();
        store.upsert_node(&node)?;
        tracing::debug!(id = %node.id, name = %enrichment.name, "Enriched node");
        return Ok(Some(node.id));
    }

    match &enrichment.fallback {
        Some(fallback) => {
            store.upsert_node(fallback)?;
            tracing::debug!(id = %fallback.id, "Created node from enrichment fallback");
            Ok(Some(fallback.id.clone()))
        }
        None => Ok(None),
    }
}

/// Rewrite edge endpoints through the remap.
///
/// A dependency edge whose target moved is retyped from the node it landed
/// on, and its id rebuilt to match.
pub fn remap_edges(edges: &[Edge], remap: &IdRemap) -> Vec<Edge> {
    edges
        .iter()
        .map(|edge| {
            let mut edge = edge.clone();
            if let Some(id) = remap.get(&edge.source) {
                edge.source = id.clone();
            }
            if let Some(id) = remap.get(&edge.target) {
                edge.target = id.clone();
                if edge.edge_type.is_dependency() {
                    retype(&mut edge);
                }
            }
            edge
        })
        .collect()
}

fn retype(edge: &mut Edge) {
    let (Ok((_, source_name)), Ok((target_type, target_name))) =
        (split_node_id(&edge.source), split_node_id(&edge.target))
    else {
        return;
    };
    let edge_type = EdgeType::for_target(target_type);
    let id = edge_id(source_name, edge_type, target_name);
    edge.edge_type = edge_type;
    edge.id = id;
}

/// Persist edges, turning missing endpoints into diagnostics.
///
/// Returns the number of newly inserted edges.
pub fn persist_edges(store: &GraphStore, edges: &[Edge], report: &mut LoadReport) -> Result<usize> {
    let mut inserted = 0;
    for edge in edges {
        match store.upsert_edge(edge) {
            Ok(true) => inserted += 1,
            Ok(false) => {}
            Err(StoreError::MissingEndpoint { edge_id, missing }) => {
                report.push(Diagnostic::DanglingEdge { edge_id, missing });
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use infragraph_core::{Node, NodeType, PropertyValue};

    use super::*;

    fn store() -> GraphStore {
        let store = GraphStore::default();
        store.connect().unwrap();
        store
    }

    #[test]
    fn test_enrichment_merges_by_name_and_keeps_type() {
        let store = store();
        store
            .upsert_node(&Node::new(NodeType::Database, "ledger").with_property("port", 5432i64))
            .unwrap();

        let mut batch = SourceBatch::default();
        batch.add_enrichment(Enrichment {
            name: "ledger".to_string(),
            properties: [("k8s_replicas".to_string(), PropertyValue::Int(2))].into(),
            fallback: Some(Node::new(NodeType::Service, "ledger")),
        });
        batch.add_edge(Edge::between(
            EdgeType::Calls,
            NodeType::Service,
            "ledger",
            NodeType::Service,
            "ledger",
        ));

        let mut report = LoadReport::start();
        let remap = merge_batch(&store, "k8s.yaml", &batch, &mut report).unwrap();

        assert_eq!(store.node_count().unwrap(), 1);
        let node = store.get_node("database:ledger").unwrap().unwrap();
        assert_eq!(node.properties["port"].as_i64(), Some(5432));
        assert_eq!(node.properties["k8s_replicas"].as_i64(), Some(2));
        assert_eq!(remap["service:ledger"], "database:ledger");

        let edges = remap_edges(&batch.edges, &remap);
        assert_eq!(edges[0].source, "database:ledger");
        assert_eq!(edges[0].target, "database:ledger");
    }

    #[test]
    fn test_remapped_target_retypes_edge() {
        let mut remap = IdRemap::new();
        remap.insert("service:ledger".to_string(), "database:ledger".to_string());
        remap.insert("service:cache".to_string(), "cache:cache".to_string());

        let edges = vec![
            Edge::between(EdgeType::Calls, NodeType::Service, "api", NodeType::Service, "ledger")
                .with_property("via", "k8s_env"),
            Edge::between(EdgeType::Calls, NodeType::Service, "cache", NodeType::Service, "api"),
            Edge::between(EdgeType::Owns, NodeType::Team, "core", NodeType::Service, "ledger"),
        ];
        let remapped = remap_edges(&edges, &remap);

        assert_eq!(remapped[0].id, "edge:api-reads_from-ledger");
        assert_eq!(remapped[0].edge_type, EdgeType::ReadsFrom);
        assert_eq!(remapped[0].target, "database:ledger");
        assert_eq!(remapped[0].properties["via"].as_str(), Some("k8s_env"));

        // Only a moved target changes the type.
        assert_eq!(remapped[1].id, "edge:cache-calls-api");
        assert_eq!(remapped[1].source, "cache:cache");

        assert_eq!(remapped[2].edge_type, EdgeType::Owns);
        assert_eq!(remapped[2].target, "database:ledger");
    }

    #[test]
    fn test_fallback_created_when_missing() {
        let store = store();
        let mut batch = SourceBatch::default();
        batch.add_enrichment(Enrichment {
            name: "search".to_string(),
            properties: Default::default(),
            fallback: Some(Node::new(NodeType::Service, "search")),
        });

        let mut report = LoadReport::start();
        let remap = merge_batch(&store, "k8s.yaml", &batch, &mut report).unwrap();

        assert!(remap.is_empty());
        assert!(store.contains_node("service:search").unwrap());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_unmatched_enrichment_is_reported() {
        let store = store();
        let mut batch = SourceBatch::default();
        batch.add_enrichment(Enrichment {
            name: "ghost".to_string(),
            properties: Default::default(),
            fallback: None,
        });

        let mut report = LoadReport::start();
        merge_batch(&store, "k8s.yaml", &batch, &mut report).unwrap();

        assert_eq!(store.node_count().unwrap(), 0);
        assert_eq!(report.diagnostics_of("unmatched_enrichment").count(), 1);
    }

    #[test]
    fn test_dangling_edges_become_diagnostics() {
        let store = store();
        store.upsert_node(&Node::new(NodeType::Service, "a")).unwrap();

        let edges = vec![Edge::between(
            EdgeType::Calls,
            NodeType::Service,
            "a",
            NodeType::Service,
            "missing",
        )];
        let mut report = LoadReport::start();
        let inserted = persist_edges(&store, &edges, &mut report).unwrap();

        assert_eq!(inserted, 0);
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::DanglingEdge {
                edge_id: "edge:a-calls-missing".to_string(),
                missing: "service:missing".to_string(),
            }]
        );
    }
}
