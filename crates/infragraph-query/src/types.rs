//! Result types for query engine operations.

use std::collections::BTreeMap;

use serde::Serialize;

use infragraph_core::{Edge, Node};

/// Impact of a failure of one node.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BlastRadiusResult {
    pub node: Node,
    /// Everything that depends on the node, directly or transitively.
    pub upstream: Vec<Node>,
    /// Everything the node depends on, directly or transitively.
    pub downstream: Vec<Node>,
    /// Distinct owning teams in first-discovery order.
    pub affected_teams: Vec<Node>,
    /// `|upstream ∪ downstream ∪ {node}|`
    pub total_affected: usize,
}

/// Node and edge counts.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
}

/// Every node and edge, in id order.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Statistics plus node names per type.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GraphSchema {
    pub statistics: GraphStats,
    pub services: Vec<String>,
    pub databases: Vec<String>,
    pub caches: Vec<String>,
    pub teams: Vec<String>,
}
