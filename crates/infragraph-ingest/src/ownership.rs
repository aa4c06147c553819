//! Resolution of raw `owns` edges against the merged node set.
//!
//! Resolution is a pure function of the node set and the raw edge: ties are
//! always broken by picking the lexicographically smallest node id.

use std::collections::BTreeMap;

use infragraph_core::types::edge_id;
use infragraph_core::{Diagnostic, Edge, EdgeType, Node, NodeType};

/// Outcome of resolving one raw ownership edge.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The target is a node id, or the name of exactly one node.
    Exact(Edge),
    /// Exactly one node matched by substring or id suffix.
    Fuzzy(Edge),
    /// Several nodes matched; the edge points at the smallest id.
    Ambiguous { edge: Edge, candidates: Vec<String> },
    /// Nothing matched. The edge is dropped.
    Unresolved,
}

impl Resolution {
    /// The resolved edge, if any.
    pub fn edge(&self) -> Option<&Edge> {
        match self {
            Self::Exact(edge) | Self::Fuzzy(edge) | Self::Ambiguous { edge, .. } => Some(edge),
            Self::Unresolved => None,
        }
    }

    /// The diagnostic to record for this outcome, if any.
    pub fn diagnostic(&self, raw: &Edge) -> Option<Diagnostic> {
        let team = team_name(&raw.source).to_string();
        match self {
            Self::Exact(_) | Self::Fuzzy(_) => None,
            Self::Ambiguous { edge, candidates } => Some(Diagnostic::AmbiguousOwnership {
                team,
                target: raw.target.clone(),
                candidates: candidates.clone(),
                chosen: edge.target.clone(),
            }),
            Self::Unresolved => Some(Diagnostic::UnresolvedOwnership {
                team,
                target: raw.target.clone(),
            }),
        }
    }
}

/// Name and id lookups over a snapshot of the merged node set.
pub struct OwnershipResolver<'a> {
    by_id: BTreeMap<&'a str, &'a Node>,
    by_name: BTreeMap<&'a str, Vec<&'a Node>>,
}

impl<'a> OwnershipResolver<'a> {
    pub fn new(nodes: &'a [Node]) -> Self {
        let mut by_id = BTreeMap::new();
        let mut by_name: BTreeMap<&str, Vec<&Node>> = BTreeMap::new();
        for node in nodes {
            by_id.insert(node.id.as_str(), node);
            by_name.entry(node.name.as_str()).or_default().push(node);
        }
        for group in by_name.values_mut() {
            group.sort_by(|a, b| a.id.cmp(&b.id));
        }
        Self { by_id, by_name }
    }

    pub fn resolve(&self, raw: &Edge) -> Resolution {
        let target = raw.target.trim();
        if target.is_empty() {
            return Resolution::Unresolved;
        }

        if let Some(node) = self.by_id.get(target) {
            return Resolution::Exact(resolved_edge(raw, node));
        }

        if let Some(named) = self.by_name.get(target) {
            return pick(raw, named, Resolution::Exact);
        }

        // by_id is ordered, so candidates come out sorted.
        let fuzzy: Vec<&Node> = self
            .by_id
            .values()
            .filter(|n| n.node_type != NodeType::Team)
            .filter(|n| n.name.contains(target) || n.id.ends_with(target))
            .copied()
            .collect();
        if fuzzy.is_empty() {
            return Resolution::Unresolved;
        }
        pick(raw, &fuzzy, Resolution::Fuzzy)
    }
}

fn pick(raw: &Edge, sorted: &[&Node], single: fn(Edge) -> Resolution) -> Resolution {
    match sorted {
        [] => Resolution::Unresolved,
        [only] => single(resolved_edge(raw, only)),
        [first, ..] => Resolution::Ambiguous {
            edge: resolved_edge(raw, first),
            candidates: sorted.iter().map(|n| n.id.clone()).collect(),
        },
    }
}

fn resolved_edge(raw: &Edge, target: &Node) -> Edge {
    Edge {
        id: edge_id(team_name(&raw.source), EdgeType::Owns, &target.name),
        edge_type: EdgeType::Owns,
        source: raw.source.clone(),
        target: target.id.clone(),
        properties: raw.properties.clone(),
    }
}

fn team_name(team_id: &str) -> &str {
    team_id.strip_prefix("team:").unwrap_or(team_id)
}
