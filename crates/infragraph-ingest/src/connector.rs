//! The connector contract and the batch every connector produces.

use infragraph_core::config::SourceKind;
use infragraph_core::{Edge, Node, Properties, PropertyValue};

use crate::cluster::ClusterManifestConnector;
use crate::compose::ComposeConnector;
use crate::error::Result;
use crate::teams::TeamsConnector;

/// Translates one configuration format into graph candidates.
pub trait Connector {
    /// The source format this connector reads.
    fn kind(&self) -> SourceKind;

    /// Parse raw source content. `origin` names the source in errors.
    fn parse(&self, origin: &str, content: &str) -> Result<SourceBatch>;
}

/// A name-matched property patch for a node created by an earlier source.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub name: String,
    pub properties: Properties,
    /// Inserted when no node with `name` exists yet.
    pub fallback: Option<Node>,
}

/// Nodes, edges and enrichments produced from one source.
///
/// Duplicate node ids within a batch merge their properties; duplicate edge
/// ids keep the first edge.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub enrichments: Vec<Enrichment>,
}

impl SourceBatch {
    pub fn add_node(&mut self, node: Node) {
        match self.nodes.iter_mut().find(|n| n.id == node.id) {
            Some(existing) => existing.merge_properties(&node.properties),
            None => self.nodes.push(node),
        }
    }

    pub fn add_edge(&mut self, edge: Edge) {
        if !self.edges.iter().any(|e| e.id == edge.id) {
            self.edges.push(edge);
        }
    }

    pub fn add_enrichment(&mut self, enrichment: Enrichment) {
        self.enrichments.push(enrichment);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.enrichments.is_empty()
    }
}

/// The closed set of supported connectors.
#[derive(Debug, Clone, Copy)]
pub enum SourceConnector {
    Compose(ComposeConnector),
    Teams(TeamsConnector),
    Cluster(ClusterManifestConnector),
}

impl SourceConnector {
    pub fn for_kind(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Compose => Self::Compose(ComposeConnector),
            SourceKind::Teams => Self::Teams(TeamsConnector),
            SourceKind::Cluster => Self::Cluster(ClusterManifestConnector),
        }
    }
}

impl Connector for SourceConnector {
    fn kind(&self) -> SourceKind {
        match self {
            Self::Compose(c) => c.kind(),
            Self::Teams(c) => c.kind(),
            Self::Cluster(c) => c.kind(),
        }
    }

    fn parse(&self, origin: &str, content: &str) -> Result<SourceBatch> {
        match self {
            Self::Compose(c) => c.parse(origin, content),
            Self::Teams(c) => c.parse(origin, content),
            Self::Cluster(c) => c.parse(origin, content),
        }
    }
}

/// Convert a YAML scalar into a property value. Nulls and collections yield `None`.
pub(crate) fn yaml_scalar(value: &serde_yaml::Value) -> Option<PropertyValue> {
    match value {
        serde_yaml::Value::Bool(b) => Some(PropertyValue::Bool(*b)),
        serde_yaml::Value::Number(n) => n
            .as_i64()
            .map(PropertyValue::Int)
            .or_else(|| n.as_f64().map(PropertyValue::Float)),
        serde_yaml::Value::String(s) => Some(PropertyValue::String(s.clone())),
        serde_yaml::Value::Tagged(tagged) => yaml_scalar(&tagged.value),
        _ => None,
    }
}

/// Render a YAML scalar as a plain string.
pub(crate) fn yaml_string(value: &serde_yaml::Value) -> Option<String> {
    yaml_scalar(value).map(|v| v.to_string())
}
