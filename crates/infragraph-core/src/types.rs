//! Core domain types for the infrastructure topology graph.
//!
//! These types represent nodes and edges exactly as they are serialized to
//! callers: `{id, type, name, properties}` for nodes and
//! `{id, type, source, target, properties}` for edges.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;

// ── Properties ────────────────────────────────────────────────────

/// A scalar property value attached to a node or edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Property map. Ordered so serialized output is stable.
pub type Properties = BTreeMap<String, PropertyValue>;

// ── Node Types ────────────────────────────────────────────────────

/// The kind of entity a node represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Service,
    Database,
    Cache,
    Team,
}

impl NodeType {
    pub const ALL: [NodeType; 4] = [Self::Service, Self::Database, Self::Cache, Self::Team];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Database => "database",
            Self::Cache => "cache",
            Self::Team => "team",
        }
    }

    /// Build the composite node id `"<type>:<name>"`.
    pub fn node_id(&self, name: &str) -> String {
        format!("{}:{name}", self.as_str())
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "service" => Ok(Self::Service),
            "database" => Ok(Self::Database),
            "cache" => Ok(Self::Cache),
            "team" => Ok(Self::Team),
            other => Err(TopologyError::UnknownNodeType(other.to_string())),
        }
    }
}

/// Split a composite id into its type and name.
pub fn split_node_id(id: &str) -> Result<(NodeType, &str), TopologyError> {
    let (kind, name) = id
        .split_once(':')
        .ok_or_else(|| TopologyError::InvalidNodeId(id.to_string()))?;
    if name.is_empty() {
        return Err(TopologyError::InvalidNodeId(id.to_string()));
    }
    Ok((kind.parse()?, name))
}

/// A vertex in the topology graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Node {
    /// Create a node whose id is derived from its type and name.
    pub fn new(node_type: NodeType, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: node_type.node_id(&name),
            node_type,
            name,
            properties: Properties::new(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Merge properties key-by-key: incoming keys overwrite, others are kept.
    pub fn merge_properties(&mut self, incoming: &Properties) {
        for (key, value) in incoming {
            self.properties.insert(key.clone(), value.clone());
        }
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

// ── Edge Types ────────────────────────────────────────────────────

/// The relationship an edge expresses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Calls,
    ReadsFrom,
    Uses,
    Owns,
}

impl EdgeType {
    /// Edge types that express a runtime dependency.
    pub const DEPENDENCIES: [EdgeType; 3] = [Self::Calls, Self::ReadsFrom, Self::Uses];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calls => "calls",
            Self::ReadsFrom => "reads_from",
            Self::Uses => "uses",
            Self::Owns => "owns",
        }
    }

    /// Dependency edge type implied by the type of the node being depended on.
    pub fn for_target(target: NodeType) -> Self {
        match target {
            NodeType::Database => Self::ReadsFrom,
            NodeType::Cache => Self::Uses,
            NodeType::Service | NodeType::Team => Self::Calls,
        }
    }

    pub fn is_dependency(&self) -> bool {
        !matches!(self, Self::Owns)
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "calls" => Ok(Self::Calls),
            "reads_from" => Ok(Self::ReadsFrom),
            "uses" => Ok(Self::Uses),
            "owns" => Ok(Self::Owns),
            other => Err(TopologyError::UnknownEdgeType(other.to_string())),
        }
    }
}

/// Build the stable edge id `"edge:<src-name>-<type>-<dst-name>"`.
pub fn edge_id(source_name: &str, edge_type: EdgeType, target_name: &str) -> String {
    format!("edge:{source_name}-{edge_type}-{target_name}")
}

/// A directed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Edge {
    /// Create an edge between two named nodes of known type.
    pub fn between(
        edge_type: EdgeType,
        source_type: NodeType,
        source_name: &str,
        target_type: NodeType,
        target_name: &str,
    ) -> Self {
        Self {
            id: edge_id(source_name, edge_type, target_name),
            edge_type,
            source: source_type.node_id(source_name),
            target: target_type.node_id(target_name),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_serializes_with_type_key() {
        let node = Node::new(NodeType::Database, "orders-db").with_property("port", 5432i64);
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["id"], "database:orders-db");
        assert_eq!(json["type"], "database");
        assert_eq!(json["name"], "orders-db");
        assert_eq!(json["properties"]["port"], 5432);
    }

    #[test]
    fn edge_type_serializes_snake_case() {
        let json = serde_json::to_string(&EdgeType::ReadsFrom).unwrap();
        assert_eq!(json, "\"reads_from\"");
        assert_eq!("reads_from".parse::<EdgeType>().unwrap(), EdgeType::ReadsFrom);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!("queue".parse::<NodeType>().is_err());
        assert!("depends".parse::<EdgeType>().is_err());
    }

    #[test]
    fn edge_type_follows_target() {
        assert_eq!(EdgeType::for_target(NodeType::Database), EdgeType::ReadsFrom);
        assert_eq!(EdgeType::for_target(NodeType::Cache), EdgeType::Uses);
        assert_eq!(EdgeType::for_target(NodeType::Service), EdgeType::Calls);
    }

    #[test]
    fn split_composite_id() {
        let (kind, name) = split_node_id("cache:session-redis").unwrap();
        assert_eq!(kind, NodeType::Cache);
        assert_eq!(name, "session-redis");

        assert!(split_node_id("no-colon").is_err());
        assert!(split_node_id("service:").is_err());
    }

    #[test]
    fn merge_keeps_absent_keys() {
        let mut node = Node::new(NodeType::Service, "api")
            .with_property("team", "platform")
            .with_property("port", 8080i64);

        let mut patch = Properties::new();
        patch.insert("port".to_string(), PropertyValue::Int(9090));
        node.merge_properties(&patch);

        assert_eq!(node.property("team").and_then(|v| v.as_str()), Some("platform"));
        assert_eq!(node.property("port").and_then(|v| v.as_i64()), Some(9090));
    }

    #[test]
    fn property_values_deserialize_untagged() {
        let props: Properties =
            serde_json::from_str(r#"{"a": true, "b": 3, "c": 1.5, "d": "x"}"#).unwrap();
        assert_eq!(props["a"], PropertyValue::Bool(true));
        assert_eq!(props["b"], PropertyValue::Int(3));
        assert_eq!(props["c"], PropertyValue::Float(1.5));
        assert_eq!(props["d"], PropertyValue::String("x".to_string()));
    }
}
