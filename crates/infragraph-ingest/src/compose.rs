//! Compose-style service manifest connector.
//!
//! Every entry under `services:` becomes a node. Declared `depends_on` lists
//! and `*_URL` environment entries that point at a sibling service become
//! dependency edges.

use std::collections::BTreeMap;

use serde::Deserialize;

use infragraph_core::config::SourceKind;
use infragraph_core::{Edge, EdgeType, Node, NodeType, Properties, PropertyValue};

use crate::connector::{yaml_scalar, yaml_string, Connector, SourceBatch};
use crate::error::{IngestError, Result};
use crate::infer::{infer_node_type, is_endpoint_key, match_endpoint};

/// Root of a compose file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeFile {
    #[serde(default)]
    pub services: BTreeMap<String, Option<ComposeService>>,
}

/// A single service definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeService {
    pub image: Option<String>,
    #[serde(default)]
    pub labels: KeyValues,
    #[serde(default)]
    pub ports: Vec<serde_yaml::Value>,
    #[serde(default)]
    pub depends_on: DependsOn,
    #[serde(default)]
    pub environment: KeyValues,
}

/// Labels and environment accept both `KEY=value` lists and maps.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeyValues {
    Map(BTreeMap<String, Option<serde_yaml::Value>>),
    List(Vec<String>),
}

impl Default for KeyValues {
    fn default() -> Self {
        Self::Map(BTreeMap::new())
    }
}

impl KeyValues {
    /// Scalar entries as property values; valueless entries are dropped.
    pub fn to_properties(&self) -> Properties {
        match self {
            Self::Map(map) => map
                .iter()
                .filter_map(|(k, v)| Some((k.clone(), v.as_ref().and_then(yaml_scalar)?)))
                .collect(),
            Self::List(items) => items
                .iter()
                .filter_map(|item| item.split_once('='))
                .map(|(k, v)| (k.to_string(), PropertyValue::from(v)))
                .collect(),
        }
    }

    /// Entries rendered as strings.
    pub fn to_strings(&self) -> BTreeMap<String, String> {
        self.to_properties()
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Map(map) => map.get(key).and_then(|v| v.as_ref()).and_then(yaml_string),
            Self::List(items) => items
                .iter()
                .filter_map(|item| item.split_once('='))
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string()),
        }
    }
}

/// `depends_on` in short (list) or long (map) form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    List(Vec<String>),
    Map(BTreeMap<String, serde_yaml::Value>),
}

impl Default for DependsOn {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl DependsOn {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::List(items) => items.iter().map(String::as_str).collect(),
            Self::Map(map) => map.keys().map(String::as_str).collect(),
        }
    }
}

impl ComposeService {
    /// The node type this service is inferred to be.
    pub fn node_type(&self, name: &str) -> NodeType {
        let explicit = self.labels.get("type");
        infer_node_type(explicit.as_deref(), self.image.as_deref(), name)
    }

    /// Container port of the first published port.
    pub fn first_port(&self) -> Option<i64> {
        let first = self.ports.first()?;
        match first {
            serde_yaml::Value::Number(n) => n.as_i64(),
            serde_yaml::Value::String(s) => {
                let container = s.rsplit(':').next()?;
                let container = container.split('/').next()?;
                container.trim().parse().ok()
            }
            serde_yaml::Value::Mapping(m) => m.get("target").and_then(|t| t.as_i64()),
            _ => None,
        }
    }

    fn properties(&self) -> Properties {
        let mut properties = self.labels.to_properties();
        properties.remove("type");
        if let Some(image) = &self.image {
            properties.insert("image".to_string(), PropertyValue::from(image.as_str()));
        }
        if let Some(port) = self.first_port() {
            properties.insert("port".to_string(), PropertyValue::Int(port));
        }
        properties
    }
}

/// Connector for compose-style manifests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeConnector;

impl Connector for ComposeConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Compose
    }

    fn parse(&self, origin: &str, content: &str) -> Result<SourceBatch> {
        let file: ComposeFile =
            serde_yaml::from_str(content).map_err(|e| IngestError::malformed(origin, e))?;
        Ok(build_batch(&file))
    }
}

/// Convert a parsed compose file into graph candidates.
pub fn build_batch(file: &ComposeFile) -> SourceBatch {
    let empty = ComposeService::default();
    let services: BTreeMap<&str, &ComposeService> = file
        .services
        .iter()
        .map(|(name, svc)| (name.as_str(), svc.as_ref().unwrap_or(&empty)))
        .collect();
    let types: BTreeMap<&str, NodeType> = services
        .iter()
        .map(|(name, svc)| (*name, svc.node_type(name)))
        .collect();

    let mut batch = SourceBatch::default();

    for (name, svc) in &services {
        batch.add_node(Node::new(types[name], *name).with_properties(svc.properties()));
    }

    for (name, svc) in &services {
        let source_type = types[name];

        for dep in svc.depends_on.names() {
            // Undeclared dependencies are typed by name alone.
            let target_type = types
                .get(dep)
                .copied()
                .unwrap_or_else(|| infer_node_type(None, None, dep));
            batch.add_edge(Edge::between(
                EdgeType::for_target(target_type),
                source_type,
                name,
                target_type,
                dep,
            ));
        }

        for (key, value) in svc.environment.to_strings() {
            if !is_endpoint_key(&key) || value.is_empty() {
                continue;
            }
            let Some(target) = match_endpoint(&value, |host| services.contains_key(host)) else {
                continue;
            };
            if target == *name {
                continue;
            }
            let target_type = types[target.as_str()];
            batch.add_edge(
                Edge::between(
                    EdgeType::for_target(target_type),
                    source_type,
                    name,
                    target_type,
                    &target,
                )
                .with_property("via", "env"),
            );
        }
    }

    batch
}
