//! Cluster manifest connector (multi-document YAML).
//!
//! `Deployment` documents enrich the node of the same name, creating it when
//! no earlier source declared one. `Service` documents only enrich. All
//! other kinds and empty documents are ignored.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use infragraph_core::config::SourceKind;
use infragraph_core::{Edge, EdgeType, Node, NodeType, Properties, PropertyValue};

use crate::connector::{yaml_scalar, yaml_string, Connector, Enrichment, SourceBatch};
use crate::error::{IngestError, Result};
use crate::infer::{infer_node_type, is_endpoint_key, match_endpoint};

type ValueMap = BTreeMap<String, serde_yaml::Value>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObjectMeta {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub labels: Option<ValueMap>,
    pub annotations: Option<ValueMap>,
}

impl ObjectMeta {
    fn label(&self, key: &str) -> Option<String> {
        self.labels.as_ref()?.get(key).and_then(yaml_string)
    }

    fn annotation(&self, key: &str) -> Option<String> {
        self.annotations.as_ref()?.get(key).and_then(yaml_string)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Deployment {
    pub metadata: ObjectMeta,
    pub spec: DeploymentSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeploymentSpec {
    pub replicas: Option<i64>,
    pub template: PodTemplate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PodTemplate {
    pub spec: PodSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PodSpec {
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Container {
    pub image: Option<String>,
    pub env: Vec<EnvVar>,
    pub resources: Resources,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Resources {
    pub limits: Option<ValueMap>,
    pub requests: Option<ValueMap>,
}

/// A literal container environment variable. `valueFrom` entries have no value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnvVar {
    pub name: Option<String>,
    pub value: Option<serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceObject {
    pub metadata: ObjectMeta,
    pub spec: ServiceSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceSpec {
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServicePort {
    pub port: Option<i64>,
}

impl Deployment {
    fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref().filter(|n| !n.is_empty())
    }

    fn main_container(&self) -> Option<&Container> {
        self.spec.template.spec.containers.first()
    }

    fn node_type(&self, name: &str) -> NodeType {
        let explicit = self
            .metadata
            .label("type")
            .or_else(|| self.metadata.annotation("type"));
        let image = self.main_container().and_then(|c| c.image.as_deref());
        infer_node_type(explicit.as_deref(), image, name)
    }

    fn properties(&self) -> Properties {
        let mut properties = Properties::new();
        if let Some(team) = self.metadata.label("team") {
            properties.insert("team".to_string(), PropertyValue::from(team));
        }
        properties.insert(
            "k8s_namespace".to_string(),
            PropertyValue::from(self.metadata.namespace.as_deref().unwrap_or("default")),
        );
        properties.insert(
            "k8s_replicas".to_string(),
            PropertyValue::Int(self.spec.replicas.unwrap_or(1)),
        );

        let Some(container) = self.main_container() else {
            return properties;
        };
        if let Some(image) = &container.image {
            properties.insert("image".to_string(), PropertyValue::from(image.as_str()));
        }
        let quantities = [
            ("resource_limit", &container.resources.limits),
            ("resource_request", &container.resources.requests),
        ];
        for (prefix, map) in quantities {
            let Some(map) = map else { continue };
            for resource in ["cpu", "memory"] {
                if let Some(value) = map.get(resource).and_then(yaml_scalar) {
                    properties.insert(format!("{prefix}_{resource}"), value);
                }
            }
        }
        properties
    }

    /// Literal `*_URL` environment values of the main container.
    fn endpoint_values(&self) -> Vec<String> {
        self.main_container()
            .map(|c| {
                c.env
                    .iter()
                    .filter(|e| e.name.as_deref().is_some_and(is_endpoint_key))
                    .filter_map(|e| e.value.as_ref().and_then(yaml_string))
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Connector for cluster deployment manifests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterManifestConnector;

impl Connector for ClusterManifestConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Cluster
    }

    fn parse(&self, origin: &str, content: &str) -> Result<SourceBatch> {
        let mut deployments = Vec::new();
        let mut services = Vec::new();

        for document in serde_yaml::Deserializer::from_str(content) {
            let value = serde_yaml::Value::deserialize(document)
                .map_err(|e| IngestError::malformed(origin, e))?;
            if value.is_null() {
                continue;
            }
            match value.get("kind").and_then(|k| k.as_str()) {
                Some("Deployment") => deployments.push(
                    serde_yaml::from_value::<Deployment>(value)
                        .map_err(|e| IngestError::malformed(origin, e))?,
                ),
                Some("Service") => services.push(
                    serde_yaml::from_value::<ServiceObject>(value)
                        .map_err(|e| IngestError::malformed(origin, e))?,
                ),
                other => tracing::debug!(origin, kind = ?other, "Ignoring manifest document"),
            }
        }

        Ok(build_batch(&deployments, &services))
    }
}

/// Convert parsed manifest objects into enrichments and edges.
pub fn build_batch(deployments: &[Deployment], services: &[ServiceObject]) -> SourceBatch {
    let types: BTreeMap<&str, NodeType> = deployments
        .iter()
        .filter_map(|d| d.name().map(|name| (name, d.node_type(name))))
        .collect();
    let names: BTreeSet<&str> = types.keys().copied().collect();

    let mut batch = SourceBatch::default();

    for deployment in deployments {
        let Some(name) = deployment.name() else { continue };
        let node_type = types[name];
        let properties = deployment.properties();

        batch.add_enrichment(Enrichment {
            name: name.to_string(),
            fallback: Some(Node::new(node_type, name).with_properties(properties.clone())),
            properties,
        });

        for value in deployment.endpoint_values() {
            let Some(target) = match_endpoint(&value, |host| names.contains(host)) else {
                continue;
            };
            if target == name {
                continue;
            }
            let target_type = types[target.as_str()];
            batch.add_edge(
                Edge::between(
                    EdgeType::for_target(target_type),
                    node_type,
                    name,
                    target_type,
                    &target,
                )
                .with_property("via", "k8s_env"),
            );
        }
    }

    for service in services {
        let Some(name) = service.metadata.name.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };
        let mut properties = Properties::new();
        properties.insert("k8s_service".to_string(), PropertyValue::Bool(true));
        if let Some(port) = service.spec.ports.first().and_then(|p| p.port) {
            properties.insert("k8s_port".to_string(), PropertyValue::Int(port));
        }
        batch.add_enrichment(Enrichment {
            name: name.to_string(),
            properties,
            fallback: None,
        });
    }

    batch
}
