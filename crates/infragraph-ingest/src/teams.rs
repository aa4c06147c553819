//! Team roster connector.
//!
//! Produces one team node per named entry and one raw `owns` edge per
//! declared target. The edge target is the literal declared string; it is
//! resolved against the merged node set by [`crate::ownership`].

use std::collections::BTreeMap;

use serde::Deserialize;

use infragraph_core::config::SourceKind;
use infragraph_core::types::edge_id;
use infragraph_core::{Edge, EdgeType, Node, NodeType, Properties};

use crate::connector::{yaml_scalar, Connector, SourceBatch};
use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamsFile {
    #[serde(default)]
    pub teams: Vec<TeamEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamEntry {
    pub name: Option<String>,
    #[serde(default)]
    pub owns: Vec<String>,
    /// `lead`, `slack_channel`, `pagerduty_schedule` and anything else.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TeamsConnector;

impl Connector for TeamsConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Teams
    }

    fn parse(&self, origin: &str, content: &str) -> Result<SourceBatch> {
        let file: TeamsFile =
            serde_yaml::from_str(content).map_err(|e| IngestError::malformed(origin, e))?;

        let mut batch = SourceBatch::default();
        for team in &file.teams {
            let Some(name) = team.name.as_deref().filter(|n| !n.is_empty()) else {
                tracing::debug!(origin, "Skipping team entry without a name");
                continue;
            };

            let properties: Properties = team
                .extra
                .iter()
                .filter_map(|(k, v)| Some((k.clone(), yaml_scalar(v)?)))
                .collect();
            let node = Node::new(NodeType::Team, name).with_properties(properties);
            let source = node.id.clone();
            batch.add_node(node);

            for target in &team.owns {
                batch.add_edge(raw_owns_edge(name, &source, target));
            }
        }

        Ok(batch)
    }
}

/// An unresolved ownership edge pointing at the literal declared target.
pub fn raw_owns_edge(team_name: &str, team_id: &str, target: &str) -> Edge {
    Edge {
        id: edge_id(team_name, EdgeType::Owns, target),
        edge_type: EdgeType::Owns,
        source: team_id.to_string(),
        target: target.to_string(),
        properties: Properties::new(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const TEAMS_YAML: &str = r##"
teams:
  - name: payments-team
    lead: ana
    slack_channel: "#payments"
    pagerduty_schedule: PAY-1
    headcount: 6
    owns:
      - payments
      - orders-db
  - name: platform-team
    owns: [api-gateway]
  - lead: nobody
    owns: [orphan]
"##;

    #[test]
    fn test_team_nodes_carry_scalar_properties() {
        let batch = TeamsConnector.parse("teams.yaml", TEAMS_YAML).unwrap();
        assert_eq!(batch.nodes.len(), 2);

        let payments = &batch.nodes[0];
        assert_eq!(payments.id, "team:payments-team");
        assert_eq!(payments.properties["lead"].as_str(), Some("ana"));
        assert_eq!(payments.properties["slack_channel"].as_str(), Some("#payments"));
        assert_eq!(payments.properties["pagerduty_schedule"].as_str(), Some("PAY-1"));
        assert_eq!(payments.properties["headcount"].as_i64(), Some(6));
        assert!(!payments.properties.contains_key("owns"));
    }

    #[test]
    fn test_owns_edges_keep_literal_target() {
        let batch = TeamsConnector.parse("teams.yaml", TEAMS_YAML).unwrap();
        let edges: Vec<(&str, &str)> = batch
            .edges
            .iter()
            .map(|e| (e.id.as_str(), e.target.as_str()))
            .collect();

        assert_eq!(
            edges,
            vec![
                ("edge:payments-team-owns-payments", "payments"),
                ("edge:payments-team-owns-orders-db", "orders-db"),
                ("edge:platform-team-owns-api-gateway", "api-gateway"),
            ]
        );
        assert!(batch.edges.iter().all(|e| e.edge_type == EdgeType::Owns));
    }

    #[test]
    fn test_empty_roster() {
        let batch = TeamsConnector.parse("teams.yaml", "teams: []").unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let err = TeamsConnector.parse("teams.yaml", "teams: 42").unwrap_err();
        assert!(matches!(err, IngestError::MalformedSource { .. }));
    }
}
