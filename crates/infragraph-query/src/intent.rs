//! Structured intent facade.
//!
//! An [`IntentRequest`] names one of a closed set of intents plus loosely
//! typed parameters. [`QueryEngine::execute_intent`] resolves identifiers,
//! runs the matching engine operation and returns a [`IntentResult`] tagged
//! by `type`. Failures never escape: they become `{"type": "error"}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use infragraph_core::{Node, NodeType};

use crate::error::{QueryError, Result};
use crate::traversal::Direction;
use crate::types::BlastRadiusResult;
use crate::QueryEngine;

/// The intents the facade understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    Ownership,
    DependencyDownstream,
    DependencyUpstream,
    BlastRadius,
    Path,
    ListNodes,
    NodeInfo,
    Search,
    TeamOwns,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A classified user question.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentRequest {
    #[serde(default)]
    pub intent: IntentKind,
    #[serde(default)]
    pub params: Map<String, Value>,
    /// When present the question was too vague; echo it back.
    #[serde(default)]
    pub clarification: Option<String>,
}

impl IntentRequest {
    pub fn new(intent: IntentKind) -> Self {
        Self {
            intent,
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// A non-empty string parameter.
    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn require(&self, name: &'static str) -> Result<&str> {
        self.param(name).ok_or(QueryError::MissingParam { name })
    }
}

/// The answer to an intent, discriminated by `type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentResult {
    Clarification {
        message: String,
    },
    Ownership {
        node: Node,
        owner: Option<Node>,
    },
    Dependencies {
        direction: Direction,
        node: Node,
        dependencies: Vec<Node>,
    },
    Dependents {
        direction: Direction,
        node: Node,
        dependents: Vec<Node>,
    },
    BlastRadius(BlastRadiusResult),
    Path {
        from: Node,
        to: Node,
        path: Vec<Node>,
    },
    List {
        node_type: Option<NodeType>,
        nodes: Vec<Node>,
        count: usize,
    },
    NodeInfo {
        node: Node,
        owner: Option<Node>,
        downstream: Vec<Node>,
        upstream: Vec<Node>,
    },
    Search {
        query: String,
        results: Vec<Node>,
        count: usize,
    },
    TeamOwnership {
        team: Node,
        owned_resources: Vec<Node>,
    },
    Error {
        message: String,
    },
}

impl IntentResult {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl QueryEngine {
    /// Execute an intent. Every failure is folded into [`IntentResult::Error`].
    pub fn execute_intent(&self, request: &IntentRequest) -> IntentResult {
        if let Some(message) = &request.clarification {
            return IntentResult::Clarification {
                message: message.clone(),
            };
        }

        match self.dispatch(request) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(intent = ?request.intent, error = %e, "Intent failed");
                IntentResult::Error {
                    message: error_message(&e),
                }
            }
        }
    }

    fn dispatch(&self, request: &IntentRequest) -> Result<IntentResult> {
        match request.intent {
            IntentKind::Ownership => match request.param("node_id") {
                Some(identifier) => {
                    let id = self.resolve_node_id(identifier)?;
                    Ok(IntentResult::Ownership {
                        owner: self.get_owner(&id)?,
                        node: self.require_node(&id)?,
                    })
                }
                None => match request.param("team_name") {
                    Some(team) => self.team_ownership(team),
                    None => Err(QueryError::MissingParam { name: "node_id" }),
                },
            },
            IntentKind::DependencyDownstream => {
                let id = self.resolve_node_id(request.require("node_id")?)?;
                Ok(IntentResult::Dependencies {
                    direction: Direction::Downstream,
                    dependencies: self.downstream(&id, None, None)?,
                    node: self.require_node(&id)?,
                })
            }
            IntentKind::DependencyUpstream => {
                let id = self.resolve_node_id(request.require("node_id")?)?;
                Ok(IntentResult::Dependents {
                    direction: Direction::Upstream,
                    dependents: self.upstream(&id, None, None)?,
                    node: self.require_node(&id)?,
                })
            }
            IntentKind::BlastRadius => {
                let id = self.resolve_node_id(request.require("node_id")?)?;
                Ok(IntentResult::BlastRadius(self.blast_radius(&id)?))
            }
            IntentKind::Path => {
                let from = self.resolve_node_id(request.require("from_id")?)?;
                let to = self.resolve_node_id(request.require("to_id")?)?;
                Ok(IntentResult::Path {
                    path: self.path(&from, &to)?,
                    from: self.require_node(&from)?,
                    to: self.require_node(&to)?,
                })
            }
            IntentKind::ListNodes => {
                let node_type = request
                    .param("node_type")
                    .map(str::parse::<NodeType>)
                    .transpose()?;
                let nodes = self.get_nodes(node_type, None)?;
                Ok(IntentResult::List {
                    node_type,
                    count: nodes.len(),
                    nodes,
                })
            }
            IntentKind::NodeInfo => {
                let id = self.resolve_node_id(request.require("node_id")?)?;
                Ok(IntentResult::NodeInfo {
                    node: self.require_node(&id)?,
                    owner: self.get_owner(&id)?,
                    downstream: self.downstream(&id, None, None)?,
                    upstream: self.upstream(&id, None, None)?,
                })
            }
            IntentKind::Search => {
                let text = request.require("query_text")?;
                let results = self.search_nodes(text)?;
                Ok(IntentResult::Search {
                    query: text.to_string(),
                    count: results.len(),
                    results,
                })
            }
            IntentKind::TeamOwns => self.team_ownership(request.require("team_name")?),
            IntentKind::Unknown => Err(QueryError::UnknownIntent),
        }
    }

    fn team_ownership(&self, reference: &str) -> Result<IntentResult> {
        let team = self.resolve_team(reference)?;
        Ok(IntentResult::TeamOwnership {
            owned_resources: self.get_nodes_owned_by_team(&team.name)?,
            team,
        })
    }
}

fn error_message(error: &QueryError) -> String {
    match error {
        QueryError::NotFound { id } => format!("Could not find '{id}' in the graph."),
        QueryError::MissingParam { name } => format!("Missing required parameter '{name}'."),
        QueryError::UnknownIntent => "Unrecognized query. Ask about ownership, dependencies, \
                                      blast radius, or paths between services."
            .to_string(),
        other => other.to_string(),
    }
}
