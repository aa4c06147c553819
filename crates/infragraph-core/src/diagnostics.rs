//! Load-time diagnostics and the per-run load report.
//!
//! Nothing that goes wrong while ingesting a single source aborts the load:
//! the problem is recorded here and surfaced to the caller instead.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::SourceKind;

/// Unique identifier for one load run.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct LoadId(pub Uuid);

impl LoadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LoadId {
    fn default() -> Self {
        Self::new()
    }
}

/// A problem found during a load pass, tagged by kind.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A source could not be read or parsed. Its nodes and edges are absent.
    MalformedSource { source: String, message: String },

    /// An optional source does not exist.
    SourceSkipped { source: String, reason: String },

    /// An ownership target matched more than one node; the smallest id was chosen.
    AmbiguousOwnership {
        team: String,
        target: String,
        candidates: Vec<String>,
        chosen: String,
    },

    /// An ownership target matched no node; the edge was dropped.
    UnresolvedOwnership { team: String, target: String },

    /// A dependency edge points at a node that does not exist.
    DanglingEdge { edge_id: String, missing: String },

    /// An enrichment found no node with the given name.
    UnmatchedEnrichment { source: String, name: String },
}

impl Diagnostic {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedSource { .. } => "malformed_source",
            Self::SourceSkipped { .. } => "source_skipped",
            Self::AmbiguousOwnership { .. } => "ambiguous_ownership",
            Self::UnresolvedOwnership { .. } => "unresolved_ownership",
            Self::DanglingEdge { .. } => "dangling_edge",
            Self::UnmatchedEnrichment { .. } => "unmatched_enrichment",
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedSource { source, message } => {
                write!(f, "malformed source {source}: {message}")
            }
            Self::SourceSkipped { source, reason } => write!(f, "skipped {source}: {reason}"),
            Self::AmbiguousOwnership {
                team,
                target,
                candidates,
                chosen,
            } => write!(
                f,
                "{team} owns '{target}' matched {} nodes ({}); chose {chosen}",
                candidates.len(),
                candidates.join(", ")
            ),
            Self::UnresolvedOwnership { team, target } => {
                write!(f, "{team} owns '{target}' matched no node")
            }
            Self::DanglingEdge { edge_id, missing } => {
                write!(f, "edge {edge_id} references missing node {missing}")
            }
            Self::UnmatchedEnrichment { source, name } => {
                write!(f, "{source} enriches '{name}' but no such node exists")
            }
        }
    }
}

/// Outcome of ingesting one source.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Loaded,
    Malformed,
    Skipped,
}

/// Per-source summary.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub path: String,
    pub kind: SourceKind,
    pub status: SourceStatus,
    /// blake3 digest of the raw source content, when it could be read.
    pub digest: Option<String>,
    pub nodes: usize,
    pub edges: usize,
}

/// Summary of one complete load pass.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub id: LoadId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub sources: Vec<SourceReport>,
    pub diagnostics: Vec<Diagnostic>,
    pub total_nodes: usize,
    pub total_edges: usize,
}

impl LoadReport {
    pub fn start() -> Self {
        Self {
            id: LoadId::new(),
            started_at: Utc::now(),
            finished_at: None,
            sources: Vec::new(),
            diagnostics: Vec::new(),
            total_nodes: 0,
            total_edges: 0,
        }
    }

    /// Record a diagnostic and log it.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(kind = diagnostic.kind(), "{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub fn finish(&mut self, total_nodes: usize, total_edges: usize) {
        self.total_nodes = total_nodes;
        self.total_edges = total_edges;
        self.finished_at = Some(Utc::now());
    }

    /// Diagnostics of the given kind.
    pub fn diagnostics_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind() == kind)
    }

    pub fn has_malformed_sources(&self) -> bool {
        self.sources
            .iter()
            .any(|s| s.status == SourceStatus::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_tags() {
        let diagnostic = Diagnostic::UnresolvedOwnership {
            team: "team:payments".to_string(),
            target: "ledger".to_string(),
        };

        let json = serde_json::to_string(&diagnostic).unwrap();
        assert!(json.contains("\"kind\":\"unresolved_ownership\""));
        assert_eq!(diagnostic.kind(), "unresolved_ownership");
    }

    #[test]
    fn report_collects_diagnostics() {
        let mut report = LoadReport::start();
        report.push(Diagnostic::SourceSkipped {
            source: "k8s.yaml".to_string(),
            reason: "not found".to_string(),
        });
        report.push(Diagnostic::DanglingEdge {
            edge_id: "edge:a-calls-b".to_string(),
            missing: "service:b".to_string(),
        });
        report.finish(3, 1);

        assert_eq!(report.diagnostics.len(), 2);
        assert_eq!(report.diagnostics_of("dangling_edge").count(), 1);
        assert!(report.finished_at.is_some());
        assert!(!report.has_malformed_sources());
    }

    #[test]
    fn report_serializes_source_summaries() {
        let mut report = LoadReport::start();
        report.sources.push(SourceReport {
            path: "data/teams.yaml".to_string(),
            kind: SourceKind::Teams,
            status: SourceStatus::Loaded,
            digest: None,
            nodes: 2,
            edges: 3,
        });
        report.finish(2, 3);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sources"][0]["kind"], "teams");
        assert_eq!(json["sources"][0]["status"], "loaded");
        assert_eq!(json["total_edges"], 3);
    }
}
