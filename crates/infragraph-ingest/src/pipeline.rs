//! Load pipeline.
//!
//! Reads every configured source concurrently, one tokio task each, then
//! parses and merges them one at a time in the fixed kind order compose,
//! teams, cluster. Dependency edges are persisted after all nodes exist;
//! ownership edges are resolved last against the complete node set.

use infragraph_core::config::{AppConfig, SourceConfig};
use infragraph_core::diagnostics::{SourceReport, SourceStatus};
use infragraph_core::{Diagnostic, Edge, EdgeType, LoadReport};
use infragraph_store::GraphStore;

use crate::connector::{Connector, SourceBatch, SourceConnector};
use crate::error::Result;
use crate::merge::{merge_batch, persist_edges, remap_edges};
use crate::ownership::OwnershipResolver;

/// A batch load over a fixed set of sources.
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    sources: Vec<SourceConfig>,
}

impl IngestPipeline {
    /// Sources are ordered by kind precedence; the sort is stable so the
    /// configured order is kept within a kind.
    pub fn new(mut sources: Vec<SourceConfig>) -> Self {
        sources.sort_by_key(|s| s.kind.precedence());
        Self { sources }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.sources.clone())
    }

    /// Sources in merge order.
    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    /// Load every source into `store` and report what happened.
    ///
    /// Only store failures abort the run. Unreadable or malformed sources
    /// are recorded in the report and the remaining sources still load.
    pub async fn run(&self, store: &GraphStore) -> Result<LoadReport> {
        store.connect()?;
        let mut report = LoadReport::start();
        tracing::info!(load_id = %report.id.0, sources = self.sources.len(), "Load started");

        let reads: Vec<_> = self
            .sources
            .iter()
            .map(|source| {
                let path = source.path.clone();
                tokio::spawn(async move { tokio::fs::read_to_string(path).await })
            })
            .collect();

        let mut dependencies: Vec<Edge> = Vec::new();
        let mut ownership: Vec<Edge> = Vec::new();

        for (source, read) in self.sources.iter().zip(reads) {
            let content = match read.await {
                Ok(Ok(content)) => content,
                Ok(Err(e)) if source.optional && e.kind() == std::io::ErrorKind::NotFound => {
                    report.push(Diagnostic::SourceSkipped {
                        source: source.path.clone(),
                        reason: e.to_string(),
                    });
                    report.sources.push(source_report(source, SourceStatus::Skipped, None, None));
                    continue;
                }
                Ok(Err(e)) => {
                    record_malformed(&mut report, source, None, e.to_string());
                    continue;
                }
                Err(e) => {
                    record_malformed(&mut report, source, None, format!("read task failed: {e}"));
                    continue;
                }
            };

            let digest = blake3::hash(content.as_bytes()).to_hex().to_string();
            let batch = match SourceConnector::for_kind(source.kind).parse(&source.path, &content) {
                Ok(batch) => batch,
                Err(e) => {
                    record_malformed(&mut report, source, Some(digest), e.to_string());
                    continue;
                }
            };

            let remap = merge_batch(store, &source.path, &batch, &mut report)?;
            let (owns, deps): (Vec<Edge>, Vec<Edge>) = remap_edges(&batch.edges, &remap)
                .into_iter()
                .partition(|e| e.edge_type == EdgeType::Owns);
            ownership.extend(owns);
            dependencies.extend(deps);

            tracing::info!(
                source = %source.path,
                kind = %source.kind,
                nodes = batch.nodes.len(),
                enrichments = batch.enrichments.len(),
                edges = batch.edges.len(),
                "Source loaded"
            );
            report.sources.push(source_report(
                source,
                SourceStatus::Loaded,
                Some(digest),
                Some(&batch),
            ));
        }

        let dependency_edges = persist_edges(store, &dependencies, &mut report)?;

        let nodes = store.get_nodes(None, None)?;
        let resolver = OwnershipResolver::new(&nodes);
        let mut resolved = Vec::with_capacity(ownership.len());
        for raw in &ownership {
            let resolution = resolver.resolve(raw);
            if let Some(diagnostic) = resolution.diagnostic(raw) {
                report.push(diagnostic);
            }
            if let Some(edge) = resolution.edge() {
                resolved.push(edge.clone());
            }
        }
        let ownership_edges = persist_edges(store, &resolved, &mut report)?;

        store.mark_loaded()?;
        report.finish(store.node_count()?, store.edge_count()?);

        tracing::info!(
            load_id = %report.id.0,
            nodes = report.total_nodes,
            edges = report.total_edges,
            dependency_edges,
            ownership_edges,
            diagnostics = report.diagnostics.len(),
            "Load complete"
        );
        Ok(report)
    }
}

/// Build a fresh store from configuration and load it.
pub async fn load_store(config: &AppConfig) -> Result<(GraphStore, LoadReport)> {
    let store = GraphStore::open(config.store.clone())?;
    let report = IngestPipeline::from_config(config).run(&store).await?;
    Ok((store, report))
}

fn record_malformed(
    report: &mut LoadReport,
    source: &SourceConfig,
    digest: Option<String>,
    message: String,
) {
    report.push(Diagnostic::MalformedSource {
        source: source.path.clone(),
        message,
    });
    report
        .sources
        .push(source_report(source, SourceStatus::Malformed, digest, None));
}

fn source_report(
    source: &SourceConfig,
    status: SourceStatus,
    digest: Option<String>,
    batch: Option<&SourceBatch>,
) -> SourceReport {
    let (nodes, edges) = batch
        .map(|b| {
            let created = b.enrichments.iter().filter(|e| e.fallback.is_some()).count();
            (b.nodes.len() + created, b.edges.len())
        })
        .unwrap_or((0, 0));
    SourceReport {
        path: source.path.clone(),
        kind: source.kind,
        status,
        digest,
        nodes,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use infragraph_core::config::SourceKind;

    use super::*;

    #[test]
    fn test_sources_sorted_by_precedence() {
        let pipeline = IngestPipeline::new(vec![
            SourceConfig::new(SourceKind::Cluster, "k8s.yaml"),
            SourceConfig::new(SourceKind::Teams, "teams-b.yaml"),
            SourceConfig::new(SourceKind::Compose, "compose.yml"),
            SourceConfig::new(SourceKind::Teams, "teams-a.yaml"),
        ]);

        let order: Vec<&str> = pipeline.sources().iter().map(|s| s.path.as_str()).collect();
        assert_eq!(order, vec!["compose.yml", "teams-b.yaml", "teams-a.yaml", "k8s.yaml"]);
    }

    #[tokio::test]
    async fn test_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        let required = dir.path().join("compose.yml");
        let optional = dir.path().join("k8s.yaml");

        let pipeline = IngestPipeline::new(vec![
            SourceConfig::new(SourceKind::Compose, required.to_string_lossy()),
            SourceConfig::new(SourceKind::Cluster, optional.to_string_lossy()).optional(),
        ]);
        let store = GraphStore::default();
        let report = pipeline.run(&store).await.unwrap();

        assert!(report.has_malformed_sources());
        assert_eq!(report.diagnostics_of("malformed_source").count(), 1);
        assert_eq!(report.diagnostics_of("source_skipped").count(), 1);
        assert_eq!(report.sources[1].status, SourceStatus::Skipped);
        assert_eq!(report.total_nodes, 0);
        assert!(report.finished_at.is_some());
    }
}
