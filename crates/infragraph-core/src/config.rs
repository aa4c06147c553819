//! Configuration management for infragraph.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`INFRAGRAPH__` prefix, `__` separator,
//!    e.g. `INFRAGRAPH__QUERY__MAX_DEPTH=6`)
//! 2. Config file (`infragraph.toml`, or any prefix passed to [`AppConfig::load`])
//! 3. Defaults

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Sources to ingest. Order here does not matter: the pipeline always
    /// merges compose, then teams, then cluster sources.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

/// The format of a configuration source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Compose-style service manifest.
    Compose,
    /// Team roster with ownership declarations.
    Teams,
    /// Cluster deployment manifests (multi-document YAML).
    Cluster,
}

impl SourceKind {
    /// Merge precedence: lower values are merged first.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Compose => 0,
            Self::Teams => 1,
            Self::Cluster => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compose => "compose",
            Self::Teams => "teams",
            Self::Cluster => "cluster",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configuration file to ingest.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub path: String,

    /// A missing optional source is skipped instead of reported as malformed.
    #[serde(default)]
    pub optional: bool,
}

impl SourceConfig {
    pub fn new(kind: SourceKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Traversal limits for the query engine.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Default hop limit for upstream/downstream closure.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Hop bound for shortest-path search.
    #[serde(default = "default_max_path_hops")]
    pub max_path_hops: usize,
}

/// Graph store settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Name used to identify the store instance in logs.
    #[serde(default = "default_store_name")]
    pub name: String,
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new(SourceKind::Compose, "data/docker-compose.yml"),
        SourceConfig::new(SourceKind::Teams, "data/teams.yaml"),
        SourceConfig::new(SourceKind::Cluster, "data/k8s-deployments.yaml").optional(),
    ]
}

fn default_max_depth() -> usize {
    10
}

fn default_max_path_hops() -> usize {
    15
}

fn default_store_name() -> String {
    "memory".to_string()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_path_hops: default_max_path_hops(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_store_name(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            query: QueryConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `<file_prefix>.{toml,yaml,json}` (optional) and the environment.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("INFRAGRAPH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.query.max_depth, 10);
        assert_eq!(config.query.max_path_hops, 15);
        assert_eq!(config.sources.len(), 3);
        assert!(config.sources[2].optional);
        assert_eq!(config.sources[2].kind, SourceKind::Cluster);
    }

    #[test]
    fn test_source_precedence() {
        let mut kinds = vec![SourceKind::Cluster, SourceKind::Compose, SourceKind::Teams];
        kinds.sort_by_key(|k| k.precedence());
        assert_eq!(
            kinds,
            vec![SourceKind::Compose, SourceKind::Teams, SourceKind::Cluster]
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.toml");
        std::fs::write(
            &path,
            r#"
[query]
max_depth = 4

[[sources]]
kind = "teams"
path = "teams.yaml"

[[sources]]
kind = "compose"
path = "compose.yml"
optional = true
"#,
        )
        .unwrap();

        let prefix = dir.path().join("graph");
        let config = AppConfig::load(prefix.to_str().unwrap()).unwrap();

        assert_eq!(config.query.max_depth, 4);
        assert_eq!(config.query.max_path_hops, 15);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].kind, SourceKind::Teams);
        assert!(config.sources[1].optional);
        assert_eq!(config.store.name, "memory");
    }
}
