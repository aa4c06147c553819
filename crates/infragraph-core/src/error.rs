use thiserror::Error;

/// Shared error type for the data model and configuration layer.
#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Invalid node id: {0} (expected \"<type>:<name>\")")]
    InvalidNodeId(String),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown edge type: {0}")]
    UnknownEdgeType(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TopologyError>;
