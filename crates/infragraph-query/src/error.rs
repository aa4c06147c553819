//! Error types for the infragraph-query crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Node not found: {id}")]
    NotFound { id: String },

    #[error("Node {node_id} has more than one owner: {}", owners.join(", "))]
    AmbiguousOwner { node_id: String, owners: Vec<String> },

    #[error("Missing parameter: {name}")]
    MissingParam { name: &'static str },

    #[error("Unknown intent")]
    UnknownIntent,

    #[error("Store error: {0}")]
    Store(#[from] infragraph_store::StoreError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] infragraph_ingest::IngestError),

    #[error(transparent)]
    Topology(#[from] infragraph_core::TopologyError),
}

pub type Result<T> = std::result::Result<T, QueryError>;
