//! Error types for the infragraph-ingest crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Malformed source {source_path}: {message}")]
    MalformedSource {
        source_path: String,
        message: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] infragraph_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub fn malformed(source_path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::MalformedSource {
            source_path: source_path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
