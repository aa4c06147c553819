//! infragraph-ingest: turns configuration sources into topology graph content.
//!
//! Each supported format has a [`connector::Connector`] that produces a
//! [`connector::SourceBatch`]. The [`pipeline::IngestPipeline`] merges the
//! batches into a [`infragraph_store::GraphStore`] in a fixed order, resolves
//! ownership declarations, and records every problem in a load report.

pub mod cluster;
pub mod compose;
pub mod connector;
pub mod error;
pub mod infer;
pub mod merge;
pub mod ownership;
pub mod pipeline;
pub mod teams;

pub use connector::{Connector, Enrichment, SourceBatch, SourceConnector};
pub use error::IngestError;
pub use pipeline::{load_store, IngestPipeline};
