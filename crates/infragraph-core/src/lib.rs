//! infragraph-core: Shared types, configuration, and error handling for infragraph.
//!
//! This crate provides the foundational types used across all infragraph components:
//! - Node types (service, database, cache, team) for the topology graph
//! - Edge types (calls, reads_from, uses, owns) for graph relationships
//! - Load diagnostics and the load report
//! - Configuration management
//! - Common error types

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod types;

pub use diagnostics::{Diagnostic, LoadReport};
pub use error::TopologyError;
pub use types::{Edge, EdgeType, Node, NodeType, Properties, PropertyValue};
