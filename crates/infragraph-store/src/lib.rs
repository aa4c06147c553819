//! infragraph-store: in-memory store for the topology graph.
//!
//! This crate is the single mutation point for the topology graph. All
//! reads and writes flow through [`GraphStore`] so that merge semantics,
//! lifecycle checks and adjacency indexes stay consistent.

pub mod mutations;
pub mod queries;
pub mod store;

pub use store::{GraphStore, StoreError, StoreState};
