//! Core traversal algorithms: bounded BFS closure and unweighted shortest path.
//!
//! Both run directly against the store's adjacency indexes. Neighbors are
//! always expanded in ascending id order, so results are reproducible.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::Serialize;

use infragraph_core::{EdgeType, Node};
use infragraph_store::GraphStore;

use crate::error::{QueryError, Result};

/// Which way edges are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// From source to target: what a node depends on.
    Downstream,
    /// From target to source: what depends on a node.
    Upstream,
}

/// Neighbor ids of `id` across edges of the given types, in id order.
fn neighbors(
    store: &GraphStore,
    id: &str,
    direction: Direction,
    edge_types: &[EdgeType],
) -> Result<BTreeSet<String>> {
    let edges = match direction {
        Direction::Downstream => store.outgoing_edges(id)?,
        Direction::Upstream => store.incoming_edges(id)?,
    };
    Ok(edges
        .into_iter()
        .filter(|e| edge_types.contains(&e.edge_type))
        .map(|e| match direction {
            Direction::Downstream => e.target,
            Direction::Upstream => e.source,
        })
        .collect())
}

/// Neighbor ids ignoring edge direction, in id order.
fn undirected_neighbors(store: &GraphStore, id: &str) -> Result<BTreeSet<String>> {
    let mut out: BTreeSet<String> = store
        .outgoing_edges(id)?
        .into_iter()
        .map(|e| e.target)
        .collect();
    out.extend(store.incoming_edges(id)?.into_iter().map(|e| e.source));
    Ok(out)
}

fn load_nodes(store: &GraphStore, ids: &[String]) -> Result<Vec<Node>> {
    ids.iter()
        .map(|id| {
            store
                .get_node(id)?
                .ok_or_else(|| QueryError::NotFound { id: id.clone() })
        })
        .collect()
}

/// All nodes reachable from `start` within `max_depth` hops.
///
/// The start node is excluded and every node appears once, in BFS
/// discovery order.
pub fn closure(
    store: &GraphStore,
    start: &str,
    direction: Direction,
    max_depth: usize,
    edge_types: &[EdgeType],
) -> Result<Vec<Node>> {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.to_string());

    let mut found = Vec::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    queue.push_back((start.to_string(), 0));

    while let Some((id, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for next in neighbors(store, &id, direction, edge_types)? {
            if visited.insert(next.clone()) {
                found.push(next.clone());
                queue.push_back((next, depth + 1));
            }
        }
    }

    load_nodes(store, &found)
}

/// Unweighted shortest path between two nodes over undirected edges.
///
/// Returns the inclusive node sequence, or an empty vector when `to` is not
/// reachable within `max_hops`. Among equally short paths, the one found by
/// expanding the smallest neighbor id first wins.
pub fn shortest_path(
    store: &GraphStore,
    from: &str,
    to: &str,
    max_hops: usize,
) -> Result<Vec<Node>> {
    if from == to {
        return load_nodes(store, &[from.to_string()]);
    }

    // child -> parent
    let mut parents: HashMap<String, String> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(from.to_string());

    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    queue.push_back((from.to_string(), 0));

    'search: while let Some((id, hops)) = queue.pop_front() {
        if hops >= max_hops {
            continue;
        }
        for next in undirected_neighbors(store, &id)? {
            if !visited.insert(next.clone()) {
                continue;
            }
            parents.insert(next.clone(), id.clone());
            if next == to {
                break 'search;
            }
            queue.push_back((next, hops + 1));
        }
    }

    if !parents.contains_key(to) {
        return Ok(Vec::new());
    }

    let mut ids = vec![to.to_string()];
    let mut cursor = to;
    while let Some(parent) = parents.get(cursor) {
        ids.push(parent.clone());
        cursor = parent.as_str();
    }
    ids.reverse();

    load_nodes(store, &ids)
}
