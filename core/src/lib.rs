//! ontograph-core: In-memory attributed graph engine.
//!
//! A pure Rust library that keeps a sorted adjacency store with per-node and
//! per-edge attribute maps, and runs classical algorithms over it: BFS, DFS
//! with edge classification and topological order, Bellman-Ford,
//! Floyd-Warshall, and the longest-path traversal used to measure hierarchy
//! depth. The `concept` module adds transitive-closure queries over a
//! Term/Product annotation graph.
//!
//! Every algorithm borrows the graph immutably and returns its own result
//! value. Loading from file formats is left to callers.

mod concept;
mod config;
mod error;
mod graph;
mod longest_path;
mod shortest_path;
mod traversal;

pub use concept::{
    add_product, add_term, ancestor_closure, ancestor_closure_into, annotate, depth_by_namespace,
    descendant_closure, descendant_closure_into, hierarchy_reversed, link, products, root_depths,
    terms, Closure, DescendantIndex, EdgeKind, NodeKind, EVIDENCE_CODES_ATTR, ID_ATTR, NAME_ATTR,
    NAMESPACE_ATTR, TYPE_ATTR,
};
pub use config::{GraphConfig, DEFAULT_MAX_MATRIX_NODES, DEFAULT_WEIGHT_ATTRIBUTE};
pub use error::{GraphError, Result};
pub use graph::{Attributes, EdgeId, Graph, OrdinalIndex};
pub use longest_path::{longest_path_from, sinks, LongestPath};
pub use shortest_path::{
    bellman_ford, floyd_warshall, initialize_single_source, relax, AllPairs, ShortestPaths,
};
pub use traversal::{bfs, dfs, BfsResult, DfsResult, EdgeClass};
