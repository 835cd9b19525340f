use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::graph::Graph;

/// Longest hop distances from a single source.
#[derive(Debug, Clone)]
pub struct LongestPath {
    pub source: String,
    /// Best hop distance for every node reached, including the source at 0.
    pub distance: BTreeMap<String, u32>,
    /// Largest distance reached (0 when nothing but the source is reachable).
    pub max_distance: u32,
}

/// Longest hop distance from `source` to every reachable node.
///
/// Queue-driven like BFS, but a node is re-enqueued each time its best
/// distance grows, so the bound propagates along every path rather than the
/// first one found. The input must be acyclic. A distance larger than
/// `node_count - 1` can only come from a cycle; it is reported as
/// `CycleDetected` instead of looping forever.
pub fn longest_path_from(graph: &Graph, source: &str) -> Result<LongestPath> {
    if !graph.contains_node(source) {
        return Err(GraphError::NodeNotFound(source.to_string()));
    }

    let limit = graph.node_count().saturating_sub(1) as u32;
    let mut best: HashMap<&str, u32> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    let mut enqueued: usize = 1;

    best.insert(source, 0);
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        let depth = best.get(current).copied().unwrap_or(0);
        for next in graph.neighbors(current) {
            let candidate = depth + 1;
            if candidate > limit {
                warn!(source, node = next, "cycle reached during longest-path traversal");
                return Err(GraphError::CycleDetected {
                    source_id: source.to_string(),
                });
            }
            if best.get(next).map_or(true, |&b| candidate > b) {
                best.insert(next, candidate);
                queue.push_back(next);
                enqueued += 1;
            }
        }
    }

    let max_distance = best.values().copied().max().unwrap_or(0);
    debug!(source, reached = best.len(), enqueued, max_distance, "longest path complete");

    Ok(LongestPath {
        source: source.to_string(),
        distance: best.into_iter().map(|(id, d)| (id.to_string(), d)).collect(),
        max_distance,
    })
}

/// Nodes without outgoing edges, ascending.
pub fn sinks(graph: &Graph) -> Vec<&str> {
    graph.node_ids().filter(|id| graph.out_degree(id) == 0).collect()
}
