use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::graph::Graph;

/// Single-source shortest path distances and predecessors.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    pub source: String,
    /// Distance per node. `None` means unreachable (∞).
    pub distance: BTreeMap<String, Option<i64>>,
    pub predecessor: BTreeMap<String, Option<String>>,
}

impl ShortestPaths {
    pub fn distance(&self, id: &str) -> Option<i64> {
        self.distance.get(id).copied().flatten()
    }

    pub fn predecessor(&self, id: &str) -> Option<&str> {
        self.predecessor.get(id).and_then(|p| p.as_deref())
    }

    /// Path from the source to `target` along predecessors, both ends
    /// included. `None` if unreachable, or if the predecessor chain does not
    /// lead back to the source (only possible with a negative cycle).
    pub fn path_to(&self, target: &str) -> Option<Vec<String>> {
        self.distance(target)?;
        let mut path = vec![target.to_string()];
        let mut current = target;
        while current != self.source {
            if path.len() > self.distance.len() {
                return None;
            }
            current = self.predecessor(current)?;
            path.push(current.to_string());
        }
        path.reverse();
        Some(path)
    }
}

/// All distances ∞ except `source` = 0; no predecessors.
pub fn initialize_single_source(graph: &Graph, source: &str) -> Result<ShortestPaths> {
    if !graph.contains_node(source) {
        return Err(GraphError::NodeNotFound(source.to_string()));
    }
    let mut distance: BTreeMap<String, Option<i64>> =
        graph.node_ids().map(|id| (id.to_string(), None)).collect();
    distance.insert(source.to_string(), Some(0));
    Ok(ShortestPaths {
        source: source.to_string(),
        distance,
        predecessor: graph.node_ids().map(|id| (id.to_string(), None)).collect(),
    })
}

/// Relax edge `u -> v` using its weight in `graph`. Returns whether
/// `dist[v]` improved.
///
/// `NodeNotFound` if either endpoint is unknown to `graph` or `paths`,
/// `EdgeNotFound` if `u -> v` is not an edge.
pub fn relax(graph: &Graph, paths: &mut ShortestPaths, u: &str, v: &str) -> Result<bool> {
    for id in [u, v] {
        if !graph.contains_node(id) || !paths.distance.contains_key(id) {
            return Err(GraphError::NodeNotFound(id.to_string()));
        }
    }
    let weight = graph.edge_weight(u, v)?;
    Ok(relax_weighted(paths, u, v, weight))
}

fn relax_weighted(paths: &mut ShortestPaths, u: &str, v: &str, weight: i64) -> bool {
    // ∞ + w stays ∞ and never improves anything.
    let Some(du) = paths.distance(u) else {
        return false;
    };
    let candidate = du.saturating_add(weight);
    let improves = paths.distance(v).map_or(true, |dv| dv > candidate);
    if improves {
        if let Some(slot) = paths.distance.get_mut(v) {
            *slot = Some(candidate);
        }
        if let Some(slot) = paths.predecessor.get_mut(v) {
            *slot = Some(u.to_string());
        }
    }
    improves
}

/// Bellman-Ford single-source shortest paths over integer edge weights.
///
/// Runs exactly `node_count - 1` passes relaxing every adjacency entry in
/// ascending `(src, dst)` order. There is no negative-cycle check after the
/// passes: on a graph with a reachable negative cycle the distances returned
/// are whatever the last pass left, not shortest paths.
pub fn bellman_ford(graph: &Graph, source: &str) -> Result<ShortestPaths> {
    let mut paths = initialize_single_source(graph, source)?;

    let weighted_edges = graph
        .edges()
        .map(|(src, dst, _)| graph.edge_weight(src, dst).map(|w| (src, dst, w)))
        .collect::<Result<Vec<_>>>()?;

    let passes = graph.node_count().saturating_sub(1);
    for _ in 0..passes {
        for &(src, dst, weight) in &weighted_edges {
            relax_weighted(&mut paths, src, dst, weight);
        }
    }

    debug!(
        source,
        passes,
        edges = weighted_edges.len(),
        reached = paths.distance.values().filter(|d| d.is_some()).count(),
        "bellman-ford complete"
    );

    Ok(paths)
}

/// All-pairs shortest paths in ordinal space, with a successor matrix for
/// path reconstruction.
#[derive(Debug, Clone)]
pub struct AllPairs {
    /// Node id per ordinal, ascending.
    ids: Vec<String>,
    /// Row-major n×n distances. `None` is ∞.
    distances: Vec<Option<i64>>,
    /// Row-major n×n first hop from row toward column. `None` on the
    /// diagonal and where no path exists.
    successors: Vec<Option<usize>>,
    diameter: i64,
}

impl AllPairs {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Ordinal of `id` at the time the matrices were built.
    pub fn ordinal(&self, id: &str) -> Option<usize> {
        self.ids.binary_search_by(|probe| probe.as_str().cmp(id)).ok()
    }

    pub fn distance(&self, i: usize, j: usize) -> Option<i64> {
        let n = self.len();
        if i >= n || j >= n {
            return None;
        }
        self.distances[i * n + j]
    }

    pub fn successor(&self, i: usize, j: usize) -> Option<usize> {
        let n = self.len();
        if i >= n || j >= n {
            return None;
        }
        self.successors[i * n + j]
    }

    /// Largest finite distance in the matrix (0 for an empty graph).
    pub fn diameter(&self) -> i64 {
        self.diameter
    }

    /// Ordinals on the shortest path from `i` to `j`, both ends included.
    ///
    /// Walks forward `i -> N[i][j] -> N[N[i][j]][j] -> ...` until the next
    /// hop is `j`. `None` when `j` is unreachable from `i`.
    pub fn path(&self, i: usize, j: usize) -> Option<Vec<usize>> {
        self.distance(i, j)?;
        let mut path = vec![i];
        if i == j {
            return Some(path);
        }
        let mut current = i;
        // A simple path has at most n - 1 hops; more means a negative cycle.
        for _ in 0..self.len() {
            let next = self.successor(current, j)?;
            path.push(next);
            if next == j {
                return Some(path);
            }
            current = next;
        }
        None
    }

    pub fn distance_between(&self, src: &str, dst: &str) -> Result<Option<i64>> {
        let (i, j) = self.endpoints(src, dst)?;
        Ok(self.distance(i, j))
    }

    pub fn path_between(&self, src: &str, dst: &str) -> Result<Option<Vec<String>>> {
        let (i, j) = self.endpoints(src, dst)?;
        Ok(self
            .path(i, j)
            .map(|ordinals| ordinals.into_iter().map(|o| self.ids[o].clone()).collect()))
    }

    fn endpoints(&self, src: &str, dst: &str) -> Result<(usize, usize)> {
        let i = self
            .ordinal(src)
            .ok_or_else(|| GraphError::NodeNotFound(src.to_string()))?;
        let j = self
            .ordinal(dst)
            .ok_or_else(|| GraphError::NodeNotFound(dst.to_string()))?;
        Ok((i, j))
    }
}

/// Floyd-Warshall all-pairs shortest paths.
///
/// Requires a current ordinal assignment (`Graph::assign_indices`). Direct
/// edges seed the distance matrix with their weight (1 on unweighted graphs)
/// and the successor matrix with the destination; the diagonal is 0. When a
/// path through `k` is shorter, `N[i][j]` takes the first hop toward `k`.
pub fn floyd_warshall(graph: &Graph) -> Result<AllPairs> {
    let index = graph.ordinals().map_err(|e| {
        warn!("floyd-warshall requested without a current ordinal assignment");
        e
    })?;
    let n = index.len();
    let limit = graph.config().max_matrix_nodes;
    if n > limit {
        warn!(nodes = n, limit, "graph too large for floyd-warshall matrices");
        return Err(GraphError::MatrixTooLarge { nodes: n, limit });
    }

    let mut dist: Vec<Option<i64>> = vec![None; n * n];
    let mut next: Vec<Option<usize>> = vec![None; n * n];

    for (src, dst, _) in graph.edges() {
        let (Some(i), Some(j)) = (index.get(src), index.get(dst)) else {
            return Err(GraphError::StaleIndex);
        };
        dist[i * n + j] = Some(graph.edge_weight(src, dst)?);
        next[i * n + j] = Some(j);
    }
    for i in 0..n {
        dist[i * n + i] = Some(0);
        next[i * n + i] = None;
    }

    for k in 0..n {
        for i in 0..n {
            let Some(ik) = dist[i * n + k] else {
                continue;
            };
            for j in 0..n {
                let Some(kj) = dist[k * n + j] else {
                    continue;
                };
                let through = ik.saturating_add(kj);
                if dist[i * n + j].map_or(true, |ij| through < ij) {
                    dist[i * n + j] = Some(through);
                    next[i * n + j] = next[i * n + k];
                }
            }
        }
    }

    let diameter = dist.iter().flatten().copied().max().unwrap_or(0);

    debug!(nodes = n, diameter, "floyd-warshall complete");

    Ok(AllPairs {
        ids: index.ids().to_vec(),
        distances: dist,
        successors: next,
        diameter,
    })
}
