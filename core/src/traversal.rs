use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::{EdgeId, Graph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not yet discovered.
    White,
    /// Discovered, still on the frontier (BFS queue or DFS stack).
    Gray,
    /// Finished.
    Black,
}

/// Classification of an edge traversed by [`dfs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeClass {
    Tree,
    Back,
    Forward,
    Cross,
}

/// Result of a breadth-first search.
#[derive(Debug, Clone)]
pub struct BfsResult {
    pub source: String,
    /// Hop distance per node. `None` means unreachable.
    pub distance: BTreeMap<String, Option<u32>>,
    pub predecessor: BTreeMap<String, Option<String>>,
    /// Nodes in the order they left the queue.
    pub order: Vec<String>,
}

impl BfsResult {
    pub fn distance(&self, id: &str) -> Option<u32> {
        self.distance.get(id).copied().flatten()
    }

    pub fn predecessor(&self, id: &str) -> Option<&str> {
        self.predecessor.get(id).and_then(|p| p.as_deref())
    }

    /// Hop path from the source to `target` along the BFS tree, both ends
    /// included. `None` if `target` was not reached.
    pub fn path_to(&self, target: &str) -> Option<Vec<String>> {
        self.distance(target)?;
        let mut path = vec![target.to_string()];
        let mut current = target;
        while let Some(parent) = self.predecessor(current) {
            path.push(parent.to_string());
            current = parent;
        }
        path.reverse();
        Some(path)
    }
}

/// Result of a full depth-first search.
#[derive(Debug, Clone)]
pub struct DfsResult {
    /// Discovery time per node; the clock starts at 1.
    pub discovery: BTreeMap<String, u32>,
    pub finish: BTreeMap<String, u32>,
    pub predecessor: BTreeMap<String, Option<String>>,
    pub edge_classes: BTreeMap<(String, String), EdgeClass>,
    /// True iff at least one back edge was found.
    pub cyclic: bool,
    /// Nodes by descending finish time. `None` when the graph is cyclic.
    pub topological_order: Option<Vec<String>>,
}

impl DfsResult {
    pub fn classify(&self, src: &str, dst: &str) -> Option<EdgeClass> {
        self.edge_classes
            .get(&(src.to_string(), dst.to_string()))
            .copied()
    }

    /// Edges with the given classification, ascending by `(src, dst)`.
    pub fn edges_of(&self, class: EdgeClass) -> impl Iterator<Item = (&str, &str)> {
        self.edge_classes
            .iter()
            .filter(move |(_, &c)| c == class)
            .map(|((src, dst), _)| (src.as_str(), dst.as_str()))
    }
}

/// Breadth-first search from `source`.
///
/// Neighbors of each dequeued node are visited in ascending id order, so the
/// predecessor chosen among equally distant parents is deterministic.
pub fn bfs(graph: &Graph, source: &str) -> Result<BfsResult> {
    if !graph.contains_node(source) {
        return Err(GraphError::NodeNotFound(source.to_string()));
    }

    let mut color: HashMap<&str, Color> = graph.node_ids().map(|id| (id, Color::White)).collect();
    let mut distance: BTreeMap<&str, Option<u32>> = graph.node_ids().map(|id| (id, None)).collect();
    let mut predecessor: BTreeMap<&str, Option<&str>> =
        graph.node_ids().map(|id| (id, None)).collect();
    let mut order: Vec<&str> = Vec::new();
    let mut queue: VecDeque<(&str, u32)> = VecDeque::new();

    color.insert(source, Color::Gray);
    distance.insert(source, Some(0));
    queue.push_back((source, 0));

    while let Some((current, depth)) = queue.pop_front() {
        order.push(current);
        for next in graph.neighbors(current) {
            if color.get(next) == Some(&Color::White) {
                color.insert(next, Color::Gray);
                distance.insert(next, Some(depth + 1));
                predecessor.insert(next, Some(current));
                queue.push_back((next, depth + 1));
            }
        }
        color.insert(current, Color::Black);
    }

    debug!(source, reached = order.len(), nodes = graph.node_count(), "bfs complete");

    Ok(BfsResult {
        source: source.to_string(),
        distance: distance
            .into_iter()
            .map(|(id, d)| (id.to_string(), d))
            .collect(),
        predecessor: predecessor
            .into_iter()
            .map(|(id, p)| (id.to_string(), p.map(str::to_string)))
            .collect(),
        order: order.into_iter().map(str::to_string).collect(),
    })
}

/// One node on the explicit DFS stack, with the cursor into its sorted
/// neighbor list.
struct Frame<'g> {
    node: &'g str,
    neighbors: Option<std::collections::btree_map::Keys<'g, String, EdgeId>>,
}

/// Depth-first search over the whole graph.
///
/// Roots are taken in ascending id order and neighbors are visited in
/// ascending id order. Edges are classified when examined:
/// an in-progress destination is a back edge (and marks the graph cyclic),
/// a finished destination is a cross edge if it was discovered before the
/// source and a forward edge otherwise, an undiscovered one is a tree edge.
///
/// On undirected graphs the edge back to the parent is examined too and is
/// classified as a back edge, so `cyclic` is only meaningful for directed
/// graphs.
pub fn dfs(graph: &Graph) -> DfsResult {
    let mut color: HashMap<&str, Color> = graph.node_ids().map(|id| (id, Color::White)).collect();
    let mut discovery: HashMap<&str, u32> = HashMap::with_capacity(graph.node_count());
    let mut finish: HashMap<&str, u32> = HashMap::with_capacity(graph.node_count());
    let mut predecessor: BTreeMap<&str, Option<&str>> =
        graph.node_ids().map(|id| (id, None)).collect();
    let mut edge_classes: BTreeMap<(&str, &str), EdgeClass> = BTreeMap::new();
    let mut cyclic = false;
    let mut time: u32 = 0;

    let mut stack: Vec<Frame> = Vec::new();

    for root in graph.node_ids() {
        if color.get(root) != Some(&Color::White) {
            continue;
        }

        time += 1;
        discovery.insert(root, time);
        color.insert(root, Color::Gray);
        stack.push(Frame {
            node: root,
            neighbors: graph.neighbor_keys(root),
        });

        while let Some(frame) = stack.last_mut() {
            let current = frame.node;
            let next = frame.neighbors.as_mut().and_then(|keys| keys.next());

            let Some(next) = next else {
                color.insert(current, Color::Black);
                time += 1;
                finish.insert(current, time);
                stack.pop();
                continue;
            };
            let next = next.as_str();

            let class = match color.get(next).copied().unwrap_or(Color::White) {
                Color::White => {
                    predecessor.insert(next, Some(current));
                    time += 1;
                    discovery.insert(next, time);
                    color.insert(next, Color::Gray);
                    stack.push(Frame {
                        node: next,
                        neighbors: graph.neighbor_keys(next),
                    });
                    EdgeClass::Tree
                }
                Color::Gray => {
                    cyclic = true;
                    EdgeClass::Back
                }
                Color::Black => {
                    if discovery[next] < discovery[current] {
                        EdgeClass::Cross
                    } else {
                        EdgeClass::Forward
                    }
                }
            };
            edge_classes.insert((current, next), class);
        }
    }

    let topological_order = if cyclic {
        None
    } else {
        let mut by_finish: Vec<(&str, u32)> = finish.iter().map(|(&id, &f)| (id, f)).collect();
        by_finish.sort_by(|a, b| b.1.cmp(&a.1));
        Some(by_finish.into_iter().map(|(id, _)| id.to_string()).collect())
    };

    debug!(
        nodes = graph.node_count(),
        classified_edges = edge_classes.len(),
        cyclic,
        "dfs complete"
    );

    DfsResult {
        discovery: discovery
            .into_iter()
            .map(|(id, d)| (id.to_string(), d))
            .collect(),
        finish: finish.into_iter().map(|(id, f)| (id.to_string(), f)).collect(),
        predecessor: predecessor
            .into_iter()
            .map(|(id, p)| (id.to_string(), p.map(str::to_string)))
            .collect(),
        edge_classes: edge_classes
            .into_iter()
            .map(|((src, dst), class)| ((src.to_string(), dst.to_string()), class))
            .collect(),
        cyclic,
        topological_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: usize) -> String {
        format!("n{:06}", i)
    }

    fn make_chain(n: usize) -> Graph {
        let mut g = Graph::new(true, false);
        for i in 0..n - 1 {
            g.add_edge(&id(i), &id(i + 1), None);
        }
        g
    }

    fn make_star(leaves: usize) -> Graph {
        let mut g = Graph::new(true, false);
        for i in 1..=leaves {
            g.add_edge("hub", &id(i), None);
        }
        g
    }

    fn make_cycle(n: usize) -> Graph {
        let mut g = Graph::new(true, false);
        for i in 0..n {
            g.add_edge(&id(i), &id((i + 1) % n), None);
        }
        g
    }

    fn make_graph(edges: &[(&str, &str)]) -> Graph {
        let mut g = Graph::new(true, false);
        for (src, dst) in edges {
            g.add_edge(src, dst, None);
        }
        g
    }

    // --- BFS tests ---

    #[test]
    fn test_bfs_chain() {
        let g = make_chain(6);
        let result = bfs(&g, &id(0)).unwrap();
        assert_eq!(result.distance(&id(0)), Some(0));
        assert_eq!(result.distance(&id(5)), Some(5));
        assert_eq!(result.predecessor(&id(5)), Some(id(4).as_str()));
        assert_eq!(result.order.len(), 6);
    }

    #[test]
    fn test_bfs_unreachable_is_none() {
        let g = make_chain(4);
        let result = bfs(&g, &id(2)).unwrap();
        assert_eq!(result.distance(&id(0)), None);
        assert_eq!(result.predecessor(&id(0)), None);
        assert_eq!(result.distance(&id(3)), Some(1));
        assert_eq!(result.distance.len(), 4);
    }

    #[test]
    fn test_bfs_star() {
        let g = make_star(100);
        let result = bfs(&g, "hub").unwrap();
        assert!(result.order.iter().skip(1).all(|n| result.distance(n) == Some(1)));
        // Leaves are dequeued in ascending id order.
        assert_eq!(result.order[1], id(1));
        assert_eq!(result.order[100], id(100));
    }

    #[test]
    fn test_bfs_cycle_no_infinite_loop() {
        let g = make_cycle(5);
        let result = bfs(&g, &id(0)).unwrap();
        assert_eq!(result.order.len(), 5);
        assert_eq!(result.distance(&id(4)), Some(4));
    }

    #[test]
    fn test_bfs_tie_break_ascending() {
        // Both a and b reach c at distance 2; a is examined first.
        let g = make_graph(&[("s", "b"), ("s", "a"), ("b", "c"), ("a", "c")]);
        let result = bfs(&g, "s").unwrap();
        assert_eq!(result.predecessor("c"), Some("a"));
        assert_eq!(result.order, vec!["s", "a", "b", "c"]);
    }

    #[test]
    fn test_bfs_self_loop() {
        let g = make_graph(&[("a", "a")]);
        let result = bfs(&g, "a").unwrap();
        assert_eq!(result.distance("a"), Some(0));
        assert_eq!(result.predecessor("a"), None);
    }

    #[test]
    fn test_bfs_undirected() {
        let mut g = Graph::new(false, false);
        g.add_edge("a", "b", None);
        let result = bfs(&g, "b").unwrap();
        assert_eq!(result.distance("a"), Some(1));
    }

    #[test]
    fn test_bfs_start_not_in_graph() {
        let g = make_chain(3);
        assert!(matches!(bfs(&g, "nope"), Err(GraphError::NodeNotFound(id)) if id == "nope"));
    }

    #[test]
    fn test_bfs_path_to() {
        let g = make_graph(&[("s", "a"), ("a", "t"), ("s", "x")]);
        let result = bfs(&g, "s").unwrap();
        assert_eq!(result.path_to("t").unwrap(), vec!["s", "a", "t"]);
        assert_eq!(result.path_to("s").unwrap(), vec!["s"]);
        let back = bfs(&g, "t").unwrap();
        assert!(back.path_to("s").is_none());
    }

    // --- DFS tests ---

    #[test]
    fn test_dfs_tree_and_forward_edges() {
        let g = make_graph(&[("a", "b"), ("b", "c"), ("a", "c")]);
        let result = dfs(&g);
        assert_eq!(result.discovery["a"], 1);
        assert_eq!(result.discovery["b"], 2);
        assert_eq!(result.discovery["c"], 3);
        assert_eq!(result.finish["c"], 4);
        assert_eq!(result.finish["b"], 5);
        assert_eq!(result.finish["a"], 6);
        assert_eq!(result.classify("a", "b"), Some(EdgeClass::Tree));
        assert_eq!(result.classify("b", "c"), Some(EdgeClass::Tree));
        assert_eq!(result.classify("a", "c"), Some(EdgeClass::Forward));
        assert!(!result.cyclic);
    }

    #[test]
    fn test_dfs_cross_edge() {
        let g = make_graph(&[("a", "b"), ("a", "c"), ("c", "b")]);
        let result = dfs(&g);
        assert_eq!(result.classify("c", "b"), Some(EdgeClass::Cross));
        assert_eq!(result.predecessor["c"].as_deref(), Some("a"));
    }

    #[test]
    fn test_dfs_cross_edge_between_trees() {
        // x is a later root whose edge points into the finished first tree.
        let g = make_graph(&[("a", "b"), ("x", "b")]);
        let result = dfs(&g);
        assert_eq!(result.classify("x", "b"), Some(EdgeClass::Cross));
        assert_eq!(result.predecessor["x"], None);
    }

    #[test]
    fn test_dfs_back_edge_marks_cyclic() {
        let g = make_cycle(4);
        let result = dfs(&g);
        assert!(result.cyclic);
        assert_eq!(result.classify(&id(3), &id(0)), Some(EdgeClass::Back));
        assert!(result.topological_order.is_none());
        assert_eq!(result.edges_of(EdgeClass::Back).count(), 1);
    }

    #[test]
    fn test_dfs_self_loop_is_back_edge() {
        let g = make_graph(&[("a", "a")]);
        let result = dfs(&g);
        assert_eq!(result.classify("a", "a"), Some(EdgeClass::Back));
        assert!(result.cyclic);
    }

    #[test]
    fn test_dfs_topological_order() {
        let g = make_graph(&[
            ("shirt", "tie"),
            ("tie", "jacket"),
            ("pants", "shoes"),
            ("pants", "belt"),
            ("belt", "jacket"),
            ("socks", "shoes"),
        ]);
        let result = dfs(&g);
        let order = result.topological_order.clone().unwrap();
        assert_eq!(order.len(), g.node_count());
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        for (src, dst, _) in g.edges() {
            assert!(pos(src) < pos(dst), "{} must precede {}", src, dst);
        }
    }

    #[test]
    fn test_dfs_disconnected_roots_ascending() {
        let mut g = make_graph(&[("b", "c")]);
        g.add_node("a", None);
        let result = dfs(&g);
        assert_eq!(result.discovery["a"], 1);
        assert_eq!(result.finish["a"], 2);
        assert_eq!(result.discovery["b"], 3);
    }

    #[test]
    fn test_dfs_deep_chain_no_recursion_limit() {
        let g = make_chain(200_000);
        let result = dfs(&g);
        assert!(!result.cyclic);
        assert_eq!(result.finish[&id(0)], 400_000);
        assert_eq!(result.topological_order.unwrap()[0], id(0));
    }

    #[test]
    fn test_dfs_empty_graph() {
        let g = Graph::new(true, false);
        let result = dfs(&g);
        assert!(result.discovery.is_empty());
        assert_eq!(result.topological_order, Some(Vec::new()));
    }
}
