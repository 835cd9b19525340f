//! Property tests for traversal, shortest-path and closure invariants.

use std::collections::{BTreeSet, HashSet, VecDeque};

use ontograph_core::{
    add_product, add_term, ancestor_closure, annotate, bellman_ford, bfs, descendant_closure, dfs,
    floyd_warshall, link, EdgeClass, EdgeKind, Graph,
};
use proptest::prelude::*;
use serde_json::json;

const N: usize = 7;

fn name(i: usize) -> String {
    format!("n{}", i)
}

fn build(directed: bool, edges: &[(usize, usize)]) -> Graph {
    let mut g = Graph::new(directed, false);
    for i in 0..N {
        g.add_node(&name(i), None);
    }
    for &(src, dst) in edges {
        g.add_edge(&name(src), &name(dst), None);
    }
    g
}

fn build_weighted(edges: &[(usize, usize, i64)]) -> Graph {
    let mut g = Graph::new(true, true);
    for i in 0..N {
        g.add_node(&name(i), None);
    }
    for &(src, dst, w) in edges {
        g.add_edge(&name(src), &name(dst), None)
            .insert("weight".into(), json!(w));
    }
    g
}

/// Cheapest simple path by exhaustive enumeration.
fn brute_force(g: &Graph, src: &str, dst: &str) -> Option<i64> {
    fn walk(
        g: &Graph,
        at: &str,
        dst: &str,
        seen: &mut HashSet<String>,
        cost: i64,
        best: &mut Option<i64>,
    ) {
        if at == dst {
            *best = Some(best.map_or(cost, |b| b.min(cost)));
            return;
        }
        for next in g.neighbors(at) {
            if seen.insert(next.to_string()) {
                let w = g.edge_weight(at, next).unwrap();
                walk(g, next, dst, seen, cost + w, best);
                seen.remove(next);
            }
        }
    }
    let mut best = None;
    let mut seen = HashSet::from([src.to_string()]);
    walk(g, src, dst, &mut seen, 0, &mut best);
    best
}

fn reachable(g: &Graph, start: &str) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<&str> = g.neighbors(start).collect();
    while let Some(id) = queue.pop_front() {
        if seen.insert(id.to_string()) {
            queue.extend(g.neighbors(id));
        }
    }
    seen
}

fn edge_list() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..N, 0..N), 0..20)
}

proptest! {
    #[test]
    fn bfs_tree_edges_add_one_hop(edges in edge_list(), directed in any::<bool>()) {
        let g = build(directed, &edges);
        let result = bfs(&g, &name(0)).unwrap();
        prop_assert_eq!(result.distance(&name(0)), Some(0));
        for id in g.node_ids() {
            if let Some(parent) = result.predecessor(id) {
                prop_assert_eq!(result.distance(id), result.distance(parent).map(|d| d + 1));
            }
        }
    }

    #[test]
    fn bfs_distance_is_shortest_hop_count(edges in edge_list()) {
        let g = build(true, &edges);
        let result = bfs(&g, &name(0)).unwrap();
        for (src, dst, _) in g.edges() {
            if let Some(d) = result.distance(src) {
                let dv = result.distance(dst);
                prop_assert!(dv.is_some() && dv.unwrap() <= d + 1);
            }
        }
    }

    #[test]
    fn dfs_intervals_nest_or_are_disjoint(edges in edge_list()) {
        let g = build(true, &edges);
        let result = dfs(&g);
        let ids: Vec<&str> = g.node_ids().collect();
        for &u in &ids {
            for &v in &ids {
                if u == v {
                    continue;
                }
                let (du, fu) = (result.discovery[u], result.finish[u]);
                let (dv, fv) = (result.discovery[v], result.finish[v]);
                prop_assert!(du < fu);
                let disjoint = fu < dv || fv < du;
                let nested = (du < dv && fv < fu) || (dv < du && fu < fv);
                prop_assert!(
                    disjoint || nested,
                    "{} [{}, {}] vs {} [{}, {}]",
                    u,
                    du,
                    fu,
                    v,
                    dv,
                    fv
                );
            }
        }
        let back_edges = result.edges_of(EdgeClass::Back).count();
        prop_assert_eq!(result.cyclic, back_edges > 0);
    }

    #[test]
    fn dfs_classifies_every_edge(edges in edge_list()) {
        let g = build(true, &edges);
        let result = dfs(&g);
        prop_assert_eq!(result.edge_classes.len(), g.edges().count());
    }

    #[test]
    fn topological_order_respects_edges(edges in edge_list()) {
        // Orient every edge from lower to higher index: always acyclic.
        let dag: Vec<(usize, usize)> = edges
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        let g = build(true, &dag);
        let result = dfs(&g);
        prop_assert!(!result.cyclic);
        let order = result.topological_order.unwrap();
        prop_assert_eq!(order.len(), N);
        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        for (src, dst, _) in g.edges() {
            prop_assert!(pos(src) < pos(dst));
        }
    }

    #[test]
    fn bellman_ford_satisfies_triangle_inequality(
        edges in prop::collection::vec((0..N, 0..N, 0i64..20), 0..20)
    ) {
        let g = build_weighted(&edges);
        let sp = bellman_ford(&g, &name(0)).unwrap();
        for (src, dst, _) in g.edges() {
            if let Some(du) = sp.distance(src) {
                let w = g.edge_weight(src, dst).unwrap();
                prop_assert!(sp.distance(dst).is_some_and(|dv| dv <= du + w));
            }
        }
    }

    #[test]
    fn floyd_warshall_matches_brute_force(
        edges in prop::collection::vec((0..N, 0..N, 0i64..20), 0..16)
    ) {
        let mut g = build_weighted(&edges);
        g.assign_indices();
        let ap = floyd_warshall(&g).unwrap();
        let mut max_finite = 0;
        for i in 0..N {
            for j in 0..N {
                let expected = brute_force(&g, &name(i), &name(j));
                prop_assert_eq!(ap.distance(i, j), expected, "{} -> {}", i, j);
                if let Some(d) = expected {
                    max_finite = max_finite.max(d);
                    let (from, to) = (name(i), name(j));
                    let path = ap.path_between(&from, &to).unwrap().unwrap();
                    prop_assert_eq!(path.first(), Some(&from));
                    prop_assert_eq!(path.last(), Some(&to));
                    let length: i64 = path
                        .windows(2)
                        .map(|w| g.edge_weight(&w[0], &w[1]).unwrap())
                        .sum();
                    prop_assert_eq!(length, d);
                } else {
                    prop_assert!(ap.path(i, j).is_none());
                }
            }
        }
        prop_assert_eq!(ap.diameter(), max_finite);
    }

    #[test]
    fn closures_match_reachability(
        parents in prop::collection::vec((1..N, 0..N), 0..12),
        annotations in prop::collection::vec((0..3usize, 0..N), 0..8),
    ) {
        let mut g = Graph::new(true, false);
        for i in 0..N {
            add_term(&mut g, &name(i), None, None);
        }
        // Child i points to a strictly smaller parent index: acyclic.
        for &(child, parent) in &parents {
            let parent = parent % child;
            link(&mut g, &name(child), &name(parent), EdgeKind::Specialization);
        }
        let product = |p: usize| format!("p{}", p);
        for p in 0..3 {
            add_product(&mut g, &product(p), None);
        }
        for &(p, term) in &annotations {
            annotate(&mut g, &product(p), &name(term), "IEA");
        }

        for p in 0..3 {
            let pid = product(p);
            let direct: BTreeSet<String> = g.neighbors(&pid).map(str::to_string).collect();
            let shallow: BTreeSet<String> = ancestor_closure(&g, &pid, false)
                .unwrap()
                .keys()
                .map(|k| k.to_string())
                .collect();
            prop_assert_eq!(&shallow, &direct);

            let mut expected = direct.clone();
            for term in &direct {
                expected.extend(reachable(&g, term));
            }
            let deep: BTreeSet<String> = ancestor_closure(&g, &pid, true)
                .unwrap()
                .keys()
                .map(|k| k.to_string())
                .collect();
            prop_assert_eq!(&deep, &expected);
        }

        for i in 0..N {
            let term = name(i);
            for deep in [false, true] {
                let found: BTreeSet<String> = descendant_closure(&g, &term, deep)
                    .unwrap()
                    .keys()
                    .map(|k| k.to_string())
                    .collect();
                let expected: BTreeSet<String> = (0..3)
                    .map(product)
                    .filter(|pid| {
                        ancestor_closure(&g, pid, deep)
                            .unwrap()
                            .contains_key(term.as_str())
                    })
                    .collect();
                prop_assert_eq!(found, expected);
            }
        }
    }

    #[test]
    fn repeated_insertion_is_idempotent(edges in edge_list(), directed in any::<bool>()) {
        let mut g = build(directed, &edges);
        for (i, &(src, dst)) in edges.iter().enumerate() {
            g.edge_mut(&name(src), &name(dst))
                .unwrap()
                .insert("tag".into(), json!(i));
        }
        let nodes = g.node_count();
        let edge_count = g.edge_count();
        let before: Vec<_> = g
            .edges()
            .map(|(s, d, a)| (s.to_string(), d.to_string(), a.clone()))
            .collect();

        for &(src, dst) in &edges {
            g.add_node(&name(src), None);
            g.add_edge(&name(src), &name(dst), None);
        }

        prop_assert_eq!(g.node_count(), nodes);
        prop_assert_eq!(g.edge_count(), edge_count);
        let after: Vec<_> = g
            .edges()
            .map(|(s, d, a)| (s.to_string(), d.to_string(), a.clone()))
            .collect();
        prop_assert_eq!(before, after);
    }
}
