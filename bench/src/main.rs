use std::time::Instant;

use ontograph_core::{
    add_product, add_term, ancestor_closure, annotate, bellman_ford, bfs, depth_by_namespace,
    descendant_closure, dfs, floyd_warshall, link, products, sinks, DescendantIndex, EdgeKind,
    Graph, GraphConfig,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mode = args.get(1).map(|s| s.as_str()).unwrap_or("all");
    let node_count: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(500);

    if mode == "help" || mode == "--help" {
        println!("Usage: ontograph-bench [mode] [node_count] [config.json]");
        println!();
        println!("Modes:");
        println!("  all         Run all generators and benchmark each (default)");
        println!("  ontology    Layered concept hierarchy with annotated products");
        println!("  random      Erdos-Renyi weighted random digraph");
        println!("  dag         Random weighted DAG (edges from lower to higher id)");
        println!();
        println!("Default node_count: 500");
        return;
    }

    let config = match args.get(3) {
        Some(path) => match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| GraphConfig::from_json(&text).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Could not load config {}: {}", path, e);
                return;
            }
        },
        None => GraphConfig::default(),
    };

    println!("ontograph-bench");
    println!("===============");
    println!();

    let generators: Vec<(&str, fn(usize, &GraphConfig) -> Graph)> = match mode {
        "ontology" => vec![("Layered ontology", gen_ontology)],
        "random" => vec![("Erdos-Renyi random", gen_random)],
        "dag" => vec![("Random DAG", gen_dag)],
        "all" => vec![
            ("Layered ontology", gen_ontology as fn(usize, &GraphConfig) -> Graph),
            ("Erdos-Renyi random", gen_random),
            ("Random DAG", gen_dag),
        ],
        _ => {
            eprintln!("Unknown mode: {}. Use --help for options.", mode);
            return;
        }
    };

    for (name, generator) in generators {
        run_benchmark(name, generator, node_count, &config);
    }
}

fn ms(t: Instant) -> f64 {
    t.elapsed().as_secs_f64() * 1000.0
}

fn run_benchmark(
    name: &str,
    generator: fn(usize, &GraphConfig) -> Graph,
    node_count: usize,
    config: &GraphConfig,
) {
    let _span = tracing::info_span!("benchmark", name).entered();
    println!("--- {} ---", name);
    println!("Target: {} nodes", node_count);

    let t = Instant::now();
    let mut graph = generator(node_count, config);
    graph.assign_indices();
    println!(
        "Generated in {:.2}s: {} nodes, {} edges, ~{:.1}MB",
        t.elapsed().as_secs_f64(),
        graph.node_count(),
        graph.edge_count(),
        graph.memory_usage() as f64 / 1_048_576.0
    );
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph generated"
    );
    println!();

    let Some(first) = graph.node_ids().next().map(str::to_string) else {
        println!("(empty graph)");
        return;
    };

    let t = Instant::now();
    match bfs(&graph, &first) {
        Ok(result) => println!("{:<16} {:>8} reached {:>10.1}ms", "bfs", result.order.len(), ms(t)),
        Err(e) => println!("{:<16} error: {}", "bfs", e),
    }

    let t = Instant::now();
    let result = dfs(&graph);
    println!(
        "{:<16} {:>8} edges   {:>10.1}ms  cyclic={}",
        "dfs",
        result.edge_classes.len(),
        ms(t),
        result.cyclic
    );

    let t = Instant::now();
    match bellman_ford(&graph, &first) {
        Ok(sp) => println!(
            "{:<16} {:>8} reached {:>10.1}ms",
            "bellman-ford",
            sp.distance.values().filter(|d| d.is_some()).count(),
            ms(t)
        ),
        Err(e) => println!("{:<16} error: {}", "bellman-ford", e),
    }

    let t = Instant::now();
    match floyd_warshall(&graph) {
        Ok(ap) => println!(
            "{:<16} diameter {:>7} {:>10.1}ms",
            "floyd-warshall",
            ap.diameter(),
            ms(t)
        ),
        Err(e) => println!("{:<16} skipped: {}", "floyd-warshall", e),
    }

    let roots = sinks(&graph);
    println!("{:<16} {:>8}", "sinks", roots.len());

    if let Ok(depths) = depth_by_namespace(&graph) {
        for (namespace, depth) in depths {
            println!("{:<16} {:>8} ({})", "max depth", depth, namespace);
        }
    }

    let products = products(&graph);
    if let Some(product) = products.first() {
        let t = Instant::now();
        if let Ok(closure) = ancestor_closure(&graph, product, true) {
            println!("{:<16} {:>8} terms   {:>10.1}ms", "ancestors", closure.len(), ms(t));
        }

        let t = Instant::now();
        if let Some(root) = roots.first() {
            if let Ok(closure) = descendant_closure(&graph, root, true) {
                println!("{:<16} {:>8} prods   {:>10.1}ms", "descendants", closure.len(), ms(t));
            }
        }

        let t = Instant::now();
        if let Ok(index) = DescendantIndex::build(&graph, true) {
            println!("{:<16} {:>8} terms   {:>10.1}ms", "desc. index", index.len(), ms(t));
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// Generators: deterministic, single-threaded
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
}

const NAMESPACES: [&str; 3] = ["biological_process", "molecular_function", "cellular_component"];
const EVIDENCE: [&str; 4] = ["IEA", "IDA", "TAS", "IMP"];

fn term_id(i: usize) -> String {
    format!("T:{:07}", i)
}

/// Layered concept hierarchy: three roots, each new Term specializes one or
/// two earlier Terms of its namespace; a third as many Products are
/// annotated to random Terms.
fn gen_ontology(node_count: usize, config: &GraphConfig) -> Graph {
    let mut graph = Graph::with_config(GraphConfig {
        directed: true,
        weighted: false,
        ..config.clone()
    });
    let mut rng = FastRng::new(42);

    let term_count = (node_count * 3 / 4).max(NAMESPACES.len());
    for i in 0..term_count {
        let namespace = NAMESPACES[i % NAMESPACES.len()];
        add_term(&mut graph, &term_id(i), None, Some(namespace));
        if i >= NAMESPACES.len() {
            // Parents share the namespace: same residue modulo 3.
            let earlier = (i / NAMESPACES.len()) as u64;
            let parent = rng.next(earlier) as usize * NAMESPACES.len() + i % NAMESPACES.len();
            link(&mut graph, &term_id(i), &term_id(parent), EdgeKind::Specialization);
            if rng.next(4) == 0 {
                let other = rng.next(earlier) as usize * NAMESPACES.len() + i % NAMESPACES.len();
                if other != parent {
                    link(&mut graph, &term_id(i), &term_id(other), EdgeKind::PartOf);
                }
            }
        }
    }

    for p in 0..node_count.saturating_sub(term_count) {
        let product = format!("P:{:07}", p);
        add_product(&mut graph, &product, None);
        for _ in 0..=rng.next(3) {
            let term = term_id(rng.next(term_count as u64) as usize);
            annotate(&mut graph, &product, &term, EVIDENCE[rng.next(4) as usize]);
        }
    }

    graph
}

fn weighted_graph(config: &GraphConfig) -> Graph {
    Graph::with_config(GraphConfig {
        directed: true,
        weighted: true,
        ..config.clone()
    })
}

/// Erdos-Renyi: ~5 weighted edges per node, uniform endpoints.
fn gen_random(node_count: usize, config: &GraphConfig) -> Graph {
    let mut graph = weighted_graph(config);
    let weight_attribute = graph.weight_attribute().to_string();
    let mut rng = FastRng::new(54321);
    let n = node_count.max(1) as u64;

    for i in 0..n {
        graph.add_node(&format!("v{:07}", i), None);
    }
    for _ in 0..n * 5 {
        let from = rng.next(n);
        let to = rng.next(n);
        if from != to {
            let weight = rng.next(100) + 1;
            graph
                .add_edge(&format!("v{:07}", from), &format!("v{:07}", to), None)
                .insert(weight_attribute.clone(), json!(weight));
        }
    }

    graph
}

/// Random DAG: edges only run from lower to higher id.
fn gen_dag(node_count: usize, config: &GraphConfig) -> Graph {
    let mut graph = weighted_graph(config);
    let weight_attribute = graph.weight_attribute().to_string();
    let mut rng = FastRng::new(99999);
    let n = node_count.max(2) as u64;

    for i in 0..n {
        graph.add_node(&format!("v{:07}", i), None);
    }
    for _ in 0..n * 3 {
        let a = rng.next(n);
        let b = rng.next(n);
        if a != b {
            let (from, to) = (a.min(b), a.max(b));
            graph
                .add_edge(&format!("v{:07}", from), &format!("v{:07}", to), None)
                .insert(weight_attribute.clone(), json!(rng.next(20)));
        }
    }

    graph
}
