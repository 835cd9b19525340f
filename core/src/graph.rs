use std::collections::btree_map::{self, Entry};
use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};

/// Attribute map carried by every node and edge.
pub type Attributes = serde_json::Map<String, Value>;

/// Position of a logical edge record in the edge arena.
pub type EdgeId = usize;

/// Dense ordinal assignment: ordinal `i` is the `i`-th node id in ascending order.
#[derive(Debug, Clone, Default)]
pub struct OrdinalIndex {
    ids: Vec<String>,
    positions: HashMap<String, usize>,
}

impl OrdinalIndex {
    /// Ordinal of a node id.
    pub fn get(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Node id at an ordinal.
    pub fn id(&self, ordinal: usize) -> Option<&str> {
        self.ids.get(ordinal).map(String::as_str)
    }

    /// All ids in ordinal order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// In-memory attributed graph: node attributes, sorted adjacency, edge arena.
///
/// Adjacency maps are `BTreeMap`s so that every iteration over nodes or
/// neighbors is in ascending id order without re-sorting. Each adjacency entry
/// points into `edges`; an undirected edge is one arena record referenced from
/// both endpoints, so a mutation through either direction is seen by both.
#[derive(Debug, Clone)]
pub struct Graph {
    config: GraphConfig,
    nodes: BTreeMap<String, Attributes>,
    adjacency: BTreeMap<String, BTreeMap<String, EdgeId>>,
    edges: Vec<Attributes>,
    index: Option<OrdinalIndex>,
}

impl Graph {
    /// Empty graph with the default weight attribute.
    pub fn new(directed: bool, weighted: bool) -> Self {
        Self::with_config(GraphConfig {
            directed,
            weighted,
            ..GraphConfig::default()
        })
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            config,
            nodes: BTreeMap::new(),
            adjacency: BTreeMap::new(),
            edges: Vec::new(),
            index: None,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn is_directed(&self) -> bool {
        self.config.directed
    }

    pub fn is_weighted(&self) -> bool {
        self.config.weighted
    }

    pub fn weight_attribute(&self) -> &str {
        &self.config.weight_attribute
    }

    /// Register a node. Re-adding an existing id returns its current
    /// attributes untouched; `attrs` is only used for new nodes.
    pub fn add_node(&mut self, id: &str, attrs: Option<Attributes>) -> &mut Attributes {
        match self.nodes.entry(id.to_string()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                self.adjacency.insert(id.to_string(), BTreeMap::new());
                // New node: the previous ordinal assignment no longer covers the graph.
                self.index = None;
                e.insert(attrs.unwrap_or_default())
            }
        }
    }

    /// Add an edge, creating missing endpoints. Re-adding an existing edge
    /// returns its current attributes untouched.
    ///
    /// On undirected graphs the same record is registered under `dst -> src`.
    pub fn add_edge(&mut self, src: &str, dst: &str, attrs: Option<Attributes>) -> &mut Attributes {
        self.add_node(src, None);
        self.add_node(dst, None);

        let existing = self.adjacency.get(src).and_then(|n| n.get(dst)).copied();
        let edge_id = match existing {
            Some(edge_id) => edge_id,
            None => {
                let edge_id = self.edges.len();
                self.edges.push(attrs.unwrap_or_default());
                self.adjacency
                    .entry(src.to_string())
                    .or_default()
                    .insert(dst.to_string(), edge_id);
                if !self.config.directed {
                    self.adjacency
                        .entry(dst.to_string())
                        .or_default()
                        .insert(src.to_string(), edge_id);
                }
                edge_id
            }
        };
        &mut self.edges[edge_id]
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get node attributes.
    pub fn node(&self, id: &str) -> Option<&Attributes> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Attributes> {
        self.nodes.get_mut(id)
    }

    /// Get the attributes of edge `src -> dst`.
    pub fn edge(&self, src: &str, dst: &str) -> Option<&Attributes> {
        let edge_id = *self.adjacency.get(src)?.get(dst)?;
        self.edges.get(edge_id)
    }

    pub fn edge_mut(&mut self, src: &str, dst: &str) -> Option<&mut Attributes> {
        let edge_id = *self.adjacency.get(src)?.get(dst)?;
        self.edges.get_mut(edge_id)
    }

    /// All node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// All nodes with attributes, ascending by id.
    pub fn nodes_iter(&self) -> impl Iterator<Item = (&str, &Attributes)> {
        self.nodes.iter().map(|(id, attrs)| (id.as_str(), attrs))
    }

    /// Out-neighbors of `id` in ascending id order. Empty for unknown ids.
    pub fn neighbors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.adjacency
            .get(id)
            .into_iter()
            .flat_map(|targets| targets.keys().map(String::as_str))
    }

    /// Sorted neighbor keys for a node, for traversals that keep the
    /// iterator in a stack frame.
    pub(crate) fn neighbor_keys(&self, id: &str) -> Option<btree_map::Keys<'_, String, EdgeId>> {
        self.adjacency.get(id).map(|targets| targets.keys())
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.adjacency.get(id).map_or(0, |targets| targets.len())
    }

    /// Every adjacency entry as `(src, dst, attrs)` in ascending `(src, dst)`
    /// order. Undirected edges appear once per direction.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &Attributes)> {
        self.adjacency.iter().flat_map(move |(src, targets)| {
            targets
                .iter()
                .map(move |(dst, &edge_id)| (src.as_str(), dst.as_str(), &self.edges[edge_id]))
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of logical edges (an undirected edge counts once).
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Integer weight of `src -> dst`.
    ///
    /// Unweighted graphs report 1 for every edge. Weighted graphs read the
    /// configured weight attribute as a JSON integer or an integer string.
    /// `EdgeNotFound` if there is no such edge.
    pub fn edge_weight(&self, src: &str, dst: &str) -> Result<i64> {
        let attrs = self.edge(src, dst).ok_or_else(|| GraphError::EdgeNotFound {
            src: src.to_string(),
            dst: dst.to_string(),
        })?;
        if !self.config.weighted {
            return Ok(1);
        }
        let invalid = || GraphError::InvalidWeight {
            src: src.to_string(),
            dst: dst.to_string(),
        };
        match attrs.get(&self.config.weight_attribute) {
            Some(Value::Number(n)) => n.as_i64().ok_or_else(invalid),
            Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    /// Assign dense ordinals in ascending id order. Must be re-run after
    /// nodes are added for matrix algorithms to accept the graph.
    pub fn assign_indices(&mut self) -> &OrdinalIndex {
        let ids: Vec<String> = self.nodes.keys().cloned().collect();
        let positions = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        self.index.insert(OrdinalIndex { ids, positions })
    }

    /// Current ordinal assignment, or `StaleIndex` if none is valid.
    pub fn ordinals(&self) -> Result<&OrdinalIndex> {
        self.index.as_ref().ok_or(GraphError::StaleIndex)
    }

    pub fn ordinal(&self, id: &str) -> Option<usize> {
        self.index.as_ref().and_then(|index| index.get(id))
    }

    /// Copy of the graph with every edge flipped.
    pub fn reversed(&self) -> Graph {
        self.reversed_filtered(|_, _| true, |_| true)
    }

    /// Reversed copy keeping only the nodes and edges accepted by the filters.
    /// An edge is kept only if both endpoints are kept.
    pub fn reversed_filtered<N, E>(&self, keep_node: N, keep_edge: E) -> Graph
    where
        N: Fn(&str, &Attributes) -> bool,
        E: Fn(&Attributes) -> bool,
    {
        let mut reversed = Graph::with_config(self.config.clone());
        for (id, attrs) in self.nodes_iter().filter(|(id, attrs)| keep_node(id, attrs)) {
            reversed.add_node(id, Some(attrs.clone()));
        }
        for (src, dst, attrs) in self.edges() {
            if keep_edge(attrs) && reversed.contains_node(src) && reversed.contains_node(dst) {
                reversed.add_edge(dst, src, Some(attrs.clone()));
            }
        }
        reversed
    }

    /// Approximate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let nodes_mem: usize = self
            .nodes
            .iter()
            .map(|(id, attrs)| id.len() + size_of::<Attributes>() + attrs.len() * 64)
            .sum();
        let adjacency_mem: usize = self
            .adjacency
            .values()
            .map(|targets| {
                targets
                    .keys()
                    .map(|k| k.len() + size_of::<EdgeId>() + 24)
                    .sum::<usize>()
            })
            .sum();
        let edges_mem: usize = self
            .edges
            .iter()
            .map(|attrs| size_of::<Attributes>() + attrs.len() * 64)
            .sum();

        nodes_mem + adjacency_mem + edges_mem
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::with_config(GraphConfig::default())
    }
}
