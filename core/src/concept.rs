//! Concept graph queries.
//!
//! A concept graph is a directed [`Graph`] whose nodes are either Terms
//! (concepts in a hierarchy) or Products (annotated items). Terms point to
//! more general Terms through `specialization` and `part-of` edges; Products
//! point to Terms through `annotation` edges carrying evidence codes.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::graph::{Attributes, Graph};
use crate::longest_path::longest_path_from;

/// Node/edge attribute naming the node kind or edge kind.
pub const TYPE_ATTR: &str = "type";
pub const ID_ATTR: &str = "id";
pub const NAME_ATTR: &str = "name";
pub const NAMESPACE_ATTR: &str = "namespace";
/// Ordered list of evidence codes on annotation edges.
pub const EVIDENCE_CODES_ATTR: &str = "evidence-codes";

/// Id → attributes of the nodes selected by a closure query, ascending.
pub type Closure<'g> = BTreeMap<&'g str, &'g Attributes>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Term,
    Product,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Term => "Term",
            NodeKind::Product => "Product",
        }
    }

    /// Kind recorded in a node's `type` attribute.
    pub fn of(attrs: &Attributes) -> Option<NodeKind> {
        match attrs.get(TYPE_ATTR).and_then(Value::as_str)? {
            "Term" => Some(NodeKind::Term),
            "Product" => Some(NodeKind::Product),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Specialization,
    PartOf,
    Annotation,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Specialization => "specialization",
            EdgeKind::PartOf => "part-of",
            EdgeKind::Annotation => "annotation",
        }
    }

    pub fn of(attrs: &Attributes) -> Option<EdgeKind> {
        match attrs.get(TYPE_ATTR).and_then(Value::as_str)? {
            "specialization" => Some(EdgeKind::Specialization),
            "part-of" => Some(EdgeKind::PartOf),
            "annotation" => Some(EdgeKind::Annotation),
            _ => None,
        }
    }

    fn is_hierarchy(self) -> bool {
        matches!(self, EdgeKind::Specialization | EdgeKind::PartOf)
    }
}

fn is_kind(graph: &Graph, id: &str, kind: NodeKind) -> bool {
    graph.node(id).and_then(NodeKind::of) == Some(kind)
}

fn set_str(attrs: &mut Attributes, key: &str, value: &str) {
    attrs.insert(key.to_string(), Value::String(value.to_string()));
}

/// Register a Term, or update the descriptive attributes of an existing one.
pub fn add_term<'a>(
    graph: &'a mut Graph,
    id: &str,
    name: Option<&str>,
    namespace: Option<&str>,
) -> &'a mut Attributes {
    let attrs = graph.add_node(id, None);
    set_str(attrs, TYPE_ATTR, NodeKind::Term.as_str());
    set_str(attrs, ID_ATTR, id);
    if let Some(name) = name {
        set_str(attrs, NAME_ATTR, name);
    }
    if let Some(namespace) = namespace {
        set_str(attrs, NAMESPACE_ATTR, namespace);
    }
    attrs
}

/// Register a Product, or update the name of an existing one.
pub fn add_product<'a>(graph: &'a mut Graph, id: &str, name: Option<&str>) -> &'a mut Attributes {
    let attrs = graph.add_node(id, None);
    set_str(attrs, TYPE_ATTR, NodeKind::Product.as_str());
    set_str(attrs, ID_ATTR, id);
    if let Some(name) = name {
        set_str(attrs, NAME_ATTR, name);
    }
    attrs
}

/// Link a Term to a more general Term.
pub fn link<'a>(
    graph: &'a mut Graph,
    child: &str,
    parent: &str,
    kind: EdgeKind,
) -> &'a mut Attributes {
    let attrs = graph.add_edge(child, parent, None);
    set_str(attrs, TYPE_ATTR, kind.as_str());
    attrs
}

/// Annotate a Product with a Term, appending `evidence_code` to the edge's
/// evidence list. Repeated annotations reuse the same edge.
///
/// A non-list `evidence-codes` value left by a loader is turned into a list:
/// a string is kept as its first element, anything else is dropped.
pub fn annotate<'a>(
    graph: &'a mut Graph,
    product: &str,
    term: &str,
    evidence_code: &str,
) -> &'a mut Attributes {
    let attrs = graph.add_edge(product, term, None);
    set_str(attrs, TYPE_ATTR, EdgeKind::Annotation.as_str());
    let codes = attrs
        .entry(EVIDENCE_CODES_ATTR)
        .or_insert_with(|| Value::Array(Vec::new()));
    if !codes.is_array() {
        let kept = match codes.take() {
            Value::String(code) => vec![Value::String(code)],
            other => {
                warn!(product, term, value = %other, "discarding non-list evidence codes");
                Vec::new()
            }
        };
        *codes = Value::Array(kept);
    }
    if let Value::Array(codes) = codes {
        codes.push(Value::String(evidence_code.to_string()));
    }
    attrs
}

/// All Product ids, ascending.
pub fn products(graph: &Graph) -> Vec<&str> {
    graph
        .nodes_iter()
        .filter(|(_, attrs)| NodeKind::of(attrs) == Some(NodeKind::Product))
        .map(|(id, _)| id)
        .collect()
}

/// All Term ids, ascending.
pub fn terms(graph: &Graph) -> Vec<&str> {
    graph
        .nodes_iter()
        .filter(|(_, attrs)| NodeKind::of(attrs) == Some(NodeKind::Term))
        .map(|(id, _)| id)
        .collect()
}

/// Terms directly linked from `start` and, when `deep`, every Term reachable
/// from those through further outgoing edges of any type.
pub fn ancestor_closure<'g>(graph: &'g Graph, start: &str, deep: bool) -> Result<Closure<'g>> {
    let mut closure = Closure::new();
    ancestor_closure_into(graph, start, &mut closure, deep)?;
    Ok(closure)
}

/// [`ancestor_closure`] accumulating into an existing map. Entries already
/// present are kept as they are.
pub fn ancestor_closure_into<'g>(
    graph: &'g Graph,
    start: &str,
    acc: &mut Closure<'g>,
    deep: bool,
) -> Result<()> {
    if !graph.contains_node(start) {
        return Err(GraphError::NodeNotFound(start.to_string()));
    }

    let mut expanded: HashSet<&'g str> = HashSet::new();
    let mut stack: Vec<&'g str> = Vec::new();

    for next in graph.neighbors(start) {
        if let Some(attrs) = term_attrs(graph, next) {
            acc.entry(next).or_insert(attrs);
            if deep {
                stack.push(next);
            }
        }
    }

    while let Some(term) = stack.pop() {
        if !expanded.insert(term) {
            continue;
        }
        for next in graph.neighbors(term) {
            if let Some(attrs) = term_attrs(graph, next) {
                acc.entry(next).or_insert(attrs);
                if !expanded.contains(next) {
                    stack.push(next);
                }
            }
        }
    }

    Ok(())
}

fn term_attrs<'g>(graph: &'g Graph, id: &str) -> Option<&'g Attributes> {
    graph
        .node(id)
        .filter(|attrs| NodeKind::of(attrs) == Some(NodeKind::Term))
}

/// Products whose ancestor closure (with the same `deep` setting) contains
/// `term`.
///
/// Computes one closure per Product; use [`DescendantIndex`] when answering
/// many such queries against the same graph.
pub fn descendant_closure<'g>(graph: &'g Graph, term: &str, deep: bool) -> Result<Closure<'g>> {
    let mut closure = Closure::new();
    descendant_closure_into(graph, term, &mut closure, deep)?;
    Ok(closure)
}

/// [`descendant_closure`] accumulating into an existing map. Entries already
/// present are kept as they are.
pub fn descendant_closure_into<'g>(
    graph: &'g Graph,
    term: &str,
    acc: &mut Closure<'g>,
    deep: bool,
) -> Result<()> {
    if !graph.contains_node(term) {
        return Err(GraphError::NodeNotFound(term.to_string()));
    }
    for (id, attrs) in graph.nodes_iter() {
        if NodeKind::of(attrs) != Some(NodeKind::Product) {
            continue;
        }
        if ancestor_closure(graph, id, deep)?.contains_key(term) {
            acc.entry(id).or_insert(attrs);
        }
    }
    Ok(())
}

/// Precomputed Term → Products inversion of the ancestor closure.
#[derive(Debug, Clone, Default)]
pub struct DescendantIndex {
    deep: bool,
    by_term: BTreeMap<String, BTreeSet<String>>,
}

impl DescendantIndex {
    /// One ancestor closure per Product, inverted.
    pub fn build(graph: &Graph, deep: bool) -> Result<Self> {
        let mut by_term: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for product in products(graph) {
            for term in ancestor_closure(graph, product, deep)?.into_keys() {
                by_term
                    .entry(term.to_string())
                    .or_default()
                    .insert(product.to_string());
            }
        }
        debug!(terms = by_term.len(), deep, "descendant index built");
        Ok(Self { deep, by_term })
    }

    pub fn is_deep(&self) -> bool {
        self.deep
    }

    /// Products annotated to `term` (directly, or through a descendant when
    /// built deep), ascending. Empty for unknown or unannotated Terms.
    pub fn descendants(&self, term: &str) -> impl Iterator<Item = &str> {
        self.by_term
            .get(term)
            .into_iter()
            .flat_map(|products| products.iter().map(String::as_str))
    }

    /// Number of Terms with at least one Product.
    pub fn len(&self) -> usize {
        self.by_term.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_term.is_empty()
    }
}

/// Term-only hierarchy with `specialization` and `part-of` edges reversed,
/// so edges run from general to specific.
pub fn hierarchy_reversed(graph: &Graph) -> Graph {
    graph.reversed_filtered(
        |_, attrs| NodeKind::of(attrs) == Some(NodeKind::Term),
        |attrs| EdgeKind::of(attrs).is_some_and(EdgeKind::is_hierarchy),
    )
}

/// Terms with no outgoing hierarchy edge to another Term.
fn hierarchy_roots(graph: &Graph) -> Vec<&str> {
    terms(graph)
        .into_iter()
        .filter(|&term| {
            !graph.neighbors(term).any(|parent| {
                is_kind(graph, parent, NodeKind::Term)
                    && graph
                        .edge(term, parent)
                        .and_then(EdgeKind::of)
                        .is_some_and(EdgeKind::is_hierarchy)
            })
        })
        .collect()
}

/// Maximum depth below each hierarchy root, measured in hops.
pub fn root_depths(graph: &Graph) -> Result<BTreeMap<String, u32>> {
    let reversed = hierarchy_reversed(graph);
    hierarchy_roots(graph)
        .into_iter()
        .map(|root| {
            longest_path_from(&reversed, root).map(|lp| (root.to_string(), lp.max_distance))
        })
        .collect()
}

/// Maximum hierarchy depth per namespace, over the roots carrying a
/// `namespace` attribute.
pub fn depth_by_namespace(graph: &Graph) -> Result<BTreeMap<String, u32>> {
    let mut depths: BTreeMap<String, u32> = BTreeMap::new();
    for (root, depth) in root_depths(graph)? {
        let namespace = graph
            .node(&root)
            .and_then(|attrs| attrs.get(NAMESPACE_ATTR))
            .and_then(Value::as_str);
        if let Some(namespace) = namespace {
            let entry = depths.entry(namespace.to_string()).or_insert(0);
            *entry = (*entry).max(depth);
        }
    }
    Ok(depths)
}
