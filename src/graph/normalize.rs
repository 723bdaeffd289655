//! Conversion of raw upload/analysis payloads into the canonical graph

use crate::graph::{Edge, Graph, Node, NodeMetrics, Position};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// Identifier as it appears in a payload: text or a bare number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    pub fn to_id_string(&self) -> String {
        match self {
            RawId::Text(text) => text.clone(),
            RawId::Number(number) => number.to_string(),
        }
    }
}

impl From<&str> for RawId {
    fn from(id: &str) -> Self {
        RawId::Text(id.to_string())
    }
}

/// Edge endpoint: either an identifier or an embedded node-like object
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawEndpoint {
    Id(RawId),
    Node { id: RawId },
}

impl RawEndpoint {
    /// Identifier of the endpoint, extracting `.id` from embedded objects
    pub fn id(&self) -> String {
        match self {
            RawEndpoint::Id(id) | RawEndpoint::Node { id } => id.to_id_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawNode {
    pub id: RawId,

    #[serde(flatten)]
    pub metrics: NodeMetrics,

    #[serde(default)]
    pub community: Option<serde_json::Value>,

    #[serde(default)]
    pub x: Option<f64>,

    #[serde(default)]
    pub y: Option<f64>,

    #[serde(default)]
    pub highlighted: Option<bool>,

    #[serde(default)]
    pub common: Option<bool>,

    #[serde(default)]
    pub fixed: Option<bool>,
}

/// Community identifier from a payload value, accepting integers and
/// numeric strings
pub(crate) fn community_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(number) => number.as_i64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

impl RawNode {
    pub(crate) fn community_id(&self) -> Option<i64> {
        self.community.as_ref().and_then(community_id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawLink {
    pub source: RawEndpoint,
    pub target: RawEndpoint,

    #[serde(default)]
    pub weight: Option<f64>,
}

/// Graph payload as delivered by the upload/analysis collaborator:
/// `{ nodes: [...], links: [{ source, target, weight? }] }`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<RawNode>,

    #[serde(default, alias = "edges")]
    pub links: Vec<RawLink>,

    #[serde(default)]
    pub directed: bool,
}

impl RawGraph {
    pub fn from_json(json: &str) -> serde_json::Result<RawGraph> {
        serde_json::from_str(json)
    }
}

impl From<&Graph> for RawGraph {
    fn from(graph: &Graph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| RawNode {
                id: RawId::Text(node.id.clone()),
                metrics: node.metrics.clone(),
                community: node.community.map(serde_json::Value::from),
                x: node.position.map(|p| p.x),
                y: node.position.map(|p| p.y),
                highlighted: Some(node.highlighted),
                common: Some(node.common),
                fixed: Some(node.fixed),
            })
            .collect();
        let links = graph
            .edges
            .iter()
            .map(|edge| RawLink {
                source: RawEndpoint::Id(RawId::Text(edge.source.clone())),
                target: RawEndpoint::Id(RawId::Text(edge.target.clone())),
                weight: Some(edge.weight),
            })
            .collect();

        RawGraph {
            nodes,
            links,
            directed: graph.directed,
        }
    }
}

/// Non-fatal problem found while normalizing
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// An edge endpoint that names no node. The edge is kept as-is.
    UnresolvedEdge {
        index: usize,
        source: String,
        target: String,
        missing_source: bool,
        missing_target: bool,
    },
    /// A repeated node identifier; the first occurrence was kept
    DuplicateNode { id: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedEdge {
                index,
                source,
                target,
                ..
            } => write!(f, "Invalid link #{}: source={}, target={}", index, source, target),
            Diagnostic::DuplicateNode { id } => write!(f, "Duplicate node id: {}", id),
        }
    }
}

/// Normalized graph plus everything that looked wrong on the way in
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub graph: Graph,
    pub diagnostics: Vec<Diagnostic>,
}

impl Normalized {
    pub fn unresolved_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnresolvedEdge { .. }))
            .count()
    }
}

/// Builder for incrementally constructing a canonical graph
pub struct GraphBuilder {
    directed: bool,

    /// Identifiers seen so far
    seen: HashSet<String>,

    nodes: Vec<Node>,

    edges: Vec<Edge>,

    diagnostics: Vec<Diagnostic>,
}

impl GraphBuilder {
    /// Create a new builder with the given capacity
    pub fn with_capacity(directed: bool, node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            directed,
            seen: HashSet::with_capacity(node_capacity),
            nodes: Vec::with_capacity(node_capacity),
            edges: Vec::with_capacity(edge_capacity),
            diagnostics: Vec::new(),
        }
    }

    /// Add a node; a repeated identifier is reported and ignored
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.seen.contains(&node.id) {
            log::warn!("Duplicate node id ignored: {}", node.id);
            self.diagnostics.push(Diagnostic::DuplicateNode { id: node.id });
            return false;
        }

        self.seen.insert(node.id.clone());
        self.nodes.push(node);
        true
    }

    /// Add an edge, reporting unresolved endpoints without dropping the edge
    pub fn add_edge(&mut self, edge: Edge) {
        let missing_source = !self.seen.contains(&edge.source);
        let missing_target = !self.seen.contains(&edge.target);

        if missing_source || missing_target {
            log::warn!("Invalid link: source={}, target={}", edge.source, edge.target);
            self.diagnostics.push(Diagnostic::UnresolvedEdge {
                index: self.edges.len(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                missing_source,
                missing_target,
            });
        }

        self.edges.push(edge);
    }

    pub fn build(self) -> Normalized {
        Normalized {
            graph: Graph::from_parts(self.nodes, self.edges, self.directed),
            diagnostics: self.diagnostics,
        }
    }
}

/// Weight used when the payload gives none, or a falsy one
const DEFAULT_WEIGHT: f64 = 1.0;

fn effective_weight(weight: Option<f64>) -> f64 {
    match weight {
        Some(w) if w != 0.0 && !w.is_nan() => w,
        _ => DEFAULT_WEIGHT,
    }
}

/// Convert a raw payload into a canonical graph.
///
/// All nodes are registered before any edge, so edge order never affects
/// resolution. The input is not modified.
pub fn normalize(raw: &RawGraph) -> Normalized {
    let mut builder = GraphBuilder::with_capacity(raw.directed, raw.nodes.len(), raw.links.len());

    for raw_node in &raw.nodes {
        let position = match (raw_node.x, raw_node.y) {
            (Some(x), Some(y)) => Some(Position { x, y }),
            _ => None,
        };
        builder.add_node(Node {
            id: raw_node.id.to_id_string(),
            metrics: raw_node.metrics.clone(),
            community: raw_node.community_id(),
            position,
            highlighted: raw_node.highlighted.unwrap_or(false),
            common: raw_node.common.unwrap_or(false),
            fixed: raw_node.fixed.unwrap_or(false),
        });
    }

    for link in &raw.links {
        builder.add_edge(Edge::weighted(
            link.source.id(),
            link.target.id(),
            effective_weight(link.weight),
        ));
    }

    let normalized = builder.build();
    log::debug!(
        "Normalized graph with {} nodes, {} edges, {} diagnostics",
        normalized.graph.node_count(),
        normalized.graph.edge_count(),
        normalized.diagnostics.len()
    );
    normalized
}
