//! Canonical in-memory graph: nodes keyed by identifier, edges by endpoint identifiers

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Precomputed centrality scores that can rank nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CentralityMetric {
    Degree,
    Betweenness,
    Closeness,
    Eigenvector,
    #[serde(rename = "pagerank")]
    PageRank,
}

impl CentralityMetric {
    /// Every supported metric, in display order
    pub const ALL: [CentralityMetric; 5] = [
        CentralityMetric::Degree,
        CentralityMetric::Betweenness,
        CentralityMetric::Closeness,
        CentralityMetric::Eigenvector,
        CentralityMetric::PageRank,
    ];

    /// Attribute name used in payloads
    pub fn key(self) -> &'static str {
        match self {
            CentralityMetric::Degree => "degree",
            CentralityMetric::Betweenness => "betweenness",
            CentralityMetric::Closeness => "closeness",
            CentralityMetric::Eigenvector => "eigenvector",
            CentralityMetric::PageRank => "pagerank",
        }
    }

    /// Name shown to researchers, e.g. "PageRank Centrality"
    pub fn label(self) -> &'static str {
        match self {
            CentralityMetric::Degree => "Degree Centrality",
            CentralityMetric::Betweenness => "Betweenness Centrality",
            CentralityMetric::Closeness => "Closeness Centrality",
            CentralityMetric::Eigenvector => "Eigenvector Centrality",
            CentralityMetric::PageRank => "PageRank Centrality",
        }
    }
}

impl fmt::Display for CentralityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CentralityMetric {
    type Err = EngineError;

    /// Accepts both "betweenness" and "Betweenness Centrality", any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let name = lowered.strip_suffix(" centrality").unwrap_or(&lowered).trim();
        CentralityMetric::ALL
            .into_iter()
            .find(|metric| metric.key() == name)
            .ok_or_else(|| EngineError::UnknownMetric(s.to_string()))
    }
}

/// Optional analytic scores carried by a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub betweenness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closeness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eigenvector: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagerank: Option<f64>,
}

impl NodeMetrics {
    /// Raw value of a metric, if present
    pub fn get(&self, metric: CentralityMetric) -> Option<f64> {
        match metric {
            CentralityMetric::Degree => self.degree,
            CentralityMetric::Betweenness => self.betweenness,
            CentralityMetric::Closeness => self.closeness,
            CentralityMetric::Eigenvector => self.eigenvector,
            CentralityMetric::PageRank => self.pagerank,
        }
    }

    /// Value used for ranking: a missing score counts as 0
    pub fn score(&self, metric: CentralityMetric) -> f64 {
        self.get(metric).unwrap_or(0.0)
    }

    pub fn set(&mut self, metric: CentralityMetric, value: f64) {
        let slot = match metric {
            CentralityMetric::Degree => &mut self.degree,
            CentralityMetric::Betweenness => &mut self.betweenness,
            CentralityMetric::Closeness => &mut self.closeness,
            CentralityMetric::Eigenvector => &mut self.eigenvector,
            CentralityMetric::PageRank => &mut self.pagerank,
        };
        *slot = Some(value);
    }
}

/// 2D layout coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Graph participant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Unique identifier within the graph
    pub id: String,

    #[serde(flatten)]
    pub metrics: NodeMetrics,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub community: Option<i64>,

    #[serde(flatten)]
    pub position: Option<Position>,

    /// Tagged by the centrality highlight selector
    pub highlighted: bool,

    /// Present in both the baseline and a compared graph
    pub common: bool,

    /// Pinned in the layout
    pub fixed: bool,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metrics: NodeMetrics::default(),
            community: None,
            position: None,
            highlighted: false,
            common: false,
            fixed: false,
        }
    }

    pub fn with_metric(mut self, metric: CentralityMetric, value: f64) -> Self {
        self.metrics.set(metric, value);
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position { x, y });
        self
    }
}

/// Interaction between two participants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::weighted(source, target, 1.0)
    }

    pub fn weighted(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }
}

/// Canonical graph. Node order is irrelevant to every computation; edges keep
/// their input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    pub directed: bool,

    pub nodes: Vec<Node>,

    #[serde(rename = "links")]
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Build a graph from parts; callers are responsible for endpoint integrity
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>, directed: bool) -> Self {
        Self {
            directed,
            nodes,
            edges,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by identifier
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Set of node identifiers
    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|node| node.id.as_str()).collect()
    }

    /// Mapping from identifier to position in `nodes`
    pub fn node_index(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.as_str(), idx))
            .collect()
    }

    /// Edges with at least one endpoint missing from the node set
    pub fn unresolved_edges(&self) -> Vec<&Edge> {
        let ids = self.node_ids();
        self.edges
            .iter()
            .filter(|edge| {
                !ids.contains(edge.source.as_str()) || !ids.contains(edge.target.as_str())
            })
            .collect()
    }

    /// Copy of the graph with every unresolved edge dropped
    pub fn without_unresolved_edges(&self) -> Graph {
        self.induced(|_| true)
    }

    /// Keep the nodes matching `keep`, and the edges whose endpoints both survive.
    pub fn induced<F>(&self, keep: F) -> Graph
    where
        F: Fn(&Node) -> bool,
    {
        let nodes: Vec<Node> = self.nodes.iter().filter(|node| keep(node)).cloned().collect();
        let retained: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
        let edges = self
            .edges
            .iter()
            .filter(|edge| {
                retained.contains(edge.source.as_str()) && retained.contains(edge.target.as_str())
            })
            .cloned()
            .collect();

        Graph {
            directed: self.directed,
            nodes,
            edges,
        }
    }

    /// Remove every highlight tag, leaving everything else untouched
    pub fn clear_highlights(&mut self) {
        for node in &mut self.nodes {
            node.highlighted = false;
        }
    }

    /// Identifiers of the nodes currently tagged as highlighted
    pub fn highlighted_ids(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|node| node.highlighted)
            .map(|node| node.id.as_str())
            .collect()
    }
}
