//! Whole-graph structural metrics
//!
//! Every function here is pure: it reads a normalized graph and never
//! touches node attributes. Edges whose endpoints do not resolve are
//! ignored by the computations that need node indices.

use crate::config::EngineConfig;
use crate::graph::{CentralityMetric, Graph};
use petgraph::algo::connected_components;
use petgraph::graph::UnGraph;
use serde::Serialize;
use statrs::statistics::{Data, Median, Statistics};
use std::collections::{HashMap, HashSet};

/// Density of the undirected simple graph underneath `graph`.
///
/// `2m / (n·(n-1))` where `m` counts distinct unordered pairs of distinct,
/// resolved endpoints rather than the raw link count, so parallel edges,
/// reverse duplicates and self-loops never push the value above 1. A payload
/// whose links are already a simple graph gets the same value as `2·links /
/// (n·(n-1))`. Zero for fewer than two nodes.
pub fn density(graph: &Graph) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }

    let ids = graph.node_ids();
    let pairs: HashSet<(&str, &str)> = graph
        .edges
        .iter()
        .filter(|edge| edge.source != edge.target)
        .filter(|edge| ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str()))
        .map(|edge| {
            let (a, b) = (edge.source.as_str(), edge.target.as_str());
            if a < b {
                (a, b)
            } else {
                (b, a)
            }
        })
        .collect();

    let n = n as f64;
    2.0 * pairs.len() as f64 / (n * (n - 1.0))
}

const UNREACHABLE: usize = usize::MAX;

/// Longest finite shortest-path length, counting every edge as 1 and
/// traversing edges in both directions.
///
/// Floyd–Warshall over the full distance matrix, O(n³). Pairs with no path
/// are left out, so a disconnected graph reports the diameter of its
/// reachable pairs. Use [`diameter_guarded`] for graphs of unknown size.
pub fn diameter(graph: &Graph) -> usize {
    let n = graph.node_count();
    if n < 2 {
        return 0;
    }

    let index = graph.node_index();
    let mut dist = vec![vec![UNREACHABLE; n]; n];
    for (i, row) in dist.iter_mut().enumerate() {
        row[i] = 0;
    }

    for edge in &graph.edges {
        if let (Some(&u), Some(&v)) = (
            index.get(edge.source.as_str()),
            index.get(edge.target.as_str()),
        ) {
            if u != v {
                dist[u][v] = 1;
                dist[v][u] = 1;
            }
        }
    }

    for k in 0..n {
        for i in 0..n {
            let ik = dist[i][k];
            if ik == UNREACHABLE {
                continue;
            }
            for j in 0..n {
                let kj = dist[k][j];
                if kj == UNREACHABLE {
                    continue;
                }
                if ik + kj < dist[i][j] {
                    dist[i][j] = ik + kj;
                }
            }
        }
    }

    dist.iter()
        .flatten()
        .copied()
        .filter(|&d| d != UNREACHABLE)
        .max()
        .unwrap_or(0)
}

/// Diameter, or `None` when the graph has more than `max_nodes` nodes
pub fn diameter_guarded(graph: &Graph, max_nodes: usize) -> Option<usize> {
    if graph.node_count() > max_nodes {
        log::warn!(
            "Skipping diameter for {} nodes (limit {}); filter the graph first",
            graph.node_count(),
            max_nodes
        );
        return None;
    }
    Some(diameter(graph))
}

/// In- and out-degree per node identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DegreeMaps {
    pub in_degree: HashMap<String, usize>,
    pub out_degree: HashMap<String, usize>,
}

impl DegreeMaps {
    /// Undirected degree: in + out
    pub fn total(&self, id: &str) -> usize {
        self.in_degree.get(id).copied().unwrap_or(0) + self.out_degree.get(id).copied().unwrap_or(0)
    }
}

/// Build both degree maps in one pass over the edges. Every node starts at 0;
/// unresolved endpoints are counted under their own identifier.
pub fn degree_maps(graph: &Graph) -> DegreeMaps {
    let mut maps = DegreeMaps::default();
    for node in &graph.nodes {
        maps.in_degree.insert(node.id.clone(), 0);
        maps.out_degree.insert(node.id.clone(), 0);
    }

    for edge in &graph.edges {
        *maps.out_degree.entry(edge.source.clone()).or_insert(0) += 1;
        *maps.in_degree.entry(edge.target.clone()).or_insert(0) += 1;
    }

    maps
}

/// Undirected degree of every node: each edge counts once at both ends
pub fn undirected_degrees(graph: &Graph) -> HashMap<&str, usize> {
    let mut degrees: HashMap<&str, usize> =
        graph.nodes.iter().map(|node| (node.id.as_str(), 0)).collect();

    for edge in &graph.edges {
        *degrees.entry(edge.source.as_str()).or_insert(0) += 1;
        *degrees.entry(edge.target.as_str()).or_insert(0) += 1;
    }

    degrees
}

/// Fraction of edges `(u, v)` whose reverse `(v, u)` is also present
pub fn reciprocity(graph: &Graph) -> f64 {
    if graph.edges.is_empty() {
        return 0.0;
    }

    let present: HashSet<(&str, &str)> = graph
        .edges
        .iter()
        .map(|edge| (edge.source.as_str(), edge.target.as_str()))
        .collect();

    let reciprocal = graph
        .edges
        .iter()
        .filter(|edge| present.contains(&(edge.target.as_str(), edge.source.as_str())))
        .count();

    reciprocal as f64 / graph.edges.len() as f64
}

/// Number of connected components, ignoring edge direction
pub fn component_count(graph: &Graph) -> usize {
    let index = graph.node_index();
    let mut undirected = UnGraph::<(), ()>::with_capacity(graph.node_count(), graph.edge_count());
    let handles: Vec<_> = graph.nodes.iter().map(|_| undirected.add_node(())).collect();

    for edge in &graph.edges {
        if let (Some(&u), Some(&v)) = (
            index.get(edge.source.as_str()),
            index.get(edge.target.as_str()),
        ) {
            undirected.add_edge(handles[u], handles[v], ());
        }
    }

    connected_components(&undirected)
}

/// Distribution summary of undirected node degree
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DegreeSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub max: f64,
}

pub fn degree_summary(graph: &Graph) -> DegreeSummary {
    if graph.is_empty() {
        return DegreeSummary::default();
    }

    let degrees = undirected_degrees(graph);
    let values: Vec<f64> = graph
        .nodes
        .iter()
        .map(|node| degrees.get(node.id.as_str()).copied().unwrap_or(0) as f64)
        .collect();

    let std_dev = Statistics::std_dev(values.iter());
    DegreeSummary {
        mean: Statistics::mean(values.iter()),
        // sample deviation is undefined for a single node
        std_dev: if std_dev.is_nan() { 0.0 } else { std_dev },
        median: Data::new(values.clone()).median(),
        max: Statistics::max(values.iter()),
    }
}

/// Whole-graph statistics handed to the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    /// `None` when the graph exceeded the diameter node guard
    pub diameter: Option<usize>,
    pub reciprocity: f64,
    pub component_count: usize,
    pub degree: DegreeSummary,
    pub degree_maps: DegreeMaps,
}

/// Compute every whole-graph metric at once
pub fn summarize(graph: &Graph, config: &EngineConfig) -> GraphSummary {
    GraphSummary {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        density: density(graph),
        diameter: diameter_guarded(graph, config.max_diameter_nodes),
        reciprocity: reciprocity(graph),
        component_count: component_count(graph),
        degree: degree_summary(graph),
        degree_maps: degree_maps(graph),
    }
}

/// Each node's metric divided by the graph maximum; all zero when the
/// maximum is zero.
pub fn relative_scores(graph: &Graph, metric: CentralityMetric) -> HashMap<String, f64> {
    let max = graph
        .nodes
        .iter()
        .map(|node| node.metrics.score(metric))
        .fold(0.0_f64, f64::max);

    graph
        .nodes
        .iter()
        .map(|node| {
            let ratio = if max > 0.0 {
                node.metrics.score(metric) / max
            } else {
                0.0
            };
            (node.id.clone(), ratio)
        })
        .collect()
}

/// Copy of `graph` whose nodes carry a degree score. When any node already
/// has one, the graph is returned unchanged.
pub fn with_degree_scores(graph: &Graph) -> Graph {
    let mut derived = graph.clone();
    if graph.nodes.iter().any(|node| node.metrics.degree.is_some()) {
        return derived;
    }

    let degrees = undirected_degrees(graph);
    for node in &mut derived.nodes {
        let degree = degrees.get(node.id.as_str()).copied().unwrap_or(0);
        node.metrics.degree = Some(degree as f64);
    }
    derived
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};

    fn make_graph(ids: &[&str], edges: &[(&str, &str)]) -> Graph {
        Graph::from_parts(
            ids.iter().map(|id| Node::new(*id)).collect(),
            edges.iter().map(|(s, t)| Edge::new(*s, *t)).collect(),
            true,
        )
    }

    #[test]
    fn test_density() {
        assert_eq!(density(&make_graph(&[], &[])), 0.0);
        assert_eq!(density(&make_graph(&["a"], &[("a", "a")])), 0.0);

        // 3 nodes, 2 edges: 4 / 6
        let g = make_graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        assert!((density(&g) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_density_stays_in_unit_interval() {
        // reciprocal and parallel edges collapse into one undirected pair
        let g = make_graph(&["a", "b"], &[("a", "b"), ("b", "a"), ("a", "b"), ("a", "a")]);
        assert_eq!(density(&g), 1.0);

        let sparse = make_graph(&["a", "b", "c", "d"], &[("a", "ghost")]);
        assert_eq!(density(&sparse), 0.0);
    }

    #[test]
    fn test_diameter_chain() {
        let g = make_graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
        assert_eq!(diameter(&g), 3);
    }

    #[test]
    fn test_diameter_ignores_direction_and_weight() {
        let mut g = make_graph(&["a", "b", "c"], &[("b", "a"), ("b", "c")]);
        g.edges[0].weight = 10.0;
        assert_eq!(diameter(&g), 2);
    }

    #[test]
    fn test_diameter_disconnected_uses_reachable_pairs() {
        let g = make_graph(
            &["a", "b", "c", "x", "y"],
            &[("a", "b"), ("b", "c"), ("x", "y")],
        );
        assert_eq!(diameter(&g), 2);
        assert_eq!(diameter(&make_graph(&["a", "b"], &[])), 0);
        assert_eq!(diameter(&make_graph(&["a"], &[])), 0);
    }

    #[test]
    fn test_removing_edge_never_shrinks_diameter() {
        let ring = make_graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e"), ("e", "a")],
        );
        let before = diameter(&ring);

        let mut cut = ring.clone();
        cut.edges.remove(4);
        assert_eq!(component_count(&cut), 1);
        assert!(diameter(&cut) >= before);
        assert_eq!(diameter(&cut), 4);
    }

    #[test]
    fn test_diameter_guard() {
        let g = make_graph(&["a", "b", "c"], &[("a", "b")]);
        assert_eq!(diameter_guarded(&g, 2), None);
        assert_eq!(diameter_guarded(&g, 3), Some(1));
    }

    #[test]
    fn test_degree_maps() {
        let g = make_graph(&["a", "b", "c"], &[("a", "b"), ("a", "c"), ("b", "c")]);
        let maps = degree_maps(&g);

        assert_eq!(maps.out_degree["a"], 2);
        assert_eq!(maps.in_degree["a"], 0);
        assert_eq!(maps.in_degree["c"], 2);
        assert_eq!(maps.total("b"), 2);
        assert_eq!(maps.total("missing"), 0);
    }

    #[test]
    fn test_reciprocity() {
        let g = make_graph(&["a", "b", "c"], &[("a", "b"), ("b", "a"), ("b", "c")]);
        assert!((reciprocity(&g) - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(reciprocity(&make_graph(&["a"], &[])), 0.0);
    }

    #[test]
    fn test_component_count() {
        let g = make_graph(&["a", "b", "c", "d"], &[("a", "b"), ("c", "ghost")]);
        assert_eq!(component_count(&g), 3);
    }

    #[test]
    fn test_degree_summary() {
        // star: center degree 3, leaves degree 1
        let g = make_graph(&["hub", "x", "y", "z"], &[("hub", "x"), ("hub", "y"), ("z", "hub")]);
        let summary = degree_summary(&g);

        assert!((summary.mean - 1.5).abs() < 1e-9);
        assert_eq!(summary.median, 1.0);
        assert_eq!(summary.max, 3.0);
        assert!(summary.std_dev > 0.0);

        let single = degree_summary(&make_graph(&["a"], &[]));
        assert_eq!(single.std_dev, 0.0);
    }

    #[test]
    fn test_relative_scores_zero_max() {
        let g = make_graph(&["a", "b"], &[]);
        let scores = relative_scores(&g, CentralityMetric::PageRank);
        assert_eq!(scores["a"], 0.0);
        assert_eq!(scores["b"], 0.0);

        let mut ranked = g.clone();
        ranked.nodes[0].metrics.pagerank = Some(0.4);
        ranked.nodes[1].metrics.pagerank = Some(0.1);
        let scores = relative_scores(&ranked, CentralityMetric::PageRank);
        assert_eq!(scores["a"], 1.0);
        assert!((scores["b"] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_with_degree_scores() {
        let g = make_graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let scored = with_degree_scores(&g);
        assert_eq!(scored.node("b").unwrap().metrics.degree, Some(2.0));
        assert_eq!(g.node("b").unwrap().metrics.degree, None);

        let mut preset = g.clone();
        preset.nodes[0].metrics.degree = Some(7.0);
        assert_eq!(with_degree_scores(&preset), preset);
    }

    #[test]
    fn test_summarize() {
        let g = make_graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
        let summary = summarize(&g, &EngineConfig::default());

        assert_eq!(summary.node_count, 2);
        assert_eq!(summary.edge_count, 2);
        assert_eq!(summary.density, 1.0);
        assert_eq!(summary.diameter, Some(1));
        assert_eq!(summary.reciprocity, 1.0);
        assert_eq!(summary.component_count, 1);
    }
}
