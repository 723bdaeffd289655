//! Centrality highlight selector: tag the top-ranked nodes for rendering

use crate::graph::{CentralityMetric, Graph};
use itertools::Itertools;

/// Score a node must reach to be tagged.
///
/// Scores are ranked descending (missing scores count as 0) and the value at
/// rank `floor(n · top_fraction)` is the cut. When that rank falls past the
/// end the lowest score is the cut, so every node qualifies. `None` for an
/// empty graph.
pub fn threshold(graph: &Graph, metric: CentralityMetric, top_fraction: f64) -> Option<f64> {
    if graph.is_empty() {
        return None;
    }

    let ranked: Vec<f64> = graph
        .nodes
        .iter()
        .map(|node| node.metrics.score(metric))
        .sorted_by(|a, b| b.total_cmp(a))
        .collect();

    let rank = (ranked.len() as f64 * top_fraction).floor() as usize;
    ranked.get(rank).or(ranked.last()).copied()
}

/// Tag every node scoring at or above the cut and untag the rest. Nodes and
/// edges are otherwise left as they are.
pub fn apply(graph: &mut Graph, metric: CentralityMetric, top_fraction: f64) {
    let Some(cut) = threshold(graph, metric, top_fraction) else {
        return;
    };

    for node in &mut graph.nodes {
        node.highlighted = node.metrics.score(metric) >= cut;
    }

    log::debug!(
        "Highlighted {} of {} nodes by {} (cut {})",
        graph.highlighted_ids().len(),
        graph.node_count(),
        metric,
        cut
    );
}
