//! Strong-connection filter: keep only brokers with high betweenness

use crate::graph::{CentralityMetric, Graph};

/// Keep nodes whose betweenness is at least `threshold` (missing counts as
/// 0), and the edges between them.
pub fn apply(graph: &Graph, threshold: f64) -> Graph {
    let filtered =
        graph.induced(|node| node.metrics.score(CentralityMetric::Betweenness) >= threshold);

    log::info!(
        "Strong-connection filter (betweenness >= {}) kept {} of {} nodes",
        threshold,
        filtered.node_count(),
        graph.node_count()
    );
    filtered
}
