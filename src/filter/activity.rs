//! Activity filter: hide participants with too few interactions

use crate::graph::metrics::undirected_degrees;
use crate::graph::Graph;

/// Keep nodes whose undirected degree is at least `threshold`, and the edges
/// between them.
///
/// Degree is counted on the unfiltered input in a single pass over the
/// edges, so removing a node never lowers the degree of its neighbours
/// within the same call.
pub fn apply(graph: &Graph, threshold: usize) -> Graph {
    let degrees = undirected_degrees(graph);
    let filtered = graph.induced(|node| degrees.get(node.id.as_str()).copied().unwrap_or(0) >= threshold);

    log::info!(
        "Activity filter (degree >= {}) kept {} of {} nodes",
        threshold,
        filtered.node_count(),
        graph.node_count()
    );
    filtered
}
