//! Comparison form filters: identifier search and minimum interaction weight

use crate::graph::Graph;

/// Keep nodes whose identifier contains `fragment`, ignoring case. An empty
/// fragment keeps everything.
pub fn by_node_id(graph: &Graph, fragment: &str) -> Graph {
    let needle = fragment.trim().to_lowercase();
    if needle.is_empty() {
        return graph.clone();
    }
    graph.induced(|node| node.id.to_lowercase().contains(&needle))
}

/// Keep edges whose weight is at least `min_weight`. Nodes are untouched.
pub fn by_min_weight(graph: &Graph, min_weight: f64) -> Graph {
    let mut filtered = graph.clone();
    filtered.edges.retain(|edge| edge.weight >= min_weight);
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};

    fn sample() -> Graph {
        Graph::from_parts(
            ["Alice", "alicia", "Bob"].into_iter().map(Node::new).collect(),
            vec![
                Edge::weighted("Alice", "alicia", 3.0),
                Edge::weighted("alicia", "Bob", 1.0),
                Edge::weighted("Bob", "Alice", 2.0),
            ],
            true,
        )
    }

    #[test]
    fn test_search_ignores_case() {
        let filtered = by_node_id(&sample(), "ALI");
        assert_eq!(filtered.node_count(), 2);
        assert_eq!(filtered.edges, vec![Edge::weighted("Alice", "alicia", 3.0)]);
    }

    #[test]
    fn test_empty_search_is_identity() {
        assert_eq!(by_node_id(&sample(), "  "), sample());
    }

    #[test]
    fn test_min_weight_inclusive() {
        let filtered = by_min_weight(&sample(), 2.0);
        assert_eq!(filtered.node_count(), 3);
        assert_eq!(filtered.edge_count(), 2);
        assert!(filtered.edges.iter().all(|e| e.weight >= 2.0));
    }
}
