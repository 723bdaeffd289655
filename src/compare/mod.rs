//! Baseline-versus-candidate comparison statistics

pub mod session;

use crate::graph::Graph;
use serde::Serialize;
use std::collections::HashSet;

/// Size deltas and overlap between a baseline graph and a candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonStats {
    pub original_node_count: usize,
    pub comparison_node_count: usize,
    pub original_link_count: usize,
    pub comparison_link_count: usize,
    pub node_difference: i64,
    pub link_difference: i64,
    /// Percent change relative to the baseline; 0 when the baseline is empty
    pub node_change_percent: f64,
    pub link_change_percent: f64,
    /// Node identifiers present in both graphs
    pub common_nodes_count: usize,
    /// `common_nodes_count` as a percentage of the baseline node count
    pub common_nodes_percent: f64,
}

/// `part / whole` as a percentage, 0 when `whole` is 0
fn percent_of(part: f64, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part / whole as f64 * 100.0
    }
}

fn signed_difference(from: usize, to: usize) -> i64 {
    to as i64 - from as i64
}

/// Identifiers present in both graphs
pub fn common_node_ids<'a>(baseline: &'a Graph, candidate: &Graph) -> HashSet<&'a str> {
    let candidate_ids = candidate.node_ids();
    baseline
        .nodes
        .iter()
        .map(|node| node.id.as_str())
        .filter(|id| candidate_ids.contains(id))
        .collect()
}

/// Compare a candidate against the baseline. `None` when either side is
/// absent; that is for the caller to report, not an error.
pub fn compare(baseline: Option<&Graph>, candidate: Option<&Graph>) -> Option<ComparisonStats> {
    let (baseline, candidate) = (baseline?, candidate?);

    let original_node_count = baseline.node_count();
    let comparison_node_count = candidate.node_count();
    let original_link_count = baseline.edge_count();
    let comparison_link_count = candidate.edge_count();

    let node_difference = signed_difference(original_node_count, comparison_node_count);
    let link_difference = signed_difference(original_link_count, comparison_link_count);
    let common_nodes_count = common_node_ids(baseline, candidate).len();

    Some(ComparisonStats {
        original_node_count,
        comparison_node_count,
        original_link_count,
        comparison_link_count,
        node_difference,
        link_difference,
        node_change_percent: percent_of(node_difference as f64, original_node_count),
        link_change_percent: percent_of(link_difference as f64, original_link_count),
        common_nodes_count,
        common_nodes_percent: percent_of(common_nodes_count as f64, original_node_count),
    })
}
