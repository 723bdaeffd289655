//! Results persistence module

use anyhow::Result;
use crate::compare::session::ComparisonSession;
use crate::graph::Graph;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use serde_json::{json, to_string_pretty};

/// Save comparison results to the specified directory
pub fn save_results(session: &mut ComparisonSession, output_dir: &str) -> Result<()> {
    log::info!(
        "Saving baseline and {} candidate(s) to {}",
        session.candidates().len(),
        output_dir
    );

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    save_summary(session, output_dir)?;
    save_comparisons(session, output_dir)?;
    save_graphs(session, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

/// Save baseline metrics and the filters in effect
fn save_summary(session: &ComparisonSession, output_dir: &str) -> Result<()> {
    log::info!("Saving summary information");

    let path = Path::new(output_dir).join("summary.json");
    let mut file = File::create(path)?;

    let baseline = session.baseline();
    let summary = json!({
        "baseline": session.baseline_summary(),
        "canonical_node_count": baseline.canonical().node_count(),
        "canonical_link_count": baseline.canonical().edge_count(),
        "filters": session
            .global_filters()
            .iter()
            .map(|spec| spec.kind().to_string())
            .collect::<Vec<_>>(),
        "highlight": baseline.highlighted_metric().map(|metric| metric.label()),
        "highlighted_nodes": baseline.current().highlighted_ids(),
        "diagnostics": session
            .baseline_diagnostics()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>(),
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}

/// Save one statistics record per candidate
fn save_comparisons(session: &mut ComparisonSession, output_dir: &str) -> Result<()> {
    log::info!("Saving comparison statistics");

    let path = Path::new(output_dir).join("comparisons.json");
    let mut file = File::create(path)?;

    let mut entries = Vec::with_capacity(session.candidates().len());
    for idx in 0..session.candidates().len() {
        let stats = session.statistics(idx)?;
        let candidate = session.candidate(idx)?;
        entries.push(json!({
            "index": idx,
            "label": candidate.label(),
            "status": candidate.status(),
            "stats": stats,
            "diagnostics": candidate
                .diagnostics()
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>(),
        }));
    }

    let comparisons = json!({ "comparisons": entries });
    file.write_all(to_string_pretty(&comparisons)?.as_bytes())?;

    Ok(())
}

/// Save the filtered graphs as the rendering layer draws them
fn save_graphs(session: &ComparisonSession, output_dir: &str) -> Result<()> {
    log::info!("Saving filtered graphs");

    let graphs_dir = Path::new(output_dir).join("graphs");
    fs::create_dir_all(&graphs_dir)?;

    write_graph(&graphs_dir.join("baseline.json"), session.baseline().current())?;

    for (idx, candidate) in session.candidates().iter().enumerate() {
        if let Some(graph) = candidate.graph() {
            write_graph(&graphs_dir.join(format!("candidate_{}.json", idx)), graph)?;
        }
    }

    Ok(())
}

fn write_graph(path: &Path, graph: &Graph) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(graph)?.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::graph::normalize::RawGraph;
    use crate::graph::{Edge, Node};

    fn make_graph(ids: &[&str], edges: &[(&str, &str)]) -> Graph {
        Graph::from_parts(
            ids.iter().map(|id| Node::new(*id)).collect(),
            edges.iter().map(|(s, t)| Edge::new(*s, *t)).collect(),
            false,
        )
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_save_results_layout() {
        let baseline = make_graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let mut session = ComparisonSession::new(baseline, EngineConfig::default());
        let candidate = make_graph(&["a", "b"], &[("a", "b")]);
        session
            .load_candidate("april", &RawGraph::from(&candidate))
            .unwrap();
        session.add_candidate("empty slot");

        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("out");
        save_results(&mut session, output_dir.to_str().unwrap()).unwrap();

        let summary = read_json(&output_dir.join("summary.json"));
        assert_eq!(summary["baseline"]["node_count"], 3);
        assert_eq!(summary["filters"], json!([]));

        let comparisons = read_json(&output_dir.join("comparisons.json"));
        let entries = comparisons["comparisons"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["label"], "april");
        assert_eq!(entries[0]["status"], "Active");
        assert_eq!(entries[0]["stats"]["nodeDifference"], -1);
        assert!(entries[1]["stats"].is_null());

        let graph = read_json(&output_dir.join("graphs").join("baseline.json"));
        assert_eq!(graph["links"].as_array().unwrap().len(), 2);
        assert!(output_dir.join("graphs").join("candidate_0.json").exists());
        assert!(!output_dir.join("graphs").join("candidate_1.json").exists());
    }
}
