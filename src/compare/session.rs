//! Comparison session: one baseline graph compared against several candidates
//!
//! Shared filters are applied with identical parameters to the baseline and
//! to every active candidate, and statistics are always taken against the
//! filtered baseline.

use super::{compare, ComparisonStats};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::filter::{CommunityMap, FilterKind, FilterSpec, GraphView};
use crate::graph::metrics::{summarize, GraphSummary};
use crate::graph::normalize::{normalize, Diagnostic, RawGraph};
use crate::graph::{CentralityMetric, Graph};
use serde::Serialize;
use std::collections::HashSet;

/// Lifecycle of a candidate slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CandidateStatus {
    /// Not participating: never supplied, or deactivated by the caller
    Inactive,
    /// Graph supplied and normalized, not yet compared
    Analyzing,
    /// Compared at least once; follows shared filters
    Active,
}

/// One candidate graph and what the session knows about it
#[derive(Debug, Clone)]
pub struct Candidate {
    label: String,
    status: CandidateStatus,
    view: Option<GraphView>,
    diagnostics: Vec<Diagnostic>,
    stats: Option<ComparisonStats>,
}

impl Candidate {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status: CandidateStatus::Inactive,
            view: None,
            diagnostics: Vec::new(),
            stats: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn status(&self) -> CandidateStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == CandidateStatus::Active
    }

    pub fn view(&self) -> Option<&GraphView> {
        self.view.as_ref()
    }

    /// The candidate as currently filtered
    pub fn graph(&self) -> Option<&Graph> {
        self.view.as_ref().map(GraphView::current)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Cached statistics; `None` until compared, after deactivation or
    /// after a filter reset.
    pub fn stats(&self) -> Option<&ComparisonStats> {
        self.stats.as_ref()
    }
}

/// Parameters of a comparison form submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonRequest {
    /// Keep only nodes whose identifier contains this text; blank disables
    pub node_filter: String,
    pub min_weight: Option<f64>,
    /// Highlight the most central nodes by this metric
    pub metric: Option<CentralityMetric>,
    pub highlight_common: bool,
}

pub struct ComparisonSession {
    config: EngineConfig,
    baseline: GraphView,
    baseline_diagnostics: Vec<Diagnostic>,
    candidates: Vec<Candidate>,
    /// Shared filters in the order they were enabled
    global: Vec<FilterSpec>,
    highlight: Option<(CentralityMetric, f64)>,
    highlight_common: bool,
    communities: Option<CommunityMap>,
}

/// Bring `view`'s filter stack in line with `global`, keeping the longest
/// matching prefix, then reapply the shared highlight.
fn sync_view(view: &mut GraphView, global: &[FilterSpec], highlight: Option<(CentralityMetric, f64)>) {
    let matching = view
        .enabled()
        .zip(global)
        .take_while(|(state, spec)| &state.spec == *spec)
        .count();

    let next = view.enabled().nth(matching).map(|state| state.spec.kind());
    if let Some(kind) = next {
        view.disable(kind);
    }
    for spec in &global[matching..] {
        view.enable(spec.clone());
    }

    match highlight {
        Some((metric, fraction)) => view.highlight(metric, fraction),
        None if view.highlighted_metric().is_some() => view.clear_highlight(),
        None => {}
    }
}

impl ComparisonSession {
    pub fn new(baseline: Graph, config: EngineConfig) -> Self {
        Self {
            config,
            baseline: GraphView::new(baseline),
            baseline_diagnostics: Vec::new(),
            candidates: Vec::new(),
            global: Vec::new(),
            highlight: None,
            highlight_common: false,
            communities: None,
        }
    }

    /// Normalize a raw baseline payload and start a session on it
    pub fn from_raw(raw: &RawGraph, config: EngineConfig) -> Self {
        let normalized = normalize(raw);
        let mut session = Self::new(normalized.graph, config);
        session.baseline_diagnostics = normalized.diagnostics;
        session
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn baseline(&self) -> &GraphView {
        &self.baseline
    }

    pub fn baseline_diagnostics(&self) -> &[Diagnostic] {
        &self.baseline_diagnostics
    }

    /// Whole-graph metrics of the baseline as currently filtered
    pub fn baseline_summary(&self) -> GraphSummary {
        summarize(self.baseline.current(), &self.config)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidate(&self, idx: usize) -> EngineResult<&Candidate> {
        self.candidates.get(idx).ok_or(EngineError::UnknownCandidate(idx))
    }

    fn candidate_mut(&mut self, idx: usize) -> EngineResult<&mut Candidate> {
        self.candidates.get_mut(idx).ok_or(EngineError::UnknownCandidate(idx))
    }

    /// Shared filters currently applied
    pub fn global_filters(&self) -> &[FilterSpec] {
        &self.global
    }

    /// Community data from the detection collaborator
    pub fn set_communities(&mut self, map: CommunityMap) {
        self.communities = Some(map);
    }

    /// Open an empty, inactive candidate slot
    pub fn add_candidate(&mut self, label: impl Into<String>) -> usize {
        self.candidates.push(Candidate::new(label));
        self.candidates.len() - 1
    }

    /// Supply (or replace) a candidate's graph. The candidate moves to
    /// `Analyzing`; any cached statistics are dropped.
    pub fn supply_candidate(&mut self, idx: usize, raw: &RawGraph) -> EngineResult<()> {
        let normalized = normalize(raw);
        let candidate = self.candidate_mut(idx)?;

        log::info!(
            "Candidate '{}': {} nodes, {} links, {} diagnostics",
            candidate.label,
            normalized.graph.node_count(),
            normalized.graph.edge_count(),
            normalized.diagnostics.len()
        );

        candidate.view = Some(GraphView::new(normalized.graph));
        candidate.diagnostics = normalized.diagnostics;
        candidate.stats = None;
        candidate.status = CandidateStatus::Analyzing;
        Ok(())
    }

    /// Compare a supplied candidate against the filtered baseline and mark it
    /// active. A deactivated candidate is brought back in line with the
    /// shared filters first.
    pub fn analyze(&mut self, idx: usize) -> EngineResult<ComparisonStats> {
        let global = &self.global;
        let highlight = self.highlight;
        let baseline = self.baseline.current();

        let candidate = self
            .candidates
            .get_mut(idx)
            .ok_or(EngineError::UnknownCandidate(idx))?;
        let view = candidate
            .view
            .as_mut()
            .ok_or(EngineError::CandidateNotLoaded(idx))?;

        sync_view(view, global, highlight);
        let stats = compare(Some(baseline), Some(view.current()))
            .ok_or(EngineError::CandidateNotLoaded(idx))?;

        candidate.stats = Some(stats.clone());
        candidate.status = CandidateStatus::Active;
        log::info!(
            "Compared '{}': {:+} nodes ({:.1}%), {:+} links ({:.1}%), {} common",
            candidate.label,
            stats.node_difference,
            stats.node_change_percent,
            stats.link_difference,
            stats.link_change_percent,
            stats.common_nodes_count
        );

        self.refresh_common();
        Ok(stats)
    }

    /// Supply and compare in one step; returns the new slot index
    pub fn load_candidate(&mut self, label: impl Into<String>, raw: &RawGraph) -> EngineResult<usize> {
        let idx = self.add_candidate(label);
        self.supply_candidate(idx, raw)?;
        self.analyze(idx)?;
        Ok(idx)
    }

    /// Take a candidate out of the comparison. Its statistics are discarded;
    /// its graph is kept for reactivation.
    pub fn deactivate(&mut self, idx: usize) -> EngineResult<()> {
        let candidate = self.candidate_mut(idx)?;
        candidate.status = CandidateStatus::Inactive;
        candidate.stats = None;
        if let Some(view) = candidate.view.as_mut() {
            view.current_mut().nodes.iter_mut().for_each(|node| node.common = false);
        }
        self.refresh_common();
        Ok(())
    }

    /// Deactivate an active candidate or (re)activate any other. Returns
    /// whether the candidate is now active.
    pub fn toggle_active(&mut self, idx: usize) -> EngineResult<bool> {
        if self.candidate(idx)?.is_active() {
            self.deactivate(idx)?;
            Ok(false)
        } else {
            self.analyze(idx)?;
            Ok(true)
        }
    }

    /// Statistics for a candidate, recomputed when they were invalidated
    /// while it stayed active. `None` for candidates that are not active.
    pub fn statistics(&mut self, idx: usize) -> EngineResult<Option<ComparisonStats>> {
        let candidate = self.candidate(idx)?;
        if !candidate.is_active() {
            return Ok(None);
        }
        if let Some(stats) = candidate.stats() {
            return Ok(Some(stats.clone()));
        }
        self.analyze(idx).map(Some)
    }

    /// Statistics of every active candidate, by slot index
    pub fn all_statistics(&mut self) -> EngineResult<Vec<(usize, ComparisonStats)>> {
        let mut all = Vec::new();
        for idx in 0..self.candidates.len() {
            if let Some(stats) = self.statistics(idx)? {
                all.push((idx, stats));
            }
        }
        Ok(all)
    }

    /// Apply a shared filter to the baseline and every active candidate. A
    /// filter of the same kind with other parameters is replaced, together
    /// with the filters applied after it. Returns false when nothing changed.
    pub fn apply_global(&mut self, spec: FilterSpec) -> bool {
        if let Some(position) = self.global.iter().position(|s| s.kind() == spec.kind()) {
            if self.global[position] == spec {
                return false;
            }
            self.global.truncate(position);
        }

        log::info!("Applying {} filter to baseline and active candidates", spec.kind());
        self.global.push(spec);
        self.refresh();
        true
    }

    /// Remove a shared filter, restoring every graph to its state before the
    /// filter. Filters applied after it are removed as well.
    pub fn remove_global(&mut self, kind: FilterKind) -> bool {
        let Some(position) = self.global.iter().position(|s| s.kind() == kind) else {
            return false;
        };

        log::info!("Removing {} filter from baseline and active candidates", kind);
        self.global.truncate(position);
        self.refresh();
        true
    }

    /// Apply the filter if it is not applied, remove it otherwise. Returns
    /// the new state.
    pub fn toggle_global(&mut self, spec: FilterSpec) -> bool {
        let kind = spec.kind();
        if self.global.iter().any(|s| s.kind() == kind) {
            self.remove_global(kind);
            false
        } else {
            self.apply_global(spec)
        }
    }

    /// Enable the community filter using the supplied community data, or the
    /// baseline's own community attributes when none was supplied.
    pub fn enable_community_filter(&mut self) -> EngineResult<bool> {
        let map = CommunityMap::resolve(self.communities.as_ref(), self.baseline.canonical())?;
        let spec = FilterSpec::community(map, &self.config);
        Ok(self.apply_global(spec))
    }

    pub fn enable_activity_filter(&mut self) -> bool {
        let spec = FilterSpec::activity(&self.config);
        self.apply_global(spec)
    }

    pub fn enable_strong_connection_filter(&mut self) -> bool {
        let spec = FilterSpec::strong_connections(&self.config);
        self.apply_global(spec)
    }

    /// Drop every shared filter and highlight, restoring the baseline and all
    /// candidates to their normalized state. Cached statistics are
    /// invalidated and recomputed on the next request.
    pub fn reset_filters(&mut self) {
        self.global.clear();
        self.highlight = None;
        self.baseline.reset();
        for candidate in &mut self.candidates {
            if let Some(view) = candidate.view.as_mut() {
                view.reset();
            }
            candidate.stats = None;
        }
        self.refresh_common();
        log::info!("Filters reset on baseline and {} candidate(s)", self.candidates.len());
    }

    /// Highlight the top fraction of nodes by `metric` on every graph in the
    /// comparison
    pub fn highlight_central(&mut self, metric: CentralityMetric) {
        self.highlight = Some((metric, self.config.highlight_top_fraction));
        self.refresh();
    }

    pub fn clear_highlight(&mut self) {
        self.highlight = None;
        self.refresh();
    }

    /// Tag nodes shared between the baseline and the active candidates
    pub fn set_highlight_common(&mut self, enabled: bool) {
        self.highlight_common = enabled;
        self.refresh_common();
    }

    /// Apply a comparison form submission: search and weight filters are
    /// shared filters, the metric drives the highlight. Fields left empty
    /// remove what an earlier request set, so the default request clears
    /// everything it controls.
    pub fn apply_request(&mut self, request: &ComparisonRequest) {
        let fragment = request.node_filter.trim();
        if fragment.is_empty() {
            self.remove_global(FilterKind::NodeSearch);
        } else {
            self.apply_global(FilterSpec::NodeSearch {
                fragment: fragment.to_string(),
            });
        }

        match request.min_weight {
            Some(min_weight) => {
                self.apply_global(FilterSpec::MinWeight { min_weight });
            }
            None => {
                self.remove_global(FilterKind::MinWeight);
            }
        }

        match request.metric {
            Some(metric) => self.highlight_central(metric),
            None => self.clear_highlight(),
        }

        self.set_highlight_common(request.highlight_common);
    }

    /// Re-sync the baseline and active candidates with the shared state and
    /// recompute their statistics
    fn refresh(&mut self) {
        sync_view(&mut self.baseline, &self.global, self.highlight);

        let baseline = self.baseline.current();
        for candidate in self.candidates.iter_mut().filter(|c| c.is_active()) {
            if let Some(view) = candidate.view.as_mut() {
                sync_view(view, &self.global, self.highlight);
                candidate.stats = compare(Some(baseline), Some(view.current()));
            }
        }

        self.refresh_common();
    }

    fn refresh_common(&mut self) {
        if !self.highlight_common {
            let graphs = std::iter::once(&mut self.baseline)
                .chain(self.candidates.iter_mut().filter_map(|c| c.view.as_mut()));
            for view in graphs {
                view.current_mut().nodes.iter_mut().for_each(|node| node.common = false);
            }
            return;
        }

        let baseline_ids: HashSet<String> = self
            .baseline
            .current()
            .nodes
            .iter()
            .map(|node| node.id.clone())
            .collect();

        let mut shared = HashSet::new();
        for candidate in self.candidates.iter_mut().filter(|c| c.is_active()) {
            if let Some(view) = candidate.view.as_mut() {
                for node in &mut view.current_mut().nodes {
                    node.common = baseline_ids.contains(&node.id);
                    if node.common {
                        shared.insert(node.id.clone());
                    }
                }
            }
        }

        for node in &mut self.baseline.current_mut().nodes {
            node.common = shared.contains(&node.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};

    fn make_graph(ids: &[&str], edges: &[(&str, &str)]) -> Graph {
        Graph::from_parts(
            ids.iter()
                .enumerate()
                .map(|(i, id)| Node::new(*id).at(i as f64, 0.0))
                .collect(),
            edges.iter().map(|(s, t)| Edge::new(*s, *t)).collect(),
            false,
        )
    }

    fn baseline() -> Graph {
        // a-b-c triangle, d hangs off c, e isolated
        make_graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")],
        )
    }

    fn raw(graph: &Graph) -> RawGraph {
        RawGraph::from(graph)
    }

    fn session_with_candidate() -> (ComparisonSession, usize) {
        let mut session = ComparisonSession::new(baseline(), EngineConfig::default());
        let candidate = make_graph(&["a", "b", "c", "x"], &[("a", "b"), ("b", "c"), ("c", "x")]);
        let idx = session.load_candidate("march", &raw(&candidate)).unwrap();
        (session, idx)
    }

    #[test]
    fn test_candidate_lifecycle() {
        let mut session = ComparisonSession::new(baseline(), EngineConfig::default());
        let idx = session.add_candidate("march");
        assert_eq!(session.candidate(idx).unwrap().status(), CandidateStatus::Inactive);
        assert_eq!(session.analyze(idx), Err(EngineError::CandidateNotLoaded(idx)));

        let candidate = make_graph(&["a", "b"], &[("a", "b")]);
        session.supply_candidate(idx, &raw(&candidate)).unwrap();
        assert_eq!(session.candidate(idx).unwrap().status(), CandidateStatus::Analyzing);
        assert_eq!(session.statistics(idx).unwrap(), None);

        let stats = session.analyze(idx).unwrap();
        assert_eq!(session.candidate(idx).unwrap().status(), CandidateStatus::Active);
        assert_eq!(stats.original_node_count, 5);
        assert_eq!(stats.comparison_node_count, 2);

        session.deactivate(idx).unwrap();
        let candidate = session.candidate(idx).unwrap();
        assert_eq!(candidate.status(), CandidateStatus::Inactive);
        assert!(candidate.stats().is_none());
        assert!(candidate.graph().is_some());

        assert!(session.toggle_active(idx).unwrap());
        assert!(session.candidate(idx).unwrap().stats().is_some());
    }

    #[test]
    fn test_unknown_candidate() {
        let mut session = ComparisonSession::new(baseline(), EngineConfig::default());
        assert_eq!(session.deactivate(3), Err(EngineError::UnknownCandidate(3)));
        assert!(session.candidate(0).is_err());
    }

    #[test]
    fn test_global_filter_hits_baseline_and_active_candidates() {
        let (mut session, idx) = session_with_candidate();
        let idle = session.add_candidate("april");
        session
            .supply_candidate(idle, &raw(&make_graph(&["a"], &[])))
            .unwrap();

        assert!(session.enable_activity_filter());
        assert!(!session.enable_activity_filter());

        // degree >= 2 keeps the triangle on both sides
        assert_eq!(session.baseline().current().node_ids(), HashSet::from(["a", "b", "c"]));
        let active = session.candidate(idx).unwrap();
        assert_eq!(active.graph().unwrap().node_ids(), HashSet::from(["b", "c"]));
        assert!(active.view().unwrap().is_enabled(FilterKind::Activity));

        // stats are taken against the filtered baseline
        let stats = active.stats().unwrap();
        assert_eq!(stats.original_node_count, 3);
        assert_eq!(stats.comparison_node_count, 2);

        // analyzing candidates are not touched until compared
        let idle_view = session.candidate(idle).unwrap().view().unwrap();
        assert!(!idle_view.is_enabled(FilterKind::Activity));

        let stats = session.analyze(idle).unwrap();
        assert_eq!(stats.comparison_node_count, 0);
    }

    #[test]
    fn test_remove_global_restores_every_graph() {
        let (mut session, idx) = session_with_candidate();
        let before = session.candidate(idx).unwrap().graph().unwrap().clone();

        session.enable_activity_filter();
        assert!(session.remove_global(FilterKind::Activity));
        assert!(!session.remove_global(FilterKind::Activity));

        assert_eq!(session.baseline().current(), &baseline());
        assert_eq!(session.candidate(idx).unwrap().graph().unwrap(), &before);
        assert_eq!(session.candidate(idx).unwrap().stats().unwrap().original_node_count, 5);
    }

    #[test]
    fn test_reset_invalidates_statistics() {
        let (mut session, idx) = session_with_candidate();
        session.enable_activity_filter();
        session.highlight_central(CentralityMetric::Degree);

        session.reset_filters();
        assert!(session.global_filters().is_empty());
        assert_eq!(session.baseline().current(), &baseline());
        assert!(session.candidate(idx).unwrap().stats().is_none());

        let stats = session.statistics(idx).unwrap().unwrap();
        assert_eq!(stats.original_node_count, 5);
        assert_eq!(session.all_statistics().unwrap(), vec![(idx, stats)]);
    }

    #[test]
    fn test_reactivated_candidate_catches_up_with_filters() {
        let (mut session, idx) = session_with_candidate();
        session.deactivate(idx).unwrap();
        session.enable_strong_connection_filter();
        session.enable_activity_filter();

        let view = session.candidate(idx).unwrap().view().unwrap();
        assert_eq!(view.enabled().count(), 0);

        session.toggle_active(idx).unwrap();
        let kinds: Vec<_> = session
            .candidate(idx)
            .unwrap()
            .view()
            .unwrap()
            .enabled()
            .map(|state| state.spec.kind())
            .collect();
        assert_eq!(kinds, vec![FilterKind::StrongConnection, FilterKind::Activity]);
    }

    #[test]
    fn test_community_filter_needs_data() {
        let (mut session, idx) = session_with_candidate();
        assert_eq!(
            session.enable_community_filter(),
            Err(EngineError::MissingCommunities)
        );
        assert!(session.global_filters().is_empty());

        let map: CommunityMap = [("a", 0), ("b", 0), ("c", 1), ("d", 1), ("x", 1)]
            .into_iter()
            .map(|(id, c)| (id.to_string(), c))
            .collect();
        session.set_communities(map);
        assert_eq!(session.enable_community_filter(), Ok(true));

        assert_eq!(session.baseline().current().edge_count(), 2);
        let candidate = session.candidate(idx).unwrap().graph().unwrap();
        assert_eq!(candidate.edge_count(), 2);
    }

    #[test]
    fn test_common_node_tags() {
        let (mut session, idx) = session_with_candidate();
        session.set_highlight_common(true);

        let common: Vec<_> = session
            .baseline()
            .current()
            .nodes
            .iter()
            .filter(|n| n.common)
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(common, vec!["a", "b", "c"]);
        let candidate = session.candidate(idx).unwrap().graph().unwrap();
        assert!(!candidate.node("x").unwrap().common);
        assert!(candidate.node("a").unwrap().common);

        session.set_highlight_common(false);
        assert!(session.baseline().current().nodes.iter().all(|n| !n.common));
    }

    #[test]
    fn test_apply_request_and_clear() {
        let (mut session, idx) = session_with_candidate();
        let request = ComparisonRequest {
            node_filter: " A ".to_string(),
            min_weight: Some(1.0),
            metric: Some(CentralityMetric::Degree),
            highlight_common: true,
        };
        session.apply_request(&request);

        assert_eq!(session.global_filters().len(), 2);
        assert_eq!(session.baseline().current().node_ids(), HashSet::from(["a"]));
        let stats = session.candidate(idx).unwrap().stats().unwrap();
        assert_eq!(stats.common_nodes_count, 1);
        assert_eq!(session.baseline().current().highlighted_ids(), vec!["a"]);

        session.apply_request(&ComparisonRequest::default());
        assert!(session.global_filters().is_empty());
        assert_eq!(session.baseline().current(), &baseline());
    }

    #[test]
    fn test_cleared_highlight_survives_filter_history() {
        let (mut session, idx) = session_with_candidate();
        session.highlight_central(CentralityMetric::Degree);
        session.enable_activity_filter();
        assert_eq!(session.baseline().current().highlighted_ids(), vec!["a", "b", "c"]);

        session.clear_highlight();
        assert!(session.remove_global(FilterKind::Activity));
        assert!(session.baseline().current().highlighted_ids().is_empty());
        let candidate = session.candidate(idx).unwrap().graph().unwrap();
        assert!(candidate.highlighted_ids().is_empty());

        session.highlight_central(CentralityMetric::Degree);
        session.enable_activity_filter();
        session.clear_highlight();
        session.reset_filters();
        assert!(session.baseline().current().highlighted_ids().is_empty());
        assert_eq!(session.baseline().current(), &baseline());
    }

    #[test]
    fn test_from_raw_keeps_diagnostics() {
        let raw = RawGraph::from_json(
            r#"{ "nodes": [{ "id": "a" }], "links": [{ "source": "a", "target": "ghost" }] }"#,
        )
        .unwrap();
        let session = ComparisonSession::from_raw(&raw, EngineConfig::default());
        assert_eq!(session.baseline_diagnostics().len(), 1);
        assert_eq!(session.baseline_summary().edge_count, 1);
    }
}
