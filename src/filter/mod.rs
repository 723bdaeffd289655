//! Reversible structural filters and the per-graph view that stacks them
//!
//! A filter never touches the canonical graph. Enabling one snapshots the
//! current view and replaces it with the filtered result; disabling it puts
//! the snapshot back verbatim, node positions included.

pub mod activity;
pub mod community;
pub mod highlight;
pub mod search;
pub mod strong;

pub use community::{CommunityLayout, CommunityMap, CommunitySummary};

use crate::config::EngineConfig;
use crate::graph::metrics::with_degree_scores;
use crate::graph::{CentralityMetric, Graph};
use serde::Serialize;
use std::fmt;

/// Identity of a structural filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FilterKind {
    Activity,
    StrongConnection,
    Community,
    NodeSearch,
    MinWeight,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterKind::Activity => "activity",
            FilterKind::StrongConnection => "strong-connection",
            FilterKind::Community => "community",
            FilterKind::NodeSearch => "node-search",
            FilterKind::MinWeight => "min-weight",
        };
        f.write_str(name)
    }
}

/// A structural filter together with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// Keep nodes whose undirected degree is at least `threshold`
    Activity { threshold: usize },
    /// Keep nodes whose betweenness is at least `threshold`
    StrongConnection { threshold: f64 },
    /// Keep intra-community edges and regroup nodes around community centroids
    Community {
        map: CommunityMap,
        layout: CommunityLayout,
    },
    /// Keep nodes whose identifier contains `fragment`, ignoring case
    NodeSearch { fragment: String },
    /// Keep edges whose weight is at least `min_weight`
    MinWeight { min_weight: f64 },
}

impl FilterSpec {
    /// Activity filter with the configured threshold
    pub fn activity(config: &EngineConfig) -> Self {
        FilterSpec::Activity {
            threshold: config.activity_threshold,
        }
    }

    /// Strong-connection filter with the configured betweenness threshold
    pub fn strong_connections(config: &EngineConfig) -> Self {
        FilterSpec::StrongConnection {
            threshold: config.strong_connection_threshold,
        }
    }

    /// Community filter laid out according to the configuration
    pub fn community(map: CommunityMap, config: &EngineConfig) -> Self {
        FilterSpec::Community {
            map,
            layout: CommunityLayout::from_config(config),
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            FilterSpec::Activity { .. } => FilterKind::Activity,
            FilterSpec::StrongConnection { .. } => FilterKind::StrongConnection,
            FilterSpec::Community { .. } => FilterKind::Community,
            FilterSpec::NodeSearch { .. } => FilterKind::NodeSearch,
            FilterSpec::MinWeight { .. } => FilterKind::MinWeight,
        }
    }

    /// Derive the filtered graph. `graph` is left untouched.
    pub fn apply(&self, graph: &Graph) -> Graph {
        match self {
            FilterSpec::Activity { threshold } => activity::apply(graph, *threshold),
            FilterSpec::StrongConnection { threshold } => strong::apply(graph, *threshold),
            FilterSpec::Community { map, layout } => community::apply(graph, map, layout),
            FilterSpec::NodeSearch { fragment } => search::by_node_id(graph, fragment),
            FilterSpec::MinWeight { min_weight } => search::by_min_weight(graph, *min_weight),
        }
    }
}

/// Result of one toggle: the graph to show and the snapshot to keep
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutput {
    pub graph: Graph,
    pub snapshot: Graph,
}

/// Toggle a filter over `current`.
///
/// Without a previous snapshot the filter is switched on: the result is the
/// filtered graph and `current` becomes the snapshot. With one it is switched
/// off: the snapshot is handed back verbatim, not recomputed.
pub fn toggle(spec: &FilterSpec, current: &Graph, previous_snapshot: Option<Graph>) -> FilterOutput {
    match previous_snapshot {
        None => FilterOutput {
            graph: spec.apply(current),
            snapshot: current.clone(),
        },
        Some(snapshot) => FilterOutput {
            graph: snapshot.clone(),
            snapshot,
        },
    }
}

/// An enabled filter and the graph as it stood right before it
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub spec: FilterSpec,
    pub snapshot: Graph,
}

/// One logical graph: its canonical form plus the derived view currently
/// shown, built by a stack of enabled filters.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphView {
    canonical: Graph,
    current: Graph,
    stack: Vec<FilterState>,
    highlight: Option<(CentralityMetric, f64)>,
}

impl GraphView {
    pub fn new(graph: Graph) -> Self {
        Self {
            current: graph.clone(),
            canonical: graph,
            stack: Vec::new(),
            highlight: None,
        }
    }

    /// The graph as normalized, never modified by filters
    pub fn canonical(&self) -> &Graph {
        &self.canonical
    }

    /// The derived graph to render and measure
    pub fn current(&self) -> &Graph {
        &self.current
    }

    pub(crate) fn current_mut(&mut self) -> &mut Graph {
        &mut self.current
    }

    pub fn is_enabled(&self, kind: FilterKind) -> bool {
        self.stack.iter().any(|state| state.spec.kind() == kind)
    }

    /// Enabled filters in the order they were applied
    pub fn enabled(&self) -> impl Iterator<Item = &FilterState> + '_ {
        self.stack.iter()
    }

    pub fn highlighted_metric(&self) -> Option<CentralityMetric> {
        self.highlight.map(|(metric, _)| metric)
    }

    /// Switch a filter on. A filter of the same kind with other parameters is
    /// switched off first; identical parameters are a no-op.
    pub fn enable(&mut self, spec: FilterSpec) -> bool {
        if let Some(existing) = self.stack.iter().find(|s| s.spec.kind() == spec.kind()) {
            if existing.spec == spec {
                return false;
            }
            self.disable(spec.kind());
        }

        let output = toggle(&spec, &self.current, None);
        log::debug!(
            "Enabled {} filter: {} -> {} nodes",
            spec.kind(),
            output.snapshot.node_count(),
            output.graph.node_count()
        );
        self.stack.push(FilterState {
            spec,
            snapshot: output.snapshot,
        });
        self.current = output.graph;
        self.reapply_highlight();
        true
    }

    /// Switch a filter off, restoring the graph saved when it was enabled.
    /// Filters enabled after it were built on top of that state and are
    /// discarded with it.
    ///
    /// Disabling a filter that is not enabled is a caller bug: it panics in
    /// debug builds and is ignored otherwise.
    pub fn disable(&mut self, kind: FilterKind) -> bool {
        let Some(position) = self.stack.iter().position(|s| s.spec.kind() == kind) else {
            log::error!("Restore requested for {} filter without a snapshot", kind);
            debug_assert!(false, "restore requested for {kind} filter without a snapshot");
            return false;
        };

        let discarded = self.stack.split_off(position);
        if discarded.len() > 1 {
            log::debug!(
                "Disabling {} filter also discards {} later filter(s)",
                kind,
                discarded.len() - 1
            );
        }

        let mut discarded = discarded.into_iter();
        if let Some(state) = discarded.next() {
            let output = toggle(&state.spec, &self.current, Some(state.snapshot));
            self.current = output.graph;
        }
        self.reapply_highlight();
        true
    }

    /// Enable the filter if it is off, disable it if it is on. Returns the
    /// new state.
    pub fn toggle(&mut self, spec: FilterSpec) -> bool {
        if self.is_enabled(spec.kind()) {
            self.disable(spec.kind());
            false
        } else {
            self.enable(spec);
            true
        }
    }

    /// Tag the top `top_fraction` of nodes by `metric`. Degree is ranked on
    /// edge counts when no node carries one.
    pub fn highlight(&mut self, metric: CentralityMetric, top_fraction: f64) {
        self.highlight = Some((metric, top_fraction));
        self.reapply_highlight();
    }

    /// Remove highlight tags, leaving the graph otherwise untouched. Saved
    /// snapshots lose their tags too, so disabling a filter later cannot
    /// bring them back.
    pub fn clear_highlight(&mut self) {
        self.highlight = None;
        self.current.clear_highlights();
        for state in &mut self.stack {
            state.snapshot.clear_highlights();
        }
    }

    /// Drop every filter and tag, back to the canonical graph
    pub fn reset(&mut self) {
        self.current = self.canonical.clone();
        self.stack.clear();
        self.highlight = None;
    }

    fn reapply_highlight(&mut self) {
        let Some((metric, top_fraction)) = self.highlight else {
            return;
        };

        if metric != CentralityMetric::Degree {
            highlight::apply(&mut self.current, metric, top_fraction);
            return;
        }

        // rank on back-filled degrees; only the tags land on the view
        let mut scored = with_degree_scores(&self.current);
        highlight::apply(&mut scored, metric, top_fraction);
        for (node, ranked) in self.current.nodes.iter_mut().zip(&scored.nodes) {
            node.highlighted = ranked.highlighted;
        }
    }
}
