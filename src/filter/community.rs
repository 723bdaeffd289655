//! Community filter and the community data it consumes
//!
//! Community detection runs upstream; this module only reads its output:
//! a mapping from node identifier to community id, plus per-community
//! summaries for the rendering layer.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::graph::normalize::RawId;
use crate::graph::{Graph, Position};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

/// Node identifier -> community id. Identifiers are trimmed on the way in
/// and on lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommunityMap {
    assignments: HashMap<String, i64>,
}

impl CommunityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, community: i64) {
        self.assignments.insert(id.trim().to_string(), community);
    }

    pub fn get(&self, id: &str) -> Option<i64> {
        self.assignments.get(id.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Distinct community ids, ascending
    pub fn communities(&self) -> Vec<i64> {
        self.assignments.values().copied().sorted().dedup().collect()
    }

    /// Mapping carried by the nodes' own `community` attributes
    pub fn from_graph(graph: &Graph) -> Self {
        graph
            .nodes
            .iter()
            .filter_map(|node| node.community.map(|c| (node.id.clone(), c)))
            .collect()
    }

    /// Copy of `graph` with each mapped node's community attribute set
    pub fn assign(&self, graph: &Graph) -> Graph {
        let mut assigned = graph.clone();
        for node in &mut assigned.nodes {
            if let Some(community) = self.get(&node.id) {
                node.community = Some(community);
            }
        }
        assigned
    }

    /// Use `provided` when it has entries, otherwise fall back to the
    /// communities already recorded on `graph`.
    pub fn resolve(provided: Option<&CommunityMap>, graph: &Graph) -> EngineResult<CommunityMap> {
        if let Some(map) = provided.filter(|map| !map.is_empty()) {
            return Ok(map.clone());
        }

        let recorded = CommunityMap::from_graph(graph);
        if recorded.is_empty() {
            log::warn!("Community data not found; run community detection first");
            return Err(EngineError::MissingCommunities);
        }

        log::info!("Using {} community assignments recorded on the graph", recorded.len());
        Ok(recorded)
    }
}

impl FromIterator<(String, i64)> for CommunityMap {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        let mut map = CommunityMap::new();
        for (id, community) in iter {
            map.insert(&id, community);
        }
        map
    }
}

/// Per-community summary produced by the detection collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySummary {
    pub id: i64,

    #[serde(default, alias = "nodes", deserialize_with = "deserialize_members")]
    pub members: Vec<String>,

    #[serde(default)]
    pub size: usize,

    /// Any further aggregate statistics, passed through untouched
    #[serde(flatten)]
    pub stats: serde_json::Map<String, serde_json::Value>,
}

fn deserialize_members<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let ids: Vec<RawId> = Vec::deserialize(deserializer)?;
    Ok(ids.iter().map(RawId::to_id_string).collect())
}

/// How the community filter places nodes: centroids on a circle, one equal
/// angular slice per community, plus seeded jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommunityLayout {
    pub radius: f64,
    pub jitter: f64,
    pub seed: u64,
}

impl CommunityLayout {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            radius: config.community_radius,
            jitter: config.community_jitter,
            seed: config.layout_seed,
        }
    }

    /// Centroid for each community, in the order given
    pub fn centers(&self, communities: &[i64]) -> HashMap<i64, Position> {
        if communities.is_empty() {
            return HashMap::new();
        }

        let step = 2.0 * PI / communities.len() as f64;
        communities
            .iter()
            .enumerate()
            .map(|(i, &community)| {
                let angle = i as f64 * step;
                let center = Position {
                    x: self.radius * angle.cos(),
                    y: self.radius * angle.sin(),
                };
                (community, center)
            })
            .collect()
    }

    fn offset(&self, rng: &mut StdRng) -> f64 {
        if self.jitter > 0.0 {
            rng.gen_range(-self.jitter..self.jitter)
        } else {
            0.0
        }
    }
}

/// Keep only edges whose endpoints are nodes of the same community, drop
/// nodes left without an edge, and move each survivor next to its
/// community's centroid.
///
/// Edges with an unmapped endpoint are dropped. Original coordinates are not
/// kept on the nodes; the filter snapshot holds them.
pub fn apply(graph: &Graph, map: &CommunityMap, layout: &CommunityLayout) -> Graph {
    let ids = graph.node_ids();
    let edges: Vec<_> = graph
        .edges
        .iter()
        .filter(|edge| ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str()))
        .filter(|edge| match (map.get(&edge.source), map.get(&edge.target)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        })
        .cloned()
        .collect();

    let connected: HashSet<&str> = edges
        .iter()
        .flat_map(|edge| [edge.source.as_str(), edge.target.as_str()])
        .collect();

    let centers = layout.centers(&map.communities());
    let mut rng = StdRng::seed_from_u64(layout.seed);

    let nodes = graph
        .nodes
        .iter()
        .filter(|node| connected.contains(node.id.as_str()))
        .map(|node| {
            let mut placed = node.clone();
            placed.community = map.get(&node.id);
            if let Some(center) = placed.community.and_then(|c| centers.get(&c)) {
                placed.position = Some(Position {
                    x: center.x + layout.offset(&mut rng),
                    y: center.y + layout.offset(&mut rng),
                });
            }
            placed
        })
        .collect();

    log::info!(
        "Community filter removed {} cross-community links",
        graph.edge_count() - edges.len()
    );

    Graph::from_parts(nodes, edges, graph.directed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};

    fn layout() -> CommunityLayout {
        CommunityLayout {
            radius: 500.0,
            jitter: 30.0,
            seed: 7,
        }
    }

    fn sample() -> (Graph, CommunityMap) {
        let graph = Graph::from_parts(
            vec![
                Node::new("a").at(1.0, 1.0),
                Node::new("b").at(2.0, 2.0),
                Node::new("c").at(3.0, 3.0),
                Node::new("d").at(4.0, 4.0),
                Node::new("loner").at(5.0, 5.0),
            ],
            vec![
                Edge::new("a", "b"),
                Edge::new("b", "c"),
                Edge::new("c", "d"),
                Edge::new("d", "loner"),
            ],
            false,
        );
        let map = [("a", 0), (" b ", 0), ("c", 1), ("d", 1)]
            .into_iter()
            .map(|(id, c)| (id.to_string(), c))
            .collect();
        (graph, map)
    }

    #[test]
    fn test_keeps_only_intra_community_edges() {
        let (graph, map) = sample();
        let filtered = apply(&graph, &map, &layout());

        assert_eq!(filtered.edges, vec![Edge::new("a", "b"), Edge::new("c", "d")]);
        assert_eq!(filtered.node_count(), 4);
        assert!(filtered.node("loner").is_none());
        assert_eq!(filtered.node("c").unwrap().community, Some(1));
    }

    #[test]
    fn test_nodes_gather_around_centroids() {
        let (graph, map) = sample();
        let layout = layout();
        let filtered = apply(&graph, &map, &layout);
        let centers = layout.centers(&[0, 1]);

        for node in &filtered.nodes {
            let center = centers[&node.community.unwrap()];
            let position = node.position.unwrap();
            assert!((position.x - center.x).abs() <= 30.0);
            assert!((position.y - center.y).abs() <= 30.0);
        }
        // two communities sit opposite each other
        assert!((centers[&0].x - 500.0).abs() < 1e-9);
        assert!((centers[&1].x + 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let (graph, map) = sample();
        assert_eq!(apply(&graph, &map, &layout()), apply(&graph, &map, &layout()));
    }

    #[test]
    fn test_zero_jitter_lands_on_centroid() {
        let (graph, map) = sample();
        let still = CommunityLayout {
            jitter: 0.0,
            ..layout()
        };
        let filtered = apply(&graph, &map, &still);
        let center = still.centers(&[0, 1])[&0];
        assert_eq!(filtered.node("a").unwrap().position, Some(center));
    }

    #[test]
    fn test_map_trims_identifiers() {
        let (_, map) = sample();
        assert_eq!(map.get("b"), Some(0));
        assert_eq!(map.get("  d"), Some(1));
        assert_eq!(map.communities(), vec![0, 1]);
    }

    #[test]
    fn test_resolve_falls_back_to_graph() {
        let (graph, map) = sample();
        assert_eq!(
            CommunityMap::resolve(None, &graph),
            Err(EngineError::MissingCommunities)
        );

        let assigned = map.assign(&graph);
        let resolved = CommunityMap::resolve(Some(&CommunityMap::new()), &assigned).unwrap();
        assert_eq!(resolved, map);
    }

    #[test]
    fn test_summary_parses_numeric_members() {
        let summary: CommunitySummary = serde_json::from_str(
            r#"{ "id": 2, "members": ["a", 17], "size": 2, "density": 0.5 }"#,
        )
        .unwrap();
        assert_eq!(summary.members, vec!["a", "17"]);
        assert_eq!(summary.stats["density"], 0.5);

        let summary: CommunitySummary =
            serde_json::from_str(r#"{ "id": 0, "nodes": ["x"], "avg_pagerank": 0.1 }"#).unwrap();
        assert_eq!(summary.members, vec!["x"]);
        assert_eq!(summary.size, 0);
    }
}
