//! JSON payload files as produced by the upload and analysis services

use crate::filter::{CommunityMap, CommunitySummary};
use crate::graph::normalize::{community_id, RawGraph, RawNode};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Read a `{ nodes, links }` graph payload
pub fn load_payload<P: AsRef<Path>>(path: P) -> Result<RawGraph> {
    let path = path.as_ref();
    log::info!("Reading graph payload: {}", path.display());

    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }

    let text = fs::read_to_string(path)?;
    let raw = RawGraph::from_json(&text)
        .with_context(|| format!("Malformed graph payload in {}", path.display()))?;

    log::info!(
        "Loaded payload with {} nodes and {} links",
        raw.nodes.len(),
        raw.links.len()
    );
    Ok(raw)
}

/// Community detection output: the node mapping plus per-community summaries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommunityData {
    pub map: CommunityMap,
    pub summaries: Vec<CommunitySummary>,
}

#[derive(Debug, Deserialize)]
struct CommunityResponse {
    #[serde(default)]
    communities: Vec<CommunitySummary>,

    #[serde(default)]
    node_communities: HashMap<String, serde_json::Value>,

    #[serde(default)]
    nodes: Vec<RawNode>,
}

impl CommunityResponse {
    /// Mapping from the explicit node table, the annotated nodes, or failing
    /// both, the summaries' member lists
    fn into_data(self) -> CommunityData {
        let mut map: CommunityMap = self
            .node_communities
            .iter()
            .filter_map(|(id, value)| community_id(value).map(|c| (id.clone(), c)))
            .collect();

        if map.is_empty() {
            map = self
                .nodes
                .iter()
                .filter_map(|node| node.community_id().map(|c| (node.id.to_id_string(), c)))
                .collect();
        }

        if map.is_empty() {
            map = self
                .communities
                .iter()
                .flat_map(|summary| summary.members.iter().map(|id| (id.clone(), summary.id)))
                .collect();
        }

        CommunityData {
            map,
            summaries: self.communities,
        }
    }
}

/// Read a community detection response:
/// `{ communities: [{ id, nodes, size, ... }], node_communities?: {...}, nodes?: [...] }`
pub fn load_communities<P: AsRef<Path>>(path: P) -> Result<CommunityData> {
    let path = path.as_ref();
    log::info!("Reading community data: {}", path.display());

    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read community data from {}", path.display()))?;
    let response: CommunityResponse = serde_json::from_str(&text)
        .with_context(|| format!("Malformed community data in {}", path.display()))?;

    let data = response.into_data();
    log::info!(
        "Loaded {} community assignments across {} communities",
        data.map.len(),
        data.map.communities().len()
    );
    Ok(data)
}
