//! Configuration management for the comparison engine

use crate::error::{EngineError, EngineResult};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable constants used by the filters and metric guards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum undirected degree for a node to survive the activity filter
    pub activity_threshold: usize,

    /// Minimum betweenness for a node to survive the strong-connection filter
    pub strong_connection_threshold: f64,

    /// Share of top-ranked nodes tagged by the centrality highlight
    pub highlight_top_fraction: f64,

    /// Radius of the circle community centroids are placed on
    pub community_radius: f64,

    /// Maximum offset applied around a community centroid
    pub community_jitter: f64,

    /// Seed for the community layout jitter
    pub layout_seed: u64,

    /// Largest node count for which the O(n³) diameter is computed
    pub max_diameter_nodes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            activity_threshold: 2,
            strong_connection_threshold: 0.2,
            highlight_top_fraction: 0.2,
            community_radius: 500.0,
            community_jitter: 30.0,
            layout_seed: 0x5EED,
            max_diameter_nodes: 500,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with custom filter thresholds, other values default
    pub fn new(activity_threshold: usize, strong_connection_threshold: f64) -> Self {
        Self {
            activity_threshold,
            strong_connection_threshold,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Reading configuration from {}", path.display());

        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;

        Ok(config)
    }

    /// Reject values the filters cannot work with
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.highlight_top_fraction > 0.0 && self.highlight_top_fraction <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "highlight_top_fraction must be in (0, 1], got {}",
                self.highlight_top_fraction
            )));
        }
        if !(self.strong_connection_threshold >= 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "strong_connection_threshold must be non-negative, got {}",
                self.strong_connection_threshold
            )));
        }
        if !(self.community_radius >= 0.0) || !(self.community_jitter >= 0.0) {
            return Err(EngineError::InvalidConfig(
                "community radius and jitter must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.activity_threshold, 2);
        assert_eq!(config.strong_connection_threshold, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "activity_threshold": 4 }}"#).unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.activity_threshold, 4);
        assert_eq!(config.community_radius, 500.0);
    }

    #[test]
    fn test_rejects_bad_fraction() {
        let config = EngineConfig {
            highlight_top_fraction: 0.0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }
}
