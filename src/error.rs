//! Error types for the comparison engine

use thiserror::Error;

/// Errors reported by session and filter operations.
///
/// Pure metric and comparator functions never fail; they fall back to
/// zero, empty or `None` results instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// No candidate slot exists at this index
    #[error("no comparison candidate at index {0}")]
    UnknownCandidate(usize),

    /// The candidate slot exists but no graph has been supplied yet
    #[error("comparison candidate {0} has no graph loaded")]
    CandidateNotLoaded(usize),

    /// The community filter needs a community mapping and none was found
    #[error("community data not found; run community detection first")]
    MissingCommunities,

    /// A metric name outside the supported centrality set
    #[error("unknown centrality metric: {0}")]
    UnknownMetric(String),

    /// A configuration value outside its valid range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;
