//! Core library for comparing interaction networks: normalization, whole-graph
//! metrics, comparison statistics and reversible structural filters.

pub mod compare;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod graph;
pub mod storage;

pub use anyhow::{Result, anyhow};

pub use compare::session::{CandidateStatus, ComparisonRequest, ComparisonSession};
pub use compare::{compare, ComparisonStats};
pub use config::EngineConfig;
pub use error::EngineError;
pub use filter::{FilterKind, FilterSpec, GraphView};
pub use graph::normalize::{normalize, Normalized, RawGraph};
pub use graph::{CentralityMetric, Edge, Graph, Node, NodeMetrics, Position};
