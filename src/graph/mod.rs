//! Graph representation, normalization and whole-graph metrics

pub mod metrics;
pub mod model;
pub mod normalize;

pub use model::{CentralityMetric, Edge, Graph, Node, NodeMetrics, Position};
