//! Loading of graph payloads and community data from disk

pub mod payload;

pub use payload::{load_communities, load_payload, CommunityData};
