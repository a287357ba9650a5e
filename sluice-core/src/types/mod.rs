//! Core types for sluice.
//!
//! - `NodeId`: Identifier for a node within a pipeline arena

mod ids;

pub use ids::NodeId;
