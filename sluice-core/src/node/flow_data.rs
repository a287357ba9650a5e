//! Addressed payload envelopes.

use crate::types::NodeId;
use crate::value::Value;

/// A payload in transit between two nodes.
///
/// `from` is `None` for data injected into an inlet, `to` is `None` for the
/// final output of an outlet.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowData {
    /// The emitting node.
    pub from: Option<NodeId>,
    /// The receiving node.
    pub to: Option<NodeId>,
    /// The carried payload.
    pub payload: Value,
}

impl FlowData {
    /// Create an envelope between two nodes.
    pub fn new(from: Option<NodeId>, to: Option<NodeId>, payload: Value) -> Self {
        Self { from, to, payload }
    }

    /// Data injected from outside into `inlet`.
    pub fn injected(inlet: NodeId, payload: Value) -> Self {
        Self::new(None, Some(inlet), payload)
    }

    /// Whether this envelope leaves the pipeline.
    pub fn is_final(&self) -> bool {
        self.to.is_none()
    }
}
