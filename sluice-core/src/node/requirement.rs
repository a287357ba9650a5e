//! Requirement links between nodes.

use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-structural dependency of one node on another.
///
/// Before the consumer runs, the producer's exposed `attribute` is copied
/// into the consumer kernel's `argument`. The producer therefore has to run
/// first even when no data edge connects the two.
///
/// Two requirements are the same requirement when producer, attribute and
/// argument all match; adding a duplicate to a node is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Requirement {
    /// The node whose attribute is read.
    pub producer: NodeId,
    /// Attribute exposed by the producer.
    pub attribute: String,
    /// Argument accepted by the consumer's kernel.
    pub argument: String,
}

impl Requirement {
    /// Create a requirement on `producer.attribute`, delivered as `argument`.
    pub fn new(
        producer: NodeId,
        attribute: impl Into<String>,
        argument: impl Into<String>,
    ) -> Self {
        Self {
            producer,
            attribute: attribute.into(),
            argument: argument.into(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} -> {}", self.producer, self.attribute, self.argument)
    }
}
