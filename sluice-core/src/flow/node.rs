//! Node entries of a pipeline definition.

use crate::node::{NodeKind, Requirement};
use crate::traits::PassThrough;
use crate::types::NodeId;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// One node of a pipeline definition.
///
/// Inlets and outlets take their kind from the section they are listed in;
/// `kind` only needs to be given for elements that fan out or fan in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node id, unique within the definition.
    pub id: NodeId,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Structural kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,

    /// Registered kernel type (defaults to "std::identity").
    #[serde(default = "default_kernel")]
    pub kernel: String,

    /// Upstream node ids in edge order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstream: Vec<NodeId>,

    /// Downstream node ids in edge order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub downstream: Vec<NodeId>,

    /// Requirements held by this node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Requirement>,

    /// Declared fan arity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_result: Option<usize>,

    /// Kernel configuration passed to the kernel factory.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub attributes: Value,
}

fn default_kernel() -> String {
    PassThrough::KERNEL_TYPE.to_string()
}

impl NodeConfig {
    /// Create a pass-through node entry.
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: None,
            kernel: default_kernel(),
            upstream: Vec::new(),
            downstream: Vec::new(),
            requirements: Vec::new(),
            n_result: None,
            attributes: Value::null(),
        }
    }

    /// Set the kind.
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the kernel type and its configuration.
    pub fn with_kernel(mut self, kernel: impl Into<String>, attributes: Value) -> Self {
        self.kernel = kernel.into();
        self.attributes = attributes;
        self
    }

    /// Set the upstream ids.
    pub fn with_upstream(mut self, upstream: impl IntoIterator<Item = NodeId>) -> Self {
        self.upstream = upstream.into_iter().collect();
        self
    }

    /// Set the downstream ids.
    pub fn with_downstream(mut self, downstream: impl IntoIterator<Item = NodeId>) -> Self {
        self.downstream = downstream.into_iter().collect();
        self
    }

    /// Add a requirement.
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Set the declared fan arity.
    pub fn with_n_result(mut self, n_result: usize) -> Self {
        self.n_result = Some(n_result);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_node() {
        let yaml = "id: 3\n";
        let node: NodeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(node.id, NodeId::new(3));
        assert_eq!(node.kernel, "std::identity");
        assert!(node.kind.is_none());
        assert!(node.attributes.is_null());
    }

    #[test]
    fn parse_full_node() {
        let yaml = r#"
id: 4
name: pad
kind: element
kernel: std::pad
upstream: [2]
downstream: [5]
requirements:
  - producer: 1
    attribute: output_shape
    argument: length
attributes:
  fill: 0
"#;
        let node: NodeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(node.kind, Some(NodeKind::Element));
        assert_eq!(node.upstream, vec![NodeId::new(2)]);
        assert_eq!(
            node.requirements,
            vec![Requirement::new(NodeId::new(1), "output_shape", "length")]
        );
        assert_eq!(node.attributes.get_field("fill"), Some(Value::int(0)));
    }

    #[test]
    fn defaults_are_omitted_when_serialized() {
        let yaml = serde_yaml::to_string(&NodeConfig::new(NodeId::new(0), "in")).unwrap();
        assert!(!yaml.contains("upstream"));
        assert!(!yaml.contains("attributes"));
        assert!(yaml.contains("std::identity"));
    }
}
