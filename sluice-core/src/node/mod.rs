//! Node model.
//!
//! Nodes live in a [`NodeArena`] and refer to each other by [`NodeId`].
//! This module provides:
//!
//! - [`NodeKind`] - Inlet, outlet, element, fan-out and fan-in, with their edge capacities
//! - [`Node`] - A kernel plus its wiring and per-run state
//! - [`Requirement`] - Attribute-to-argument dependency between two nodes
//! - [`FlowData`] - The addressed envelope carried along edges
//! - [`NodeArena`] - Owner of all nodes, wiring and the per-node `flow` step

mod arena;
mod flow_data;
mod requirement;

pub use arena::NodeArena;
pub use flow_data::FlowData;
pub use requirement::Requirement;

use crate::traits::Kernel;
use crate::types::NodeId;
use crate::value::{DataShape, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Attributes every node exposes regardless of its kernel.
pub const BUILTIN_ATTRIBUTES: &[&str] = &[
    "name",
    "input_shape",
    "output_shape",
    "input_columns",
    "output_columns",
];

/// The structural role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry point; receives injected data, no upstream.
    Inlet,
    /// Exit point; emits the pipeline's result, no downstream.
    Outlet,
    /// Ordinary 1-to-1 node.
    #[default]
    Element,
    /// One upstream, many downstream.
    FanOut,
    /// Many upstream, one downstream.
    FanIn,
}

impl NodeKind {
    /// Maximum number of upstream edges given a declared arity.
    pub fn upstream_capacity(self, n_result: Option<usize>) -> usize {
        match self {
            Self::Inlet => 0,
            Self::Outlet | Self::Element | Self::FanOut => 1,
            Self::FanIn => n_result.unwrap_or(usize::MAX),
        }
    }

    /// Maximum number of downstream edges given a declared arity.
    pub fn downstream_capacity(self, n_result: Option<usize>) -> usize {
        match self {
            Self::Outlet => 0,
            Self::Inlet | Self::Element | Self::FanIn => 1,
            Self::FanOut => n_result.unwrap_or(usize::MAX),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inlet => "inlet",
            Self::Outlet => "outlet",
            Self::Element => "element",
            Self::FanOut => "fan-out",
            Self::FanIn => "fan-in",
        };
        write!(f, "{}", s)
    }
}

/// A processing node: a kernel plus its wiring and per-run state.
///
/// Edges are only changed through the owning [`NodeArena`], which keeps
/// both ends of every edge consistent.
#[derive(Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) upstream: Vec<NodeId>,
    pub(crate) downstream: Vec<NodeId>,
    pub(crate) requirements: BTreeSet<Requirement>,
    pub(crate) n_result: Option<usize>,
    pub(crate) executed: bool,
    pub(crate) input_shapes: Option<Vec<DataShape>>,
    pub(crate) output_shapes: Option<Vec<DataShape>>,
    pub(crate) kernel: Box<dyn Kernel>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        kind: NodeKind,
        name: impl Into<String>,
        kernel: Box<dyn Kernel>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            upstream: Vec::new(),
            downstream: Vec::new(),
            requirements: BTreeSet::new(),
            n_result: None,
            executed: false,
            input_shapes: None,
            output_shapes: None,
            kernel,
        }
    }

    /// The node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Structural kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Upstream nodes in attachment order. Parallel edges repeat the id.
    pub fn upstream(&self) -> &[NodeId] {
        &self.upstream
    }

    /// Downstream nodes in attachment order. Parallel edges repeat the id.
    pub fn downstream(&self) -> &[NodeId] {
        &self.downstream
    }

    /// Requirements held by this node.
    pub fn requirements(&self) -> &BTreeSet<Requirement> {
        &self.requirements
    }

    /// Declared fan arity.
    pub fn n_result(&self) -> Option<usize> {
        self.n_result
    }

    /// Whether the node has run since the last reset.
    pub fn executed(&self) -> bool {
        self.executed
    }

    /// Shapes of the inputs seen on the last run.
    pub fn input_shapes(&self) -> Option<&[DataShape]> {
        self.input_shapes.as_deref()
    }

    /// Shapes of the outputs produced on the last run.
    pub fn output_shapes(&self) -> Option<&[DataShape]> {
        self.output_shapes.as_deref()
    }

    /// The node's kernel.
    pub fn kernel(&self) -> &dyn Kernel {
        self.kernel.as_ref()
    }

    /// Mutable access to the node's kernel.
    pub fn kernel_mut(&mut self) -> &mut dyn Kernel {
        self.kernel.as_mut()
    }

    /// Remaining upstream capacity.
    pub fn upstream_capacity(&self) -> usize {
        self.kind.upstream_capacity(self.n_result)
    }

    /// Remaining downstream capacity.
    pub fn downstream_capacity(&self) -> usize {
        self.kind.downstream_capacity(self.n_result)
    }

    /// Number of outputs the kernel must return for the current wiring.
    ///
    /// A fan-out node wired to a single consumer with a declared arity
    /// emits that many outputs, all to the same consumer.
    pub fn expected_outputs(&self) -> usize {
        match (self.kind, self.downstream.len(), self.n_result) {
            (NodeKind::Outlet, _, _) => 1,
            (NodeKind::FanOut, 1, Some(n)) => n,
            (_, k, _) => k,
        }
    }

    /// Whether `attribute` can be read from this node.
    pub fn exposes(&self, attribute: &str) -> bool {
        BUILTIN_ATTRIBUTES.contains(&attribute) || self.kernel.attributes().contains(&attribute)
    }

    /// Whether the kernel accepts `argument`.
    pub fn accepts(&self, argument: &str) -> bool {
        self.kernel.arguments().contains(&argument)
    }

    /// Read an exposed attribute.
    ///
    /// Shape attributes are null until the node has run. A node with a
    /// single input (or output) reports that shape directly; otherwise the
    /// attribute is a list with one entry per payload.
    pub fn attribute(&self, attribute: &str) -> Option<Value> {
        match attribute {
            "name" => Some(Value::string(self.name.as_str())),
            "input_shape" => Some(shape_attribute(&self.input_shapes, DataShape::dims_value)),
            "output_shape" => Some(shape_attribute(&self.output_shapes, DataShape::dims_value)),
            "input_columns" => Some(shape_attribute(&self.input_shapes, DataShape::columns_value)),
            "output_columns" => {
                Some(shape_attribute(&self.output_shapes, DataShape::columns_value))
            }
            other if self.kernel.attributes().contains(&other) => self.kernel.attribute(other),
            _ => None,
        }
    }

    /// Clear per-run state. Edges and requirements are kept.
    pub fn reset(&mut self) {
        self.executed = false;
        self.input_shapes = None;
        self.output_shapes = None;
        self.kernel.reset();
    }
}

fn shape_attribute(shapes: &Option<Vec<DataShape>>, f: fn(&DataShape) -> Value) -> Value {
    match shapes.as_deref() {
        None => Value::null(),
        Some([single]) => f(single),
        Some(many) => Value::array(many.iter().map(f)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacities_follow_kind() {
        assert_eq!(NodeKind::Inlet.upstream_capacity(None), 0);
        assert_eq!(NodeKind::Outlet.downstream_capacity(None), 0);
        assert_eq!(NodeKind::Element.downstream_capacity(Some(4)), 1);
        assert_eq!(NodeKind::FanOut.downstream_capacity(Some(3)), 3);
        assert_eq!(NodeKind::FanOut.downstream_capacity(None), usize::MAX);
        assert_eq!(NodeKind::FanIn.upstream_capacity(Some(2)), 2);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let yaml = serde_yaml::to_string(&NodeKind::FanOut).unwrap();
        assert_eq!(yaml.trim(), "fan_out");
        assert_eq!(NodeKind::FanIn.to_string(), "fan-in");
    }
}
