//! Error types for sluice.
//!
//! Every error carries the node identifiers needed to locate the problem
//! in the pipeline graph, and a stable code grouped by the phase that
//! raised it: construction, scheduling, execution, kernels, configuration.

use crate::node::NodeKind;
use crate::types::NodeId;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for sluice operations.
#[derive(Error, Debug)]
pub enum SluiceError {
    // =========================================================================
    // Structural Errors (E100-E199)
    // =========================================================================
    /// A node was supplied in a role its kind cannot fill.
    #[error("E101: Node {node_id} is a {actual} node and cannot be used as {role}")]
    WrongNodeKind {
        /// The offending node.
        node_id: NodeId,
        /// The role the node was supplied for ("inlet", "outlet", ...).
        role: &'static str,
        /// The node's actual kind.
        actual: NodeKind,
    },

    /// An attachment would exceed a node's edge capacity.
    #[error("E102: Node {node_id} accepts at most {capacity} {direction} edge(s)")]
    ArityExceeded {
        /// The node whose capacity is full.
        node_id: NodeId,
        /// "upstream" or "downstream".
        direction: &'static str,
        /// Maximum number of edges in that direction.
        capacity: usize,
    },

    /// Detaching an edge that does not exist.
    #[error("E103: Node {other} is not attached {direction} of node {node_id}")]
    NotAttached {
        /// The node being detached from.
        node_id: NodeId,
        /// The node that was expected on the edge.
        other: NodeId,
        /// "upstream" or "downstream".
        direction: &'static str,
    },

    /// A node id does not resolve in the arena.
    #[error("E104: Unknown node {node_id}")]
    UnknownNode {
        /// The id that could not be resolved.
        node_id: NodeId,
    },

    /// An inlet has an upstream edge.
    #[error("E105: Inlet {node_id} must not have upstream nodes")]
    InletHasUpstream {
        /// The inlet.
        node_id: NodeId,
    },

    /// An outlet has a downstream edge.
    #[error("E106: Outlet {node_id} must not have downstream nodes")]
    OutletHasDownstream {
        /// The outlet.
        node_id: NodeId,
    },

    /// A non-outlet node in the graph has nowhere to send its output.
    #[error("E107: Node {node_id} has no downstream nodes and is not an outlet")]
    DanglingNode {
        /// The dangling node.
        node_id: NodeId,
    },

    /// A requirement names an attribute its producer does not expose.
    #[error("E108: Node {producer} does not expose attribute '{attribute}'")]
    UnknownAttribute {
        /// The producing node.
        producer: NodeId,
        /// The attribute name.
        attribute: String,
    },

    /// A requirement names an argument its consumer does not accept.
    #[error("E109: Node {consumer} does not accept argument '{argument}'")]
    UnknownArgument {
        /// The consuming node.
        consumer: NodeId,
        /// The argument name.
        argument: String,
    },

    /// Two nodes share the same id.
    #[error("E110: Duplicate node id {node_id}")]
    DuplicateNodeId {
        /// The repeated id.
        node_id: NodeId,
    },

    /// A requirement's producer is not part of the pipeline.
    #[error("E111: Node {consumer} requires node {producer}, which is not reachable from the inlets")]
    RequirementOutsideGraph {
        /// The consuming node.
        consumer: NodeId,
        /// The unreachable producer.
        producer: NodeId,
    },

    /// A node reachable from the inlets depends on a node that is not.
    #[error("E112: Node {node_id} has upstream node {upstream} that is not reachable from the inlets")]
    UnreachableUpstream {
        /// The node with the foreign upstream.
        node_id: NodeId,
        /// The upstream node outside the pipeline.
        upstream: NodeId,
    },

    /// The graph as a whole is malformed.
    #[error("E113: Invalid pipeline topology: {cause}")]
    InvalidTopology {
        /// Description of the problem.
        cause: String,
    },

    // =========================================================================
    // Scheduling Errors (E200-E299)
    // =========================================================================
    /// No firing sequence reaches the terminal marking.
    #[error(
        "E201: No execution sequence possible for {nodes} node(s) after exploring {explored} marking(s)"
    )]
    NoExecutionSequence {
        /// Number of transitions in the net.
        nodes: usize,
        /// Number of markings visited before giving up.
        explored: usize,
    },

    /// The search visited more markings than allowed.
    #[error("E202: Scheduler search exceeded the limit of {limit} explored markings")]
    SearchLimitExceeded {
        /// The configured limit.
        limit: usize,
    },

    // =========================================================================
    // Execution Errors (E300-E399)
    // =========================================================================
    /// A node was invoked before its upstream nodes or requirement producers ran.
    #[error("E301: Node {node_id} cannot execute, waiting on {waiting_on:?}")]
    PreconditionFailed {
        /// The node that was invoked.
        node_id: NodeId,
        /// Nodes that have not executed yet.
        waiting_on: Vec<NodeId>,
    },

    /// A flow envelope reached a node it was not addressed to.
    #[error("E302: Flow data addressed to {addressed_to:?} delivered to node {node_id}")]
    Misaddressed {
        /// The receiving node.
        node_id: NodeId,
        /// The envelope's destination.
        addressed_to: Option<NodeId>,
    },

    /// A kernel returned the wrong number of outputs.
    #[error("E303: Node {node_id} produced {actual} output(s), expected {expected}")]
    OutputArityMismatch {
        /// The emitting node.
        node_id: NodeId,
        /// Number of outputs the wiring requires.
        expected: usize,
        /// Number of outputs produced.
        actual: usize,
    },

    /// The number of payloads passed to a run does not match the inlets.
    #[error("E304: Pipeline has {expected} inlet(s) but {actual} payload(s) were supplied")]
    InputCountMismatch {
        /// Number of inlets.
        expected: usize,
        /// Number of payloads supplied.
        actual: usize,
    },

    /// An upstream edge delivered nothing when the node was invoked.
    #[error("E305: Node {node_id} is missing input from {from:?}")]
    MissingInput {
        /// The receiving node.
        node_id: NodeId,
        /// The expected sender, absent for injected inlet data.
        from: Option<NodeId>,
    },

    /// The run was cancelled between node invocations.
    #[error("E306: Run cancelled before node {node_id}")]
    Cancelled {
        /// The next node that would have executed.
        node_id: NodeId,
    },

    /// A flow envelope came from a node that is not upstream of the receiver.
    #[error("E307: Node {node_id} received flow data from {from:?}, which is not upstream")]
    UnexpectedSender {
        /// The receiving node.
        node_id: NodeId,
        /// The sender.
        from: Option<NodeId>,
    },

    // =========================================================================
    // Kernel Errors (E400-E499)
    // =========================================================================
    /// A kernel's transform failed.
    #[error("E401: Kernel '{kernel}' failed on node {node_id}: {cause}")]
    Kernel {
        /// The node running the kernel.
        node_id: NodeId,
        /// Kernel type name.
        kernel: String,
        /// Reason for the failure.
        cause: String,
    },

    /// A kernel ran without an argument it needs.
    #[error("E402: Kernel '{kernel}' requires argument '{argument}'")]
    MissingArgument {
        /// Kernel type name.
        kernel: String,
        /// The missing argument.
        argument: String,
    },

    /// An argument value has the wrong type or range.
    #[error("E403: Invalid argument '{argument}' for kernel '{kernel}': {cause}")]
    InvalidArgument {
        /// Kernel type name.
        kernel: String,
        /// The argument name.
        argument: String,
        /// Why the value was rejected.
        cause: String,
    },

    /// No factory is registered for a kernel type.
    #[error("E404: Unknown kernel type '{kernel_type}'")]
    UnknownKernel {
        /// The unresolved type name.
        kernel_type: String,
    },

    /// A kernel received a payload it cannot process.
    #[error("E405: Node {node_id} received an unsupported payload: {cause}")]
    InvalidInput {
        /// The receiving node.
        node_id: NodeId,
        /// Description of the payload problem.
        cause: String,
    },

    // =========================================================================
    // Configuration Errors (E500-E599)
    // =========================================================================
    /// Serialization/deserialization error.
    #[error("E501: Serialization error: {0}")]
    Serialization(
        /// The serialization error message.
        String,
    ),

    /// A pipeline definition document could not be parsed.
    #[error("E502: Failed to parse pipeline definition at {path}: {cause}")]
    DefinitionParse {
        /// The source file, or "<string>" for in-memory documents.
        path: PathBuf,
        /// Reason for the parse failure.
        cause: String,
    },

    /// A pipeline definition failed validation.
    #[error("E503: Pipeline definition '{name}' is invalid: {}", .problems.join("; "))]
    DefinitionInvalid {
        /// The definition's name.
        name: String,
        /// One message per problem found.
        problems: Vec<String>,
    },

    /// Invalid configuration value.
    #[error("E504: Invalid configuration '{field}': {cause}")]
    ConfigValue {
        /// The configuration field with invalid value.
        field: String,
        /// Description of why the value is invalid.
        cause: String,
    },

    /// File I/O error.
    #[error("E505: I/O error at {path}: {cause}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Reason for the failure.
        cause: String,
    },
}

impl SluiceError {
    /// Get the error code (e.g., "E101").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::WrongNodeKind { .. } => "E101",
            Self::ArityExceeded { .. } => "E102",
            Self::NotAttached { .. } => "E103",
            Self::UnknownNode { .. } => "E104",
            Self::InletHasUpstream { .. } => "E105",
            Self::OutletHasDownstream { .. } => "E106",
            Self::DanglingNode { .. } => "E107",
            Self::UnknownAttribute { .. } => "E108",
            Self::UnknownArgument { .. } => "E109",
            Self::DuplicateNodeId { .. } => "E110",
            Self::RequirementOutsideGraph { .. } => "E111",
            Self::UnreachableUpstream { .. } => "E112",
            Self::InvalidTopology { .. } => "E113",
            Self::NoExecutionSequence { .. } => "E201",
            Self::SearchLimitExceeded { .. } => "E202",
            Self::PreconditionFailed { .. } => "E301",
            Self::Misaddressed { .. } => "E302",
            Self::OutputArityMismatch { .. } => "E303",
            Self::InputCountMismatch { .. } => "E304",
            Self::MissingInput { .. } => "E305",
            Self::Cancelled { .. } => "E306",
            Self::UnexpectedSender { .. } => "E307",
            Self::Kernel { .. } => "E401",
            Self::MissingArgument { .. } => "E402",
            Self::InvalidArgument { .. } => "E403",
            Self::UnknownKernel { .. } => "E404",
            Self::InvalidInput { .. } => "E405",
            Self::Serialization(_) => "E501",
            Self::DefinitionParse { .. } => "E502",
            Self::DefinitionInvalid { .. } => "E503",
            Self::ConfigValue { .. } => "E504",
            Self::Io { .. } => "E505",
        }
    }

    /// Check if this error was raised while building or wiring the graph.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        self.code().starts_with("E1")
    }

    /// Check if this error was raised by the scheduler.
    #[must_use]
    pub fn is_scheduling_error(&self) -> bool {
        self.code().starts_with("E2")
    }

    /// Check if this error was raised while running the pipeline.
    ///
    /// Kernel failures count as execution errors.
    #[must_use]
    pub fn is_execution_error(&self) -> bool {
        self.code().starts_with("E3") || self.code().starts_with("E4")
    }

    /// Check if this error is a configuration/serialization error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Serialization(_)
                | Self::DefinitionParse { .. }
                | Self::DefinitionInvalid { .. }
                | Self::ConfigValue { .. }
                | Self::UnknownKernel { .. }
        )
    }
}

/// Result type alias for sluice operations.
pub type Result<T> = std::result::Result<T, SluiceError>;

/// Extension trait for attaching node context to foreign errors.
pub trait ResultExt<T> {
    /// Wrap the error as a kernel failure on `node_id`.
    fn with_kernel(self, node_id: NodeId, kernel: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn with_kernel(self, node_id: NodeId, kernel: &str) -> Result<T> {
        self.map_err(|e| SluiceError::Kernel {
            node_id,
            kernel: kernel.to_string(),
            cause: e.to_string(),
        })
    }
}
