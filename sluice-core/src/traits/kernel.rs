//! Kernel trait and related types.

use crate::error::{Result, SluiceError};
use crate::types::NodeId;
use crate::value::Value;
use std::fmt;

/// Metadata about a kernel type.
#[derive(Debug, Clone)]
pub struct KernelInfo {
    /// Fully qualified name (e.g., "std::scale", "plugins::tokenize").
    pub name: String,
    /// Namespace (e.g., "std", "plugins").
    pub namespace: String,
    /// Short name (e.g., "scale", "tokenize").
    pub short_name: String,
    /// Description of what the kernel does.
    pub description: String,
    /// Version of the kernel implementation.
    pub version: String,
}

impl KernelInfo {
    /// Create new kernel info.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let short_name = name.into();
        let full_name = format!("{}::{}", namespace, short_name);
        Self {
            name: full_name,
            namespace,
            short_name,
            description: String::new(),
            version: "1.0.0".to_string(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// What a kernel knows about the node invoking it.
#[derive(Debug, Clone)]
pub struct KernelContext {
    /// The invoking node.
    pub node_id: NodeId,
    /// The invoking node's display name.
    pub node_name: String,
    /// Number of outputs the node's wiring requires from this call.
    pub expected_outputs: usize,
}

impl KernelContext {
    /// Create a context.
    pub fn new(node_id: NodeId, node_name: impl Into<String>, expected_outputs: usize) -> Self {
        Self {
            node_id,
            node_name: node_name.into(),
            expected_outputs,
        }
    }

    /// Build a kernel failure for this node.
    pub fn fail(&self, kernel: &str, cause: impl Into<String>) -> SluiceError {
        SluiceError::Kernel {
            node_id: self.node_id,
            kernel: kernel.to_string(),
            cause: cause.into(),
        }
    }

    /// Build an unsupported-payload error for this node.
    pub fn invalid_input(&self, cause: impl Into<String>) -> SluiceError {
        SluiceError::InvalidInput {
            node_id: self.node_id,
            cause: cause.into(),
        }
    }
}

/// The transform a node runs.
///
/// Ordinary kernels map one input to one output. Fan-out kernels map one
/// input to `ctx.expected_outputs` outputs, fan-in kernels map one input
/// per upstream edge to a single output. The engine treats the kernel as a
/// pure function of its inputs and arguments; a kernel may update its own
/// attributes while transforming.
///
/// Requirement injection goes through [`Kernel::set_argument`] and reads
/// through [`Kernel::attribute`]. Both are checked against the declared
/// [`Kernel::arguments`] and [`Kernel::attributes`] when the requirement is
/// added, so a kernel only has to handle names it declared.
///
/// # Example
///
/// ```ignore
/// use sluice_core::prelude::*;
///
/// #[derive(Debug)]
/// struct Negate;
///
/// impl Kernel for Negate {
///     fn info(&self) -> KernelInfo {
///         KernelInfo::new("custom", "negate")
///     }
///
///     fn transform(&mut self, ctx: &KernelContext, inputs: Vec<Value>) -> Result<Vec<Value>> {
///         let n = inputs[0].as_f64().ok_or_else(|| ctx.invalid_input("not a number"))?;
///         Ok(vec![Value::float(-n)])
///     }
/// }
/// ```
pub trait Kernel: Send + fmt::Debug {
    /// Get metadata about this kernel.
    fn info(&self) -> KernelInfo;

    /// Transform the node's inputs into its outputs.
    ///
    /// `inputs` holds one payload per upstream edge, in upstream order
    /// (a single payload for inlets).
    fn transform(&mut self, ctx: &KernelContext, inputs: Vec<Value>) -> Result<Vec<Value>>;

    /// Attribute names this kernel exposes to requirements.
    fn attributes(&self) -> &[&'static str] {
        &[]
    }

    /// Read an exposed attribute.
    fn attribute(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Argument names this kernel accepts from requirements.
    fn arguments(&self) -> &[&'static str] {
        &[]
    }

    /// Set an accepted argument.
    fn set_argument(&mut self, name: &str, _value: Value) -> Result<()> {
        Err(SluiceError::InvalidArgument {
            kernel: self.info().name,
            argument: name.to_string(),
            cause: "kernel accepts no arguments".to_string(),
        })
    }

    /// Configuration to serialize, readable by this kernel's factory.
    fn config(&self) -> Value {
        Value::null()
    }

    /// Whether [`Kernel::config`] fully describes the kernel.
    fn serializable(&self) -> bool {
        true
    }

    /// Clear per-run state.
    fn reset(&mut self) {}
}

/// A kernel factory that creates kernel instances from configuration.
pub trait KernelFactory: Send + Sync {
    /// Get the kernel type name this factory creates.
    fn kernel_type(&self) -> &str;

    /// Create a new kernel instance from its serialized configuration.
    fn create(&self, config: &Value) -> Result<Box<dyn Kernel>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_info_creation() {
        let info = KernelInfo::new("std", "scale")
            .with_description("Multiply by a scalar")
            .with_version("2.0.0");

        assert_eq!(info.name, "std::scale");
        assert_eq!(info.namespace, "std");
        assert_eq!(info.short_name, "scale");
        assert_eq!(info.version, "2.0.0");
    }

    #[test]
    fn context_errors_carry_node() {
        let ctx = KernelContext::new(NodeId::new(9), "scaler", 1);
        let err = ctx.fail("std::scale", "overflow");
        assert_eq!(err.code(), "E401");
        assert!(err.to_string().contains("node_9"));
        assert_eq!(ctx.invalid_input("x").code(), "E405");
    }
}
