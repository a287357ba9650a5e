//! Concat kernel (fan-in).
//!
//! Joins the array payloads of every upstream edge into one array. Inputs
//! arrive in upstream order, so `[[1, 2], [3]]` becomes `[1, 2, 3]` no
//! matter which branch finished first.

use crate::registry::{KernelCategory, KernelDescriptor, StandardKernel, config_schema};
use serde_json::Value as JsonValue;
use sluice_core::error::Result;
use sluice_core::node::NodeKind;
use sluice_core::traits::{Kernel, KernelContext, KernelInfo};
use sluice_core::value::Value;
use tracing::debug;

/// Concatenates array inputs in upstream order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Concat;

impl Kernel for Concat {
    fn info(&self) -> KernelInfo {
        KernelInfo::new("std", "concat").with_description("Join array inputs in upstream order")
    }

    fn transform(&mut self, ctx: &KernelContext, inputs: Vec<Value>) -> Result<Vec<Value>> {
        let mut joined = Vec::new();
        for (position, input) in inputs.into_iter().enumerate() {
            match input.into_inner() {
                JsonValue::Array(items) => joined.extend(items),
                other => {
                    return Err(ctx.invalid_input(format!(
                        "input {} is not an array: {}",
                        position, other
                    )));
                }
            }
        }
        debug!(node = %ctx.node_name, items = joined.len(), "Concatenated inputs");
        Ok(vec![Value::from(JsonValue::Array(joined))])
    }
}

impl StandardKernel for Concat {
    const KERNEL_TYPE: &'static str = "std::concat";

    fn from_config(_config: &Value) -> Result<Self> {
        Ok(Self)
    }

    fn descriptor() -> KernelDescriptor {
        KernelDescriptor {
            kernel_type: Self::KERNEL_TYPE.to_string(),
            category: KernelCategory::Flow,
            kind: NodeKind::FanIn,
            description: "Join array inputs in upstream order".to_string(),
            arguments: Vec::new(),
            attributes: Vec::new(),
            config_schema: config_schema::<()>(),
        }
    }
}
