//! Duplicate kernel (fan-out).

use crate::registry::{KernelCategory, KernelDescriptor, StandardKernel, config_schema};
use sluice_core::error::Result;
use sluice_core::node::NodeKind;
use sluice_core::traits::{Kernel, KernelContext, KernelInfo};
use sluice_core::value::Value;
use tracing::debug;

/// Copies its single input once per expected output.
///
/// # Example Definition
/// ```yaml
/// elements:
///   - id: 2
///     name: copy
///     kind: fan_out
///     kernel: std::duplicate
///     upstream: [1]
///     downstream: [3, 4]
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Duplicate;

impl Kernel for Duplicate {
    fn info(&self) -> KernelInfo {
        KernelInfo::new("std", "duplicate")
            .with_description("Copy the input to every downstream edge")
    }

    fn transform(&mut self, ctx: &KernelContext, inputs: Vec<Value>) -> Result<Vec<Value>> {
        let [input] = <[Value; 1]>::try_from(inputs)
            .map_err(|inputs| {
                ctx.invalid_input(format!("expected 1 input, got {}", inputs.len()))
            })?;
        debug!(node = %ctx.node_name, copies = ctx.expected_outputs, "Duplicating input");
        Ok(vec![input; ctx.expected_outputs])
    }
}

impl StandardKernel for Duplicate {
    const KERNEL_TYPE: &'static str = "std::duplicate";

    fn from_config(_config: &Value) -> Result<Self> {
        Ok(Self)
    }

    fn descriptor() -> KernelDescriptor {
        KernelDescriptor {
            kernel_type: Self::KERNEL_TYPE.to_string(),
            category: KernelCategory::Flow,
            kind: NodeKind::FanOut,
            description: "Copy the input to every downstream edge".to_string(),
            arguments: Vec::new(),
            attributes: Vec::new(),
            config_schema: config_schema::<()>(),
        }
    }
}
