//! Split kernel (fan-out).
//!
//! Divides an array into one contiguous chunk per downstream edge. Chunk
//! sizes differ by at most one; the leading chunks take the remainder.

use crate::registry::{
    KernelCategory, KernelDescriptor, StandardKernel, config_schema, parse_config,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sluice_core::error::Result;
use sluice_core::node::NodeKind;
use sluice_core::traits::{Kernel, KernelContext, KernelInfo};
use sluice_core::value::Value;
use tracing::debug;

/// Configuration for [`Split`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SplitConfig {
    /// Dot path of the array inside the payload. The whole payload when
    /// unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Divides an array across the downstream edges.
///
/// # Example Definition
/// ```yaml
/// elements:
///   - id: 2
///     name: shard
///     kind: fan_out
///     kernel: std::split
///     attributes:
///       field: items
///     upstream: [1]
///     downstream: [3, 4, 5]
/// ```
#[derive(Debug, Clone, Default)]
pub struct Split {
    config: SplitConfig,
}

impl Split {
    /// Split the whole payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split the array at `field`.
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            config: SplitConfig {
                field: Some(field.into()),
            },
        }
    }
}

impl Kernel for Split {
    fn info(&self) -> KernelInfo {
        KernelInfo::new("std", "split").with_description("Divide an array across downstream edges")
    }

    fn transform(&mut self, ctx: &KernelContext, inputs: Vec<Value>) -> Result<Vec<Value>> {
        let [input] = <[Value; 1]>::try_from(inputs)
            .map_err(|inputs| {
                ctx.invalid_input(format!("expected 1 input, got {}", inputs.len()))
            })?;

        let target = match &self.config.field {
            Some(path) => input
                .get_field(path)
                .ok_or_else(|| ctx.invalid_input(format!("field '{}' not found", path)))?,
            None => input,
        };
        let items = match target.into_inner() {
            JsonValue::Array(items) => items,
            other => return Err(ctx.invalid_input(format!("cannot split {}", other))),
        };

        let parts = ctx.expected_outputs;
        if parts == 0 {
            return Ok(Vec::new());
        }
        let (base, extra) = (items.len() / parts, items.len() % parts);
        debug!(node = %ctx.node_name, items = items.len(), parts, "Splitting array");

        let mut rest = items.into_iter();
        Ok((0..parts)
            .map(|i| {
                let size = base + usize::from(i < extra);
                Value::from(JsonValue::Array(rest.by_ref().take(size).collect()))
            })
            .collect())
    }

    fn config(&self) -> Value {
        serde_json::to_value(&self.config)
            .map(Value::from)
            .unwrap_or_default()
    }
}

impl StandardKernel for Split {
    const KERNEL_TYPE: &'static str = "std::split";

    fn from_config(config: &Value) -> Result<Self> {
        Ok(Self {
            config: parse_config(Self::KERNEL_TYPE, config)?,
        })
    }

    fn descriptor() -> KernelDescriptor {
        KernelDescriptor {
            kernel_type: Self::KERNEL_TYPE.to_string(),
            category: KernelCategory::Data,
            kind: NodeKind::FanOut,
            description: "Divide an array across downstream edges".to_string(),
            arguments: Vec::new(),
            attributes: Vec::new(),
            config_schema: config_schema::<SplitConfig>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sluice_core::types::NodeId;

    fn ctx(parts: usize) -> KernelContext {
        KernelContext::new(NodeId::new(2), "shard", parts)
    }

    #[test]
    fn leading_chunks_take_the_remainder() {
        let out = Split::new()
            .transform(&ctx(3), vec![Value::from(json!([1, 2, 3, 4, 5, 6, 7]))])
            .unwrap();
        assert_eq!(
            out,
            vec![
                Value::from(json!([1, 2, 3])),
                Value::from(json!([4, 5])),
                Value::from(json!([6, 7])),
            ]
        );
    }

    #[test]
    fn more_parts_than_items() {
        let out = Split::new()
            .transform(&ctx(3), vec![Value::from(json!(["a"]))])
            .unwrap();
        assert_eq!(out[0], Value::from(json!(["a"])));
        assert_eq!(out[2], Value::from(json!([])));
    }

    #[test]
    fn splits_nested_field() {
        let mut split =
            Split::from_config(&Value::from(json!({ "field": "batch.items" }))).unwrap();
        let out = split
            .transform(&ctx(2), vec![Value::from(json!({ "batch": { "items": [1, 2] } }))])
            .unwrap();
        assert_eq!(out, vec![Value::from(json!([1])), Value::from(json!([2]))]);
        assert_eq!(split.config(), Value::from(json!({ "field": "batch.items" })));
    }

    #[test]
    fn missing_field_is_invalid_input() {
        let err = Split::field("items")
            .transform(&ctx(2), vec![Value::from(json!({ "rows": [] }))])
            .unwrap_err();
        assert_eq!(err.code(), "E405");
    }
}
