//! Pad kernel.
//!
//! Extends an array to a target length with a fill value. Longer arrays
//! pass through unchanged. The length can come from another node: a
//! requirement on `output_shape` delivers a dims array, whose first
//! dimension is used.

use crate::registry::{
    KernelCategory, KernelDescriptor, StandardKernel, config_schema, parse_config,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sluice_core::error::{Result, SluiceError};
use sluice_core::node::NodeKind;
use sluice_core::traits::{Kernel, KernelContext, KernelInfo};
use sluice_core::value::Value;
use tracing::debug;

/// Configuration for [`Pad`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PadConfig {
    /// Target length. Required before the first run, either here or as an
    /// argument.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    /// Value appended to short arrays.
    pub fill: JsonValue,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            length: None,
            fill: JsonValue::from(0),
        }
    }
}

/// Pads arrays to a target length.
///
/// # Example Definition
/// ```yaml
/// elements:
///   - id: 3
///     name: align
///     kernel: std::pad
///     attributes:
///       fill: null
///     requirements:
///       - producer: 2
///         attribute: output_shape
///         argument: length
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pad {
    configured: PadConfig,
    length: Option<usize>,
}

impl Pad {
    /// Pad to `length` with zeros.
    pub fn new(length: usize) -> Self {
        Self::with_config(PadConfig {
            length: Some(length),
            ..PadConfig::default()
        })
    }

    /// Pad with the given configuration.
    pub fn with_config(configured: PadConfig) -> Self {
        Self {
            length: configured.length,
            configured,
        }
    }

    /// Use `fill` for appended items.
    pub fn with_fill(mut self, fill: impl Into<JsonValue>) -> Self {
        self.configured.fill = fill.into();
        self
    }

    /// Length the next run pads to.
    pub fn length(&self) -> Option<usize> {
        self.length
    }
}

fn length_from(value: &Value) -> Option<usize> {
    value.as_usize().or_else(|| {
        let first = value.as_array()?.first()?;
        first.as_u64().and_then(|n| usize::try_from(n).ok())
    })
}

impl Kernel for Pad {
    fn info(&self) -> KernelInfo {
        KernelInfo::new("std", "pad").with_description("Extend arrays to a target length")
    }

    fn transform(&mut self, ctx: &KernelContext, inputs: Vec<Value>) -> Result<Vec<Value>> {
        let length = self.length.ok_or_else(|| SluiceError::MissingArgument {
            kernel: Self::KERNEL_TYPE.to_string(),
            argument: "length".to_string(),
        })?;

        inputs
            .into_iter()
            .map(|input| match input.into_inner() {
                JsonValue::Array(mut items) => {
                    if items.len() < length {
                        debug!(
                            node = %ctx.node_name,
                            from = items.len(),
                            to = length,
                            "Padding array"
                        );
                        items.resize(length, self.configured.fill.clone());
                    }
                    Ok(Value::from(JsonValue::Array(items)))
                }
                other => Err(ctx.invalid_input(format!("cannot pad {}", other))),
            })
            .collect()
    }

    fn attributes(&self) -> &[&'static str] {
        &["length"]
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "length" => Some(
                self.length
                    .map(|n| Value::int(n as i64))
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }

    fn arguments(&self) -> &[&'static str] {
        &["length"]
    }

    fn set_argument(&mut self, name: &str, value: Value) -> Result<()> {
        let length = length_from(&value).ok_or_else(|| SluiceError::InvalidArgument {
            kernel: Self::KERNEL_TYPE.to_string(),
            argument: name.to_string(),
            cause: format!("expected a length or a shape, got {}", value.inner()),
        })?;
        self.length = Some(length);
        Ok(())
    }

    fn config(&self) -> Value {
        serde_json::to_value(&self.configured)
            .map(Value::from)
            .unwrap_or_default()
    }

    fn reset(&mut self) {
        self.length = self.configured.length;
    }
}

impl StandardKernel for Pad {
    const KERNEL_TYPE: &'static str = "std::pad";

    fn from_config(config: &Value) -> Result<Self> {
        Ok(Self::with_config(parse_config(Self::KERNEL_TYPE, config)?))
    }

    fn descriptor() -> KernelDescriptor {
        KernelDescriptor {
            kernel_type: Self::KERNEL_TYPE.to_string(),
            category: KernelCategory::Data,
            kind: NodeKind::Element,
            description: "Extend arrays to a target length".to_string(),
            arguments: vec!["length".to_string()],
            attributes: vec!["length".to_string()],
            config_schema: config_schema::<PadConfig>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sluice_core::types::NodeId;

    fn ctx() -> KernelContext {
        KernelContext::new(NodeId::new(3), "align", 1)
    }

    #[test]
    fn pads_short_arrays_only() {
        let mut pad = Pad::new(3);
        let out = pad
            .transform(&ctx(), vec![Value::from(json!([1])), Value::from(json!([1, 2, 3, 4]))])
            .unwrap();
        assert_eq!(
            out,
            vec![Value::from(json!([1, 0, 0])), Value::from(json!([1, 2, 3, 4]))]
        );
    }

    #[test]
    fn length_from_shape_argument() {
        let mut pad = Pad::default().with_fill(JsonValue::Null);
        pad.set_argument("length", Value::from(json!([2, 5]))).unwrap();
        assert_eq!(pad.length(), Some(2));
        let out = pad.transform(&ctx(), vec![Value::from(json!([]))]).unwrap();
        assert_eq!(out, vec![Value::from(json!([null, null]))]);
    }

    #[test]
    fn reset_restores_configured_length() {
        let mut pad = Pad::new(4);
        pad.set_argument("length", Value::int(1)).unwrap();
        assert_eq!(pad.attribute("length"), Some(Value::int(1)));
        pad.reset();
        assert_eq!(pad.length(), Some(4));
        assert_eq!(pad.config(), Value::from(json!({ "length": 4, "fill": 0 })));
    }

    #[test]
    fn missing_length() {
        let err = Pad::default()
            .transform(&ctx(), vec![Value::from(json!([1]))])
            .unwrap_err();
        assert_eq!(err.code(), "E402");

        let err = Pad::default()
            .set_argument("length", Value::string("long"))
            .unwrap_err();
        assert_eq!(err.code(), "E403");
    }
}
