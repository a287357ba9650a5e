//! Scale kernel.

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

/// Configuration for [`Scale`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScaleConfig {
    /// Factor applied to every number.
    pub scalar: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self { scalar: 1.0 }
    }
}

/// Multiplies every number in the payload by a scalar.
///
/// Arrays and object fields are scaled element-wise; the result always
/// holds floats. The scalar is exposed as both an argument and an
/// attribute, so one scale node can take its factor from another.
#[derive(Debug, Clone, Default)]
pub struct Scale {
    config: ScaleConfig,
}

impl Scale {
    /// Scale by `scalar`.
    pub fn new(scalar: f64) -> Self {
        Self {
            config: ScaleConfig { scalar },
        }
    }

    /// Current factor.
    pub fn scalar(&self) -> f64 {
        self.config.scalar
    }
}

fn scale(value: &JsonValue, scalar: f64) -> Option<JsonValue> {
    match value {
        JsonValue::Number(n) => {
            serde_json::Number::from_f64(n.as_f64()? * scalar).map(JsonValue::Number)
        }
        JsonValue::Array(items) => items
            .iter()
            .map(|item| scale(item, scalar))
            .collect::<Option<Vec<_>>>()
            .map(JsonValue::Array),
        JsonValue::Object(map) => map
            .iter()
            .map(|(k, v)| scale(v, scalar).map(|v| (k.clone(), v)))
            .collect::<Option<serde_json::Map<_, _>>>()
            .map(JsonValue::Object),
        _ => None,
    }
}

impl Kernel for Scale {
    fn info(&self) -> KernelInfo {
        KernelInfo::new("std", "scale").with_description("Multiply every number by a scalar")
    }

    fn transform(&mut self, ctx: &KernelContext, inputs: Vec<Value>) -> Result<Vec<Value>> {
        inputs
            .iter()
            .map(|input| {
                scale(input.inner(), self.config.scalar)
                    .map(Value::from)
                    .ok_or_else(|| ctx.invalid_input(format!("cannot scale {}", input.inner())))
            })
            .collect()
    }

    fn attributes(&self) -> &[&'static str] {
        &["scalar"]
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        (name == "scalar").then(|| Value::float(self.config.scalar))
    }

    fn arguments(&self) -> &[&'static str] {
        &["scalar"]
    }

    fn set_argument(&mut self, name: &str, value: Value) -> Result<()> {
        let scalar = value.as_f64().ok_or_else(|| SluiceError::InvalidArgument {
            kernel: Self::KERNEL_TYPE.to_string(),
            argument: name.to_string(),
            cause: format!("expected a number, got {}", value.inner()),
        })?;
        self.config.scalar = scalar;
        Ok(())
    }

    fn config(&self) -> Value {
        serde_json::to_value(&self.config)
            .map(Value::from)
            .unwrap_or_default()
    }
}

impl StandardKernel for Scale {
    const KERNEL_TYPE: &'static str = "std::scale";

    fn from_config(config: &Value) -> Result<Self> {
        Ok(Self {
            config: parse_config(Self::KERNEL_TYPE, config)?,
        })
    }

    fn descriptor() -> KernelDescriptor {
        KernelDescriptor {
            kernel_type: Self::KERNEL_TYPE.to_string(),
            category: KernelCategory::Data,
            kind: NodeKind::Element,
            description: "Multiply every number by a scalar".to_string(),
            arguments: vec!["scalar".to_string()],
            attributes: vec!["scalar".to_string()],
            config_schema: config_schema::<ScaleConfig>(),
        }
    }
}
