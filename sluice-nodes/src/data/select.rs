//! Select kernel.

use crate::registry::{
    KernelCategory, KernelDescriptor, StandardKernel, config_schema, parse_config,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use sluice_core::error::{Result, SluiceError};
use sluice_core::node::NodeKind;
use sluice_core::traits::{Kernel, KernelContext, KernelInfo};
use sluice_core::value::Value;

/// Configuration for [`Select`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SelectConfig {
    /// Columns to keep, in output order.
    pub columns: Vec<String>,
    /// Skip columns a row lacks instead of failing.
    pub ignore_absent: bool,
}

/// Projects rows onto a set of columns.
///
/// Works on a single object or an array of objects. The `columns`
/// argument pairs with the `output_columns` attribute, so a select node can
/// keep exactly the columns another node produced.
#[derive(Debug, Clone, Default)]
pub struct Select {
    configured: SelectConfig,
    columns: Vec<String>,
}

impl Select {
    /// Keep `columns`.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(SelectConfig {
            columns: columns.into_iter().map(Into::into).collect(),
            ignore_absent: false,
        })
    }

    /// Select with the given configuration.
    pub fn with_config(configured: SelectConfig) -> Self {
        Self {
            columns: configured.columns.clone(),
            configured,
        }
    }

    /// Skip absent columns.
    pub fn ignore_absent(mut self) -> Self {
        self.configured.ignore_absent = true;
        self
    }

    fn project(&self, ctx: &KernelContext, row: &JsonValue) -> Result<JsonValue> {
        let JsonValue::Object(fields) = row else {
            return Err(ctx.invalid_input(format!("cannot select columns from {}", row)));
        };
        let mut projected = Map::new();
        for column in &self.columns {
            match fields.get(column) {
                Some(value) => {
                    projected.insert(column.clone(), value.clone());
                }
                None if self.configured.ignore_absent => {}
                None => return Err(ctx.invalid_input(format!("column '{}' is absent", column))),
            }
        }
        Ok(JsonValue::Object(projected))
    }
}

impl Kernel for Select {
    fn info(&self) -> KernelInfo {
        KernelInfo::new("std", "select").with_description("Keep a set of columns")
    }

    fn transform(&mut self, ctx: &KernelContext, inputs: Vec<Value>) -> Result<Vec<Value>> {
        inputs
            .iter()
            .map(|input| {
                let projected = match input.inner() {
                    JsonValue::Array(rows) => JsonValue::Array(
                        rows.iter()
                            .map(|row| self.project(ctx, row))
                            .collect::<Result<_>>()?,
                    ),
                    row => self.project(ctx, row)?,
                };
                Ok(Value::from(projected))
            })
            .collect()
    }

    fn arguments(&self) -> &[&'static str] {
        &["columns"]
    }

    fn set_argument(&mut self, name: &str, value: Value) -> Result<()> {
        self.columns = value.as_string_list().ok_or_else(|| SluiceError::InvalidArgument {
            kernel: Self::KERNEL_TYPE.to_string(),
            argument: name.to_string(),
            cause: format!("expected a list of column names, got {}", value.inner()),
        })?;
        Ok(())
    }

    fn config(&self) -> Value {
        serde_json::to_value(&self.configured)
            .map(Value::from)
            .unwrap_or_default()
    }

    fn reset(&mut self) {
        self.columns = self.configured.columns.clone();
    }
}

impl StandardKernel for Select {
    const KERNEL_TYPE: &'static str = "std::select";

    fn from_config(config: &Value) -> Result<Self> {
        Ok(Self::with_config(parse_config(Self::KERNEL_TYPE, config)?))
    }

    fn descriptor() -> KernelDescriptor {
        KernelDescriptor {
            kernel_type: Self::KERNEL_TYPE.to_string(),
            category: KernelCategory::Data,
            kind: NodeKind::Element,
            description: "Keep a set of columns".to_string(),
            arguments: vec!["columns".to_string()],
            attributes: Vec::new(),
            config_schema: config_schema::<SelectConfig>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sluice_core::types::NodeId;

    fn ctx() -> KernelContext {
        KernelContext::new(NodeId::new(5), "keep", 1)
    }

    #[test]
    fn projects_rows() {
        let out = Select::new(["b", "a"])
            .transform(
                &ctx(),
                vec![Value::from(json!([{ "a": 1, "b": 2, "c": 3 }, { "a": 4, "b": 5 }]))],
            )
            .unwrap();
        assert_eq!(out, vec![Value::from(json!([{ "a": 1, "b": 2 }, { "a": 4, "b": 5 }]))]);
    }

    #[test]
    fn absent_column() {
        let row = Value::from(json!({ "a": 1 }));
        let err = Select::new(["a", "z"])
            .transform(&ctx(), vec![row.clone()])
            .unwrap_err();
        assert_eq!(err.code(), "E405");

        let out = Select::new(["a", "z"])
            .ignore_absent()
            .transform(&ctx(), vec![row])
            .unwrap();
        assert_eq!(out, vec![Value::from(json!({ "a": 1 }))]);
    }

    #[test]
    fn columns_argument_lasts_until_reset() {
        let mut select = Select::new(["a"]);
        select
            .set_argument("columns", Value::from(json!(["b"])))
            .unwrap();
        let out = select
            .transform(&ctx(), vec![Value::from(json!({ "a": 1, "b": 2 }))])
            .unwrap();
        assert_eq!(out, vec![Value::from(json!({ "b": 2 }))]);

        select.reset();
        assert_eq!(
            select.config(),
            Value::from(json!({ "columns": ["a"], "ignore_absent": false }))
        );
        assert!(select.set_argument("columns", Value::int(3)).is_err());
    }
}
