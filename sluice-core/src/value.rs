//! Dynamic payload type carried between nodes.
//!
//! Payloads are JSON documents. Tabular data is an array of row objects,
//! matrices are nested arrays. [`DataShape`] summarizes either form so that
//! nodes can expose the shape of what they consumed and produced.

use crate::error::{Result, SluiceError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Dynamic value flowing through a pipeline.
///
/// Wraps serde_json::Value to provide typed extraction for kernels and
/// shape inspection for the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(pub JsonValue);

impl Value {
    /// Create a null value.
    pub fn null() -> Self {
        Self(JsonValue::Null)
    }

    /// Create a boolean value.
    pub fn bool(v: bool) -> Self {
        Self(JsonValue::Bool(v))
    }

    /// Create an integer value.
    pub fn int(v: i64) -> Self {
        Self(JsonValue::Number(v.into()))
    }

    /// Create a floating-point value.
    pub fn float(v: f64) -> Self {
        Self(serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number))
    }

    /// Create a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Self(JsonValue::String(v.into()))
    }

    /// Create an array value.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Self(JsonValue::Array(items.into_iter().map(|v| v.0).collect()))
    }

    /// Parse a value from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map(Self)
            .map_err(|e| SluiceError::Serialization(format!("Failed to parse value: {}", e)))
    }

    /// Serialize to a JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&self.0)
            .map_err(|e| SluiceError::Serialization(format!("Failed to serialize value: {}", e)))
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Get a field by dot path, with `field[0]` indexing.
    ///
    /// Returns None if the field doesn't exist.
    pub fn get_field(&self, path: &str) -> Option<Value> {
        let mut current = &self.0;
        for part in path.split('.') {
            if let Some((field, idx_str)) = part.split_once('[') {
                if !field.is_empty() {
                    current = current.get(field)?;
                }
                let idx: usize = idx_str.strip_suffix(']')?.parse().ok()?;
                current = current.get(idx)?;
            } else {
                current = current.get(part)?;
            }
        }
        Some(Value(current.clone()))
    }

    /// Convert to f64 if the value is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        self.0.as_f64()
    }

    /// Convert to a non-negative integer if possible.
    pub fn as_usize(&self) -> Option<usize> {
        self.0.as_u64().and_then(|v| usize::try_from(v).ok())
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Convert to bool if the value is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        self.0.as_bool()
    }

    /// Borrow the array items.
    pub fn as_array(&self) -> Option<&Vec<JsonValue>> {
        self.0.as_array()
    }

    /// Collect a list of strings, for column-name style arguments.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        self.0
            .as_array()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Shape metadata for this value.
    pub fn shape(&self) -> DataShape {
        DataShape::of(&self.0)
    }

    /// Get the inner JSON value.
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Consume and return the inner JSON value.
    pub fn into_inner(self) -> JsonValue {
        self.0
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Self(v)
    }
}

impl From<Value> for JsonValue {
    fn from(v: Value) -> Self {
        v.0
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::string(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::bool(v)
    }
}

/// Shape of a payload.
///
/// `dims` follows nested arrays through their first element. An array of
/// row objects contributes the row count and the column count, and its
/// column names are recorded in `columns`. Scalars have no dims.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataShape {
    /// Extent of each dimension.
    pub dims: Vec<usize>,
    /// Column names for tabular payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

impl DataShape {
    /// Inspect a JSON value.
    pub fn of(value: &JsonValue) -> Self {
        let mut dims = Vec::new();
        let mut columns = None;
        let mut current = value;
        loop {
            match current {
                JsonValue::Array(items) => {
                    dims.push(items.len());
                    match items.first() {
                        Some(first) => current = first,
                        None => break,
                    }
                }
                JsonValue::Object(map) => {
                    dims.push(map.len());
                    columns = Some(map.keys().cloned().collect());
                    break;
                }
                _ => break,
            }
        }
        Self { dims, columns }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// The dims as a payload value.
    pub fn dims_value(&self) -> Value {
        Value::array(self.dims.iter().map(|d| Value::int(*d as i64)))
    }

    /// The column names as a payload value, null when untabular.
    pub fn columns_value(&self) -> Value {
        match &self.columns {
            Some(cols) => Value::array(cols.iter().map(|c| Value::string(c.as_str()))),
            None => Value::null(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_nested_field_access() {
        let value = Value(json!({"user": {"name": "ada", "tags": ["x", "y"]}}));
        assert_eq!(value.get_field("user.name").unwrap().as_str(), Some("ada"));
        assert_eq!(value.get_field("user.tags[1]").unwrap().as_str(), Some("y"));
        assert!(value.get_field("user.missing").is_none());
    }

    #[test]
    fn string_list_rejects_mixed_arrays() {
        assert_eq!(
            Value(json!(["a", "b"])).as_string_list(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(Value(json!(["a", 1])).as_string_list(), None);
    }

    #[test]
    fn shape_of_matrix() {
        let shape = Value(json!([[1, 2, 3], [4, 5, 6]])).shape();
        assert_eq!(shape.dims, vec![2, 3]);
        assert_eq!(shape.columns, None);
        assert_eq!(shape.rank(), 2);
    }

    #[test]
    fn shape_of_rows() {
        let shape = Value(json!([{"a": 1, "b": 2}, {"a": 3, "b": 4}, {"a": 5, "b": 6}])).shape();
        assert_eq!(shape.dims, vec![3, 2]);
        assert_eq!(shape.columns, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn shape_of_scalar_and_empty() {
        assert!(Value::int(4).shape().dims.is_empty());
        assert_eq!(Value(json!([])).shape().dims, vec![0]);
    }

    #[test]
    fn dims_value_is_an_array() {
        let shape = Value(json!([1, 2, 3])).shape();
        assert_eq!(shape.dims_value(), Value(json!([3])));
        assert!(shape.columns_value().is_null());
    }
}
