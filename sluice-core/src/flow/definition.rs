//! Pipeline definition - the top-level document.

use super::NodeConfig;
use super::validation::{DefinitionValidator, ValidationResult};
use crate::error::{Result, SluiceError};
use crate::node::NodeKind;
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The section of a definition a node is listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionSection {
    /// `inlets`
    Inlets,
    /// `outlets`
    Outlets,
    /// `elements`
    Elements,
}

impl DefinitionSection {
    /// Section key in the document.
    pub fn key(self) -> &'static str {
        match self {
            Self::Inlets => "inlets",
            Self::Outlets => "outlets",
            Self::Elements => "elements",
        }
    }

    /// Kind assumed for entries that do not state one.
    pub fn default_kind(self) -> NodeKind {
        match self {
            Self::Inlets => NodeKind::Inlet,
            Self::Outlets => NodeKind::Outlet,
            Self::Elements => NodeKind::Element,
        }
    }

    /// Whether `kind` may be listed in this section.
    pub fn admits(self, kind: NodeKind) -> bool {
        match self {
            Self::Inlets => kind == NodeKind::Inlet,
            Self::Outlets => kind == NodeKind::Outlet,
            Self::Elements => !matches!(kind, NodeKind::Inlet | NodeKind::Outlet),
        }
    }
}

/// A complete pipeline definition.
///
/// Inlets and outlets are listed in the order the pipeline receives and
/// returns payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Pipeline name (required).
    pub name: String,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Entry nodes, in payload order.
    #[serde(default)]
    pub inlets: Vec<NodeConfig>,

    /// Exit nodes, in result order.
    #[serde(default)]
    pub outlets: Vec<NodeConfig>,

    /// All other nodes.
    #[serde(default)]
    pub elements: Vec<NodeConfig>,
}

impl PipelineDefinition {
    /// Create an empty definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            inlets: Vec::new(),
            outlets: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Parse a definition from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| SluiceError::DefinitionParse {
            path: PathBuf::from("<string>"),
            cause: e.to_string(),
        })
    }

    /// Parse a definition from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SluiceError::DefinitionParse {
            path: PathBuf::from("<string>"),
            cause: e.to_string(),
        })
    }

    /// Serialize to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| SluiceError::Serialization(e.to_string()))
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SluiceError::Serialization(e.to_string()))
    }

    /// Load a definition from a file.
    ///
    /// Files ending in `.json` are read as JSON, anything else as YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SluiceError::Io {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })?;
        let parsed = if is_json(path) {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        };
        parsed.map_err(|e| match e {
            SluiceError::DefinitionParse { cause, .. } => SluiceError::DefinitionParse {
                path: path.to_path_buf(),
                cause,
            },
            other => other,
        })
    }

    /// Write the definition to a file, as JSON or YAML by extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            self.to_json()?
        } else {
            self.to_yaml()?
        };
        std::fs::write(path, content).map_err(|e| SluiceError::Io {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })
    }

    /// Validate the definition.
    pub fn validate(&self) -> ValidationResult {
        DefinitionValidator::new().validate(self)
    }

    /// Validate, converting the problems into a single error.
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate()
            .map_err(|errors| SluiceError::DefinitionInvalid {
                name: self.name.clone(),
                problems: errors.iter().map(ToString::to_string).collect(),
            })
    }

    /// Set description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Add an inlet.
    pub fn with_inlet(mut self, node: NodeConfig) -> Self {
        self.inlets.push(node);
        self
    }

    /// Add an outlet.
    pub fn with_outlet(mut self, node: NodeConfig) -> Self {
        self.outlets.push(node);
        self
    }

    /// Add an element.
    pub fn with_element(mut self, node: NodeConfig) -> Self {
        self.elements.push(node);
        self
    }

    /// Every node with the section it is listed in.
    pub fn nodes(&self) -> impl Iterator<Item = (DefinitionSection, &NodeConfig)> {
        let inlets = self.inlets.iter().map(|n| (DefinitionSection::Inlets, n));
        let outlets = self.outlets.iter().map(|n| (DefinitionSection::Outlets, n));
        let elements = self.elements.iter().map(|n| (DefinitionSection::Elements, n));
        inlets.chain(outlets).chain(elements)
    }

    /// Get a node by id.
    pub fn get_node(&self, id: NodeId) -> Option<&NodeConfig> {
        self.nodes().map(|(_, n)| n).find(|n| n.id == id)
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.inlets.len() + self.outlets.len() + self.elements.len()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Requirement;
    use crate::value::Value;

    const FAN_OUT: &str = r#"
name: fan_out
description: Copy a payload to two outlets

inlets:
  - id: 0
    name: in
    downstream: [1]

elements:
  - id: 1
    name: copy
    kind: fan_out
    kernel: std::duplicate
    n_result: 2
    upstream: [0]
    downstream: [2, 3]

outlets:
  - id: 2
    name: left
    upstream: [1]
  - id: 3
    name: right
    upstream: [1]
"#;

    #[test]
    fn parse_definition() {
        let def = PipelineDefinition::from_yaml(FAN_OUT).unwrap();
        assert_eq!(def.name, "fan_out");
        assert_eq!(def.inlets.len(), 1);
        assert_eq!(def.outlets.len(), 2);
        assert_eq!(def.node_count(), 4);

        let copy = def.get_node(NodeId::new(1)).unwrap();
        assert_eq!(copy.kind, Some(NodeKind::FanOut));
        assert_eq!(copy.n_result, Some(2));
        assert!(def.validate().is_ok());
    }

    #[test]
    fn yaml_and_json_agree() {
        let def = PipelineDefinition::from_yaml(FAN_OUT).unwrap();
        let json = def.to_json().unwrap();
        assert_eq!(PipelineDefinition::from_json(&json).unwrap(), def);
    }

    #[test]
    fn parse_error_is_reported() {
        let err = PipelineDefinition::from_yaml("name: [unclosed").unwrap_err();
        assert_eq!(err.code(), "E502");
    }

    #[test]
    fn builder_produces_valid_definition() {
        let def = PipelineDefinition::new("pad")
            .with_inlet(NodeConfig::new(NodeId::new(0), "a").with_downstream([NodeId::new(2)]))
            .with_inlet(NodeConfig::new(NodeId::new(1), "b").with_downstream([NodeId::new(3)]))
            .with_outlet(NodeConfig::new(NodeId::new(2), "out_a").with_upstream([NodeId::new(0)]))
            .with_element(
                NodeConfig::new(NodeId::new(3), "pad")
                    .with_kernel("std::pad", Value::null())
                    .with_upstream([NodeId::new(1)])
                    .with_downstream([NodeId::new(4)])
                    .with_requirement(Requirement::new(NodeId::new(0), "output_shape", "length")),
            )
            .with_outlet(NodeConfig::new(NodeId::new(4), "out_b").with_upstream([NodeId::new(3)]));
        assert!(def.ensure_valid().is_ok());
    }

    #[test]
    fn file_round_trip_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let def = PipelineDefinition::from_yaml(FAN_OUT).unwrap();

        let yaml_path = dir.path().join("pipeline.yaml");
        def.save(&yaml_path).unwrap();
        assert_eq!(PipelineDefinition::from_file(&yaml_path).unwrap(), def);

        let json_path = dir.path().join("pipeline.json");
        def.save(&json_path).unwrap();
        let content = std::fs::read_to_string(&json_path).unwrap();
        assert!(content.trim_start().starts_with('{'));
        assert_eq!(PipelineDefinition::from_file(&json_path).unwrap(), def);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err =
            PipelineDefinition::from_file(Path::new("/nonexistent/pipeline.yaml")).unwrap_err();
        assert_eq!(err.code(), "E505");
    }
}
