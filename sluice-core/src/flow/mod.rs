//! Pipeline definition documents.
//!
//! A definition is the serialized form of a pipeline: every node with its
//! kind, kernel type, kernel configuration, edges and requirements, keyed by
//! the node's id. Documents are YAML or JSON.
//!
//! - [`PipelineDefinition`] - The top-level document
//! - [`NodeConfig`] - One node
//!
//! # Example YAML
//!
//! ```yaml
//! name: normalize
//!
//! inlets:
//!   - id: 0
//!     name: raw
//!     downstream: [1]
//!
//! elements:
//!   - id: 1
//!     name: scale
//!     kernel: std::scale
//!     upstream: [0]
//!     downstream: [2]
//!     attributes:
//!       scalar: 0.5
//!
//! outlets:
//!   - id: 2
//!     name: scaled
//!     upstream: [1]
//! ```

mod definition;
mod node;
mod validation;

pub use definition::{DefinitionSection, PipelineDefinition};
pub use node::NodeConfig;
pub use validation::{DefinitionValidator, ValidationError, ValidationErrorKind, ValidationResult};
