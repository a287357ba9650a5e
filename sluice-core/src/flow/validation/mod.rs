//! Definition validation.
//!
//! Checks a [`PipelineDefinition`](super::PipelineDefinition) without
//! building it: identifiers, references, section/kind agreement and that
//! every edge is declared on both of its ends.

mod error;
mod validator;

pub use error::{ValidationError, ValidationErrorKind};
pub use validator::DefinitionValidator;

/// Result of definition validation.
pub type ValidationResult = Result<(), Vec<ValidationError>>;
