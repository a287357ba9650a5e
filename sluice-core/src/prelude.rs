//! Prelude for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! # Example
//!
//! ```ignore
//! use sluice_core::prelude::*;
//! ```

// Core types
pub use crate::types::NodeId;
pub use crate::value::{DataShape, Value};

// Error handling
pub use crate::error::{Result, ResultExt, SluiceError};

// Node model
pub use crate::node::{FlowData, Node, NodeArena, NodeKind, Requirement};

// Traits
pub use crate::traits::{
    FnKernel, Kernel, KernelContext, KernelFactory, KernelInfo, KernelRegistry, PassThrough,
};

// Definitions
pub use crate::flow::{
    DefinitionSection, NodeConfig, PipelineDefinition, ValidationError, ValidationErrorKind,
};
