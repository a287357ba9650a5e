//! Sluice Core Library
//!
//! This crate provides the foundational types and traits for sluice
//! pipelines.
//!
//! # Overview
//!
//! A pipeline is a directed graph of nodes. Data enters through inlets,
//! flows along single edges through elements, fans out and back in, and
//! leaves through outlets. Requirements add non-structural dependencies:
//! a node can take an argument from an attribute another node exposes
//! once that node has run.
//!
//! # Key Components
//!
//! - **Node**: Arena-allocated nodes, their kinds, edges and requirements
//! - **Traits**: The `Kernel` capability a node runs, and its registry
//! - **Flow**: Serializable pipeline definitions and their validation
//! - **Value**: The JSON payload type and its shape metadata
//!
//! # Example
//!
//! ```ignore
//! use sluice_core::prelude::*;
//!
//! let mut arena = NodeArena::new();
//! let inlet = arena.inlet("in");
//! let double = arena.add(
//!     NodeKind::Element,
//!     "double",
//!     FnKernel::map("double", |v| Ok(Value::float(v.as_f64().unwrap_or(0.0) * 2.0))),
//! );
//! let outlet = arena.outlet("out");
//! arena.connect(inlet, double)?;
//! arena.connect(double, outlet)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod flow;
pub mod node;
pub mod prelude;
pub mod traits;
pub mod types;
pub mod value;

// Re-export key types at crate root for convenience
pub use error::{Result, SluiceError};
pub use flow::{NodeConfig, PipelineDefinition};
pub use node::{FlowData, Node, NodeArena, NodeKind, Requirement};
pub use traits::{Kernel, KernelContext, KernelFactory, KernelInfo, KernelRegistry};
pub use types::NodeId;
pub use value::{DataShape, Value};
