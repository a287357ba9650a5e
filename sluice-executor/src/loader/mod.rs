#![allow(clippy::module_inception)]

//! Loading pipelines from definitions and writing them back.
//!
//! This module bridges the serializable [`PipelineDefinition`] documents of
//! `sluice-core` and runnable [`Pipeline`]s. Kernels are built through a
//! [`KernelRegistry`] from each node's `kernel` type and `attributes`.
//!
//! # Example
//!
//! ```ignore
//! use sluice_core::traits::KernelRegistry;
//! use sluice_executor::loader::PipelineLoader;
//!
//! let registry = KernelRegistry::new();
//! let mut pipeline = PipelineLoader::new().load_file("pipelines/copy.yaml", &registry)?;
//! let outputs = pipeline.run(vec![Value::int(5)])?;
//! ```
//!
//! [`PipelineDefinition`]: sluice_core::flow::PipelineDefinition
//! [`Pipeline`]: crate::pipeline::Pipeline
//! [`KernelRegistry`]: sluice_core::traits::KernelRegistry

mod export;
mod loader;

pub use loader::{LoaderConfig, PipelineLoader};
