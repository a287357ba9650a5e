//! Sluice Executor - scheduling and running pipelines.
//!
//! This crate provides the execution infrastructure for sluice:
//! - Petri-net construction from a wired node arena
//! - Reachability search for an execution order
//! - Dataflow execution along that order
//! - Pipeline composition (merge and concatenate)
//! - Loading pipelines from definitions and writing them back
//! - Logging setup
//!
//! # Example
//!
//! ```ignore
//! use sluice_core::prelude::*;
//! use sluice_executor::prelude::*;
//!
//! let mut arena = NodeArena::new();
//! let inlet = arena.inlet("in");
//! let outlet = arena.outlet("out");
//! arena.connect(inlet, outlet)?;
//!
//! let mut pipeline = Pipeline::new(arena, vec![inlet], vec![outlet])?;
//! let outputs = pipeline.run(vec![Value::int(1)])?;
//! ```

#![warn(missing_docs)]

pub mod loader;
pub mod observability;
pub mod pipeline;
pub mod scheduler;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::loader::{LoaderConfig, PipelineLoader};
    pub use crate::observability::{LogFormat, TracingConfig, init_tracing};
    pub use crate::pipeline::Pipeline;
    pub use crate::scheduler::{
        CancellationToken, Executor, ExecutorConfig, Marking, PetriNet, Place,
        ReachabilityScheduler, SchedulerConfig,
    };
}
