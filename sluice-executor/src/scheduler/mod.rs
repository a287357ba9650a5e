//! Petri-net scheduler and dataflow executor.
//!
//! This module provides the scheduling and execution infrastructure:
//! - [`PetriNet`] - Places, transitions and incidence matrices built from a pipeline
//! - [`Marking`] - Branch-local 0/1 token assignments
//! - [`ReachabilityScheduler`] - Depth-first search for a firing sequence
//! - [`Executor`] - Runs the nodes in the scheduled order and routes their outputs

mod executor;
mod marking;
mod petri;
mod reachability;

pub use executor::{CancellationToken, Executor, ExecutorConfig};
pub use marking::Marking;
pub use petri::{PetriNet, Place};
pub use reachability::{ReachabilityScheduler, SchedulerConfig};
