//! Core traits for sluice components.
//!
//! - `Kernel`: The transform a node runs, plus the attributes it exposes and
//!   the arguments it accepts
//! - `KernelFactory`: Builds kernels from their serialized configuration
//! - `KernelRegistry`: Maps kernel type names to factories

mod builtin;
mod kernel;
mod registry;

pub use builtin::{FnKernel, PassThrough};
pub use kernel::{Kernel, KernelContext, KernelFactory, KernelInfo};
pub use registry::KernelRegistry;
