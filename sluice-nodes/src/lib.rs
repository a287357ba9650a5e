//! Standard kernel library for sluice.
//!
//! This crate provides the built-in kernels that definitions refer to by
//! type name:
//!
//! ## Flow (`flow::*`)
//! - [`flow::Duplicate`] - copy one input to every downstream edge
//! - [`flow::Concat`] - join array inputs in upstream order
//!
//! ## Data (`data::*`)
//! - [`data::Split`] - divide an array across downstream edges
//! - [`data::Scale`] - multiply every number by a scalar
//! - [`data::Pad`] - extend arrays to a target length
//! - [`data::Select`] - keep a set of columns
//!
//! [`standard_registry`] builds any of them (and `std::identity`) from a
//! definition's `attributes`.

pub mod data;
pub mod flow;
pub mod registry;

pub use data::{Pad, PadConfig, Scale, ScaleConfig, Select, SelectConfig, Split, SplitConfig};
pub use flow::{Concat, Duplicate};
pub use registry::{
    KernelCatalog, KernelCategory, KernelDescriptor, StandardFactory, StandardKernel,
    standard_catalog, standard_registry,
};

/// Prelude for commonly used types.
pub mod prelude {
    pub use crate::data::{Pad, Scale, Select, Split};
    pub use crate::flow::{Concat, Duplicate};
    pub use crate::registry::{StandardKernel, standard_registry};
}
