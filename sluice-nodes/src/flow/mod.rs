//! Flow kernels: fan-out and fan-in.
//!
//! - `std::duplicate` - copy one input to every downstream edge
//! - `std::concat` - join array inputs from every upstream edge

mod concat;
mod duplicate;

pub use concat::Concat;
pub use duplicate::Duplicate;
