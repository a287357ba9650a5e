//! Data kernels: reshape and transform payloads.
//!
//! - `std::split` - divide an array across the downstream edges
//! - `std::scale` - multiply every number by a scalar
//! - `std::pad` - extend an array to a length
//! - `std::select` - project rows onto columns

mod pad;
mod scale;
mod select;
mod split;

pub use pad::{Pad, PadConfig};
pub use scale::{Scale, ScaleConfig};
pub use select::{Select, SelectConfig};
pub use split::{Split, SplitConfig};
