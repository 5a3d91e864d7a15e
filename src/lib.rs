// SPDX-License-Identifier: MPL-2.0

//! # Digital image correlation subsets
//!
//! Subset definition and intensity sampling for digital image correlation.
//!
//! A correlation solver builds one [`Subset`](subset::Subset) per point of interest,
//! fills its reference intensities once from the reference image,
//! and then, at every iteration, resamples the deformed image through
//! the current [`DefMap`](def_map::DefMap) to compare both buffers.

// #![warn(missing_docs)]

pub mod config;
pub mod def_map;
pub mod error;
pub mod img;
pub mod interop;
pub mod runtime;
pub mod subset;

pub use config::Config;
pub use def_map::DefMap;
pub use error::{Error, Result};
pub use img::{Image, Interpolation};
pub use runtime::Runtime;
pub use subset::{Buffer, InitMode, Subset};
