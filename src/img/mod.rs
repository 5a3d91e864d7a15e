// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! # Image manipulation
//!
//! This module is a namespace for submodules dealing with image manipulation.
//! Images are immutable row-major grids of `f32` intensities.

pub mod gray;
pub mod interpolation;

pub use gray::{Image, IntoIntensity};
pub use interpolation::Interpolation;
