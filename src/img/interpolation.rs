// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sub-pixel interpolation kernels.
//!
//! The kernels below assume that the sampled location has already been
//! validated with `Image::contains`. Use `Image::sample` for checked access.

use std::fmt;
use std::str::FromStr;

use super::gray::Image;

/// Interpolation order used when sampling at fractional locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    Bilinear,
    /// Keys cubic convolution (a = -0.5) on a 4x4 neighborhood.
    Cubic,
}

impl Default for Interpolation {
    fn default() -> Self {
        Interpolation::Bilinear
    }
}

impl FromStr for Interpolation {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(Interpolation::Nearest),
            "bilinear" | "linear" => Ok(Interpolation::Bilinear),
            "cubic" | "bicubic" | "keys" => Ok(Interpolation::Cubic),
            other => Err(format!("Unknown interpolation: {}", other)),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interpolation::Nearest => "nearest",
            Interpolation::Bilinear => "bilinear",
            Interpolation::Cubic => "cubic",
        };
        f.write_str(name)
    }
}

/// Nearest pixel center, halfway cases rounded away from zero.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
pub fn nearest(x: f32, y: f32, image: &Image) -> f32 {
    image.pixel(x.round() as usize, y.round() as usize)
}

/// Simple linear interpolation of a pixel with floating point coordinates.
///
/// The right (resp. bottom) neighbor is only read when the fractional part
/// is not zero, so the last row and column can be sampled exactly.
#[allow(clippy::many_single_char_names)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
pub fn linear(x: f32, y: f32, image: &Image) -> f32 {
    let u = x.floor();
    let v = y.floor();
    let a = x - u;
    let b = y - v;
    let u_0 = u as usize;
    let v_0 = v as usize;
    let u_1 = if a > 0.0 { u_0 + 1 } else { u_0 };
    let v_1 = if b > 0.0 { v_0 + 1 } else { v_0 };
    let vu_00 = image.pixel(u_0, v_0);
    let vu_10 = image.pixel(u_0, v_1);
    let vu_01 = image.pixel(u_1, v_0);
    let vu_11 = image.pixel(u_1, v_1);
    (1.0 - b) * (1.0 - a) * vu_00
        + b * (1.0 - a) * vu_10
        + (1.0 - b) * a * vu_01
        + b * a * vu_11
}

/// Keys cubic convolution.
///
/// Stencil pixels falling outside of the image replicate the border.
/// At integer locations the weights are exactly (0, 1, 0, 0).
#[allow(clippy::cast_possible_truncation)]
pub fn cubic(x: f32, y: f32, image: &Image) -> f32 {
    let u = x.floor();
    let v = y.floor();
    let wx = keys_weights(x - u);
    let wy = keys_weights(y - v);
    let u = u as i64;
    let v = v as i64;
    let mut acc = 0.0;
    for (j, wy_j) in wy.iter().enumerate() {
        let row = border_index(v + j as i64 - 1, image.height());
        let mut row_acc = 0.0;
        for (i, wx_i) in wx.iter().enumerate() {
            let col = border_index(u + i as i64 - 1, image.width());
            row_acc += wx_i * image.pixel(col, row);
        }
        acc += wy_j * row_acc;
    }
    acc
}

/// Weights of the 4 stencil samples at offsets -1, 0, 1, 2.
fn keys_weights(t: f32) -> [f32; 4] {
    [
        keys_kernel(t + 1.0),
        keys_kernel(t),
        keys_kernel(1.0 - t),
        keys_kernel(2.0 - t),
    ]
}

fn keys_kernel(t: f32) -> f32 {
    let t = t.abs();
    if t <= 1.0 {
        (1.5 * t - 2.5) * t * t + 1.0
    } else if t < 2.0 {
        ((-0.5 * t + 2.5) * t - 4.0) * t + 2.0
    } else {
        0.0
    }
}

#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_truncation)]
fn border_index(i: i64, len: usize) -> usize {
    i.max(0).min(len as i64 - 1) as usize
}
