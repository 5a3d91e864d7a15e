// SPDX-License-Identifier: MPL-2.0

//! Error type shared by every fallible operation of the crate.

use std::path::PathBuf;
use thiserror::Error;

use crate::subset::Buffer;

/// Errors raised by images, subsets and the parallel runtime.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid construction: {0}")]
    Construction(String),
    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("index {index} out of range for a subset of {len} pixels")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("the {0} intensities are not initialized")]
    UninitializedAccess(Buffer),
    #[error("sample at ({x}, {y}) is outside of the {width}x{height} image")]
    SampleOutOfBounds {
        x: f32,
        y: f32,
        width: usize,
        height: usize,
    },
    #[error("pixel ({x}, {y}) is outside of the {width}x{height} image")]
    OutOfRange {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },
    #[error("failed to load image {}: {}", .path.display(), .reason)]
    Load { path: PathBuf, reason: String },
    #[error("failed to save image {}: {}", .path.display(), .reason)]
    Save { path: PathBuf, reason: String },
    #[error("cannot rasterize subset: {0}")]
    Raster(String),
    #[error("degenerate {0} intensities (zero deviation)")]
    Degenerate(Buffer),
    #[error("failed to build the thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type of the crate.
pub type Result<T> = std::result::Result<T, Error>;
