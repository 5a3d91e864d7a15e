// SPDX-License-Identifier: MPL-2.0

//! Immutable gray level image with bounds-checked access.

use std::path::Path;

use crate::error::{Error, Result};
use crate::img::interpolation::{self, Interpolation};

/// Pixel types that can be converted into an intensity value.
pub trait IntoIntensity: Copy {
    fn into_intensity(self) -> f32;
}

impl IntoIntensity for u8 {
    fn into_intensity(self) -> f32 {
        self as f32
    }
}

impl IntoIntensity for u16 {
    fn into_intensity(self) -> f32 {
        self as f32
    }
}

impl IntoIntensity for f32 {
    fn into_intensity(self) -> f32 {
        self
    }
}

/// Row-major grid of intensities.
///
/// The image never changes after construction,
/// so it can be shared between any number of subsets.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    intensities: Vec<f32>,
}

impl Image {
    /// Build an image from a row-major intensity buffer.
    pub fn from_vec(width: usize, height: usize, intensities: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Construction(format!(
                "image dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: intensities.len(),
        })?;
        if intensities.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: intensities.len(),
            });
        }
        Ok(Self {
            width,
            height,
            intensities,
        })
    }

    /// Build an image by converting a row-major buffer of raw pixels.
    pub fn from_raw<T: IntoIntensity>(width: usize, height: usize, raw: &[T]) -> Result<Self> {
        let intensities = raw.iter().map(|&p| p.into_intensity()).collect();
        Self::from_vec(width, height, intensities)
    }

    /// Build an image by evaluating `f(x, y)` at every pixel.
    pub fn from_fn<F: FnMut(usize, usize) -> f32>(
        width: usize,
        height: usize,
        mut f: F,
    ) -> Result<Self> {
        let mut intensities = Vec::with_capacity(width.saturating_mul(height));
        for y in 0..height {
            for x in 0..width {
                intensities.push(f(x, y));
            }
        }
        Self::from_vec(width, height, intensities)
    }

    /// Decode an image file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::interop::read(path)
    }

    /// Encode the image into a file, the format is deduced from the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::interop::write(path, self.width, self.height, &self.intensities)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major intensity buffer.
    pub fn intensities(&self) -> &[f32] {
        &self.intensities
    }

    /// Intensity of the pixel at integer coordinates.
    pub fn at(&self, x: i32, y: i32) -> Result<f32> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Err(Error::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.pixel(x as usize, y as usize))
    }

    /// Check that a fractional location lies within the pixel centers extent,
    /// that is `[0, width - 1] x [0, height - 1]`.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x <= (self.width - 1) as f32 && y <= (self.height - 1) as f32
    }

    /// Intensity at a fractional location.
    ///
    /// Locations outside of the image are rejected, never clamped.
    /// Every interpolation returns the exact pixel value at integer locations.
    pub fn sample(&self, x: f32, y: f32, interpolation: Interpolation) -> Result<f32> {
        if !self.contains(x, y) {
            return Err(Error::SampleOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let value = match interpolation {
            Interpolation::Nearest => interpolation::nearest(x, y, self),
            Interpolation::Bilinear => interpolation::linear(x, y, self),
            Interpolation::Cubic => interpolation::cubic(x, y, self),
        };
        Ok(value)
    }

    /// Unchecked (beyond slice indexing) access for already validated coordinates.
    pub(crate) fn pixel(&self, x: usize, y: usize) -> f32 {
        self.intensities[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use super::Image;
    use crate::error::Error;
    use crate::img::interpolation::Interpolation;

    fn ramp() -> Image {
        Image::from_fn(4, 3, |x, y| (10 * y + x) as f32).expect("valid image")
    }

    #[test]
    fn from_vec_checks_length() {
        let err = Image::from_vec(3, 2, vec![0.0; 5]).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: 6,
                actual: 5
            }
        ));
        assert!(matches!(
            Image::from_vec(0, 2, Vec::new()),
            Err(Error::Construction(_))
        ));
    }

    #[test]
    fn at_is_row_major_and_bounds_checked() {
        let img = ramp();
        assert_eq!(img.at(0, 0).unwrap(), 0.0);
        assert_eq!(img.at(3, 0).unwrap(), 3.0);
        assert_eq!(img.at(1, 2).unwrap(), 21.0);
        assert_eq!(img.intensities()[4], 10.0);

        assert!(matches!(img.at(4, 0), Err(Error::OutOfRange { x: 4, .. })));
        assert!(matches!(img.at(0, 3), Err(Error::OutOfRange { y: 3, .. })));
        assert!(matches!(img.at(-1, 0), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn from_raw_converts_pixels() {
        let img = Image::from_raw(2, 2, &[0u16, 300, 65535, 7]).expect("valid image");
        assert_eq!(img.intensities(), &[0.0, 300.0, 65535.0, 7.0]);
    }

    #[test]
    fn sample_rejects_locations_outside_of_the_extent() {
        let img = ramp();
        for &(x, y) in &[(-0.01, 1.0), (3.01, 1.0), (1.0, -0.5), (1.0, 2.5)] {
            for &interp in &[
                Interpolation::Nearest,
                Interpolation::Bilinear,
                Interpolation::Cubic,
            ] {
                assert!(matches!(
                    img.sample(x, y, interp),
                    Err(Error::SampleOutOfBounds { .. })
                ));
            }
        }
        assert!(img.sample(f32::NAN, 1.0, Interpolation::Bilinear).is_err());
        // The last pixel center is still inside.
        assert_eq!(img.sample(3.0, 2.0, Interpolation::Bilinear).unwrap(), 23.0);
    }
}
