// SPDX-License-Identifier: MPL-2.0

//! Subsets: the finite set of pixels tracked around one point of interest.
//!
//! A subset owns an ordered list of pixel coordinates, fixed at construction,
//! and two intensity buffers indexed like the coordinates.
//! The reference buffer is filled once from the reference image,
//! the deformed buffer is refilled at every solver iteration
//! by sampling the deformed image through a deformation map.

use std::convert::TryFrom;
use std::fmt;
use std::path::Path;

use crate::def_map::DefMap;
use crate::error::{Error, Result};
use crate::img::{Image, Interpolation};

/// Selects one of the two intensity buffers of a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffer {
    Reference,
    Deformed,
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Buffer::Reference => f.write_str("reference"),
            Buffer::Deformed => f.write_str("deformed"),
        }
    }
}

/// Target buffer of `Subset::initialize_with_map`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitMode {
    FillRefIntensities,
    FillDefIntensities,
}

impl InitMode {
    fn buffer(self) -> Buffer {
        match self {
            InitMode::FillRefIntensities => Buffer::Reference,
            InitMode::FillDefIntensities => Buffer::Deformed,
        }
    }
}

/// Inclusive pixel bounds of a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BoundingBox {
    /// Number of columns, `None` if it does not fit a `usize`.
    pub fn width(&self) -> Option<usize> {
        extent(self.min_x, self.max_x)
    }

    /// Number of rows, `None` if it does not fit a `usize`.
    pub fn height(&self) -> Option<usize> {
        extent(self.min_y, self.max_y)
    }
}

fn extent(min: i32, max: i32) -> Option<usize> {
    let span = i64::from(max) - i64::from(min) + 1;
    usize::try_from(span).ok()
}

/// Largest raster built by `Subset::raster` (1 GiB of intensities).
pub const MAX_RASTER_PIXELS: usize = 1 << 28;

#[derive(Debug, Clone)]
pub struct Subset {
    cx: i32,
    cy: i32,
    coordinates: Vec<(i32, i32)>,
    ref_intensities: Option<Vec<f32>>,
    def_intensities: Option<Vec<f32>>,
    interpolation: Interpolation,
}

impl Subset {
    /// Rectangular subset of `width x height` pixels centered on `(cx, cy)`.
    ///
    /// Columns span `cx - width / 2 ..` for `width` pixels (integer division),
    /// and similarly for rows. Odd sizes are exactly centered,
    /// even sizes have the extra pixel on the low side.
    /// Coordinates are stored row by row.
    pub fn rectangle(cx: i32, cy: i32, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Construction(format!(
                "subset dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        let too_large = || {
            Error::Construction(format!(
                "subset of {}x{} pixels is too large",
                width, height
            ))
        };
        let num_pixels = width.checked_mul(height).ok_or_else(too_large)?;
        let w = i32::try_from(width).map_err(|_| too_large())?;
        let h = i32::try_from(height).map_err(|_| too_large())?;
        let x0 = cx.checked_sub(w / 2).ok_or_else(too_large)?;
        let y0 = cy.checked_sub(h / 2).ok_or_else(too_large)?;
        let x1 = x0.checked_add(w - 1).ok_or_else(too_large)?;
        let y1 = y0.checked_add(h - 1).ok_or_else(too_large)?;

        let mut coordinates = Vec::with_capacity(num_pixels);
        for y in y0..=y1 {
            for x in x0..=x1 {
                coordinates.push((x, y));
            }
        }
        log::debug!(
            "Rectangular subset at ({}, {}) of {}x{} pixels",
            cx,
            cy,
            width,
            height
        );
        Ok(Self::with_coordinates(cx, cy, coordinates))
    }

    /// Subset made of the pixels `(xs[i], ys[i])`, in that order.
    ///
    /// The centroid is kept as given, whatever the distribution of the pixels.
    pub fn from_coordinates(cx: i32, cy: i32, xs: &[i32], ys: &[i32]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(Error::Construction(format!(
                "{} x coordinates but {} y coordinates",
                xs.len(),
                ys.len()
            )));
        }
        let coordinates = xs.iter().cloned().zip(ys.iter().cloned()).collect();
        Self::from_pairs(cx, cy, coordinates)
    }

    /// Subset made of an ordered list of `(x, y)` pixels.
    /// An empty list gives an empty subset.
    pub fn from_pairs(cx: i32, cy: i32, coordinates: Vec<(i32, i32)>) -> Result<Self> {
        log::debug!(
            "Subset at ({}, {}) with {} explicit pixels",
            cx,
            cy,
            coordinates.len()
        );
        Ok(Self::with_coordinates(cx, cy, coordinates))
    }

    fn with_coordinates(cx: i32, cy: i32, coordinates: Vec<(i32, i32)>) -> Self {
        Self {
            cx,
            cy,
            coordinates,
            ref_intensities: None,
            def_intensities: None,
            interpolation: Interpolation::default(),
        }
    }

    /// Set the interpolation used when sampling through a deformation map.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn num_pixels(&self) -> usize {
        self.coordinates.len()
    }

    pub fn centroid_x(&self) -> i32 {
        self.cx
    }

    pub fn centroid_y(&self) -> i32 {
        self.cy
    }

    pub fn coordinates(&self) -> &[(i32, i32)] {
        &self.coordinates
    }

    pub fn x(&self, i: usize) -> Result<i32> {
        self.coordinate(i).map(|(x, _)| x)
    }

    pub fn y(&self, i: usize) -> Result<i32> {
        self.coordinate(i).map(|(_, y)| y)
    }

    fn coordinate(&self, i: usize) -> Result<(i32, i32)> {
        self.coordinates
            .get(i)
            .cloned()
            .ok_or(Error::IndexOutOfRange {
                index: i,
                len: self.coordinates.len(),
            })
    }

    pub fn ref_intensities(&self, i: usize) -> Result<f32> {
        self.intensity(Buffer::Reference, i)
    }

    pub fn def_intensities(&self, i: usize) -> Result<f32> {
        self.intensity(Buffer::Deformed, i)
    }

    fn intensity(&self, buffer: Buffer, i: usize) -> Result<f32> {
        if i >= self.num_pixels() {
            return Err(Error::IndexOutOfRange {
                index: i,
                len: self.num_pixels(),
            });
        }
        Ok(self.buffer(buffer)?[i])
    }

    /// Whole intensity buffer, in coordinates order.
    pub fn buffer(&self, buffer: Buffer) -> Result<&[f32]> {
        let slot = match buffer {
            Buffer::Reference => &self.ref_intensities,
            Buffer::Deformed => &self.def_intensities,
        };
        slot.as_deref().ok_or(Error::UninitializedAccess(buffer))
    }

    pub fn ref_buffer(&self) -> Result<&[f32]> {
        self.buffer(Buffer::Reference)
    }

    pub fn def_buffer(&self) -> Result<&[f32]> {
        self.buffer(Buffer::Deformed)
    }

    pub fn is_initialized(&self, buffer: Buffer) -> bool {
        self.buffer(buffer).is_ok()
    }

    fn non_empty_buffer(&self, buffer: Buffer) -> Result<&[f32]> {
        let intensities = self.buffer(buffer)?;
        if intensities.is_empty() {
            return Err(Error::Degenerate(buffer));
        }
        Ok(intensities)
    }

    /// Fill the reference intensities with a direct lookup of each pixel.
    pub fn initialize(&mut self, image: &Image) -> Result<()> {
        let sampled: Result<Vec<f32>> = self
            .coordinates
            .iter()
            .map(|&(x, y)| {
                image.at(x, y).map_err(|_| Error::SampleOutOfBounds {
                    x: x as f32,
                    y: y as f32,
                    width: image.width(),
                    height: image.height(),
                })
            })
            .collect();
        self.ref_intensities = Some(sampled?);
        log::trace!(
            "Reference intensities of subset ({}, {}) initialized",
            self.cx,
            self.cy
        );
        Ok(())
    }

    /// Fill one of the buffers by sampling `image` at every pixel
    /// moved by `map` about the subset centroid.
    ///
    /// The target buffer is only replaced if every sample succeeds.
    pub fn initialize_with_map(
        &mut self,
        image: &Image,
        map: &DefMap,
        mode: InitMode,
    ) -> Result<()> {
        let interpolation = self.interpolation;
        // Translations skip the matrix so integer shifts stay exact.
        let warp = if map.is_translation() {
            None
        } else {
            Some(map.affine(self.cx as f32, self.cy as f32))
        };
        let sampled: Result<Vec<f32>> = self
            .coordinates
            .iter()
            .map(|&(x, y)| {
                let (mx, my) = match &warp {
                    Some(mat) => DefMap::apply_affine(mat, x as f32, y as f32),
                    None => (x as f32 + map.u, y as f32 + map.v),
                };
                image.sample(mx, my, interpolation)
            })
            .collect();
        let sampled = sampled?;
        match mode.buffer() {
            Buffer::Reference => self.ref_intensities = Some(sampled),
            Buffer::Deformed => self.def_intensities = Some(sampled),
        }
        log::trace!(
            "{} intensities of subset ({}, {}) initialized with {:?}",
            mode.buffer(),
            self.cx,
            self.cy,
            map
        );
        Ok(())
    }

    /// Smallest rectangle containing every pixel of the subset,
    /// `None` for an empty subset.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let (&(x0, y0), rest) = self.coordinates.split_first()?;
        let init = BoundingBox {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        Some(rest.iter().fold(init, |b, &(x, y)| BoundingBox {
            min_x: b.min_x.min(x),
            min_y: b.min_y.min(y),
            max_x: b.max_x.max(x),
            max_y: b.max_y.max(y),
        }))
    }

    /// Rasterize one buffer over the bounding box of the subset.
    /// Pixels of the box that are not part of the subset are 0.
    ///
    /// Fails for empty subsets and for boxes larger than `MAX_RASTER_PIXELS`.
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    pub fn raster(&self, buffer: Buffer) -> Result<(usize, usize, Vec<f32>)> {
        let intensities = self.buffer(buffer)?;
        let bbox = self
            .bounding_box()
            .ok_or_else(|| Error::Raster("the subset has no pixel".to_string()))?;
        let too_large = || {
            Error::Raster(format!(
                "bounding box from ({}, {}) to ({}, {}) is too large",
                bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
            ))
        };
        let width = bbox.width().ok_or_else(too_large)?;
        let height = bbox.height().ok_or_else(too_large)?;
        let area = width
            .checked_mul(height)
            .filter(|&area| area <= MAX_RASTER_PIXELS)
            .ok_or_else(too_large)?;
        let mut raster = vec![0.0; area];
        for (&(x, y), &value) in self.coordinates.iter().zip(intensities) {
            // Bounded by width and height, both checked above.
            let col = (i64::from(x) - i64::from(bbox.min_x)) as usize;
            let row = (i64::from(y) - i64::from(bbox.min_y)) as usize;
            raster[row * width + col] = value;
        }
        Ok((width, height, raster))
    }

    /// Save one buffer as an image for visual inspection.
    pub fn write<P: AsRef<Path>>(&self, path: P, use_deformed: bool) -> Result<()> {
        let buffer = if use_deformed {
            Buffer::Deformed
        } else {
            Buffer::Reference
        };
        let (width, height, raster) = self.raster(buffer)?;
        crate::interop::write(path, width, height, &raster)
    }

    /// Mean intensity of a buffer.
    /// The buffer of an empty subset is degenerate.
    pub fn mean(&self, buffer: Buffer) -> Result<f32> {
        let intensities = self.non_empty_buffer(buffer)?;
        Ok(mean(intensities))
    }

    /// Mean intensity of a buffer and the square root of the sum
    /// of squared differences to that mean.
    pub fn mean_and_deviation(&self, buffer: Buffer) -> Result<(f32, f32)> {
        let intensities = self.non_empty_buffer(buffer)?;
        let m = mean(intensities);
        let sum_sqr: f64 = intensities
            .iter()
            .map(|&v| (v as f64 - m as f64).powi(2))
            .sum();
        Ok((m, sum_sqr.sqrt() as f32))
    }

    /// Zero-normalized sum of squared differences between
    /// the reference and the deformed intensities.
    ///
    /// It is 0 for a perfect match, insensitive to affine intensity changes,
    /// and bounded by 4.
    pub fn gamma(&self) -> Result<f32> {
        let (ref_mean, ref_dev) = self.mean_and_deviation(Buffer::Reference)?;
        let (def_mean, def_dev) = self.mean_and_deviation(Buffer::Deformed)?;
        if ref_dev == 0.0 {
            return Err(Error::Degenerate(Buffer::Reference));
        }
        if def_dev == 0.0 {
            return Err(Error::Degenerate(Buffer::Deformed));
        }
        let gamma: f64 = self
            .ref_buffer()?
            .iter()
            .zip(self.def_buffer()?)
            .map(|(&r, &d)| {
                let diff = (r - ref_mean) / ref_dev - (d - def_mean) / def_dev;
                (diff as f64).powi(2)
            })
            .sum();
        Ok(gamma as f32)
    }
}

fn mean(values: &[f32]) -> f32 {
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    (sum / values.len() as f64) as f32
}
