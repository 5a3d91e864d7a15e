// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Interoperability between the `image` crate codec and the `Image` type.

use image::{DynamicImage, ImageBuffer, Luma, Primitive};
use std::path::Path;

use crate::error::{Error, Result};
use crate::img::{Image, IntoIntensity};

/// Conversion of an intensity back into a storable pixel value.
pub trait FromIntensity: Primitive {
    fn from_intensity(v: f32) -> Self;
}

impl FromIntensity for u8 {
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    fn from_intensity(v: f32) -> u8 {
        v.max(0.0).min(u8::MAX as f32).round() as u8
    }
}

impl FromIntensity for u16 {
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    fn from_intensity(v: f32) -> u16 {
        v.max(0.0).min(u16::MAX as f32).round() as u16
    }
}

/// Convert a gray image into an `Image`.
/// Inverse operation of `image_from_intensities`.
pub fn image_from_luma<T: Primitive + IntoIntensity>(
    img: &ImageBuffer<Luma<T>, Vec<T>>,
) -> Result<Image> {
    let (width, height) = img.dimensions();
    Image::from_raw(width as usize, height as usize, img.as_raw())
}

/// Convert a row-major intensity buffer into a gray image.
/// Inverse operation of `image_from_luma`.
pub fn image_from_intensities<T: FromIntensity>(
    width: usize,
    height: usize,
    intensities: &[f32],
) -> Option<ImageBuffer<Luma<T>, Vec<T>>> {
    let raw = intensities.iter().map(|&v| T::from_intensity(v)).collect();
    ImageBuffer::from_raw(width as u32, height as u32, raw)
}

/// Decode an image file into an intensity image.
///
/// Gray images keep their raw values (0-255 or 0-65535).
/// Color images are first converted to luma by the codec.
pub fn read<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();
    let load_error = |reason: String| Error::Load {
        path: path.to_path_buf(),
        reason,
    };
    let dyn_img = image::open(path).map_err(|e| load_error(e.to_string()))?;
    match &dyn_img {
        DynamicImage::ImageLuma8(img) => image_from_luma(img),
        DynamicImage::ImageLuma16(img) => image_from_luma(img),
        DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_)
        | DynamicImage::ImageLumaA8(_) => {
            log::debug!("Converting {} to gray 8 bits", path.display());
            image_from_luma(&dyn_img.to_luma8())
        }
        DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_)
        | DynamicImage::ImageLumaA16(_) => {
            log::debug!("Converting {} to gray 16 bits", path.display());
            image_from_luma(&dyn_img.to_luma16())
        }
        _ => Err(load_error("unsupported pixel type".to_string())),
    }
}

/// Encode a row-major intensity buffer into an image file.
///
/// The output is 8 bits gray when every value fits into `0..=255`,
/// and 16 bits gray otherwise. Values are rounded and clamped.
pub fn write<P: AsRef<Path>>(
    path: P,
    width: usize,
    height: usize,
    intensities: &[f32],
) -> Result<()> {
    let path = path.as_ref();
    let save_error = |reason: String| Error::Save {
        path: path.to_path_buf(),
        reason,
    };
    let expected = width * height;
    if intensities.len() != expected {
        return Err(Error::SizeMismatch {
            expected,
            actual: intensities.len(),
        });
    }
    let fits_u8 = intensities.iter().all(|&v| v <= u8::MAX as f32);
    let saved = if fits_u8 {
        image_from_intensities::<u8>(width, height, intensities)
            .ok_or_else(|| save_error("invalid dimensions".to_string()))?
            .save(path)
    } else {
        image_from_intensities::<u16>(width, height, intensities)
            .ok_or_else(|| save_error("invalid dimensions".to_string()))?
            .save(path)
    };
    saved.map_err(|e| save_error(e.to_string()))?;
    log::debug!("Saved {}x{} image to {}", width, height, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{image_from_intensities, read, write, FromIntensity};
    use crate::error::Error;
    use crate::img::Image;

    #[test]
    fn intensities_are_rounded_and_clamped() {
        assert_eq!(u8::from_intensity(-3.0), 0);
        assert_eq!(u8::from_intensity(12.6), 13);
        assert_eq!(u8::from_intensity(300.0), 255);
        assert_eq!(u16::from_intensity(70000.0), u16::MAX);
    }

    #[test]
    fn buffer_conversion_is_row_major() {
        let buf = image_from_intensities::<u8>(3, 2, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
            .expect("valid dimensions");
        assert_eq!(buf.get_pixel(2, 0).0, [2]);
        assert_eq!(buf.get_pixel(0, 1).0, [3]);
    }

    #[test]
    fn write_then_read_png() {
        let dir = std::env::temp_dir().join("dic_interop_test");
        std::fs::create_dir_all(&dir).expect("temp dir");

        let img8 = Image::from_fn(6, 4, |x, y| (x * 40 + y) as f32).expect("valid image");
        let path8 = dir.join("gray8.png");
        img8.save(&path8).expect("saved");
        assert_eq!(read(&path8).expect("loaded"), img8);

        let img16 = Image::from_fn(5, 3, |x, y| (x * 1000 + y) as f32).expect("valid image");
        let path16 = dir.join("gray16.png");
        write(&path16, 5, 3, img16.intensities()).expect("saved");
        assert_eq!(Image::load(&path16).expect("loaded"), img16);
    }

    #[test]
    fn read_missing_file_is_a_load_error() {
        let path = std::env::temp_dir().join("dic_does_not_exist.png");
        assert!(matches!(read(&path), Err(Error::Load { .. })));
    }

    #[test]
    fn write_checks_buffer_length() {
        let path = std::env::temp_dir().join("dic_short_buffer.png");
        assert!(matches!(
            write(&path, 2, 2, &[0.0; 3]),
            Err(Error::SizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }
}
