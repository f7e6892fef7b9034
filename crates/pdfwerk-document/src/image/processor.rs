// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — grayscale, Lanczos resizing, mean-pivot contrast and
// smoothing-blend sharpness. Operates on in-memory images using the `image`
// and `imageproc` crates.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use imageproc::filter::filter3x3;
use pdfwerk_core::error::{PdfwerkError, Result};
use tracing::{debug, instrument};

/// 3x3 smoothing kernel used as the "blurred" end of the sharpness blend.
const SMOOTH_KERNEL: [f32; 9] = [
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    5.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
];

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let prepared = ImageProcessor::from_dynamic(image)
///     .grayscale()
///     .upscale_to_min(300)
///     .adjust_contrast(1.2)
///     .adjust_sharpness(1.1)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Convert the image to 8-bit grayscale (luma).
    pub fn grayscale(self) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        }
    }

    /// Shrink the image to fit within `max_side` x `max_side`, preserving
    /// aspect ratio. Images that already fit are left alone.
    pub fn fit_within(self, max_side: u32) -> Self {
        if self.image.width() <= max_side && self.image.height() <= max_side {
            return self;
        }
        let resized = self
            .image
            .resize(max_side, max_side, FilterType::Lanczos3);
        debug!(
            new_w = resized.width(),
            new_h = resized.height(),
            "Downscaled"
        );
        Self { image: resized }
    }

    /// Upscale so neither side is below `min_side`, keeping the aspect ratio.
    ///
    /// The scale factor is `max(min/w, min/h)`, so the short side lands on
    /// `min_side` and the long side grows proportionally.
    #[instrument(skip(self), fields(min_side))]
    pub fn upscale_to_min(self, min_side: u32) -> Self {
        let (w, h) = (self.image.width(), self.image.height());
        if w == 0 || h == 0 || (w >= min_side && h >= min_side) {
            return self;
        }
        let scale = (min_side as f64 / w as f64).max(min_side as f64 / h as f64);
        let new_w = ((w as f64 * scale) as u32).max(1);
        let new_h = ((h as f64 * scale) as u32).max(1);
        debug!(from_w = w, from_h = h, new_w, new_h, "Upscaling image");
        Self {
            image: self.image.resize_exact(new_w, new_h, FilterType::Lanczos3),
        }
    }

    /// Adjust contrast by a factor, pivoting on the mean luminance.
    ///
    /// Values > 1.0 increase contrast; 1.0 is a no-op. Grayscale images stay
    /// grayscale; anything else comes back as RGBA.
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_contrast(self, factor: f32) -> Self {
        let mean = mean_luminance(&self.image.to_luma8()).round();
        let adjust = |channel: u8| -> u8 {
            let val = mean + factor * (channel as f32 - mean);
            val.round().clamp(0.0, 255.0) as u8
        };

        let image = match self.image {
            DynamicImage::ImageLuma8(gray) => {
                let contrasted = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
                    Luma([adjust(gray.get_pixel(x, y).0[0])])
                });
                DynamicImage::ImageLuma8(contrasted)
            }
            other => {
                let rgba = other.to_rgba8();
                let contrasted = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                    let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
                    Rgba([adjust(r), adjust(g), adjust(b), a])
                });
                DynamicImage::ImageRgba8(contrasted)
            }
        };
        Self { image }
    }

    /// Adjust sharpness by a factor: blend between a 3x3 smoothed copy (0.0)
    /// and the original (1.0). Values > 1.0 extrapolate away from the blur.
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_sharpness(self, factor: f32) -> Self {
        let blend = |smooth: u8, orig: u8| -> u8 {
            let val = smooth as f32 + factor * (orig as f32 - smooth as f32);
            val.round().clamp(0.0, 255.0) as u8
        };

        let image = match self.image {
            DynamicImage::ImageLuma8(gray) => {
                let smoothed: GrayImage = filter3x3(&gray, &SMOOTH_KERNEL);
                let sharpened = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
                    Luma([blend(smoothed.get_pixel(x, y).0[0], gray.get_pixel(x, y).0[0])])
                });
                DynamicImage::ImageLuma8(sharpened)
            }
            other => {
                let rgba = other.to_rgba8();
                let smoothed: RgbaImage = filter3x3(&rgba, &SMOOTH_KERNEL);
                let sharpened = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                    let Rgba([sr, sg, sb, _]) = *smoothed.get_pixel(x, y);
                    let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
                    Rgba([blend(sr, r), blend(sg, g), blend(sb, b), a])
                });
                DynamicImage::ImageRgba8(sharpened)
            }
        };
        Self { image }
    }

    // -- Output ---------------------------------------------------------------

    /// Write the image as PNG to `path`. Failures are output errors.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|err| {
                PdfwerkError::Output(format!(
                    "failed to save image to {}: {}",
                    path.display(),
                    err
                ))
            })
    }
}

/// Mean of an 8-bit luma plane; 0 for an empty image.
pub fn mean_luminance(gray: &GrayImage) -> f32 {
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    let sum: u64 = pixels.iter().map(|&p| p as u64).sum();
    sum as f32 / pixels.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)])))
    }

    #[test]
    fn upscale_hits_minimum_on_short_side() {
        let out = ImageProcessor::from_dynamic(gray(100, 50, |_, _| 0)).upscale_to_min(300);
        assert_eq!(out.height(), 300);
        assert_eq!(out.width(), 600);
    }

    #[test]
    fn upscale_leaves_large_images_alone() {
        let out = ImageProcessor::from_dynamic(gray(400, 300, |_, _| 0)).upscale_to_min(300);
        assert_eq!((out.width(), out.height()), (400, 300));
    }

    #[test]
    fn fit_within_preserves_aspect() {
        let out = ImageProcessor::from_dynamic(gray(1000, 250, |_, _| 0)).fit_within(500);
        assert_eq!((out.width(), out.height()), (500, 125));
    }

    #[test]
    fn contrast_pivots_on_mean() {
        // Half 100, half 200: mean 150 stays put, extremes spread.
        let img = gray(2, 1, |x, _| if x == 0 { 100 } else { 200 });
        let out = ImageProcessor::from_dynamic(img)
            .adjust_contrast(1.2)
            .into_dynamic()
            .to_luma8();
        assert_eq!(out.get_pixel(0, 0).0[0], 90);
        assert_eq!(out.get_pixel(1, 0).0[0], 210);
    }

    #[test]
    fn sharpness_of_one_is_identity() {
        let img = gray(8, 8, |x, y| ((x * 31 + y * 17) % 256) as u8);
        let expected = img.to_luma8();
        let out = ImageProcessor::from_dynamic(img)
            .adjust_sharpness(1.0)
            .into_dynamic()
            .to_luma8();
        assert_eq!(out, expected);
    }

    #[test]
    fn flat_image_is_unchanged_by_sharpness() {
        let out = ImageProcessor::from_dynamic(gray(5, 5, |_, _| 77))
            .adjust_sharpness(1.1)
            .into_dynamic()
            .to_luma8();
        assert!(out.pixels().all(|p| p.0[0] == 77));
    }

    #[test]
    fn saved_png_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.png");
        ImageProcessor::from_dynamic(gray(3, 2, |_, _| 9))
            .save_png(&path)
            .expect("save");
        let back = image::open(&path).expect("reopen").to_luma8();
        assert_eq!(back.dimensions(), (3, 2));
        assert!(back.pixels().all(|p| p.0[0] == 9));
    }

    #[test]
    fn saving_into_a_missing_directory_is_an_output_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = ImageProcessor::from_dynamic(gray(3, 2, |_, _| 9))
            .save_png(dir.path().join("missing").join("out.png"));
        assert!(matches!(result, Err(PdfwerkError::Output(_))));
    }
}
