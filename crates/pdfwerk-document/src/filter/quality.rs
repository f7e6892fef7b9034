// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image quality filter — cheap heuristics that weed out decorative lines,
// icons, solid fills, and flat gradients before any OCR runs.

use image::{DynamicImage, GrayImage};
use pdfwerk_core::config::QualityConfig;
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::QualityVerdict;
use tracing::{debug, trace};

use crate::image::processor::{ImageProcessor, mean_luminance};

/// Stateless evaluator; holds only its thresholds.
#[derive(Debug, Clone, Default)]
pub struct ImageQualityFilter {
    config: QualityConfig,
}

impl ImageQualityFilter {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Run every rule in order; the first failure wins.
    ///
    /// Dimension rules are structural and reject outright. The statistical
    /// rules (complexity, variance) accept the image if they cannot be
    /// computed.
    pub fn evaluate(&self, image: &DynamicImage, min_size: u32) -> QualityVerdict {
        let (w, h) = (image.width(), image.height());

        if w < min_size || h < min_size {
            return QualityVerdict::reject(format!("Too small ({w}x{h})"));
        }
        if w == 0 || h == 0 {
            return QualityVerdict::reject(format!("Error in quality check: empty image ({w}x{h})"));
        }

        let aspect = w.max(h) as f64 / w.min(h) as f64;
        if aspect > self.config.max_aspect_ratio {
            return QualityVerdict::reject(format!("Extreme aspect ratio ({aspect:.1}:1)"));
        }

        let area = w as u64 * h as u64;
        if area < min_size as u64 * min_size as u64 {
            return QualityVerdict::reject(format!("Insufficient area ({area} pixels)"));
        }

        let gray = self.analysis_plane(image);

        match self.has_sufficient_complexity(&gray) {
            Ok(false) => return QualityVerdict::reject("Low complexity (solid/gradient)"),
            Ok(true) => {}
            Err(err) => debug!(%err, "Complexity check failed, treating as passed"),
        }

        match self.has_sufficient_variance(&gray) {
            Ok(false) => return QualityVerdict::reject("Low variance (uniform content)"),
            Ok(true) => {}
            Err(err) => debug!(%err, "Variance check failed, treating as passed"),
        }

        QualityVerdict::accept("Passed all checks")
    }

    /// Size rule only, used when smart filtering is switched off.
    pub fn evaluate_size_only(&self, image: &DynamicImage, min_size: u32) -> QualityVerdict {
        let (w, h) = (image.width(), image.height());
        if w < min_size || h < min_size {
            QualityVerdict::reject(format!("Too small ({w}x{h})"))
        } else {
            QualityVerdict::accept("Size check only")
        }
    }

    /// Grayscale copy, downscaled to fit the analysis box when the image
    /// has more pixels than that box holds.
    fn analysis_plane(&self, image: &DynamicImage) -> GrayImage {
        let side = self.config.analysis_side;
        let gray = ImageProcessor::from_dynamic(image.clone()).grayscale();
        let area = gray.width() as u64 * gray.height() as u64;
        let gray = if area > side as u64 * side as u64 {
            gray.fit_within(side)
        } else {
            gray
        };
        gray.into_dynamic().to_luma8()
    }

    /// Enough distinct intensities to be more than a fill or a soft gradient.
    pub fn has_sufficient_complexity(&self, gray: &GrayImage) -> Result<bool> {
        if gray.as_raw().is_empty() {
            return Err(PdfwerkError::ImageError(
                "no pixels to analyse for complexity".into(),
            ));
        }
        let mut seen = [false; 256];
        for &p in gray.as_raw() {
            seen[p as usize] = true;
        }
        let unique = seen.iter().filter(|&&s| s).count();
        trace!(unique, "Distinct intensities");
        Ok(unique >= self.config.min_unique_intensities)
    }

    /// Population standard deviation of intensities at or above the minimum.
    pub fn has_sufficient_variance(&self, gray: &GrayImage) -> Result<bool> {
        let pixels = gray.as_raw();
        if pixels.is_empty() {
            return Err(PdfwerkError::ImageError(
                "no pixels to analyse for variance".into(),
            ));
        }
        let mean = mean_luminance(gray) as f64;
        let variance = pixels
            .iter()
            .map(|&p| {
                let d = p as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / pixels.len() as f64;
        let std_dev = variance.sqrt();
        trace!(std_dev, "Intensity spread");
        Ok(std_dev >= self.config.min_std_dev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    fn filter() -> ImageQualityFilter {
        ImageQualityFilter::default()
    }

    fn solid(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([255, 0, 0])))
    }

    fn textured(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(w, h, |x, y| {
            Luma([((x * 37 + y * 91) % 256) as u8])
        }))
    }

    #[test]
    fn small_images_are_rejected_for_size() {
        let verdict = filter().evaluate(&solid(50, 50), 150);
        assert!(!verdict.accepted);
        assert!(verdict.reason.starts_with("Too small"));
    }

    #[test]
    fn thin_strips_are_rejected_for_aspect_ratio() {
        let verdict = filter().evaluate(&textured(2000, 150), 150);
        assert!(!verdict.accepted);
        assert!(verdict.reason.starts_with("Extreme aspect ratio"));
    }

    #[test]
    fn solid_fill_is_rejected_as_low_complexity() {
        let verdict = filter().evaluate(&solid(400, 300), 150);
        assert!(!verdict.accepted);
        assert_eq!(verdict.reason, "Low complexity (solid/gradient)");
    }

    #[test]
    fn every_solid_fill_at_or_above_min_size_is_rejected() {
        let colours = [[0, 0, 0], [255, 255, 255], [255, 0, 0], [128, 128, 128], [12, 80, 200]];
        // 1200x900 and 1600x1600 go through the analysis downscale.
        let sizes = [(150, 150), (400, 300), (1200, 900), (1600, 1600)];
        let f = filter();
        for colour in colours {
            for (w, h) in sizes {
                let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(colour)));
                let verdict = f.evaluate(&rgb, 150);
                assert!(!verdict.accepted, "{colour:?} {w}x{h} accepted");
                assert_eq!(verdict.reason, "Low complexity (solid/gradient)");

                let luma =
                    DynamicImage::ImageLuma8(GrayImage::from_pixel(w, h, Luma([colour[0]])));
                assert!(!f.evaluate(&luma, 150).accepted, "gray {} {w}x{h}", colour[0]);
            }
        }
    }

    #[test]
    fn two_close_shades_fail_variance() {
        // Twelve adjacent intensities pass complexity but barely vary.
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(200, 200, |x, _| {
            Luma([120 + (x % 12) as u8])
        }));
        let verdict = filter().evaluate(&img, 150);
        assert!(!verdict.accepted);
        assert_eq!(verdict.reason, "Low variance (uniform content)");
    }

    #[test]
    fn textured_image_passes() {
        let verdict = filter().evaluate(&textured(400, 300), 150);
        assert!(verdict.accepted, "{}", verdict.reason);
    }

    #[test]
    fn large_images_are_analysed_downscaled() {
        // Coarse checkerboard plus a slow ramp survives a Lanczos downscale.
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(1200, 900, |x, y| {
            let check = if (x / 60 + y / 60) % 2 == 0 { 0 } else { 150 };
            Luma([(check + (x / 5) % 50) as u8])
        }));
        let verdict = filter().evaluate(&img, 150);
        assert!(verdict.accepted, "{}", verdict.reason);
    }

    #[test]
    fn size_only_mode_ignores_content() {
        let f = filter();
        assert!(f.evaluate_size_only(&solid(400, 300), 150).accepted);
        assert!(!f.evaluate_size_only(&solid(100, 300), 150).accepted);
    }

    #[test]
    fn statistical_checks_fail_open_on_empty_planes() {
        let empty = GrayImage::new(0, 0);
        assert!(filter().has_sufficient_complexity(&empty).is_err());
        assert!(filter().has_sufficient_variance(&empty).is_err());
    }
}
