// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pre-OCR enhancement for embedded images.

use image::DynamicImage;
use pdfwerk_core::config::EnhanceConfig;
use tracing::{debug, instrument};

use crate::image::processor::ImageProcessor;

/// Grayscale, upscale small images, then lift contrast and sharpness.
#[derive(Debug, Clone, Default)]
pub struct OcrEnhancer {
    config: EnhanceConfig,
}

impl OcrEnhancer {
    pub fn new(config: EnhanceConfig) -> Self {
        Self { config }
    }

    /// Produce the image handed to full OCR. Never fails: an empty image is
    /// returned unchanged.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn enhance(&self, image: &DynamicImage) -> DynamicImage {
        if image.width() == 0 || image.height() == 0 {
            return image.clone();
        }
        let enhanced = ImageProcessor::from_dynamic(image.clone())
            .grayscale()
            .upscale_to_min(self.config.min_side)
            .adjust_contrast(self.config.contrast)
            .adjust_sharpness(self.config.sharpness)
            .into_dynamic();
        debug!(
            out_w = enhanced.width(),
            out_h = enhanced.height(),
            "Image enhanced for OCR"
        );
        enhanced
    }
}
