// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::Result;

/// Tunables for the image pipeline and the OCR backends.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub quality: QualityConfig,
    pub probe: ProbeConfig,
    pub enhance: EnhanceConfig,
    /// Pages whose native text is shorter than this (trimmed) are OCR'd.
    pub min_native_text_chars: usize,
    /// Linear scale used when rasterising a page for OCR.
    pub render_scale: f32,
    /// Tesseract language code.
    pub ocr_language: String,
    /// Directory holding the ocrs `.rten` models; `None` uses the ocrs cache.
    pub ocr_model_dir: Option<PathBuf>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            quality: QualityConfig::default(),
            probe: ProbeConfig::default(),
            enhance: EnhanceConfig::default(),
            min_native_text_chars: 50,
            render_scale: 2.0,
            ocr_language: "eng".to_string(),
            ocr_model_dir: None,
        }
    }
}

impl ProcessorConfig {
    /// Load a JSON config file. Missing keys fall back to defaults.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        debug!(?config, "processor config loaded");
        Ok(config)
    }
}

/// Thresholds for the image quality filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub max_aspect_ratio: f64,
    pub min_unique_intensities: usize,
    pub min_std_dev: f64,
    /// Images with more pixels than `analysis_side²` are downscaled to fit
    /// `analysis_side × analysis_side` before the statistical checks.
    pub analysis_side: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_aspect_ratio: 10.0,
            min_unique_intensities: 10,
            min_std_dev: 15.0,
            analysis_side: 500,
        }
    }
}

/// Settings for the quick OCR probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub confidence_threshold: f32,
    pub max_side: u32,
    /// The probe's text must be strictly longer than this once trimmed.
    pub min_text_chars: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 30.0,
            max_side: 800,
            min_text_chars: 3,
        }
    }
}

/// Settings for pre-OCR enhancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    pub min_side: u32,
    pub contrast: f32,
    pub sharpness: f32,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            min_side: 300,
            contrast: 1.2,
            sharpness: 1.1,
        }
    }
}
