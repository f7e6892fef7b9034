// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR module — the recognizer seam, pre-OCR enhancement, the quick probe,
// and the concrete engines.
//
// # Feature Gates
//
// - `ocr`: the pure-Rust `ocrs` engine (needs `.rten` models on disk).
// - `tesseract`: libtesseract via the `tesseract` crate; the only backend
//   that reports per-word confidences.
//
// With neither feature enabled the pipeline still runs; OCR steps are skipped
// with a warning.

pub mod enhance;
pub mod probe;

#[cfg(feature = "ocr")]
pub mod ocrs_engine;

#[cfg(feature = "tesseract")]
pub mod tesseract_engine;

use image::DynamicImage;
use pdfwerk_core::config::ProcessorConfig;
use pdfwerk_core::error::Result;
use pdfwerk_core::types::OcrResult;
#[cfg(any(feature = "ocr", feature = "tesseract"))]
use tracing::warn;

pub use enhance::OcrEnhancer;
pub use probe::{ProbeVerdict, QuickOcrProbe};

#[cfg(feature = "ocr")]
pub use ocrs_engine::OcrsRecognizer;

#[cfg(feature = "tesseract")]
pub use tesseract_engine::TesseractRecognizer;

/// How the engine should segment the image before recognising it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLayout {
    /// Treat the whole image as one uniform block of text (embedded images,
    /// probe passes).
    SingleBlock,
    /// Let the engine detect columns and blocks (rendered pages).
    Auto,
}

/// One recognised word with its engine confidence (0-100; negative when the
/// engine has no opinion).
#[derive(Debug, Clone, PartialEq)]
pub struct OcrToken {
    pub text: String,
    pub confidence: f32,
}

/// Anything that can turn pixels into text.
///
/// Implementations are moved into the worker thread, hence `Send + Sync`.
/// Calls are blocking and not interruptible.
pub trait TextRecognizer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Plain text, lines separated by `\n`.
    fn recognize_text(&self, image: &DynamicImage, layout: PageLayout) -> Result<String>;

    /// Word-level tokens with confidences.
    ///
    /// Backends that cannot score words return an error; callers fall back
    /// to [`TextRecognizer::recognize_text`].
    fn recognize_tokens(&self, image: &DynamicImage, layout: PageLayout) -> Result<Vec<OcrToken>>;

    /// Full pass: `None` when the engine found no text at all.
    ///
    /// The default reports a confidence of -1 (unscored); backends that
    /// score their output override it.
    fn recognize(&self, image: &DynamicImage, layout: PageLayout) -> Result<Option<OcrResult>> {
        let text = self.recognize_text(image, layout)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(OcrResult {
            text,
            confidence: -1.0,
        }))
    }
}

/// Names of the OCR backends compiled into this build.
pub fn compiled_backends() -> Vec<&'static str> {
    let mut backends = Vec::new();
    if cfg!(feature = "tesseract") {
        backends.push("tesseract");
    }
    if cfg!(feature = "ocr") {
        backends.push("ocrs");
    }
    backends
}

/// Construct the best available recognizer: Tesseract first (it scores
/// words), then ocrs. `None` when no backend is compiled in or none could
/// be initialised.
pub fn default_recognizer(config: &ProcessorConfig) -> Option<Box<dyn TextRecognizer>> {
    #[cfg(feature = "tesseract")]
    match TesseractRecognizer::new(&config.ocr_language) {
        Ok(engine) => return Some(Box::new(engine)),
        Err(err) => warn!(%err, "Tesseract unavailable"),
    }

    #[cfg(feature = "ocr")]
    {
        let engine = match &config.ocr_model_dir {
            Some(dir) => OcrsRecognizer::from_model_dir(dir),
            None => OcrsRecognizer::with_defaults(),
        };
        match engine {
            Ok(engine) => return Some(Box::new(engine)),
            Err(err) => warn!(%err, "ocrs unavailable"),
        }
    }

    let _ = config;
    None
}
