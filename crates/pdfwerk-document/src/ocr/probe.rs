// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quick OCR probe — a cheap, downscaled single-block pass that decides
// whether an image is worth a full OCR run.

use image::DynamicImage;
use pdfwerk_core::config::ProbeConfig;
use tracing::{debug, instrument};

use super::{OcrToken, PageLayout, TextRecognizer};
use crate::image::processor::ImageProcessor;

/// Result of a probe; `reason` is for the log only.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeVerdict {
    pub has_text: bool,
    pub reason: String,
}

impl ProbeVerdict {
    fn new(has_text: bool, reason: impl Into<String>) -> Self {
        Self {
            has_text,
            reason: reason.into(),
        }
    }
}

/// Probe runner; borrows the recognizer for its lifetime.
pub struct QuickOcrProbe<'a> {
    recognizer: &'a dyn TextRecognizer,
    config: ProbeConfig,
}

impl<'a> QuickOcrProbe<'a> {
    pub fn new(recognizer: &'a dyn TextRecognizer, config: ProbeConfig) -> Self {
        Self { recognizer, config }
    }

    /// Does `image` likely contain text?
    ///
    /// Scored tokens are tried first. If the engine cannot produce them, a
    /// plain text pass decides on length alone. Errors from both passes
    /// reject the image.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn probe(&self, image: &DynamicImage) -> ProbeVerdict {
        let small = ImageProcessor::from_dynamic(image.clone())
            .fit_within(self.config.max_side)
            .into_dynamic();

        let verdict = match self.recognizer.recognize_tokens(&small, PageLayout::SingleBlock) {
            Ok(tokens) => assess_tokens(&tokens, &self.config),
            Err(err) => {
                debug!(%err, "Scored probe unavailable, falling back to plain text");
                match self.recognizer.recognize_text(&small, PageLayout::SingleBlock) {
                    Ok(text) if text.trim().chars().count() > self.config.min_text_chars => {
                        ProbeVerdict::new(true, "Text detected (fallback method)")
                    }
                    Ok(_) => ProbeVerdict::new(false, "No meaningful text detected"),
                    Err(err) => ProbeVerdict::new(false, format!("OCR test failed: {err}")),
                }
            }
        };
        debug!(has_text = verdict.has_text, reason = %verdict.reason, "Probe finished");
        verdict
    }
}

/// Decide from scored tokens.
///
/// Tokens at or below zero confidence are noise. The mean of the rest must
/// reach the threshold, and the words that individually beat the threshold
/// must add up to more than `min_text_chars` characters.
pub fn assess_tokens(tokens: &[OcrToken], config: &ProbeConfig) -> ProbeVerdict {
    let scored: Vec<&OcrToken> = tokens.iter().filter(|t| t.confidence > 0.0).collect();
    if scored.is_empty() {
        return ProbeVerdict::new(false, "No text detected");
    }

    let mean = scored.iter().map(|t| t.confidence).sum::<f32>() / scored.len() as f32;
    let confident = scored
        .iter()
        .filter(|t| t.confidence > config.confidence_threshold)
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    if mean >= config.confidence_threshold
        && confident.trim().chars().count() > config.min_text_chars
    {
        ProbeVerdict::new(true, format!("Text detected (confidence: {mean:.1}%)"))
    } else {
        ProbeVerdict::new(false, format!("Low confidence text ({mean:.1}%)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use pdfwerk_core::error::{PdfwerkError, Result};
    use std::sync::Mutex;

    fn token(text: &str, confidence: f32) -> OcrToken {
        OcrToken {
            text: text.to_string(),
            confidence,
        }
    }

    /// Recognizer that returns canned answers and records the probe size.
    struct Scripted {
        tokens: Option<Vec<OcrToken>>,
        text: Option<String>,
        seen: Mutex<Option<(u32, u32)>>,
    }

    impl TextRecognizer for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn recognize_text(&self, _image: &DynamicImage, _layout: PageLayout) -> Result<String> {
            self.text
                .clone()
                .ok_or_else(|| PdfwerkError::OcrError("no text".into()))
        }

        fn recognize_tokens(
            &self,
            image: &DynamicImage,
            layout: PageLayout,
        ) -> Result<Vec<OcrToken>> {
            assert_eq!(layout, PageLayout::SingleBlock);
            *self.seen.lock().expect("lock") = Some((image.width(), image.height()));
            self.tokens
                .clone()
                .ok_or_else(|| PdfwerkError::OcrError("no scores".into()))
        }
    }

    fn blank(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(w, h, Luma([255])))
    }

    #[test]
    fn blank_page_has_no_text() {
        let engine = Scripted {
            tokens: Some(vec![token("", -1.0)]),
            text: None,
            seen: Mutex::new(None),
        };
        let verdict = QuickOcrProbe::new(&engine, ProbeConfig::default()).probe(&blank(300, 300));
        assert!(!verdict.has_text);
        assert_eq!(verdict.reason, "No text detected");
    }

    #[test]
    fn probe_downscales_large_images() {
        let engine = Scripted {
            tokens: Some(vec![token("Invoice", 91.0), token("total", 88.0)]),
            text: None,
            seen: Mutex::new(None),
        };
        let verdict = QuickOcrProbe::new(&engine, ProbeConfig::default()).probe(&blank(1600, 1200));
        assert!(verdict.has_text);
        assert_eq!(*engine.seen.lock().expect("lock"), Some((800, 600)));
    }

    #[test]
    fn low_mean_confidence_rejects() {
        let tokens = [token("xx", 10.0), token("yy", 20.0), token("long-ish", 45.0)];
        let verdict = assess_tokens(&tokens, &ProbeConfig::default());
        assert!(!verdict.has_text);
        assert_eq!(verdict.reason, "Low confidence text (25.0%)");
    }

    #[test]
    fn short_confident_text_rejects() {
        let tokens = [token("ab", 95.0)];
        assert!(!assess_tokens(&tokens, &ProbeConfig::default()).has_text);
    }

    #[test]
    fn mean_on_the_threshold_is_enough() {
        // Mean lands exactly on 30; only "text" beats the threshold on its own.
        let tokens = [token("word", 20.0), token("text", 40.0)];
        let verdict = assess_tokens(&tokens, &ProbeConfig::default());
        assert!(verdict.has_text, "{verdict:?}");
    }

    #[test]
    fn only_confident_words_count_towards_length() {
        let tokens = [token("lengthy", 25.0), token("ok", 50.0)];
        assert!(!assess_tokens(&tokens, &ProbeConfig::default()).has_text);
    }

    #[test]
    fn fallback_uses_plain_text_length() {
        let engine = Scripted {
            tokens: None,
            text: Some("  Hello  ".into()),
            seen: Mutex::new(None),
        };
        let verdict = QuickOcrProbe::new(&engine, ProbeConfig::default()).probe(&blank(200, 200));
        assert!(verdict.has_text);
        assert_eq!(verdict.reason, "Text detected (fallback method)");
    }

    #[test]
    fn fallback_failure_rejects_with_error() {
        let engine = Scripted {
            tokens: None,
            text: None,
            seen: Mutex::new(None),
        };
        let verdict = QuickOcrProbe::new(&engine, ProbeConfig::default()).probe(&blank(200, 200));
        assert!(!verdict.has_text);
        assert!(verdict.reason.starts_with("OCR test failed"));
    }
}
