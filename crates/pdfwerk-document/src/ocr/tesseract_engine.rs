// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract backend via the `tesseract` crate (needs libtesseract and the
// language's traineddata at runtime).

use image::{DynamicImage, ImageFormat};
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::OcrResult;
use tesseract::{PageSegMode, Tesseract};
use tracing::{debug, instrument};

use super::{OcrToken, PageLayout, TextRecognizer};

/// TSV row level for a single word.
const TSV_WORD_LEVEL: &str = "5";

/// Recognizer that starts a fresh Tesseract instance per call.
///
/// The handle is not shareable between threads, so only the language is
/// kept here.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    language: String,
}

impl TesseractRecognizer {
    /// Check once that Tesseract initialises with `language`.
    #[instrument]
    pub fn new(language: &str) -> Result<Self> {
        Tesseract::new(None, Some(language)).map_err(|err| {
            PdfwerkError::OcrError(format!(
                "failed to initialise Tesseract with language '{}': {}",
                language, err
            ))
        })?;
        Ok(Self {
            language: language.to_string(),
        })
    }

    /// A Tesseract handle loaded with `image` and set to `layout`.
    fn prepared(&self, image: &DynamicImage, layout: PageLayout) -> Result<Tesseract> {
        let mut png = std::io::Cursor::new(Vec::new());
        image.write_to(&mut png, ImageFormat::Png).map_err(|err| {
            PdfwerkError::OcrError(format!("failed to encode image for Tesseract: {}", err))
        })?;

        let mut tess = Tesseract::new(None, Some(&self.language))
            .map_err(|err| PdfwerkError::OcrError(format!("Tesseract init failed: {}", err)))?
            .set_image_from_mem(png.get_ref())
            .map_err(|err| PdfwerkError::OcrError(format!("Tesseract rejected image: {}", err)))?;

        tess.set_page_seg_mode(match layout {
            PageLayout::SingleBlock => PageSegMode::PsmSingleBlock,
            PageLayout::Auto => PageSegMode::PsmAuto,
        });
        Ok(tess)
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height(), ?layout))]
    fn recognize_text(&self, image: &DynamicImage, layout: PageLayout) -> Result<String> {
        let mut tess = self.prepared(image, layout)?;
        let text = tess
            .get_text()
            .map_err(|err| PdfwerkError::OcrError(format!("Tesseract recognition failed: {}", err)))?;
        debug!(char_count = text.len(), "Tesseract recognition complete");
        Ok(text)
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height(), ?layout))]
    fn recognize_tokens(&self, image: &DynamicImage, layout: PageLayout) -> Result<Vec<OcrToken>> {
        let mut tess = self.prepared(image, layout)?;
        let tsv = tess
            .get_tsv_text(0)
            .map_err(|err| PdfwerkError::OcrError(format!("Tesseract TSV output failed: {}", err)))?;
        let tokens = parse_tsv_words(&tsv);
        debug!(tokens = tokens.len(), "Tesseract word scores read");
        Ok(tokens)
    }

    /// Text and mean word confidence from a single recognition pass.
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), ?layout))]
    fn recognize(&self, image: &DynamicImage, layout: PageLayout) -> Result<Option<OcrResult>> {
        let mut tess = self.prepared(image, layout)?;
        let text = tess
            .get_text()
            .map_err(|err| PdfwerkError::OcrError(format!("Tesseract recognition failed: {}", err)))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let confidence = tess.mean_text_conf() as f32;
        debug!(char_count = text.len(), confidence, "Tesseract recognition complete");
        Ok(Some(OcrResult { text, confidence }))
    }
}

/// Word rows from Tesseract's TSV output.
///
/// Columns: level, page, block, par, line, word, left, top, width, height,
/// conf, text. Rows that are not words or do not parse are skipped.
pub fn parse_tsv_words(tsv: &str) -> Vec<OcrToken> {
    tsv.lines()
        .filter_map(|line| {
            let columns: Vec<&str> = line.splitn(12, '\t').collect();
            if columns.len() < 11 || columns[0] != TSV_WORD_LEVEL {
                return None;
            }
            let confidence = columns[10].trim().parse::<f32>().ok()?;
            Some(OcrToken {
                text: columns.get(11).map(|t| t.trim().to_string()).unwrap_or_default(),
                confidence,
            })
        })
        .collect()
}
