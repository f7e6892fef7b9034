// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text extraction — native text per page, optionally replaced by OCR of the
// rendered page when the native layer is (almost) empty.

use pdfwerk_core::error::Result;
use pdfwerk_core::progress::Severity;
use pdfwerk_core::types::{OperationOutcome, OperationSummary};
use tracing::{debug, instrument};

use super::{OperationContext, page_progress};
use crate::ocr::PageLayout;
use crate::pdf::reader::PdfReader;

/// One page's block in a text output.
pub fn page_block(page_number: u32, text: &str) -> String {
    format!("--- Page {page_number} ---\n{text}\n")
}

/// Blocks joined the way every text output file is laid out.
pub fn join_blocks(blocks: &[String]) -> String {
    blocks.join("\n")
}

#[instrument(skip_all)]
pub(crate) fn simple_text(ctx: &OperationContext<'_>) -> Result<OperationOutcome> {
    let mut summary = OperationSummary::default();
    if ctx.cancelled() {
        return Ok(OperationOutcome::Cancelled(summary));
    }
    ctx.status("Extracting text...", 10.0);
    ctx.log("Starting simple text extraction...", Severity::Info);

    let reader = PdfReader::open(&ctx.params.input_path)?;
    let total = reader.page_count();
    let mut blocks = Vec::with_capacity(total);

    for index in 0..total {
        if ctx.cancelled() {
            return Ok(OperationOutcome::Cancelled(summary));
        }
        let page_number = index as u32 + 1;
        ctx.status(
            &format!("Page {}/{}...", page_number, total),
            page_progress(index, total),
        );

        let text = match reader.page_text(page_number) {
            Ok(text) => text,
            Err(err) => {
                ctx.warn(&format!("No text from page {page_number}: {err}"));
                String::new()
            }
        };
        blocks.push(page_block(page_number, &text));
        summary.pages_visited += 1;
        ctx.log(&format!("Page {page_number} extracted"), Severity::Info);
    }

    let path = ctx.params.output_path("_simple_text.txt");
    ctx.write_text(&path, &join_blocks(&blocks))?;
    summary.record_output(&path);
    ctx.log(&format!("Saved: {}", path.display()), Severity::Success);
    Ok(OperationOutcome::Completed(summary))
}

#[instrument(skip_all, fields(ocr = ctx.params.ocr_enabled))]
pub(crate) fn text_with_ocr(ctx: &OperationContext<'_>) -> Result<OperationOutcome> {
    let mut summary = OperationSummary::default();
    if ctx.cancelled() {
        return Ok(OperationOutcome::Cancelled(summary));
    }
    ctx.status("Converting to text with OCR...", 10.0);
    ctx.log("Starting text extraction with OCR fallback...", Severity::Info);

    let reader = PdfReader::open(&ctx.params.input_path)?;
    let total = reader.page_count();
    let recognizer = ctx.recognizer();
    let rasterizer = ctx.engines.rasterizer.as_deref();
    if recognizer.is_some() && rasterizer.is_none() {
        ctx.warn("No page renderer available; pages without native text stay empty");
    }

    let mut blocks = Vec::with_capacity(total);
    for index in 0..total {
        if ctx.cancelled() {
            return Ok(OperationOutcome::Cancelled(summary));
        }
        let page_number = index as u32 + 1;
        ctx.status(
            &format!("Processing page {}/{}...", page_number, total),
            page_progress(index, total),
        );

        let mut text = match reader.page_text(page_number) {
            Ok(text) => text,
            Err(err) => {
                ctx.warn(&format!("No native text from page {page_number}: {err}"));
                String::new()
            }
        };

        let native_len = text.trim().chars().count();
        if native_len < ctx.config.min_native_text_chars {
            if let (Some(recognizer), Some(rasterizer)) = (recognizer, rasterizer) {
                let ocr = rasterizer
                    .rasterize(&ctx.params.input_path, page_number, ctx.config.render_scale)
                    .and_then(|image| recognizer.recognize(&image, PageLayout::Auto));
                match ocr {
                    Ok(Some(result)) if result.trimmed_len() > native_len => {
                        debug!(
                            page_number,
                            native_len,
                            confidence = result.confidence,
                            "OCR text replaces native text"
                        );
                        text = result.text;
                        summary.ocr_pages += 1;
                        ctx.log(&format!("OCR applied to page {page_number}"), Severity::Info);
                    }
                    Ok(_) => debug!(page_number, "OCR text not longer than native text"),
                    Err(err) => ctx.warn(&format!("OCR failed for page {page_number}: {err}")),
                }
            }
        }

        blocks.push(page_block(page_number, &text));
        summary.pages_visited += 1;
        ctx.log(&format!("Page {page_number} processed"), Severity::Info);
    }

    let path = ctx.params.output_path("_text_ocr.txt");
    ctx.write_text(&path, &join_blocks(&blocks))?;
    summary.record_output(&path);
    ctx.log(&format!("Text saved: {}", path.display()), Severity::Success);
    ctx.status("Text extraction completed!", 100.0);
    Ok(OperationOutcome::Completed(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_headed_and_separated_by_blank_lines() {
        let blocks = vec![page_block(1, "Alpha"), page_block(2, "")];
        assert_eq!(
            join_blocks(&blocks),
            "--- Page 1 ---\nAlpha\n\n--- Page 2 ---\n\n"
        );
    }
}
