// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Slicing — copy a page range into one new PDF, or split the whole document
// into parts under a size limit.

use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::progress::Severity;
use pdfwerk_core::types::{OperationOutcome, OperationSummary};
use tracing::{debug, info, instrument};

use super::{OperationContext, page_progress};
use crate::pdf::assembler::PageAssembler;
use crate::pdf::reader::PdfReader;

/// Clamp a 1-based inclusive `[start, end]` request to the document.
///
/// Returns a 0-based half-open range; an empty range is an error.
pub fn clamp_page_range(start: u32, end: u32, page_count: usize) -> Result<(u32, u32)> {
    let start0 = start.max(1) - 1;
    let end0 = end.min(page_count as u32);
    if start0 >= end0 {
        return Err(PdfwerkError::InvalidParameters(format!(
            "page range {}-{} selects no pages of a {}-page document",
            start, end, page_count
        )));
    }
    Ok((start0, end0))
}

#[instrument(skip_all, fields(start = ctx.params.start_page, end = ctx.params.end_page))]
pub(crate) fn slice_by_pages(ctx: &OperationContext<'_>) -> Result<OperationOutcome> {
    let mut summary = OperationSummary::default();
    if ctx.cancelled() {
        return Ok(OperationOutcome::Cancelled(summary));
    }
    ctx.status("Slicing pages...", 25.0);

    let reader = PdfReader::open(&ctx.params.input_path)?;
    let (start, end) =
        clamp_page_range(ctx.params.start_page, ctx.params.end_page, reader.page_count())?;

    let mut assembler = PageAssembler::new();
    for index in start..end {
        if ctx.cancelled() {
            return Ok(OperationOutcome::Cancelled(summary));
        }
        let percent = 25.0 + (index - start) as f32 / (end - start) as f32 * 50.0;
        ctx.status(&format!("Page {}...", index + 1), percent);

        assembler.push_page(&reader, index + 1)?;
        summary.pages_visited += 1;
        ctx.log(&format!("Added page {}", index + 1), Severity::Info);
    }

    let path = ctx
        .params
        .output_path(&format!("_pages_{}-{}.pdf", start + 1, end));
    assembler.save(&path)?;
    summary.record_output(&path);
    ctx.log(&format!("Saved: {}", path.display()), Severity::Success);
    ctx.status("Pages sliced successfully!", 100.0);
    Ok(OperationOutcome::Completed(summary))
}

/// Grow a part page by page, measuring its real serialised size after each
/// page, and flush it once it reaches the limit or the document ends.
#[instrument(skip_all, fields(max_mb = ctx.params.max_part_size_mb))]
pub(crate) fn slice_by_size(ctx: &OperationContext<'_>) -> Result<OperationOutcome> {
    let mut summary = OperationSummary::default();
    if ctx.cancelled() {
        return Ok(OperationOutcome::Cancelled(summary));
    }
    ctx.status("Slicing by size...", 10.0);
    ctx.log("Starting size-based slicing...", Severity::Info);

    let reader = PdfReader::open(&ctx.params.input_path)?;
    let total = reader.page_count();
    let max_bytes = ctx.params.max_part_size_bytes();

    let mut assembler = PageAssembler::new();
    let mut part_number = 1;

    for index in 0..total {
        if ctx.cancelled() {
            return Ok(OperationOutcome::Cancelled(summary));
        }
        let page_number = index as u32 + 1;
        ctx.status(
            &format!("Processing page {}/{}...", page_number, total),
            page_progress(index, total),
        );

        assembler.push_page(&reader, page_number)?;
        summary.pages_visited += 1;

        let current_size = assembler.to_bytes()?.len() as u64;
        debug!(page_number, current_size, "Part size measured");

        if current_size >= max_bytes || index + 1 == total {
            let path = ctx
                .params
                .output_path(&format!("_part_{}.pdf", part_number));
            assembler.save(&path)?;
            summary.record_output(&path);
            info!(part_number, pages = assembler.page_count(), "Part written");
            ctx.log(
                &format!(
                    "Saved part {}: {} pages, {:.1} MB",
                    part_number,
                    assembler.page_count(),
                    current_size as f64 / 1024.0 / 1024.0
                ),
                Severity::Success,
            );
            assembler = PageAssembler::new();
            part_number += 1;
        }
    }

    Ok(OperationOutcome::Completed(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_clamped_to_document() {
        assert_eq!(clamp_page_range(0, 99, 5).expect("range"), (0, 5));
        assert_eq!(clamp_page_range(2, 3, 5).expect("range"), (1, 3));
    }

    #[test]
    fn empty_range_is_invalid() {
        assert!(matches!(
            clamp_page_range(4, 2, 5),
            Err(PdfwerkError::InvalidParameters(_))
        ));
        assert!(matches!(
            clamp_page_range(7, 9, 5),
            Err(PdfwerkError::InvalidParameters(_))
        ));
    }

    #[test]
    fn single_page_range_is_allowed() {
        assert_eq!(clamp_page_range(3, 3, 5).expect("range"), (2, 3));
    }
}
