// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image extraction — decode every embedded image, gate it through the
// quality filter and the OCR probe, save it, and OCR it.

use std::path::Path;

use image::DynamicImage;
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::progress::Severity;
use pdfwerk_core::types::{OcrResult, OperationOutcome, OperationSummary};
use tracing::{debug, instrument};

use super::text::{join_blocks, page_block};
use super::{OperationContext, page_progress};
use crate::filter::quality::ImageQualityFilter;
use crate::image::processor::ImageProcessor;
use crate::ocr::{OcrEnhancer, PageLayout, QuickOcrProbe};
use crate::pdf::images::ImageRef;
use crate::pdf::reader::PdfReader;

/// Output file name for image `image_number` on page `page_number`.
pub fn image_file_name(page_number: u32, image_number: usize) -> String {
    format!("page_{page_number}_img_{image_number}.png")
}

/// What became of one image.
enum ImageFate {
    Filtered,
    Kept { saved: bool, ocr_line: Option<String> },
}

#[instrument(skip_all, fields(
    ocr = ctx.params.ocr_enabled,
    save = ctx.params.save_images,
    smart = ctx.params.smart_filtering,
))]
pub(crate) fn extract_images(ctx: &OperationContext<'_>) -> Result<OperationOutcome> {
    let mut summary = OperationSummary::default();
    if ctx.cancelled() {
        return Ok(OperationOutcome::Cancelled(summary));
    }
    ctx.status("Extracting images and performing OCR...", 10.0);
    ctx.log("Starting image extraction and OCR...", Severity::Info);

    let reader = PdfReader::open(&ctx.params.input_path)?;
    let total = reader.page_count();

    let images_dir = ctx.params.images_dir();
    if ctx.params.save_images {
        std::fs::create_dir_all(&images_dir).map_err(|err| {
            PdfwerkError::Output(format!("cannot create {}: {}", images_dir.display(), err))
        })?;
    }

    let mut page_blocks = Vec::new();
    for index in 0..total {
        if ctx.cancelled() {
            return Ok(OperationOutcome::Cancelled(summary));
        }
        let page_number = index as u32 + 1;
        ctx.status(
            &format!("Processing page {}/{}...", page_number, total),
            page_progress(index, total),
        );
        summary.pages_visited += 1;

        let image_refs = match reader.page_images(page_number) {
            Ok(found) => found,
            Err(err) => {
                ctx.warn(&format!("Cannot list images on page {page_number}: {err}"));
                continue;
            }
        };
        ctx.log(
            &format!("Page {}: Found {} images", page_number, image_refs.len()),
            Severity::Info,
        );

        let mut page_lines = Vec::new();
        for (position, image_ref) in image_refs.iter().enumerate() {
            if ctx.cancelled() {
                return Ok(OperationOutcome::Cancelled(summary));
            }
            let image_number = position + 1;
            summary.images_processed += 1;

            match process_image(ctx, &reader, image_ref, page_number, image_number, &images_dir) {
                Ok(ImageFate::Filtered) => summary.images_filtered += 1,
                Ok(ImageFate::Kept { saved, ocr_line }) => {
                    if saved {
                        summary.images_saved += 1;
                    }
                    page_lines.extend(ocr_line);
                }
                Err(err) => ctx.warn(&format!(
                    "Error processing image {image_number} on page {page_number}: {err}"
                )),
            }
        }

        if !page_lines.is_empty() {
            page_blocks.push(page_block(page_number, &page_lines.join("\n")));
        }
    }

    if !page_blocks.is_empty() {
        let path = ctx.params.output_path("_ocr_results.txt");
        ctx.write_text(&path, &join_blocks(&page_blocks))?;
        summary.record_output(&path);
        ctx.log(&format!("OCR results saved: {}", path.display()), Severity::Success);
    }

    ctx.log(
        &format!(
            "Summary: {} images processed, {} images saved",
            summary.images_processed, summary.images_saved
        ),
        Severity::Success,
    );
    ctx.status("Image extraction and OCR completed!", 100.0);
    Ok(OperationOutcome::Completed(summary))
}

/// Decode → colour-convert → filter → probe → save → enhance + OCR.
fn process_image(
    ctx: &OperationContext<'_>,
    reader: &PdfReader,
    image_ref: &ImageRef,
    page_number: u32,
    image_number: usize,
    images_dir: &Path,
) -> Result<ImageFate> {
    let label = format!("Page {page_number}, Image {image_number}");

    let mut raster = reader.decode_image(image_ref)?;
    ctx.log(
        &format!(
            "{}: {}x{}, {} channels",
            label,
            raster.width(),
            raster.height(),
            raster.channels()
        ),
        Severity::Info,
    );
    if raster.needs_rgb_conversion() {
        ctx.log(
            &format!("Converting CMYK image {image_number} to RGB"),
            Severity::Info,
        );
        raster = raster.into_rgb();
    }
    let image = raster.to_dynamic()?;

    if !worth_processing(ctx, &image, &label) {
        return Ok(ImageFate::Filtered);
    }

    let mut saved = false;
    if ctx.params.save_images {
        let file_name = image_file_name(page_number, image_number);
        ImageProcessor::from_dynamic(image.clone()).save_png(images_dir.join(&file_name))?;
        saved = true;
        ctx.log(
            &format!("Saved: {} ({}x{})", file_name, image.width(), image.height()),
            Severity::Success,
        );
    }

    let mut ocr_line = None;
    if let Some(recognizer) = ctx.recognizer() {
        let enhanced = OcrEnhancer::new(ctx.config.enhance.clone()).enhance(&image);
        match recognizer.recognize(&enhanced, PageLayout::SingleBlock) {
            Ok(Some(result)) if result.trimmed_len() > 0 => {
                ctx.log(&ocr_summary(image_number, &result), Severity::Success);
                ocr_line = Some(format!("Image {image_number}: {}", result.text.trim()));
            }
            Ok(_) => ctx.log(
                &format!("OCR found no text in image {image_number}"),
                Severity::Info,
            ),
            Err(err) => ctx.warn(&format!("OCR failed for image {image_number}: {err}")),
        }
    }

    Ok(ImageFate::Kept { saved, ocr_line })
}

fn ocr_summary(image_number: usize, result: &OcrResult) -> String {
    let mut line = format!(
        "OCR completed for image {}: {} characters",
        image_number,
        result.trimmed_len()
    );
    if result.confidence >= 0.0 {
        line.push_str(&format!(" ({:.0}% confidence)", result.confidence));
    }
    line
}

/// Quality filter first, then the OCR probe when OCR is on.
///
/// With smart filtering off only the size rule applies and the probe is
/// skipped.
fn worth_processing(ctx: &OperationContext<'_>, image: &DynamicImage, label: &str) -> bool {
    let min_size = ctx.params.min_image_size;
    let filter = ImageQualityFilter::new(ctx.config.quality.clone());

    if !ctx.params.smart_filtering {
        let verdict = filter.evaluate_size_only(image, min_size);
        if !verdict.accepted {
            ctx.log(&format!("{label}: {}", verdict.reason), Severity::Filter);
        }
        return verdict.accepted;
    }

    let verdict = filter.evaluate(image, min_size);
    if !verdict.accepted {
        ctx.log(&format!("{label}: {}", verdict.reason), Severity::Filter);
        return false;
    }

    if let Some(recognizer) = ctx.recognizer() {
        let probe = QuickOcrProbe::new(recognizer, ctx.config.probe.clone()).probe(image);
        if !probe.has_text {
            ctx.log(&format!("{label}: {}", probe.reason), Severity::Filter);
            return false;
        }
        ctx.log(&format!("{label}: {}", probe.reason), Severity::Info);
    }

    debug!(label, "Image accepted");
    true
}
