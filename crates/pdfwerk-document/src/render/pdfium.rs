// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDFium page rasterizer (dynamic linking, needs libpdfium at runtime).

use std::path::Path;

use image::DynamicImage;
use pdfium_render::prelude::*;
use pdfwerk_core::error::{PdfwerkError, Result};
use tracing::{debug, instrument};

use super::PageRasterizer;

/// Bind to libpdfium, looking next to the binary first, then system-wide.
fn create_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|err| {
            PdfwerkError::RenderError(format!("failed to load the PDFium library: {:?}", err))
        })?;
    Ok(Pdfium::new(bindings))
}

/// Rasterizer that binds PDFium per call and loads the document fresh, so
/// it holds no library handles between pages.
#[derive(Debug, Default)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    /// Fails if libpdfium cannot be found.
    pub fn new() -> Result<Self> {
        create_pdfium()?;
        Ok(Self)
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    #[instrument(skip(self), fields(source = %source.display()))]
    fn rasterize(&self, source: &Path, page_number: u32, scale: f32) -> Result<DynamicImage> {
        let pdfium = create_pdfium()?;
        let document = pdfium.load_pdf_from_file(source, None).map_err(|err| {
            PdfwerkError::RenderError(format!("failed to load {}: {:?}", source.display(), err))
        })?;

        let index = page_number
            .checked_sub(1)
            .and_then(|index| u16::try_from(index).ok())
            .ok_or_else(|| {
                PdfwerkError::RenderError(format!("page {} cannot be rendered", page_number))
            })?;
        let page = document.pages().get(index).map_err(|err| {
            PdfwerkError::RenderError(format!("page {} not found: {:?}", page_number, err))
        })?;

        let pixel_width = (page.width().value * scale).round() as i32;
        let pixel_height = (page.height().value * scale).round() as i32;
        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(pixel_width)
                    .set_target_height(pixel_height)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .map_err(|err| {
                PdfwerkError::RenderError(format!(
                    "failed to render page {}: {:?}",
                    page_number, err
                ))
            })?;

        let image = bitmap.as_image();
        debug!(
            page_number,
            width = image.width(),
            height = image.height(),
            "Page rasterised"
        );
        Ok(image)
    }
}
