// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render module — turn whole pages into pixels for OCR.
//
// The `render` feature enables a PDFium backend; without it, text+OCR keeps
// the native text of every page.

#[cfg(feature = "render")]
pub mod pdfium;

use std::path::Path;

use image::DynamicImage;
use pdfwerk_core::error::Result;

#[cfg(feature = "render")]
pub use pdfium::PdfiumRasterizer;

/// Anything that can rasterise a page of a PDF on disk.
pub trait PageRasterizer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Render page `page_number` (1-based) of `source` at `scale` times its
    /// size in points.
    fn rasterize(&self, source: &Path, page_number: u32, scale: f32) -> Result<DynamicImage>;
}

/// The PDFium rasterizer if it is compiled in and the library loads.
pub fn default_rasterizer() -> Option<Box<dyn PageRasterizer>> {
    #[cfg(feature = "render")]
    match PdfiumRasterizer::new() {
        Ok(rasterizer) => return Some(Box::new(rasterizer)),
        Err(err) => tracing::warn!(%err, "PDFium unavailable, pages will not be rasterised"),
    }
    None
}
