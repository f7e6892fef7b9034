// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect existing PDF documents, extract native text,
// and enumerate embedded images using the `lopdf` crate.

use std::path::Path;

use lopdf::{Document, ObjectId};
use pdfwerk_core::error::{PdfwerkError, Result};
use tracing::{debug, info, instrument};

use crate::image::raster::Raster;
use crate::pdf::images::{self, ImageDecodeError, ImageRef};

/// Read-only handle on a loaded PDF.
///
/// Wraps `lopdf::Document`. The document is released when the reader is
/// dropped, so an operation that owns its reader frees it on every exit path.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            PdfwerkError::Input(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            PdfwerkError::Input(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }

    /// Object id of a page (1-indexed).
    pub fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        pages.get(&page_number).copied().ok_or_else(|| {
            PdfwerkError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })
    }

    // -- Extraction -----------------------------------------------------------

    /// Native text of a single page (1-indexed).
    ///
    /// Pages without a text layer yield an empty string.
    #[instrument(skip(self))]
    pub fn page_text(&self, page_number: u32) -> Result<String> {
        self.page_id(page_number)?;
        let text = self.document.extract_text(&[page_number]).map_err(|err| {
            PdfwerkError::PdfError(format!(
                "text extraction failed on page {}: {}",
                page_number, err
            ))
        })?;
        debug!(page_number, chars = text.len(), "Native text extracted");
        Ok(text)
    }

    /// Image XObjects drawn by a page (1-indexed), in resource order.
    ///
    /// Images nested inside form XObjects are included; an image referenced
    /// twice is listed once.
    #[instrument(skip(self))]
    pub fn page_images(&self, page_number: u32) -> Result<Vec<ImageRef>> {
        let page_id = self.page_id(page_number)?;
        let found = images::list_page_images(&self.document, page_id)?;
        debug!(page_number, images = found.len(), "Page images listed");
        Ok(found)
    }

    /// Decode one image found by [`PdfReader::page_images`] into pixels.
    pub fn decode_image(&self, image: &ImageRef) -> std::result::Result<Raster, ImageDecodeError> {
        images::decode_image(&self.document, image.object_id)
    }
}
