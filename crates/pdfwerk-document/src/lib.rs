// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfwerk-document — Document processing for pdfwerk.
//
// Provides PDF access (open, copy pages, native text, embedded images), the
// image pipeline (quality filter, enhancement), OCR backends and the quick
// probe, page rasterisation, and the five batch operations with a
// background worker to run them.

pub mod filter;
pub mod image;
pub mod ocr;
pub mod ops;
pub mod pdf;
pub mod render;
pub mod worker;

// Re-export the primary structs so callers can use `pdfwerk_document::PdfReader` etc.
pub use filter::ImageQualityFilter;
pub use crate::image::processor::ImageProcessor;
pub use crate::image::raster::Raster;
pub use ocr::{OcrEnhancer, OcrToken, PageLayout, QuickOcrProbe, TextRecognizer};
pub use ops::{Engines, run};
pub use pdf::assembler::PageAssembler;
pub use pdf::reader::PdfReader;
pub use render::PageRasterizer;
pub use worker::{OperationHandle, spawn};

#[cfg(feature = "ocr")]
pub use ocr::OcrsRecognizer;

#[cfg(feature = "tesseract")]
pub use ocr::TesseractRecognizer;

#[cfg(feature = "render")]
pub use render::PdfiumRasterizer;
