// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pdfwerk.

use thiserror::Error;

/// Top-level error type for all pdfwerk operations.
///
/// Only the variants that abort a whole operation ever reach the caller.
/// Per-page and per-image failures are logged through the progress sink and
/// processing continues.
#[derive(Debug, Error)]
pub enum PdfwerkError {
    // -- Fatal setup errors --
    #[error("cannot read input: {0}")]
    Input(String),

    #[error("cannot write output: {0}")]
    Output(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    #[error("page rendering failed: {0}")]
    RenderError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdfwerkError>;
