// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operations — the five batch jobs and the dispatcher that frames them with
// start, completion, cancellation, and failure reporting.

pub mod images;
pub mod slice;
pub mod text;

use std::path::Path;

use pdfwerk_core::config::ProcessorConfig;
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::progress::{CancellationFlag, ProgressSink, Severity};
use pdfwerk_core::types::{OperationKind, OperationOutcome, OperationParameters};
use tracing::{error, info, instrument, warn};

use crate::ocr::{self, TextRecognizer};
use crate::render::{self, PageRasterizer};

/// OCR and rendering backends handed to an operation.
///
/// Either may be missing; operations degrade to native-only behaviour with
/// a warning.
#[derive(Default)]
pub struct Engines {
    pub recognizer: Option<Box<dyn TextRecognizer>>,
    pub rasterizer: Option<Box<dyn PageRasterizer>>,
}

impl Engines {
    /// No OCR, no rendering.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whatever this build and this machine provide.
    pub fn detect(config: &ProcessorConfig) -> Self {
        Self {
            recognizer: ocr::default_recognizer(config),
            rasterizer: render::default_rasterizer(),
        }
    }

    pub fn with_recognizer(mut self, recognizer: impl TextRecognizer + 'static) -> Self {
        self.recognizer = Some(Box::new(recognizer));
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: impl PageRasterizer + 'static) -> Self {
        self.rasterizer = Some(Box::new(rasterizer));
        self
    }
}

impl std::fmt::Debug for Engines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engines")
            .field("recognizer", &self.recognizer.as_ref().map(|r| r.name()))
            .field("rasterizer", &self.rasterizer.as_ref().map(|r| r.name()))
            .finish()
    }
}

/// Everything a running operation reads, borrowed for its duration.
pub(crate) struct OperationContext<'a> {
    pub params: &'a OperationParameters,
    pub config: &'a ProcessorConfig,
    pub engines: &'a Engines,
    pub sink: &'a dyn ProgressSink,
    pub cancel: &'a CancellationFlag,
}

impl OperationContext<'_> {
    pub fn cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn status(&self, text: &str, percent: f32) {
        self.sink.status(text, Some(percent));
    }

    pub fn log(&self, message: &str, severity: Severity) {
        self.sink.log(message, severity);
    }

    /// Log a recoverable problem to both the caller and tracing.
    pub fn warn(&self, message: &str) {
        warn!("{message}");
        self.sink.log(message, Severity::Warning);
    }

    /// The recognizer, if OCR is switched on and one is available.
    pub fn recognizer(&self) -> Option<&dyn TextRecognizer> {
        if !self.params.ocr_enabled {
            return None;
        }
        self.engines.recognizer.as_deref()
    }

    /// Write a finished text output. Failures are fatal output errors.
    pub fn write_text(&self, path: &Path, contents: &str) -> Result<()> {
        std::fs::write(path, contents).map_err(|err| {
            PdfwerkError::Output(format!("cannot write {}: {}", path.display(), err))
        })
    }
}

/// Per-page progress across the 10-90 % band.
pub(crate) fn page_progress(index: usize, total: usize) -> f32 {
    if total == 0 {
        return 10.0;
    }
    10.0 + (index as f32 / total as f32) * 80.0
}

/// Run one operation to completion, cancellation, or failure.
///
/// Parameters are validated before any work starts. Failures are reported
/// through the sink and returned; files written before the failure stay.
#[instrument(skip_all, fields(kind = %params.kind, input = %params.input_path.display()))]
pub fn run(
    params: &OperationParameters,
    config: &ProcessorConfig,
    engines: &Engines,
    sink: &dyn ProgressSink,
    cancel: &CancellationFlag,
) -> Result<OperationOutcome> {
    sink.status("Initializing...", Some(0.0));
    sink.log(&format!("Starting {}...", params.kind), Severity::Info);

    let ctx = OperationContext {
        params,
        config,
        engines,
        sink,
        cancel,
    };

    let result = params.validate().and_then(|()| {
        if params.ocr_enabled && engines.recognizer.is_none() && needs_ocr(params.kind) {
            ctx.warn("OCR is enabled but no OCR engine is available; continuing without OCR");
        }
        match params.kind {
            OperationKind::SlicePages => slice::slice_by_pages(&ctx),
            OperationKind::SliceSize => slice::slice_by_size(&ctx),
            OperationKind::SimpleText => text::simple_text(&ctx),
            OperationKind::TextOcr => text::text_with_ocr(&ctx),
            OperationKind::ImagesOcr => images::extract_images(&ctx),
        }
    });

    match &result {
        Ok(OperationOutcome::Completed(summary)) => {
            info!(outputs = summary.outputs.len(), "Operation completed");
            sink.status("Completed!", Some(100.0));
            sink.log("Completed successfully!", Severity::Success);
        }
        Ok(OperationOutcome::Cancelled(summary)) => {
            info!(outputs = summary.outputs.len(), "Operation cancelled");
            sink.status("Stopped", Some(0.0));
            sink.log("Stopped by user", Severity::Warning);
        }
        Err(err) => {
            error!(%err, "Operation failed");
            sink.log(&format!("Error: {err}"), Severity::Error);
            sink.status("Error occurred", Some(0.0));
        }
    }
    result
}

fn needs_ocr(kind: OperationKind) -> bool {
    matches!(kind, OperationKind::TextOcr | OperationKind::ImagesOcr)
}
