// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for pdfwerk operations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PdfwerkError, Result};

/// The five batch operations a caller can run against one PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Copy an inclusive 1-based page range into a new PDF.
    SlicePages,
    /// Split the document into parts no larger than a size limit.
    SliceSize,
    /// Native text only, no rasterisation.
    SimpleText,
    /// Native text with an OCR fallback for pages that have almost none.
    TextOcr,
    /// Extract embedded images, filter them, save and OCR the worthwhile ones.
    ImagesOcr,
}

impl OperationKind {
    /// Short label used in status lines and tracing spans.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SlicePages => "slice by pages",
            Self::SliceSize => "slice by size",
            Self::SimpleText => "simple text extraction",
            Self::TextOcr => "text extraction with OCR",
            Self::ImagesOcr => "image extraction with OCR",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Colour space of an embedded image, as declared by the PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Indexed, Lab, Separation, DeviceN and anything else we cannot map directly.
    Other(String),
}

impl ColorSpace {
    /// Number of colour components (excluding alpha), if known.
    pub fn components(&self) -> Option<u8> {
        match self {
            Self::Gray => Some(1),
            Self::Rgb => Some(3),
            Self::Cmyk => Some(4),
            Self::Other(_) => None,
        }
    }

    /// Map a component count (e.g. from an ICC profile's `/N`) to a colour space.
    pub fn from_components(n: i64) -> Self {
        match n {
            1 => Self::Gray,
            3 => Self::Rgb,
            4 => Self::Cmyk,
            other => Self::Other(format!("{other}-component")),
        }
    }
}

impl std::fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gray => f.write_str("gray"),
            Self::Rgb => f.write_str("rgb"),
            Self::Cmyk => f.write_str("cmyk"),
            Self::Other(name) => write!(f, "other({name})"),
        }
    }
}

/// Outcome of the image quality filter.
///
/// The reason is only ever logged; callers branch on `accepted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityVerdict {
    pub accepted: bool,
    pub reason: String,
}

impl QualityVerdict {
    pub fn accept(reason: impl Into<String>) -> Self {
        Self {
            accepted: true,
            reason: reason.into(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: reason.into(),
        }
    }
}

/// Text produced by a full OCR pass together with its confidence (0-100,
/// negative when the engine does not score its output).
///
/// "No result" is modelled as `Option<OcrResult>::None`.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    pub text: String,
    pub confidence: f32,
}

impl OcrResult {
    pub fn trimmed_len(&self) -> usize {
        self.text.trim().chars().count()
    }
}

/// Immutable snapshot of everything an operation needs.
///
/// Taken once when the operation starts; later changes on the caller's side
/// never reach a running operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationParameters {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub kind: OperationKind,
    /// First page of the slice range (1-based, inclusive).
    pub start_page: u32,
    /// Last page of the slice range (1-based, inclusive).
    pub end_page: u32,
    /// Maximum size of one part for size-based slicing, in megabytes.
    pub max_part_size_mb: f64,
    pub ocr_enabled: bool,
    pub save_images: bool,
    pub smart_filtering: bool,
    /// Minimum width and height (pixels) of an image worth processing.
    pub min_image_size: u32,
}

impl OperationParameters {
    /// Parameters with the same defaults the interactive front end starts with.
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        kind: OperationKind,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            kind,
            start_page: 1,
            end_page: 1,
            max_part_size_mb: 5.0,
            ocr_enabled: true,
            save_images: true,
            smart_filtering: true,
            min_image_size: 150,
        }
    }

    /// Check the parameters that can be checked without opening the document.
    ///
    /// A missing input is an input error and a missing output directory is an
    /// output error; both are fatal before any work starts.
    pub fn validate(&self) -> Result<()> {
        if !self.input_path.is_file() {
            return Err(PdfwerkError::Input(format!(
                "{} does not exist or is not a file",
                self.input_path.display()
            )));
        }
        if !self.output_dir.is_dir() {
            return Err(PdfwerkError::Output(format!(
                "output directory {} does not exist",
                self.output_dir.display()
            )));
        }
        if self.kind == OperationKind::SliceSize
            && !(self.max_part_size_mb.is_finite() && self.max_part_size_mb > 0.0)
        {
            return Err(PdfwerkError::InvalidParameters(format!(
                "max part size must be a positive number of MB, got {}",
                self.max_part_size_mb
            )));
        }
        if self.kind == OperationKind::SlicePages && self.end_page == 0 {
            return Err(PdfwerkError::InvalidParameters(
                "end page must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Maximum part size in bytes.
    pub fn max_part_size_bytes(&self) -> u64 {
        (self.max_part_size_mb * 1024.0 * 1024.0) as u64
    }

    /// File stem of the input, used as the prefix for every output name.
    pub fn input_stem(&self) -> String {
        self.input_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }

    /// `<output_dir>/<stem><suffix>`.
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}{}", self.input_stem(), suffix))
    }

    /// Directory that receives extracted images: `<output_dir>/<stem>_images`.
    pub fn images_dir(&self) -> PathBuf {
        self.output_path("_images")
    }
}

/// What an operation did, reported on completion or cancellation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationSummary {
    /// Every file the operation wrote, in the order written.
    pub outputs: Vec<PathBuf>,
    pub pages_visited: usize,
    pub images_processed: usize,
    pub images_saved: usize,
    pub images_filtered: usize,
    /// Pages whose native text was replaced by OCR text.
    pub ocr_pages: usize,
}

impl OperationSummary {
    pub fn record_output(&mut self, path: &Path) {
        self.outputs.push(path.to_path_buf());
    }
}

/// Terminal state of an operation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Completed(OperationSummary),
    /// Stopped at a cancellation checkpoint; files already written stay on disk.
    Cancelled(OperationSummary),
}

impl OperationOutcome {
    pub fn summary(&self) -> &OperationSummary {
        match self {
            Self::Completed(summary) | Self::Cancelled(summary) => summary,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_use_input_stem() {
        let params =
            OperationParameters::new("/data/report.final.pdf", "/out", OperationKind::SimpleText);
        assert_eq!(params.input_stem(), "report.final");
        assert_eq!(
            params.output_path("_simple_text.txt"),
            PathBuf::from("/out/report.final_simple_text.txt")
        );
        assert_eq!(params.images_dir(), PathBuf::from("/out/report.final_images"));
    }

    #[test]
    fn max_part_size_converts_megabytes() {
        let mut params = OperationParameters::new("a.pdf", "/out", OperationKind::SliceSize);
        params.max_part_size_mb = 1.5;
        assert_eq!(params.max_part_size_bytes(), 1_572_864);
    }

    #[test]
    fn validate_reports_missing_input_as_input_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let params = OperationParameters::new(
            dir.path().join("missing.pdf"),
            dir.path(),
            OperationKind::SimpleText,
        );
        assert!(matches!(params.validate(), Err(PdfwerkError::Input(_))));
    }

    #[test]
    fn validate_reports_missing_output_dir_as_output_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, b"%PDF-1.5").expect("write");
        let params = OperationParameters::new(
            &input,
            dir.path().join("nope"),
            OperationKind::SimpleText,
        );
        assert!(matches!(params.validate(), Err(PdfwerkError::Output(_))));
    }

    #[test]
    fn validate_rejects_non_positive_part_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, b"%PDF-1.5").expect("write");
        let mut params = OperationParameters::new(&input, dir.path(), OperationKind::SliceSize);
        params.max_part_size_mb = 0.0;
        assert!(matches!(
            params.validate(),
            Err(PdfwerkError::InvalidParameters(_))
        ));
    }

    #[test]
    fn color_space_from_icc_components() {
        assert_eq!(ColorSpace::from_components(1), ColorSpace::Gray);
        assert_eq!(ColorSpace::from_components(4), ColorSpace::Cmyk);
        assert!(matches!(ColorSpace::from_components(2), ColorSpace::Other(_)));
    }
}
