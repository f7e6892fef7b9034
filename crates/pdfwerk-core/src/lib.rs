// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfwerk — Core types, errors, and configuration shared across all crates.

pub mod config;
pub mod error;
pub mod progress;
pub mod types;

pub use config::ProcessorConfig;
pub use error::PdfwerkError;
pub use progress::{CancellationFlag, NullSink, ProgressSink, Severity, TracingSink};
pub use types::*;
