// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Caller-facing progress, log, and cancellation plumbing.
//
// The caller (a UI, the CLI, a test) owns the sink and the cancellation flag.
// Operations only report into the sink and poll the flag at page and image
// boundaries.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Severity attached to each log line sent to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
    /// An image was skipped by the quality filter or the OCR probe.
    Filter,
}

/// Receives status, progress, and log lines from a running operation.
///
/// Implementations must be cheap; they are called at least once per page.
pub trait ProgressSink: Send + Sync {
    /// Short status line plus an optional completion percentage (0-100).
    fn status(&self, text: &str, percent: Option<f32>);

    /// A log line for the caller's log view.
    fn log(&self, message: &str, severity: Severity);
}

/// Sink that forwards everything to `tracing`, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn status(&self, text: &str, percent: Option<f32>) {
        match percent {
            Some(percent) => tracing::info!(percent = f64::from(percent), "{text}"),
            None => tracing::info!("{text}"),
        }
    }

    fn log(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => tracing::error!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Filter => tracing::debug!(filter = true, "{message}"),
            Severity::Info | Severity::Success => tracing::info!("{message}"),
        }
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn status(&self, _text: &str, _percent: Option<f32>) {}

    fn log(&self, _message: &str, _severity: Severity) {}
}

/// Shared cancellation flag, set by the caller and polled by the operation.
///
/// Cloning shares the underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the running operation stop at its next checkpoint.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
