// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background worker — run one operation on its own thread so the caller
// stays responsive and can cancel.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use pdfwerk_core::config::ProcessorConfig;
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::progress::{CancellationFlag, ProgressSink};
use pdfwerk_core::types::{OperationOutcome, OperationParameters};
use tracing::{debug, instrument};

use crate::ops::{self, Engines};

/// Handle on an operation running in the background.
///
/// Cancellation goes through the [`CancellationFlag`] passed to [`spawn`].
pub struct OperationHandle {
    thread: JoinHandle<Result<OperationOutcome>>,
}

impl OperationHandle {
    /// Wait for the operation to end.
    pub fn join(self) -> Result<OperationOutcome> {
        self.thread
            .join()
            .map_err(|_| PdfwerkError::Io(std::io::Error::other("worker thread panicked")))?
    }
}

/// Start `params` on a new thread.
///
/// The parameters are a snapshot: the worker owns its copy, its config, and
/// its engines for the rest of the run.
#[instrument(skip_all, fields(kind = %params.kind))]
pub fn spawn(
    params: OperationParameters,
    config: ProcessorConfig,
    engines: Engines,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationFlag,
) -> Result<OperationHandle> {
    let thread = thread::Builder::new()
        .name(format!("pdfwerk-{}", params.kind.label().replace(' ', "-")))
        .spawn(move || {
            debug!("Worker started");
            ops::run(&params, &config, &engines, sink.as_ref(), &cancel)
        })?;
    Ok(OperationHandle { thread })
}
