// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfwerk — batch PDF slicing, text extraction, and image OCR.
//
// Entry point. Initialises logging, loads the config, detects OCR and render
// backends, and runs one operation on the background worker. Ctrl-C asks the
// operation to stop at its next page or image.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use pdfwerk_core::config::ProcessorConfig;
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::progress::{CancellationFlag, TracingSink};
use pdfwerk_core::types::{OperationKind, OperationOutcome, OperationParameters};
use pdfwerk_document::{Engines, PdfReader, ocr, worker};

#[derive(Debug, Parser)]
#[command(name = "pdfwerk", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Copy an inclusive page range into a new PDF.
    SlicePages {
        #[command(flatten)]
        common: CommonArgs,
        /// First page (1-based).
        #[arg(long, default_value_t = 1)]
        start: u32,
        /// Last page (1-based, inclusive).
        #[arg(long)]
        end: u32,
    },
    /// Split the document into parts no larger than a size limit.
    SliceSize {
        #[command(flatten)]
        common: CommonArgs,
        /// Maximum part size in megabytes.
        #[arg(long, default_value_t = 5.0)]
        max_mb: f64,
    },
    /// Native text of every page.
    Text {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Native text, with OCR for pages that have almost none.
    TextOcr {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Extract embedded images, filter them, save and OCR the useful ones.
    Images {
        #[command(flatten)]
        common: CommonArgs,
        /// Do not write the extracted images to disk.
        #[arg(long)]
        no_save_images: bool,
        /// Only apply the minimum size rule; skip the quality checks and probe.
        #[arg(long)]
        no_smart_filter: bool,
        /// Minimum width and height in pixels.
        #[arg(long, default_value_t = 150)]
        min_image_size: u32,
    },
    /// Page count and available OCR / render backends.
    Info {
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// PDF to process.
    input: PathBuf,
    /// Where outputs are written (defaults to the input's directory).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// JSON file overriding processing thresholds.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Never run OCR, even when a backend is available.
    #[arg(long)]
    no_ocr: bool,
}

impl CommonArgs {
    fn parameters(&self, kind: OperationKind) -> OperationParameters {
        let output_dir = self.output_dir.clone().unwrap_or_else(|| {
            self.input
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
        });
        let mut params = OperationParameters::new(&self.input, output_dir, kind);
        params.ocr_enabled = !self.no_ocr;
        params
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ProcessorConfig> {
    match path {
        Some(path) => ProcessorConfig::load(path),
        None => Ok(ProcessorConfig::default()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match dispatch(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "pdfwerk failed");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Command) -> Result<()> {
    let (common, params) = match command {
        Command::Info { input, config } => {
            return info(&input, load_config(config.as_ref())?);
        }
        Command::SlicePages { common, start, end } => {
            let mut params = common.parameters(OperationKind::SlicePages);
            params.start_page = start;
            params.end_page = end;
            (common, params)
        }
        Command::SliceSize { common, max_mb } => {
            let mut params = common.parameters(OperationKind::SliceSize);
            params.max_part_size_mb = max_mb;
            (common, params)
        }
        Command::Text { common } => {
            let params = common.parameters(OperationKind::SimpleText);
            (common, params)
        }
        Command::TextOcr { common } => {
            let params = common.parameters(OperationKind::TextOcr);
            (common, params)
        }
        Command::Images {
            common,
            no_save_images,
            no_smart_filter,
            min_image_size,
        } => {
            let mut params = common.parameters(OperationKind::ImagesOcr);
            params.save_images = !no_save_images;
            params.smart_filtering = !no_smart_filter;
            params.min_image_size = min_image_size;
            (common, params)
        }
    };

    let config = load_config(common.config.as_ref())?;
    let outcome = run_in_background(params, config).await?;

    let summary = outcome.summary();
    for output in &summary.outputs {
        println!("{}", output.display());
    }
    if outcome.is_cancelled() {
        tracing::warn!(written = summary.outputs.len(), "Stopped before the end");
    }
    Ok(())
}

/// Run on the worker thread and forward Ctrl-C as a cancellation request.
async fn run_in_background(
    params: OperationParameters,
    config: ProcessorConfig,
) -> Result<OperationOutcome> {
    let engines = if needs_engines(&params) {
        Engines::detect(&config)
    } else {
        Engines::none()
    };
    tracing::info!(?engines, kind = %params.kind, "Starting operation");

    let cancel = CancellationFlag::new();
    let handle = worker::spawn(params, config, engines, Arc::new(TracingSink), cancel.clone())?;
    let mut join = tokio::task::spawn_blocking(move || handle.join());

    let joined = tokio::select! {
        joined = &mut join => joined,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupt received, stopping after the current item");
            cancel.cancel();
            join.await
        }
    };
    joined.map_err(|err| PdfwerkError::Io(std::io::Error::other(err)))?
}

/// Only the OCR operations use a recognizer or rasterizer.
fn needs_engines(params: &OperationParameters) -> bool {
    params.ocr_enabled && matches!(params.kind, OperationKind::TextOcr | OperationKind::ImagesOcr)
}

fn info(input: &Path, config: ProcessorConfig) -> Result<()> {
    let reader = PdfReader::open(input)?;
    let engines = Engines::detect(&config);

    println!("file:      {}", input.display());
    println!("pages:     {}", reader.page_count());
    println!("compiled:  {}", backend_list(&ocr::compiled_backends()));
    println!(
        "ocr:       {}",
        engines.recognizer.as_ref().map_or("unavailable", |r| r.name())
    );
    println!(
        "render:    {}",
        engines.rasterizer.as_ref().map_or("unavailable", |r| r.name())
    );
    Ok(())
}

fn backend_list(backends: &[&str]) -> String {
    if backends.is_empty() {
        "none".to_string()
    } else {
        backends.join(", ")
    }
}
