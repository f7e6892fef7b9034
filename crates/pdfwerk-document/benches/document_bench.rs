// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the per-image hot path of image extraction: the
// quality filter and the OCR enhancement that follows it.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};
use pdfwerk_core::config::{EnhanceConfig, QualityConfig};
use pdfwerk_document::{ImageQualityFilter, OcrEnhancer};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Synthetic "scanned figure": dark strokes on a light page.
fn figure(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
        if (x / 7 + y / 11) % 5 == 0 {
            Luma([40u8])
        } else {
            Luma([220u8 - ((x + y) % 30) as u8])
        }
    }))
}

/// Filter on an image small enough to skip the analysis downscale, and on
/// one large enough to need it.
fn bench_quality_filter(c: &mut Criterion) {
    let filter = ImageQualityFilter::new(QualityConfig::default());
    let small = figure(400, 300);
    let large = figure(2400, 1800);

    c.bench_function("quality_filter (400x300)", |b| {
        b.iter(|| black_box(filter.evaluate(black_box(&small), 150)));
    });
    c.bench_function("quality_filter (2400x1800)", |b| {
        b.iter(|| black_box(filter.evaluate(black_box(&large), 150)));
    });
}

/// Full enhancement chain, including the upscale to the OCR minimum side.
fn bench_enhance(c: &mut Criterion) {
    let enhancer = OcrEnhancer::new(EnhanceConfig::default());
    let img = figure(400, 300);

    c.bench_function("ocr_enhance (400x300)", |b| {
        b.iter(|| black_box(enhancer.enhance(black_box(&img))));
    });
}

criterion_group!(benches, bench_quality_filter, bench_enhance);
criterion_main!(benches);
