// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filter module — decide whether an extracted image is worth saving and OCR.

pub mod quality;

pub use quality::ImageQualityFilter;
