// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading documents, copying pages into new documents, and
// decoding embedded images.

pub mod assembler;
pub mod images;
pub mod reader;

#[cfg(test)]
pub(crate) mod test_support;

pub use assembler::PageAssembler;
pub use images::{ImageDecodeError, ImageRef};
pub use reader::PdfReader;
