// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for the integration tests: in-memory PDFs, a recording
// progress sink, and scripted OCR / render backends.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{DynamicImage, GrayImage, Luma};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::progress::{CancellationFlag, ProgressSink, Severity};
use pdfwerk_document::ocr::{OcrToken, PageLayout, TextRecognizer};
use pdfwerk_document::render::PageRasterizer;

// -- PDF fixtures -------------------------------------------------------------

/// An uncompressed 8-bit image XObject.
pub struct FixtureImage {
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub data: Vec<u8>,
}

impl FixtureImage {
    pub fn solid_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb.repeat((width * height) as usize);
        Self {
            width,
            height,
            color_space: "DeviceRGB",
            data,
        }
    }

    /// A busy grayscale pattern that passes the quality filter.
    pub fn textured_gray(width: u32, height: u32) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(((x * 37 + y * 91) % 256) as u8);
            }
        }
        Self {
            width,
            height,
            color_space: "DeviceGray",
            data,
        }
    }
}

/// One page per entry, each with a single line of text.
pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
    build_pdf(pages.iter().map(|text| (*text, Vec::new())).collect())
}

/// Pages with text and images.
pub fn build_pdf(pages: Vec<(&str, Vec<FixtureImage>)>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let kids: Vec<Object> = pages
        .into_iter()
        .map(|(text, images)| add_page(&mut doc, pages_id, font_id, text, images).into())
        .collect();

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialise fixture");
    bytes
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    text: &str,
    images: Vec<FixtureImage>,
) -> ObjectId {
    let mut operations = Vec::new();
    if !text.is_empty() {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 24.into()]));
        operations.push(Operation::new("Td", vec![72.into(), 700.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
        operations.push(Operation::new("ET", vec![]));
    }

    let mut xobjects = lopdf::Dictionary::new();
    for (index, image) in images.into_iter().enumerate() {
        let name = format!("Im{}", index + 1);
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => image.color_space,
                "BitsPerComponent" => 8,
            },
            image.data,
        ));
        xobjects.set(name.clone(), image_id);
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "cm",
            vec![
                (image.width as i64).into(),
                0.into(),
                0.into(),
                (image.height as i64).into(),
                72.into(),
                100.into(),
            ],
        ));
        operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        operations.push(Operation::new("Q", vec![]));
    }

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content"),
    ));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => xobjects,
        },
    })
}

/// Write `bytes` to `<dir>/<name>` and return the path.
pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write fixture");
    path
}

// -- Progress sink ------------------------------------------------------------

/// Sink that records everything and can cancel when a log line appears.
#[derive(Default)]
pub struct RecordingSink {
    pub logs: Mutex<Vec<(String, Severity)>>,
    pub statuses: Mutex<Vec<(String, Option<f32>)>>,
    cancel_on: Option<(String, CancellationFlag)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel `flag` as soon as a log line containing `needle` arrives.
    pub fn cancelling_on(needle: &str, flag: CancellationFlag) -> Self {
        Self {
            cancel_on: Some((needle.to_string(), flag)),
            ..Self::default()
        }
    }

    pub fn logs_with(&self, severity: Severity) -> Vec<String> {
        self.logs
            .lock()
            .expect("lock")
            .iter()
            .filter(|(_, s)| *s == severity)
            .map(|(m, _)| m.clone())
            .collect()
    }

    pub fn status_count(&self) -> usize {
        self.statuses.lock().expect("lock").len()
    }
}

impl ProgressSink for RecordingSink {
    fn status(&self, text: &str, percent: Option<f32>) {
        self.statuses
            .lock()
            .expect("lock")
            .push((text.to_string(), percent));
    }

    fn log(&self, message: &str, severity: Severity) {
        self.logs
            .lock()
            .expect("lock")
            .push((message.to_string(), severity));
        if let Some((needle, flag)) = &self.cancel_on {
            if message.contains(needle.as_str()) {
                flag.cancel();
            }
        }
    }
}

// -- OCR / render fakes -------------------------------------------------------

/// Recognizer with fixed answers.
pub struct ScriptedRecognizer {
    pub text: String,
    pub tokens: Vec<OcrToken>,
}

impl ScriptedRecognizer {
    /// Confident tokens plus the same words as plain text.
    pub fn confident(words: &[&str]) -> Self {
        Self {
            text: words.join(" "),
            tokens: words
                .iter()
                .map(|w| OcrToken {
                    text: w.to_string(),
                    confidence: 92.0,
                })
                .collect(),
        }
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn recognize_text(&self, _image: &DynamicImage, _layout: PageLayout) -> Result<String> {
        Ok(self.text.clone())
    }

    fn recognize_tokens(&self, _image: &DynamicImage, _layout: PageLayout) -> Result<Vec<OcrToken>> {
        Ok(self.tokens.clone())
    }
}

/// Rasterizer that paints each page a flat gray equal to its page number,
/// so [`PageTextRecognizer`] can tell pages apart.
pub struct MarkerRasterizer;

impl PageRasterizer for MarkerRasterizer {
    fn name(&self) -> &'static str {
        "marker"
    }

    fn rasterize(&self, _source: &Path, page_number: u32, scale: f32) -> Result<DynamicImage> {
        let side = (100.0 * scale) as u32;
        Ok(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            side,
            side,
            Luma([page_number as u8]),
        )))
    }
}

/// Recognizer that reads the page marker painted by [`MarkerRasterizer`].
pub struct PageTextRecognizer {
    pub pages: Vec<(u8, &'static str)>,
}

impl TextRecognizer for PageTextRecognizer {
    fn name(&self) -> &'static str {
        "page-text"
    }

    fn recognize_text(&self, image: &DynamicImage, layout: PageLayout) -> Result<String> {
        assert_eq!(layout, PageLayout::Auto);
        let marker = image.to_luma8().get_pixel(0, 0).0[0];
        Ok(self
            .pages
            .iter()
            .find(|(page, _)| *page == marker)
            .map(|(_, text)| text.to_string())
            .unwrap_or_default())
    }

    fn recognize_tokens(&self, _image: &DynamicImage, _layout: PageLayout) -> Result<Vec<OcrToken>> {
        Err(PdfwerkError::OcrError("not scored".into()))
    }
}

/// Recognizer whose every call fails.
pub struct FailingRecognizer;

impl TextRecognizer for FailingRecognizer {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn recognize_text(&self, _image: &DynamicImage, _layout: PageLayout) -> Result<String> {
        Err(PdfwerkError::OcrError("engine crashed".into()))
    }

    fn recognize_tokens(&self, _image: &DynamicImage, _layout: PageLayout) -> Result<Vec<OcrToken>> {
        Err(PdfwerkError::OcrError("engine crashed".into()))
    }
}
