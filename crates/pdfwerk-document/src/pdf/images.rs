// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Embedded image XObjects — enumeration per page and decoding into `Raster`
// pixel buffers.

use std::collections::HashSet;

use image::ImageFormat;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::ColorSpace;
use thiserror::Error;
use tracing::{debug, trace};

use crate::image::raster::Raster;

/// Form XObjects can nest; stop following them past this depth.
const MAX_FORM_DEPTH: usize = 8;

/// An image XObject found in a page's resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Resource name, e.g. `Im1`.
    pub name: String,
    pub object_id: ObjectId,
}

/// Why a single embedded image could not be turned into pixels.
///
/// These are per-image failures: the caller logs them and moves on.
#[derive(Debug, Error)]
pub enum ImageDecodeError {
    #[error("object {0:?} is not an image stream")]
    NotAnImage(ObjectId),

    #[error("missing or invalid /{0}")]
    MissingKey(&'static str),

    #[error("unsupported filter {0}")]
    UnsupportedFilter(String),

    #[error("unsupported bits per component: {0}")]
    UnsupportedBitDepth(i64),

    #[error("unsupported colour space: {0}")]
    UnsupportedColorSpace(String),

    #[error("stream decoding failed: {0}")]
    Stream(String),

    #[error("pixel data too short: expected {expected} bytes, got {actual}")]
    ShortData { expected: usize, actual: usize },

    #[error("embedded codec failed: {0}")]
    Codec(String),
}

impl From<ImageDecodeError> for PdfwerkError {
    fn from(err: ImageDecodeError) -> Self {
        PdfwerkError::ImageError(err.to_string())
    }
}

// -- Enumeration ---------------------------------------------------------------

/// List the image XObjects a page draws, following form XObjects.
pub(crate) fn list_page_images(document: &Document, page_id: ObjectId) -> Result<Vec<ImageRef>> {
    let page = document.get_dictionary(page_id).map_err(|err| {
        PdfwerkError::PdfError(format!("cannot read page {:?}: {}", page_id, err))
    })?;

    let mut found = Vec::new();
    let mut seen = HashSet::new();
    if let Some(resources) = page_resources(document, page) {
        collect_images(document, resources, 0, &mut seen, &mut found);
    }
    Ok(found)
}

/// The page's `/Resources`, inherited from the page tree when absent.
fn page_resources<'a>(document: &'a Document, page: &'a Dictionary) -> Option<&'a Dictionary> {
    let mut node = page;
    for _ in 0..MAX_FORM_DEPTH * 8 {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve(document, resources).as_dict().ok();
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = document.get_dictionary(parent).ok()?;
    }
    None
}

fn collect_images(
    document: &Document,
    resources: &Dictionary,
    depth: usize,
    seen: &mut HashSet<ObjectId>,
    found: &mut Vec<ImageRef>,
) {
    let xobjects = match resources.get(b"XObject") {
        Ok(xobjects) => match resolve(document, xobjects).as_dict() {
            Ok(dict) => dict,
            Err(_) => return,
        },
        Err(_) => return,
    };

    for (name, value) in xobjects.iter() {
        let Ok(object_id) = value.as_reference() else {
            trace!("Skipping inline XObject entry");
            continue;
        };
        let Ok(Object::Stream(stream)) = document.get_object(object_id) else {
            continue;
        };
        match name_of(&stream.dict, b"Subtype") {
            Some(b"Image") => {
                if seen.insert(object_id) {
                    found.push(ImageRef {
                        name: String::from_utf8_lossy(name).into_owned(),
                        object_id,
                    });
                }
            }
            Some(b"Form") if depth < MAX_FORM_DEPTH => {
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .and_then(|resources| resolve(document, resources).as_dict());
                if let Ok(form_resources) = form_resources {
                    collect_images(document, form_resources, depth + 1, seen, found);
                }
            }
            _ => {}
        }
    }
}

// -- Decoding ------------------------------------------------------------------

/// Decode an image XObject into a pixel buffer.
///
/// DCT (JPEG) images go through the `image` codec; everything else must be
/// raw samples after lopdf's stream filters (Flate, LZW, ASCII85, ...).
pub fn decode_image(
    document: &Document,
    object_id: ObjectId,
) -> std::result::Result<Raster, ImageDecodeError> {
    decode_image_inner(document, object_id, true)
}

/// Soft-mask images may not carry their own `/SMask`, so masks are decoded
/// with `follow_smask` off. That also stops self-referencing masks.
fn decode_image_inner(
    document: &Document,
    object_id: ObjectId,
    follow_smask: bool,
) -> std::result::Result<Raster, ImageDecodeError> {
    let stream = match document.get_object(object_id) {
        Ok(Object::Stream(stream)) => stream,
        _ => return Err(ImageDecodeError::NotAnImage(object_id)),
    };
    let dict = &stream.dict;
    if name_of(dict, b"Subtype") != Some(&b"Image"[..]) {
        return Err(ImageDecodeError::NotAnImage(object_id));
    }

    let width = positive_int(document, dict, b"Width").ok_or(ImageDecodeError::MissingKey("Width"))?;
    let height =
        positive_int(document, dict, b"Height").ok_or(ImageDecodeError::MissingKey("Height"))?;

    let filters = stream_filters(document, dict);
    let last_filter = filters.last().map(Vec::as_slice);

    let mut raster = match last_filter {
        Some(b"DCTDecode") | Some(b"DCT") => decode_jpeg(stream, &filters)?,
        Some(b"JPXDecode") | Some(b"JBIG2Decode") | Some(b"CCITTFaxDecode") | Some(b"CCF") => {
            let name = last_filter.map(String::from_utf8_lossy).unwrap_or_default();
            return Err(ImageDecodeError::UnsupportedFilter(name.into_owned()));
        }
        _ => decode_samples(document, stream, width, height)?,
    };

    if raster.width() != width || raster.height() != height {
        debug!(
            declared = format!("{width}x{height}"),
            decoded = format!("{}x{}", raster.width(), raster.height()),
            "Image dimensions differ from dictionary"
        );
    }

    if follow_smask {
        if let Some(alpha) = soft_mask(document, dict, raster.width(), raster.height()) {
            raster = raster.with_alpha(&alpha);
        }
    }

    Ok(raster)
}

fn decode_jpeg(
    stream: &Stream,
    filters: &[Vec<u8>],
) -> std::result::Result<Raster, ImageDecodeError> {
    if filters.len() > 1 {
        let chain: Vec<String> = filters
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();
        return Err(ImageDecodeError::UnsupportedFilter(chain.join("+")));
    }
    let image = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
        .map_err(|err| ImageDecodeError::Codec(err.to_string()))?;
    Ok(Raster::from_dynamic(&image))
}

fn decode_samples(
    document: &Document,
    stream: &Stream,
    width: u32,
    height: u32,
) -> std::result::Result<Raster, ImageDecodeError> {
    let dict = &stream.dict;
    let data = if dict.has(b"Filter") {
        stream
            .decompressed_content()
            .map_err(|err| ImageDecodeError::Stream(err.to_string()))?
    } else {
        stream.content.clone()
    };

    let is_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
    let bits = if is_mask {
        1
    } else {
        dict.get(b"BitsPerComponent")
            .ok()
            .map(|bpc| resolve(document, bpc))
            .and_then(|bpc| bpc.as_i64().ok())
            .unwrap_or(8)
    };

    let color = if is_mask {
        ResolvedColor::Direct(ColorSpace::Gray)
    } else {
        match dict.get(b"ColorSpace") {
            Ok(cs) => resolve_color_space(document, cs)?,
            Err(_) => return Err(ImageDecodeError::MissingKey("ColorSpace")),
        }
    };

    match color {
        ResolvedColor::Direct(space) => {
            let components = space
                .components()
                .ok_or_else(|| ImageDecodeError::UnsupportedColorSpace(space.to_string()))?;
            let mut samples = unpack_samples(&data, width, height, components, bits)?;
            if is_mask && mask_decode_inverted(document, dict) {
                // `/Decode [1 0]`: samples of 1 paint. Painted areas stay black.
                for sample in &mut samples {
                    *sample = 255 - *sample;
                }
            }
            Raster::new(width, height, space, false, samples)
                .map_err(|err| ImageDecodeError::Codec(err.to_string()))
        }
        ResolvedColor::Indexed {
            base,
            hival,
            palette,
        } => {
            let indices = unpack_indices(&data, width, height, bits)?;
            let components = base
                .components()
                .ok_or_else(|| ImageDecodeError::UnsupportedColorSpace(base.to_string()))?
                as usize;
            let mut samples = Vec::with_capacity(indices.len() * components);
            for index in indices {
                let index = (index as usize).min(hival);
                let start = index * components;
                match palette.get(start..start + components) {
                    Some(entry) => samples.extend_from_slice(entry),
                    None => samples.extend(std::iter::repeat_n(0u8, components)),
                }
            }
            Raster::new(width, height, base, false, samples)
                .map_err(|err| ImageDecodeError::Codec(err.to_string()))
        }
    }
}

/// A `/ColorSpace` entry reduced to something we can decode.
enum ResolvedColor {
    Direct(ColorSpace),
    Indexed {
        base: ColorSpace,
        hival: usize,
        palette: Vec<u8>,
    },
}

fn resolve_color_space(
    document: &Document,
    object: &Object,
) -> std::result::Result<ResolvedColor, ImageDecodeError> {
    match resolve(document, object) {
        Object::Name(name) => Ok(ResolvedColor::Direct(color_space_from_name(name))),
        Object::Array(items) => {
            let family = match items.first().map(|item| resolve(document, item)) {
                Some(Object::Name(family)) => family.as_slice(),
                _ => return Err(ImageDecodeError::MissingKey("ColorSpace")),
            };
            match family {
                b"ICCBased" => {
                    let components = items
                        .get(1)
                        .and_then(|profile| match resolve(document, profile) {
                            Object::Stream(stream) => stream.dict.get(b"N").ok()?.as_i64().ok(),
                            _ => None,
                        })
                        .unwrap_or(3);
                    Ok(ResolvedColor::Direct(ColorSpace::from_components(components)))
                }
                b"CalGray" => Ok(ResolvedColor::Direct(ColorSpace::Gray)),
                b"CalRGB" => Ok(ResolvedColor::Direct(ColorSpace::Rgb)),
                b"Indexed" | b"I" => {
                    let base = match items.get(1) {
                        Some(base) => match resolve_color_space(document, base)? {
                            ResolvedColor::Direct(base) => base,
                            ResolvedColor::Indexed { .. } => {
                                return Err(ImageDecodeError::UnsupportedColorSpace(
                                    "nested Indexed".into(),
                                ));
                            }
                        },
                        None => return Err(ImageDecodeError::MissingKey("ColorSpace")),
                    };
                    let hival = items
                        .get(2)
                        .and_then(|hival| resolve(document, hival).as_i64().ok())
                        .unwrap_or(255)
                        .clamp(0, 255) as usize;
                    let palette = match items.get(3).map(|lookup| resolve(document, lookup)) {
                        Some(Object::String(bytes, _)) => bytes.clone(),
                        Some(Object::Stream(stream)) => stream
                            .decompressed_content()
                            .unwrap_or_else(|_| stream.content.clone()),
                        _ => return Err(ImageDecodeError::MissingKey("Indexed lookup")),
                    };
                    Ok(ResolvedColor::Indexed {
                        base,
                        hival,
                        palette,
                    })
                }
                other => Ok(ResolvedColor::Direct(ColorSpace::Other(
                    String::from_utf8_lossy(other).into_owned(),
                ))),
            }
        }
        _ => Err(ImageDecodeError::MissingKey("ColorSpace")),
    }
}

fn color_space_from_name(name: &[u8]) -> ColorSpace {
    match name {
        b"DeviceGray" | b"G" | b"CalGray" => ColorSpace::Gray,
        b"DeviceRGB" | b"RGB" | b"CalRGB" => ColorSpace::Rgb,
        b"DeviceCMYK" | b"CMYK" => ColorSpace::Cmyk,
        other => ColorSpace::Other(String::from_utf8_lossy(other).into_owned()),
    }
}

/// Expand packed samples to one byte per component.
fn unpack_samples(
    data: &[u8],
    width: u32,
    height: u32,
    components: u8,
    bits: i64,
) -> std::result::Result<Vec<u8>, ImageDecodeError> {
    let per_row = width as usize * components as usize;
    let rows = height as usize;
    match bits {
        8 => {
            let expected = per_row * rows;
            if data.len() < expected {
                return Err(ImageDecodeError::ShortData {
                    expected,
                    actual: data.len(),
                });
            }
            Ok(data[..expected].to_vec())
        }
        16 => {
            let expected = per_row * rows * 2;
            if data.len() < expected {
                return Err(ImageDecodeError::ShortData {
                    expected,
                    actual: data.len(),
                });
            }
            Ok(data[..expected].chunks_exact(2).map(|pair| pair[0]).collect())
        }
        1 | 2 | 4 => {
            let bits = bits as usize;
            let max = (1u16 << bits) - 1;
            let row_bytes = (per_row * bits).div_ceil(8);
            let expected = row_bytes * rows;
            if data.len() < expected {
                return Err(ImageDecodeError::ShortData {
                    expected,
                    actual: data.len(),
                });
            }
            let mut out = Vec::with_capacity(per_row * rows);
            for row in data[..expected].chunks_exact(row_bytes) {
                for sample in 0..per_row {
                    let value = read_packed(row, sample, bits);
                    out.push((value as u16 * 255 / max) as u8);
                }
            }
            Ok(out)
        }
        other => Err(ImageDecodeError::UnsupportedBitDepth(other)),
    }
}

/// Palette indices, one per pixel, without scaling.
fn unpack_indices(
    data: &[u8],
    width: u32,
    height: u32,
    bits: i64,
) -> std::result::Result<Vec<u8>, ImageDecodeError> {
    match bits {
        8 => unpack_samples(data, width, height, 1, 8),
        1 | 2 | 4 => {
            let bits = bits as usize;
            let per_row = width as usize;
            let row_bytes = (per_row * bits).div_ceil(8);
            let expected = row_bytes * height as usize;
            if data.len() < expected {
                return Err(ImageDecodeError::ShortData {
                    expected,
                    actual: data.len(),
                });
            }
            Ok(data[..expected]
                .chunks_exact(row_bytes)
                .flat_map(|row| (0..per_row).map(move |sample| read_packed(row, sample, bits)))
                .collect())
        }
        other => Err(ImageDecodeError::UnsupportedBitDepth(other)),
    }
}

/// Read the `index`-th `bits`-wide sample from a packed, MSB-first row.
fn read_packed(row: &[u8], index: usize, bits: usize) -> u8 {
    let bit_offset = index * bits;
    let byte = row[bit_offset / 8];
    let shift = 8 - bits - (bit_offset % 8);
    (byte >> shift) & ((1u8 << bits) - 1)
}

/// Decode `/SMask` into an alpha plane matching the image size, if possible.
fn soft_mask(document: &Document, dict: &Dictionary, width: u32, height: u32) -> Option<Vec<u8>> {
    let mask_id = dict.get(b"SMask").ok()?.as_reference().ok()?;
    let mask = match decode_image_inner(document, mask_id, false) {
        Ok(mask) => mask,
        Err(err) => {
            debug!(%err, "Ignoring undecodable soft mask");
            return None;
        }
    };
    if mask.width() != width || mask.height() != height {
        debug!("Ignoring soft mask with mismatched size");
        return None;
    }
    Some(mask.to_gray_plane())
}

// -- Helpers -------------------------------------------------------------------

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn name_of<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match dict.get(key) {
        Ok(Object::Name(name)) => Some(name.as_slice()),
        _ => None,
    }
}

fn positive_int(document: &Document, dict: &Dictionary, key: &[u8]) -> Option<u32> {
    let value = resolve(document, dict.get(key).ok()?).as_i64().ok()?;
    u32::try_from(value).ok().filter(|value| *value > 0)
}

/// A stencil mask paints where samples are 0 unless `/Decode` is `[1 0]`.
fn mask_decode_inverted(document: &Document, dict: &Dictionary) -> bool {
    let Ok(decode) = dict.get(b"Decode") else {
        return false;
    };
    match resolve(document, decode) {
        Object::Array(range) => range
            .first()
            .map(|first| resolve(document, first))
            .and_then(|first| match first {
                Object::Integer(value) => Some(*value as f32),
                Object::Real(value) => Some(*value),
                _ => None,
            })
            .is_some_and(|first| first >= 0.5),
        _ => false,
    }
}

fn stream_filters(document: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter").map(|filter| resolve(document, filter)) {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| match resolve(document, item) {
                Object::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
