// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw pixel buffers decoded from PDF image XObjects.

use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::ColorSpace;

/// Interleaved 8-bit samples with a colour space tag and optional alpha.
///
/// `channels` counts the alpha channel when present, so a CMYK image with a
/// soft mask has five channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    color: ColorSpace,
    channels: u8,
    has_alpha: bool,
    data: Vec<u8>,
}

impl Raster {
    /// Wrap decoded samples, checking the buffer length.
    pub fn new(
        width: u32,
        height: u32,
        color: ColorSpace,
        has_alpha: bool,
        data: Vec<u8>,
    ) -> Result<Self> {
        let components = color.components().ok_or_else(|| {
            PdfwerkError::ImageError(format!("cannot build raster for colour space {color}"))
        })?;
        let channels = components + u8::from(has_alpha);
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(PdfwerkError::ImageError(format!(
                "raster {}x{} with {} channels needs {} bytes, got {}",
                width,
                height,
                channels,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            color,
            channels,
            has_alpha,
            data,
        })
    }

    /// Take the pixels of an already decoded image (e.g. an embedded JPEG).
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let (color, has_alpha, data) = match image {
            DynamicImage::ImageLuma8(gray) => (ColorSpace::Gray, false, gray.as_raw().clone()),
            DynamicImage::ImageLumaA8(gray) => (ColorSpace::Gray, true, gray.as_raw().clone()),
            DynamicImage::ImageRgb8(rgb) => (ColorSpace::Rgb, false, rgb.as_raw().clone()),
            other if other.color().has_alpha() => {
                (ColorSpace::Rgb, true, other.to_rgba8().into_raw())
            }
            other => (ColorSpace::Rgb, false, other.to_rgb8().into_raw()),
        };
        let colour_channels: u8 = if color == ColorSpace::Gray { 1 } else { 3 };
        let channels = colour_channels + u8::from(has_alpha);
        Self {
            width,
            height,
            color,
            channels,
            has_alpha,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color_space(&self) -> &ColorSpace {
        &self.color
    }

    /// Channel count including alpha.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Four or more colour channels once alpha is discounted: CMYK territory.
    pub fn needs_rgb_conversion(&self) -> bool {
        self.channels - u8::from(self.has_alpha) >= 4
    }

    /// Attach an alpha plane (one byte per pixel), replacing any existing one.
    pub fn with_alpha(self, alpha: &[u8]) -> Self {
        let pixels = self.width as usize * self.height as usize;
        if alpha.len() != pixels {
            return self;
        }
        let colour = self.channels as usize - usize::from(self.has_alpha);
        let mut data = Vec::with_capacity(pixels * (colour + 1));
        for (pixel, a) in self.data.chunks_exact(self.channels as usize).zip(alpha) {
            data.extend_from_slice(&pixel[..colour]);
            data.push(*a);
        }
        Self {
            channels: colour as u8 + 1,
            has_alpha: true,
            data,
            ..self
        }
    }

    /// Convert CMYK samples to RGB, keeping alpha. Other spaces pass through.
    pub fn into_rgb(self) -> Self {
        if self.color != ColorSpace::Cmyk {
            return self;
        }
        let alpha = usize::from(self.has_alpha);
        let mut data =
            Vec::with_capacity(self.width as usize * self.height as usize * (3 + alpha));
        for pixel in self.data.chunks_exact(self.channels as usize) {
            let [r, g, b] = cmyk_to_rgb(pixel[0], pixel[1], pixel[2], pixel[3]);
            data.extend_from_slice(&[r, g, b]);
            if self.has_alpha {
                data.push(pixel[4]);
            }
        }
        Self {
            color: ColorSpace::Rgb,
            channels: 3 + alpha as u8,
            data,
            ..self
        }
    }

    /// Luminance plane, one byte per pixel (alpha ignored).
    pub fn to_gray_plane(&self) -> Vec<u8> {
        match self.color {
            ColorSpace::Gray => self
                .data
                .chunks_exact(self.channels as usize)
                .map(|pixel| pixel[0])
                .collect(),
            _ => match self.to_dynamic() {
                Ok(image) => image.to_luma8().into_raw(),
                Err(_) => vec![0; self.width as usize * self.height as usize],
            },
        }
    }

    /// Build an `image::DynamicImage` for analysis, saving, and OCR.
    ///
    /// CMYK rasters are converted on the fly; call [`Raster::into_rgb`] first
    /// to convert once and keep the result.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let (w, h) = (self.width, self.height);
        let mismatch =
            || PdfwerkError::ImageError(format!("raster buffer does not match {w}x{h}"));
        match (&self.color, self.has_alpha) {
            (ColorSpace::Gray, false) => GrayImage::from_raw(w, h, self.data.clone())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(mismatch),
            (ColorSpace::Gray, true) => GrayAlphaImage::from_raw(w, h, self.data.clone())
                .map(DynamicImage::ImageLumaA8)
                .ok_or_else(mismatch),
            (ColorSpace::Rgb, false) => RgbImage::from_raw(w, h, self.data.clone())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(mismatch),
            (ColorSpace::Rgb, true) => RgbaImage::from_raw(w, h, self.data.clone())
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(mismatch),
            (ColorSpace::Cmyk, _) => self.clone().into_rgb().to_dynamic(),
            (ColorSpace::Other(name), _) => Err(PdfwerkError::ImageError(format!(
                "no pixel conversion for colour space {name}"
            ))),
        }
    }
}

/// Naive device CMYK → RGB.
pub fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let white = 255 - k as u16;
    let channel = |ink: u8| ((255 - ink as u16) * white / 255) as u8;
    [channel(c), channel(m), channel(y)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_buffer_length() {
        let result = Raster::new(4, 4, ColorSpace::Rgb, false, vec![0; 10]);
        assert!(result.is_err());
    }

    #[test]
    fn cmyk_converts_to_rgb_in_place() {
        // Pure magenta + yellow ink = red.
        let raster = Raster::new(2, 1, ColorSpace::Cmyk, false, vec![0, 255, 255, 0, 0, 0, 0, 255])
            .expect("raster");
        assert!(raster.needs_rgb_conversion());

        let rgb = raster.into_rgb();
        assert_eq!(rgb.color_space(), &ColorSpace::Rgb);
        assert_eq!(rgb.channels(), 3);
        assert!(!rgb.needs_rgb_conversion());
        let image = rgb.to_dynamic().expect("dynamic").to_rgb8();
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn alpha_counts_as_a_channel_but_not_as_colour() {
        let raster = Raster::new(1, 1, ColorSpace::Rgb, false, vec![1, 2, 3])
            .expect("raster")
            .with_alpha(&[200]);
        assert_eq!(raster.channels(), 4);
        assert!(raster.has_alpha());
        assert!(!raster.needs_rgb_conversion());
        assert_eq!(raster.to_dynamic().expect("dynamic").to_rgba8().get_pixel(0, 0).0, [1, 2, 3, 200]);
    }

    #[test]
    fn other_colour_spaces_cannot_be_built() {
        let result = Raster::new(1, 1, ColorSpace::Other("Lab".into()), false, vec![0; 3]);
        assert!(result.is_err());
    }
}
