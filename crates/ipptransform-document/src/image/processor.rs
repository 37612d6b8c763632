// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decodes a JPEG or PNG input document into an [`EmbeddedImage`]: the pixel
// data and PDF metadata needed to embed it as an image XObject in the
// one-page wrapper PDF §4.2 builds for raster input documents.
//
// JPEGs pass through verbatim as `DCTDecode` streams — re-encoding would
// both waste cycles and throw away quality the input already paid for, the
// same shortcut `cupsRasterToPDF`-style filters take. PNGs are decoded and
// re-packed as `FlateDecode` RGB/Gray streams, with any alpha channel
// split out into a separate `SMask` image per the PDF imaging model.

use std::io::{Cursor, Write};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder};
use tracing::debug;

use crate::error::{PrepError, Result};

/// A decoded image ready to be written as a PDF image XObject.
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub bits_per_component: u8,
    pub filter: &'static str,
    pub data: Vec<u8>,
    /// Soft-mask (alpha) data, `FlateDecode`/`DeviceGray`/8bpc, same
    /// dimensions as `data`. Only ever populated for PNG inputs with alpha.
    pub smask: Option<Vec<u8>>,
}

/// Decode `bytes` (declared as `mime`) into an [`EmbeddedImage`].
pub fn decode_for_embedding(bytes: &[u8], mime: &str) -> Result<EmbeddedImage> {
    match mime {
        "image/jpeg" => decode_jpeg(bytes),
        "image/png" => decode_png(bytes),
        other => Err(PrepError::UnsupportedOption(format!(
            "image input format {other}"
        ))),
    }
}

fn decode_jpeg(bytes: &[u8]) -> Result<EmbeddedImage> {
    let decoder = JpegDecoder::new(Cursor::new(bytes))?;
    let (width, height) = decoder.dimensions();
    let color_space = match decoder.color_type() {
        ColorType::L8 => "DeviceGray",
        ColorType::Rgb8 => "DeviceRGB",
        other => {
            return Err(PrepError::BadInput(format!(
                "unsupported JPEG color type {other:?}"
            )));
        }
    };
    debug!(width, height, color_space, "decoded JPEG for embedding (DCTDecode passthrough)");
    Ok(EmbeddedImage {
        width,
        height,
        color_space,
        bits_per_component: 8,
        filter: "DCTDecode",
        data: bytes.to_vec(),
        smask: None,
    })
}

fn decode_png(bytes: &[u8]) -> Result<EmbeddedImage> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?;
    let width = img.width();
    let height = img.height();

    let (color_space, raw, alpha) = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        let pixel_count = (width * height) as usize;
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for px in rgba.pixels() {
            rgb.extend_from_slice(&[px[0], px[1], px[2]]);
            alpha.push(px[3]);
        }
        ("DeviceRGB", rgb, Some(alpha))
    } else if img.color().channel_count() == 1 {
        ("DeviceGray", img.to_luma8().into_raw(), None)
    } else {
        ("DeviceRGB", img.to_rgb8().into_raw(), None)
    };

    debug!(width, height, color_space, has_alpha = alpha.is_some(), "decoded PNG for embedding");
    Ok(EmbeddedImage {
        width,
        height,
        color_space,
        bits_per_component: 8,
        filter: "FlateDecode",
        data: deflate(&raw),
        smask: alpha.map(|a| deflate(&a)),
    })
}

fn deflate(raw: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw).expect("writing to an in-memory buffer cannot fail");
    encoder.finish().expect("flushing an in-memory buffer cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn png_round_trips_dimensions_and_colorspace() {
        let embedded = decode_for_embedding(&tiny_png(), "image/png").unwrap();
        assert_eq!(embedded.width, 4);
        assert_eq!(embedded.height, 4);
        assert_eq!(embedded.color_space, "DeviceRGB");
        assert_eq!(embedded.filter, "FlateDecode");
        assert!(embedded.smask.is_none());
    }

    #[test]
    fn unsupported_mime_is_rejected() {
        let err = decode_for_embedding(&[], "image/gif");
        assert!(err.is_err());
    }
}
