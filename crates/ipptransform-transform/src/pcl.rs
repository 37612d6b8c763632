// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HP PCL driver (§4.3). Rasterizes each page the same way the raster driver
// does, then wraps PackBits-compressed rows in PCL raster-graphics escape
// sequences. Reuses `ipptransform_raster::packbits::encode_line` directly,
// passing no fill pixel: PCL decoders reject opcode 128 (clear-to-end), so
// this driver must never let the encoder emit it, unlike the RSC raster
// drivers which do pass one.

use ipptransform_core::{PrintColorMode, PrintOptions, Sides};
use ipptransform_raster::packbits::encode_line;

use crate::color::{pack_row, resolve_format, RasterFormat};
use crate::dither::BayerMatrix;
use crate::error::Result;
use crate::render::rasterize_page;

const ESC: u8 = 0x1b;

/// Renders `pdf_bytes` into a PCL byte stream: job reset, per-page raster
/// setup/data/eject, job terminator. The HP PCL raster-graphics hardware
/// this driver targets is monochrome-only, so color mode resolution is
/// pinned to `Monochrome` regardless of the job's requested
/// `print-color-mode` — a color request still prints, just not in color.
pub fn render_pcl(pdf_bytes: &[u8], page_count: u32, opts: &PrintOptions) -> Result<Vec<u8>> {
    let format = resolve_format(PrintColorMode::Monochrome, opts.quality, &[]);
    let dither = BayerMatrix::new();
    let xdpi = opts.resolution.x_dpi;
    let ydpi = opts.resolution.y_dpi;

    let mut out = Vec::new();
    write_job_reset(&mut out);

    for page_number in 1..=page_count {
        let rendered = rasterize_page(pdf_bytes, page_number, xdpi, ydpi, true)?;
        write_page_setup(&mut out, xdpi, opts);
        write_raster_config(&mut out, bit_depth(format), rendered.width);

        let mut blank_run: u32 = 0;
        for y in 0..rendered.height {
            let row = pack_row(format, &rendered, y, &dither);
            if is_blank_row(format, &row) {
                blank_run += 1;
                continue;
            }
            if blank_run > 0 {
                // `ESC*b<n>Y` advances the logical raster position by `n`
                // rows without transferring data, for runs of blank rows.
                out.extend_from_slice(format!("\x1b*b{blank_run}Y").as_bytes());
                blank_run = 0;
            }
            // These are always single-component rows (1 or 8 bits packed
            // into one byte per pixel-group), so `encode_line`'s grouping
            // width is always 1 regardless of the per-pixel bit depth.
            let mut packed = Vec::with_capacity(row.len() / 2 + 1);
            encode_line(&row, 1, None, &mut packed);
            out.extend_from_slice(format!("\x1b*b{}W", packed.len()).as_bytes());
            out.extend_from_slice(&packed);
        }
        if blank_run > 0 {
            out.extend_from_slice(format!("\x1b*b{blank_run}Y").as_bytes());
        }

        // `ESC*rB` ends the raster graphics; `ESC&l0H` ejects the page.
        out.extend_from_slice(b"\x1b*rB");
        if opts.sides.is_duplex() && page_number % 2 == 0 {
            out.extend_from_slice(b"\x1b&a2G");
        }
        out.extend_from_slice(b"\x0c");
    }

    write_job_terminator(&mut out);
    Ok(out)
}

/// A row with no ink: all-zero bytes for the additive-black formats, all-`0xff`
/// bytes for the additive-gray ones. Runs of these are skipped with
/// `ESC*b<n>Y` instead of being PackBits-encoded and transferred.
fn is_blank_row(format: RasterFormat, row: &[u8]) -> bool {
    match format {
        RasterFormat::Black1 | RasterFormat::Black8 => row.iter().all(|&b| b == 0),
        RasterFormat::Sgray1 | RasterFormat::Sgray8 => row.iter().all(|&b| b == 0xff),
        _ => false,
    }
}

fn bit_depth(format: RasterFormat) -> usize {
    match format {
        RasterFormat::Black1 | RasterFormat::Sgray1 => 1,
        _ => 8,
    }
}

fn write_job_reset(out: &mut Vec<u8>) {
    out.push(ESC);
    out.extend_from_slice(b"E"); // ESC E: printer reset
}

fn write_page_setup(out: &mut Vec<u8>, xdpi: u32, opts: &PrintOptions) {
    out.extend_from_slice(format!("\x1b&l{}A", media_size_code(opts)).as_bytes());
    out.extend_from_slice(format!("\x1b&u{xdpi}D").as_bytes()); // unit-of-measure
    if opts.sides.is_duplex() {
        let duplex_code = if matches!(opts.sides, Sides::TwoSidedShortEdge) { 2 } else { 1 };
        out.extend_from_slice(format!("\x1b&l{duplex_code}S").as_bytes());
    } else {
        out.extend_from_slice(b"\x1b&l0S");
    }
}

fn media_size_code(opts: &PrintOptions) -> u32 {
    // US Letter (2) vs A4 (26), the two PWG default media sizes the rest of
    // the pipeline ships with; anything else falls back to "custom" (101).
    let (w, h) = opts.media.page_points();
    if (w - 612.0).abs() < 2.0 && (h - 792.0).abs() < 2.0 {
        2
    } else if (w - 595.0).abs() < 2.0 && (h - 842.0).abs() < 2.0 {
        26
    } else {
        101
    }
}

fn write_raster_config(out: &mut Vec<u8>, bpp: usize, width: u32) {
    out.extend_from_slice(format!("\x1b*t{width}R").as_bytes()); // raster width, pixels
    out.extend_from_slice(format!("\x1b*r{bpp}U").as_bytes()); // plane count (1 = simple)
    out.extend_from_slice(b"\x1b*b2M"); // compression method 2 = PackBits
    out.extend_from_slice(b"\x1b*r1A"); // start raster graphics, relative position
}

fn write_job_terminator(out: &mut Vec<u8>) {
    out.extend_from_slice(b"\x1b%-12345X"); // universal exit language (UEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_size_code_recognizes_letter_and_a4() {
        let mut opts = PrintOptions::defaults_for(ipptransform_core::OutputFormat::Pcl);
        assert_eq!(media_size_code(&opts), 2);
        opts.media.width = 21000;
        opts.media.height = 29700;
        assert_eq!(media_size_code(&opts), 26);
    }

    #[test]
    fn bit_depth_matches_format() {
        assert_eq!(bit_depth(RasterFormat::Black1), 1);
        assert_eq!(bit_depth(RasterFormat::Sgray8), 8);
    }
}
