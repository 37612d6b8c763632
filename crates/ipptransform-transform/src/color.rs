// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Color/quality resolution (§4.3): picks one wire raster format from the
// destination's advertised `pwg-raster-document-type-supported` list (or,
// for standalone/file output with no destination to query, the format's
// own preference order) given the job's `print-color-mode` and
// `print-quality`. Also packs a rendered 8-bit gray/RGB scanline into the
// chosen format's wire bytes, including the 1-bit ordered-dither path.

use ipptransform_core::{PrintColorMode, PrintQuality, Resolution};
use ipptransform_raster::header::ColorSpace;

use crate::dither::BayerMatrix;
use crate::render::RenderedPage;

/// One wire raster pixel format, named the way `pwg-raster-document-type-supported`
/// values are (`black_1`, `srgb_8`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    AdobeRgb16,
    AdobeRgb8,
    Srgb8,
    Cmyk8,
    Black1,
    Sgray1,
    Black8,
    Sgray8,
}

impl RasterFormat {
    pub fn pwg_type_name(self) -> &'static str {
        match self {
            RasterFormat::AdobeRgb16 => "adobe-rgb_16",
            RasterFormat::AdobeRgb8 => "adobe-rgb_8",
            RasterFormat::Srgb8 => "srgb_8",
            RasterFormat::Cmyk8 => "cmyk_8",
            RasterFormat::Black1 => "black_1",
            RasterFormat::Sgray1 => "sgray_1",
            RasterFormat::Black8 => "black_8",
            RasterFormat::Sgray8 => "sgray_8",
        }
    }

    pub fn color_space(self) -> ColorSpace {
        match self {
            RasterFormat::AdobeRgb16 | RasterFormat::AdobeRgb8 => ColorSpace::AdobeRgb,
            RasterFormat::Srgb8 => ColorSpace::Srgb,
            RasterFormat::Cmyk8 => ColorSpace::Cmyk,
            RasterFormat::Black1 | RasterFormat::Black8 => ColorSpace::Black,
            RasterFormat::Sgray1 | RasterFormat::Sgray8 => ColorSpace::Gray,
        }
    }

    pub fn bits_per_color(self) -> u32 {
        match self {
            RasterFormat::AdobeRgb16 => 16,
            RasterFormat::Black1 | RasterFormat::Sgray1 => 1,
            _ => 8,
        }
    }

    pub fn is_color(self) -> bool {
        matches!(
            self,
            RasterFormat::AdobeRgb16 | RasterFormat::AdobeRgb8 | RasterFormat::Srgb8 | RasterFormat::Cmyk8
        )
    }
}

/// Resolves the wire raster format per the §4.3 preference table. `supported`
/// is the destination's `pwg-raster-document-type-supported` list; an empty
/// slice (no destination to query — e.g. `-f outfile`) falls back to the
/// first entry of the matching preference order.
pub fn resolve_format(mode: PrintColorMode, quality: PrintQuality, supported: &[String]) -> RasterFormat {
    if matches!(mode, PrintColorMode::BiLevel) {
        return pick(&[RasterFormat::Black1, RasterFormat::Sgray1], supported);
    }

    let want_color = match mode {
        PrintColorMode::Color => true,
        PrintColorMode::Monochrome => false,
        PrintColorMode::Auto | PrintColorMode::BiLevel => supports_any_color(supported),
    };

    if want_color {
        let prefs: &[RasterFormat] = if matches!(quality, PrintQuality::High) {
            &[RasterFormat::AdobeRgb16, RasterFormat::AdobeRgb8, RasterFormat::Srgb8, RasterFormat::Cmyk8]
        } else {
            &[RasterFormat::Srgb8, RasterFormat::Cmyk8]
        };
        pick(prefs, supported)
    } else {
        let prefs: &[RasterFormat] = if matches!(quality, PrintQuality::Draft) {
            &[RasterFormat::Black1, RasterFormat::Sgray1]
        } else {
            &[RasterFormat::Black8, RasterFormat::Sgray8]
        };
        pick(prefs, supported)
    }
}

/// Resolves the job's raster resolution: an explicit `-r` pin always wins;
/// otherwise the destination's advertised `pwg-raster-document-resolution-
/// supported` list is consulted (first entry); with neither available, falls
/// back to a hardcoded table keyed by color mode — 600x600 for monochrome
/// and bi-level jobs, 300x300 otherwise.
pub fn resolve_resolution(requested: Option<Resolution>, mode: PrintColorMode, supported: &[(u32, u32)]) -> Resolution {
    if let Some(resolution) = requested {
        return resolution;
    }
    if let Some(&(x_dpi, y_dpi)) = supported.first() {
        return Resolution { x_dpi, y_dpi };
    }
    match mode {
        PrintColorMode::Monochrome | PrintColorMode::BiLevel => Resolution { x_dpi: 600, y_dpi: 600 },
        PrintColorMode::Color | PrintColorMode::Auto => Resolution { x_dpi: 300, y_dpi: 300 },
    }
}

fn supports_any_color(supported: &[String]) -> bool {
    supported.is_empty()
        || supported
            .iter()
            .any(|t| t.starts_with("srgb_") || t.starts_with("adobe-rgb_") || t.starts_with("cmyk_"))
}

fn pick(prefs: &[RasterFormat], supported: &[String]) -> RasterFormat {
    if supported.is_empty() {
        return prefs[0];
    }
    prefs
        .iter()
        .find(|f| supported.iter().any(|s| s == f.pwg_type_name()))
        .copied()
        .unwrap_or(prefs[0])
}

/// 8-bit luma from a possibly-RGB sample, BT.601 coefficients.
fn luma(sample: &[u8]) -> u8 {
    if sample.len() == 1 {
        sample[0]
    } else {
        (0.299 * sample[0] as f32 + 0.587 * sample[1] as f32 + 0.114 * sample[2] as f32).round() as u8
    }
}

/// Packs one rendered row (`page.row(y)`, 8-bit gray or RGB) into `format`'s
/// wire bytes, `bytes_per_line` long. `y` is the row's device-pixel index,
/// used to index the dither matrix for 1-bit formats.
pub fn pack_row(format: RasterFormat, page: &RenderedPage, y: u32, dither: &BayerMatrix) -> Vec<u8> {
    let width = page.width;
    let row = page.row(y);
    let src_bpp = page.bytes_per_pixel();

    match format {
        RasterFormat::Srgb8 | RasterFormat::AdobeRgb8 => {
            let mut out = Vec::with_capacity(width as usize * 3);
            for x in 0..width as usize {
                let px = &row[x * src_bpp..x * src_bpp + src_bpp];
                if src_bpp == 1 {
                    out.extend_from_slice(&[px[0], px[0], px[0]]);
                } else {
                    out.extend_from_slice(px);
                }
            }
            out
        }
        RasterFormat::AdobeRgb16 => {
            let mut out = Vec::with_capacity(width as usize * 6);
            for x in 0..width as usize {
                let px = &row[x * src_bpp..x * src_bpp + src_bpp];
                let rgb = if src_bpp == 1 { [px[0]; 3] } else { [px[0], px[1], px[2]] };
                for component in rgb {
                    out.extend_from_slice(&[component, component]);
                }
            }
            out
        }
        RasterFormat::Cmyk8 => {
            let mut out = Vec::with_capacity(width as usize * 4);
            for x in 0..width as usize {
                let px = &row[x * src_bpp..x * src_bpp + src_bpp];
                let (r, g, b) = if src_bpp == 1 { (px[0], px[0], px[0]) } else { (px[0], px[1], px[2]) };
                out.extend_from_slice(&[255 - r, 255 - g, 255 - b, 0]);
            }
            out
        }
        RasterFormat::Sgray8 => {
            let mut out = Vec::with_capacity(width as usize);
            for x in 0..width as usize {
                out.push(luma(&row[x * src_bpp..x * src_bpp + src_bpp]));
            }
            out
        }
        RasterFormat::Black8 => {
            let mut out = Vec::with_capacity(width as usize);
            for x in 0..width as usize {
                out.push(255 - luma(&row[x * src_bpp..x * src_bpp + src_bpp]));
            }
            out
        }
        RasterFormat::Sgray1 | RasterFormat::Black1 => pack_1bpp(format, row, width, src_bpp, y, dither),
    }
}

/// 1-bit dithered packing. `Black1` sets a bit for ink (dark) pixels;
/// `Sgray1` follows the additive-gray convention (0 = black), so its bit
/// sense is inverted relative to `Black1`.
fn pack_1bpp(format: RasterFormat, row: &[u8], width: u32, src_bpp: usize, y: u32, dither: &BayerMatrix) -> Vec<u8> {
    let bytes_per_line = (width as usize).div_ceil(8);
    let mut out = vec![0u8; bytes_per_line];
    for x in 0..width {
        let sample = luma(&row[x as usize * src_bpp..x as usize * src_bpp + src_bpp]);
        let ink = dither.is_ink(x, y, sample);
        let bit = matches!(format, RasterFormat::Black1) == ink;
        if bit {
            out[x as usize / 8] |= 0x80 >> (x % 8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_quality_color_prefers_adobe_rgb_16() {
        let supported = vec!["adobe-rgb_16".to_string(), "srgb_8".to_string()];
        let fmt = resolve_format(PrintColorMode::Color, PrintQuality::High, &supported);
        assert_eq!(fmt, RasterFormat::AdobeRgb16);
    }

    #[test]
    fn normal_quality_color_prefers_srgb_8() {
        let fmt = resolve_format(PrintColorMode::Color, PrintQuality::Normal, &[]);
        assert_eq!(fmt, RasterFormat::Srgb8);
    }

    #[test]
    fn bilevel_forces_black_1() {
        let fmt = resolve_format(PrintColorMode::BiLevel, PrintQuality::High, &[]);
        assert_eq!(fmt, RasterFormat::Black1);
    }

    #[test]
    fn mono_draft_prefers_black_1() {
        let fmt = resolve_format(PrintColorMode::Monochrome, PrintQuality::Draft, &[]);
        assert_eq!(fmt, RasterFormat::Black1);
    }

    #[test]
    fn falls_back_to_supported_list_entry() {
        let supported = vec!["sgray_8".to_string()];
        let fmt = resolve_format(PrintColorMode::Monochrome, PrintQuality::Normal, &supported);
        assert_eq!(fmt, RasterFormat::Sgray8);
    }

    #[test]
    fn sgray_and_black_1bpp_have_opposite_bit_sense() {
        let dither = BayerMatrix::new();
        let row = [0u8; 1]; // fully black sample
        let black = pack_1bpp(RasterFormat::Black1, &row, 1, 1, 0, &dither);
        let sgray = pack_1bpp(RasterFormat::Sgray1, &row, 1, 1, 0, &dither);
        assert_eq!(black[0], 0x80);
        assert_eq!(sgray[0], 0x00);
    }

    #[test]
    fn explicit_resolution_overrides_probe_and_fallback() {
        let r = resolve_resolution(Some(Resolution { x_dpi: 150, y_dpi: 150 }), PrintColorMode::Color, &[(300, 300)]);
        assert_eq!(r, Resolution { x_dpi: 150, y_dpi: 150 });
    }

    #[test]
    fn resolution_falls_back_to_advertised_list_then_hardcoded_table() {
        let from_list = resolve_resolution(None, PrintColorMode::Color, &[(600, 1200)]);
        assert_eq!(from_list, Resolution { x_dpi: 600, y_dpi: 1200 });

        let mono_default = resolve_resolution(None, PrintColorMode::Monochrome, &[]);
        assert_eq!(mono_default, Resolution { x_dpi: 600, y_dpi: 600 });

        let color_default = resolve_resolution(None, PrintColorMode::Color, &[]);
        assert_eq!(color_default, Resolution { x_dpi: 300, y_dpi: 300 });
    }

    #[test]
    fn cmyk_conversion_inverts_rgb_into_cmy_with_zero_black() {
        let page = RenderedPage { width: 1, height: 1, gray: false, pixels: vec![255, 0, 128] };
        let dither = BayerMatrix::new();
        let packed = pack_row(RasterFormat::Cmyk8, &page, 0, &dither);
        assert_eq!(packed, vec![0, 255, 127, 0]);
    }
}
