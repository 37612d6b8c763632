// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PWG Raster / Apple Raster / CUPS raster driver (§4.3). Rasterizes each
// page of the prepared PDF via `render::rasterize_page` directly at the
// job's (xdpi, ydpi), picks a wire pixel format with `color::resolve_format`,
// and streams pages through `ipptransform_raster`'s `RasterWriter`, which
// already coalesces identical consecutive rows into one compressed run.

use ipptransform_core::{OutputFormat, PrintOptions, Sides};
use ipptransform_raster::header::{pwg_integer, RasterHeader};
use ipptransform_raster::sync::SyncWord;
use ipptransform_raster::writer::{Dialect, RasterWriter};

use crate::color::{pack_row, resolve_format, RasterFormat};
use crate::dither::BayerMatrix;
use crate::error::{Result, XformError};
use crate::render::rasterize_page;

/// Which raster dialect to emit; selected by the caller from the negotiated
/// output format (`PwgRaster` vs `AppleRaster`) or an explicit CUPS sync word
/// for local/legacy delivery.
#[derive(Debug, Clone, Copy)]
pub enum RasterKind {
    Pwg,
    Apple,
    Cups(SyncWord),
}

/// Renders every page of `pdf_bytes` into a complete raster stream, per
/// `opts`. `supported_types` is the destination's advertised
/// `pwg-raster-document-type-supported` list (empty when there is no
/// negotiated destination, e.g. writing straight to a file).
pub fn render_raster_stream(
    pdf_bytes: &[u8],
    page_count: u32,
    opts: &PrintOptions,
    kind: RasterKind,
    supported_types: &[String],
) -> Result<Vec<u8>> {
    if !crate::render::pdftoppm_available() {
        return Err(XformError::ChildProcessFailed(
            "pdftoppm is required to rasterize pages and was not found on PATH".into(),
        ));
    }

    let format = resolve_format(opts.print_color_mode, opts.quality, supported_types);
    let dither = BayerMatrix::new();
    let (page_w_pt, page_h_pt) = opts.media.page_points();
    let xdpi = opts.resolution.x_dpi;
    let ydpi = opts.resolution.y_dpi;

    let dialect = match kind {
        RasterKind::Pwg => Dialect::Pwg,
        RasterKind::Cups(word) => Dialect::Cups(word),
        RasterKind::Apple => Dialect::Apple {
            page_count,
            print_quality: opts.quality.ipp_enum_value() as u32,
        },
    };

    let mut writer = RasterWriter::new(Vec::new(), dialect);

    for page_number in 1..=page_count {
        let is_back = opts.sides.is_duplex() && page_number % 2 == 0;
        let rendered = rasterize_page(pdf_bytes, page_number, xdpi, ydpi, !format.is_color())?;

        let mut header =
            RasterHeader::for_media(page_w_pt.round() as u32, page_h_pt.round() as u32, xdpi, ydpi, format.color_space(), format.bits_per_color());
        header.duplex = opts.sides.is_duplex();
        header.num_copies = if opts.copies > 1 { opts.copies } else { 1 };
        header.tumble = matches!(opts.sides, Sides::TwoSidedShortEdge);
        header.orientation = ipptransform_raster::header::Orientation::Portrait;
        header.page_size_name = String::new();

        header.vendor_integer[pwg_integer::TOTAL_PAGE_COUNT] = page_count;
        header.vendor_integer[pwg_integer::CROSS_FEED_TRANSFORM] = if is_back { 0xFFFFFFFF } else { 1 };
        header.vendor_integer[pwg_integer::FEED_TRANSFORM] = if is_back { 0xFFFFFFFF } else { 1 };
        header.vendor_integer[pwg_integer::IMAGE_BOX_LEFT] = header.imaging_bbox.left;
        header.vendor_integer[pwg_integer::IMAGE_BOX_TOP] = header.imaging_bbox.top;
        header.vendor_integer[pwg_integer::IMAGE_BOX_RIGHT] = header.imaging_bbox.right;
        header.vendor_integer[pwg_integer::IMAGE_BOX_BOTTOM] = header.imaging_bbox.bottom;
        header.vendor_integer[pwg_integer::PRINT_QUALITY] = opts.quality.ipp_enum_value() as u32;

        if header.width != rendered.width {
            return Err(XformError::Internal(format!(
                "rasterized page width {} does not match the expected header width {}",
                rendered.width, header.width
            )));
        }
        header.height = rendered.height;

        writer.write_header(&header)?;

        // `pdftoppm` is asked to render directly at (xdpi, ydpi), so every
        // output row already sits at its final device position — unlike a
        // capture device with a fixed native resolution, there is no
        // cross-axis mismatch left for `rowheight` replication to correct.
        for y in 0..rendered.height {
            let row = pack_row(format, &rendered, y, &dither);
            writer.write_row(&row)?;
        }
    }

    Ok(writer.finish()?)
}

/// Maps an `OutputFormat` to the raster kind it names, for callers that
/// already know the negotiated output format.
pub fn kind_for_output_format(format: OutputFormat) -> Option<RasterKind> {
    match format {
        OutputFormat::PwgRaster => Some(RasterKind::Pwg),
        OutputFormat::AppleRaster => Some(RasterKind::Apple),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_for_output_format_maps_raster_formats_only() {
        assert!(matches!(kind_for_output_format(OutputFormat::PwgRaster), Some(RasterKind::Pwg)));
        assert!(matches!(kind_for_output_format(OutputFormat::AppleRaster), Some(RasterKind::Apple)));
        assert!(kind_for_output_format(OutputFormat::Pdf).is_none());
    }
}
