// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// XFORM's entry point: dispatches the prepared intermediate PDF to the
// driver matching `opts.output_format`, or passes it through untouched for
// `OutputFormat::Pdf` (§4.3: "a PDF destination needs no transform at all").

use ipptransform_core::{OutputFormat, PrintOptions};
use tracing::instrument;

use crate::error::Result;
use crate::pcl::render_pcl;
use crate::pclm::{render_pclm, strip_height_from_env};
use crate::postscript::render_postscript;
use crate::raster_driver::{kind_for_output_format, render_raster_stream};

/// Transforms `pdf_bytes` (PREP's intermediate PDF, `page_count` pages) into
/// the bytes for `opts.output_format`. `supported_raster_types` is the
/// destination's advertised `pwg-raster-document-type-supported` list, used
/// only by the raster drivers; pass an empty slice when there is no
/// negotiated destination (e.g. `-f outfile`).
#[instrument(skip(pdf_bytes), fields(output_format = ?opts.output_format, page_count))]
pub fn transform(pdf_bytes: &[u8], page_count: u32, opts: &PrintOptions, supported_raster_types: &[String]) -> Result<Vec<u8>> {
    match opts.output_format {
        OutputFormat::Pdf => Ok(pdf_bytes.to_vec()),
        OutputFormat::Pcl => render_pcl(pdf_bytes, page_count, opts),
        OutputFormat::Pclm => render_pclm(pdf_bytes, page_count, opts, strip_height_from_env()),
        OutputFormat::PostScript => render_postscript(pdf_bytes, page_count, opts),
        OutputFormat::PwgRaster | OutputFormat::AppleRaster => {
            let kind = kind_for_output_format(opts.output_format)
                .expect("PwgRaster and AppleRaster always map to a RasterKind");
            render_raster_stream(pdf_bytes, page_count, opts, kind, supported_raster_types)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_output_is_a_passthrough() {
        let opts = PrintOptions::defaults_for(OutputFormat::Pdf);
        let bytes = transform(b"%PDF-1.7 stub", 1, &opts, &[]).unwrap();
        assert_eq!(bytes, b"%PDF-1.7 stub");
    }
}
