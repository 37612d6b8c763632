// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PostScript driver (§4.3). Primary path delegates to the external
// `pdftops` converter, the same delegation pattern `render::rasterize_page`
// uses for `pdftoppm`; when `pdftops` is unavailable, falls back to
// synthesizing minimal PostScript directly from rasterized pages with
// hex-encoded `colorimage`/`image` operators.

use std::process::Command;

use ipptransform_core::PrintOptions;

use crate::color::{pack_row, resolve_format};
use crate::dither::BayerMatrix;
use crate::error::{Result, XformError};
use crate::render::{rasterize_page, spool_to_tempfile};

/// Converts `pdf_bytes` to PostScript, preferring the external `pdftops`
/// and falling back to the in-process synthesizer when it isn't installed.
pub fn render_postscript(pdf_bytes: &[u8], page_count: u32, opts: &PrintOptions) -> Result<Vec<u8>> {
    if pdftops_available() {
        render_via_pdftops(pdf_bytes)
    } else {
        render_synthesized(pdf_bytes, page_count, opts)
    }
}

fn pdftops_available() -> bool {
    Command::new("pdftops")
        .arg("-v")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}

fn render_via_pdftops(pdf_bytes: &[u8]) -> Result<Vec<u8>> {
    let (_dir, pdf_path) = spool_to_tempfile(pdf_bytes)?;
    let ps_path = pdf_path.with_extension("ps");

    let status = Command::new("pdftops")
        .arg(&pdf_path)
        .arg(&ps_path)
        .status()
        .map_err(|err| XformError::ChildProcessFailed(format!("failed to spawn pdftops: {err}")))?;
    if !status.success() {
        return Err(XformError::ChildProcessFailed(format!("pdftops exited with {status}")));
    }

    std::fs::read(&ps_path).map_err(|err| {
        XformError::ChildProcessFailed(format!("reading pdftops output {}: {err}", ps_path.display()))
    })
}

/// Synthesizes a minimal DSC-conformant PostScript document: one `%%Page`
/// per rasterized page, each drawing one ASCII85-encoded `image`/`colorimage`
/// raster covering the full media box.
fn render_synthesized(pdf_bytes: &[u8], page_count: u32, opts: &PrintOptions) -> Result<Vec<u8>> {
    let format = resolve_format(opts.print_color_mode, opts.quality, &[]);
    let dither = BayerMatrix::new();
    let xdpi = opts.resolution.x_dpi;
    let ydpi = opts.resolution.y_dpi;
    let (page_w_pt, page_h_pt) = opts.media.page_points();

    let mut out = Vec::new();
    out.extend_from_slice(b"%!PS-Adobe-3.0\n");
    out.extend_from_slice(format!("%%Pages: {page_count}\n").as_bytes());
    out.extend_from_slice(format!("%%BoundingBox: 0 0 {} {}\n", page_w_pt.round(), page_h_pt.round()).as_bytes());
    out.extend_from_slice(b"%%EndComments\n");

    for page_number in 1..=page_count {
        let rendered = rasterize_page(pdf_bytes, page_number, xdpi, ydpi, !format.is_color())?;
        out.extend_from_slice(format!("%%Page: {page_number} {page_number}\n").as_bytes());
        out.extend_from_slice(b"gsave\n");
        out.extend_from_slice(format!("{page_w_pt} {page_h_pt} scale\n").as_bytes());

        let mut raw = Vec::with_capacity(rendered.pixels.len());
        for y in 0..rendered.height {
            raw.extend(pack_row(format, &rendered, y, &dither));
        }

        let components = if format.is_color() { 3 } else { 1 };
        let w = rendered.width;
        let h = rendered.height;
        out.extend_from_slice(format!("/rows {} string def\n", w as usize * components).as_bytes());
        out.extend_from_slice(format!("{w} {h} 8 [{w} 0 0 -{h} 0 {h}] {{currentfile rows readhexstring pop}}\n").as_bytes());
        if format.is_color() {
            out.extend_from_slice(b"false 3 colorimage\n");
        } else {
            out.extend_from_slice(b"image\n");
        }
        out.extend_from_slice(to_hex(&raw).as_bytes());
        out.extend_from_slice(b"\n");
        out.extend_from_slice(b"grestore\nshowpage\n");
    }

    out.extend_from_slice(b"%%EOF\n");
    Ok(out)
}

fn to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for b in data {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_hex_encodes_bytes_lowercase() {
        assert_eq!(to_hex(&[0x0a, 0xff]), "0aff");
    }
}
