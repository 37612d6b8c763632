// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterizes one page of the prepared intermediate PDF into a pixel buffer
// at the job's requested resolution (§4.3: "either Core Graphics or an
// external `pdftoppm` PPM renderer"). This workspace has no Core Graphics
// binding to reach for, so every driver that needs pixels — raster, PCL,
// PCLm, and the PostScript fallback synthesizer — goes through the
// external `pdftoppm` path, the same way the PostScript driver's other leg
// shells out to `pdftops`.

use std::io::Write as _;
use std::process::Command;

use tracing::{debug, instrument};

use crate::error::{Result, XformError};

/// One rasterized page, device pixels, 8 bits per component.
pub struct RenderedPage {
    pub width: u32,
    pub height: u32,
    pub gray: bool,
    /// Row-major pixel data, `width * (if gray {1} else {3})` bytes per row.
    pub pixels: Vec<u8>,
}

impl RenderedPage {
    pub fn bytes_per_pixel(&self) -> usize {
        if self.gray { 1 } else { 3 }
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * self.bytes_per_pixel();
        let start = y as usize * stride;
        &self.pixels[start..start + stride]
    }
}

/// Renders `page_number` (1-indexed) of `pdf_bytes` at `x_dpi`x`y_dpi`,
/// requesting grayscale output from `pdftoppm` when `gray` is set (avoids
/// an RGB->gray conversion pass for monochrome jobs).
#[instrument(skip(pdf_bytes), fields(page_number, x_dpi, y_dpi, gray))]
pub fn rasterize_page(pdf_bytes: &[u8], page_number: u32, x_dpi: u32, y_dpi: u32, gray: bool) -> Result<RenderedPage> {
    let workdir = tempfile::tempdir().map_err(XformError::Io)?;
    let pdf_path = workdir.path().join("job.pdf");
    std::fs::write(&pdf_path, pdf_bytes).map_err(XformError::Io)?;
    let out_root = workdir.path().join("page");

    let mut cmd = Command::new("pdftoppm");
    cmd.arg("-f").arg(page_number.to_string());
    cmd.arg("-l").arg(page_number.to_string());
    cmd.arg("-rx").arg(x_dpi.to_string());
    cmd.arg("-ry").arg(y_dpi.to_string());
    cmd.arg("-singlefile");
    if gray {
        cmd.arg("-gray");
    }
    cmd.arg(&pdf_path).arg(&out_root);

    let status = cmd
        .status()
        .map_err(|err| XformError::ChildProcessFailed(format!("failed to spawn pdftoppm: {err}")))?;
    if !status.success() {
        return Err(XformError::ChildProcessFailed(format!(
            "pdftoppm exited with {status}"
        )));
    }

    let candidate = out_root.with_extension(if gray { "pgm" } else { "ppm" });
    let data = std::fs::read(&candidate).map_err(|err| {
        XformError::ChildProcessFailed(format!("reading pdftoppm output {}: {err}", candidate.display()))
    })?;

    let page = parse_netpbm(&data)?;
    debug!(width = page.width, height = page.height, "rasterized page");
    Ok(page)
}

/// Parses the subset of binary PNM (`P5` grayscale / `P6` RGB) that
/// `pdftoppm` emits: a three-token ASCII header (`magic`, `width height`,
/// `maxval`), each separated by whitespace and `#`-comments skipped, then
/// one newline, then raw binary samples.
fn parse_netpbm(data: &[u8]) -> Result<RenderedPage> {
    let mut pos = 0usize;
    let magic = next_token(data, &mut pos)?;
    let gray = match magic.as_str() {
        "P5" => true,
        "P6" => false,
        other => return Err(XformError::BadInput(format!("unrecognized pdftoppm output format '{other}'"))),
    };
    let width: u32 = next_token(data, &mut pos)?
        .parse()
        .map_err(|_| XformError::BadInput("malformed PNM width".into()))?;
    let height: u32 = next_token(data, &mut pos)?
        .parse()
        .map_err(|_| XformError::BadInput("malformed PNM height".into()))?;
    let maxval: u32 = next_token(data, &mut pos)?
        .parse()
        .map_err(|_| XformError::BadInput("malformed PNM maxval".into()))?;
    if maxval != 255 {
        return Err(XformError::UnsupportedFormat(format!(
            "pdftoppm produced a {maxval}-maxval sample depth, only 255 is supported"
        )));
    }

    // Exactly one whitespace byte separates the header from the binary data.
    pos += 1;
    let bpp = if gray { 1 } else { 3 };
    let expected = width as usize * height as usize * bpp;
    if data.len() < pos + expected {
        return Err(XformError::BadInput("truncated PNM pixel data".into()));
    }
    let pixels = data[pos..pos + expected].to_vec();
    Ok(RenderedPage { width, height, gray, pixels })
}

fn next_token(data: &[u8], pos: &mut usize) -> Result<String> {
    loop {
        while *pos < data.len() && data[*pos].is_ascii_whitespace() {
            *pos += 1;
        }
        if *pos < data.len() && data[*pos] == b'#' {
            while *pos < data.len() && data[*pos] != b'\n' {
                *pos += 1;
            }
            continue;
        }
        break;
    }
    let start = *pos;
    while *pos < data.len() && !data[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    if start == *pos {
        return Err(XformError::BadInput("unexpected end of PNM header".into()));
    }
    std::str::from_utf8(&data[start..*pos])
        .map(str::to_owned)
        .map_err(|_| XformError::BadInput("non-ASCII PNM header token".into()))
}

/// Whether the `pdftoppm` binary is reachable on `PATH`, consulted once by
/// drivers that want to fail fast with a clear diagnostic rather than a
/// bare "failed to spawn" error.
pub fn pdftoppm_available() -> bool {
    Command::new("pdftoppm")
        .arg("-v")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}

/// Writes `bytes` into a fresh temp file and returns its path, keeping the
/// owning [`tempfile::TempDir`] alive alongside it. Used by the PostScript
/// driver's `pdftops` delegation path.
pub fn spool_to_tempfile(bytes: &[u8]) -> Result<(tempfile::TempDir, std::path::PathBuf)> {
    let dir = tempfile::tempdir().map_err(XformError::Io)?;
    let path = dir.path().join("job.pdf");
    let mut f = std::fs::File::create(&path).map_err(XformError::Io)?;
    f.write_all(bytes).map_err(XformError::Io)?;
    Ok((dir, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_p6_header() {
        let mut data = b"P6\n2 1\n255\n".to_vec();
        data.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        let page = parse_netpbm(&data).unwrap();
        assert_eq!((page.width, page.height, page.gray), (2, 1, false));
        assert_eq!(page.row(0), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn parses_p5_grayscale_with_comment() {
        let mut data = b"P5\n# a comment\n2 2\n255\n".to_vec();
        data.extend_from_slice(&[10, 20, 30, 40]);
        let page = parse_netpbm(&data).unwrap();
        assert!(page.gray);
        assert_eq!(page.row(1), &[30, 40]);
    }

    #[test]
    fn rejects_non_255_maxval() {
        let data = b"P6\n1 1\n65535\n\x00\x00\x00\x00\x00\x00".to_vec();
        assert!(parse_netpbm(&data).is_err());
    }

    #[test]
    fn rejects_truncated_pixel_data() {
        let data = b"P6\n4 4\n255\n\x00\x00\x00".to_vec();
        assert!(parse_netpbm(&data).is_err());
    }
}
