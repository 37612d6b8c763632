//! Modified PackBits compression for a single raster line.
//!
//! This is the per-row compression `cupsRasterWritePixels`/`cupsRasterReadPixels`
//! use once a row's repeat count (handled one layer up, in `writer`/`reader`)
//! has been accounted for. A line is a sequence of opcodes:
//!
//! - `0x00..=0x7f` (0..127): repeat the following `bpp` bytes `opcode + 1` times.
//! - `0x81..=0xff` (129..255): `257 - opcode` literal pixels follow, `bpp` bytes each.
//! - `0x80` (128): clear the rest of the line (0xff for additive colorspaces
//!   such as gray/RGB, 0x00 otherwise). The encoder emits it whenever the
//!   remainder of the line is uniformly the colorspace's fill pixel —
//!   pass that pixel as `fill_pixel` — and `decode_line` always honors it.
//!
//! The row-repeat byte that precedes these opcodes (handled one layer up, in
//! `writer`/`reader`) is not part of this module.

use crate::error::{RasterError, Result};

/// Append the PackBits-compressed form of one line (`line.len()` must be a
/// multiple of `bpp`) to `out`. `fill_pixel`, if given, is the colorspace's
/// clear-to-end pixel (`bpp` bytes, e.g. all-`0xff` for an additive
/// colorspace); when the line's remainder from some point on is entirely
/// that pixel, the clear-to-end opcode (`0x80`) replaces the trailing
/// run/literal segments.
pub fn encode_line(line: &[u8], bpp: usize, fill_pixel: Option<&[u8]>, out: &mut Vec<u8>) {
    assert!(bpp > 0, "bytes per pixel must be nonzero");
    assert_eq!(line.len() % bpp, 0, "line length must be a multiple of bpp");

    let pixel_count = line.len() / bpp;
    let pixel = |i: usize| &line[i * bpp..(i + 1) * bpp];

    // Index of the first pixel from which every remaining pixel is the
    // fill pixel (`pixel_count` if no such suffix exists), computed once
    // rather than re-scanned on every encoder step.
    let clear_from = match fill_pixel.filter(|f| f.len() == bpp) {
        Some(fill) => {
            let mut k = pixel_count;
            while k > 0 && pixel(k - 1) == fill {
                k -= 1;
            }
            k
        }
        None => pixel_count,
    };

    let mut i = 0;
    while i < pixel_count {
        // A lone trailing pixel would otherwise be forced into a literal
        // segment below; prefer clear-to-end when it qualifies.
        if i >= clear_from {
            out.push(128);
            return;
        }

        if i + 1 == pixel_count {
            // Single trailing pixel: always literal.
            out.push(0);
            out.extend_from_slice(pixel(i));
            i += 1;
            continue;
        }

        if pixel(i) == pixel(i + 1) {
            // Repeating run.
            let mut count = 2usize;
            let mut j = i + 1;
            while count < 128 && j + 1 < pixel_count && pixel(j) == pixel(j + 1) {
                count += 1;
                j += 1;
            }
            out.push((count - 1) as u8);
            out.extend_from_slice(pixel(j));
            i = j + 1;
        } else {
            // Literal run. `count` already includes pixel `j` by the time
            // the loop exits, whether it stopped because the next pixel
            // repeats or because `j` reached the last pixel.
            let mut count = 1usize;
            let mut j = i;
            while count < 128 && j + 1 < pixel_count && pixel(j) != pixel(j + 1) {
                count += 1;
                j += 1;
            }
            let opcode = 257 - count;
            out.push(opcode as u8);
            out.extend_from_slice(&line[i * bpp..(i + count) * bpp]);
            i += count;
        }
    }
}

/// Decode one line of PackBits-compressed data from `input`, filling exactly
/// `bytes_per_line` bytes of `out`. `fill_with_ff` selects the clear-to-end
/// fill byte for additive colorspaces (gray/RGB/sRGB/RGBW/AdobeRGB all clear
/// to white, everything else clears to black/zero).
pub fn decode_line(
    mut input: impl FnMut() -> Result<u8>,
    bpp: usize,
    bytes_per_line: usize,
    fill_with_ff: bool,
    out: &mut [u8],
) -> Result<()> {
    assert_eq!(out.len(), bytes_per_line);
    assert!(bpp > 0);

    let mut pos = 0usize;
    while pos < bytes_per_line {
        let opcode = input()?;
        if opcode == 128 {
            let fill = if fill_with_ff { 0xff } else { 0x00 };
            out[pos..].fill(fill);
            pos = bytes_per_line;
        } else if opcode > 128 {
            let pixels = 257 - opcode as usize;
            let mut count = pixels * bpp;
            if pos + count > bytes_per_line {
                count = bytes_per_line - pos;
            }
            for b in &mut out[pos..pos + count] {
                *b = input()?;
            }
            pos += count;
        } else {
            let pixels = opcode as usize + 1;
            let mut count = pixels * bpp;
            if pos + count > bytes_per_line {
                count = bytes_per_line - pos;
            }
            if count < bpp {
                return Err(RasterError::CompressionOverrun);
            }
            for b in &mut out[pos..pos + bpp] {
                *b = input()?;
            }
            let mut filled = bpp;
            while filled < count {
                let (left, right) = out[pos..pos + count].split_at_mut(filled);
                right[..bpp].copy_from_slice(&left[filled - bpp..filled]);
                filled += bpp;
            }
            pos += count;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_vec(bytes: &[u8], bpp: usize, bytes_per_line: usize, fill_with_ff: bool) -> Vec<u8> {
        let mut iter = bytes.iter().copied();
        let mut out = vec![0u8; bytes_per_line];
        decode_line(
            || iter.next().ok_or(RasterError::UnexpectedEof),
            bpp,
            bytes_per_line,
            fill_with_ff,
            &mut out,
        )
        .unwrap();
        out
    }

    #[test]
    fn encodes_single_trailing_pixel() {
        let line = [1u8, 2, 3];
        let mut out = Vec::new();
        encode_line(&line, 3, None, &mut out);
        assert_eq!(out, vec![0, 1, 2, 3]);
    }

    #[test]
    fn round_trips_repeating_run() {
        let line = [0xccu8; 3 * 8];
        let mut out = Vec::new();
        encode_line(&line, 3, None, &mut out);
        let decoded = decode_vec(&out, 3, line.len(), false);
        assert_eq!(&decoded[..], &line[..]);
    }

    #[test]
    fn round_trips_literal_run() {
        let line: Vec<u8> = (0u8..30).collect();
        let mut out = Vec::new();
        encode_line(&line, 1, None, &mut out);
        let decoded = decode_vec(&out, 1, line.len(), false);
        assert_eq!(decoded, line);
    }

    #[test]
    fn round_trips_mixed_run_grounded_on_cups_vector() {
        // One 24-byte (3bpp x 8px) line taken from the reference encoder's
        // golden test fixture (first compressed line of its first test row).
        let line: Vec<u8> = vec![
            0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0xff, 0xff, 0x00, 0xff, 0xff, 0x00, 0xff, 0xff,
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        ];
        let mut out = Vec::new();
        encode_line(&line, 3, None, &mut out);
        let decoded = decode_vec(&out, 3, line.len(), false);
        assert_eq!(decoded, line);
    }

    #[test]
    fn clear_to_end_opcode_fills_white_for_additive_colorspace() {
        let decoded = decode_vec(&[128], 3, 9, true);
        assert_eq!(decoded, vec![0xff; 9]);
        let decoded = decode_vec(&[128], 3, 9, false);
        assert_eq!(decoded, vec![0x00; 9]);
    }

    #[test]
    fn encoder_emits_clear_to_end_for_all_white_row() {
        // Spec example: an all-white 600-byte grayscale scanline compresses
        // (after the row-repeat byte, added one layer up by the writer) to
        // exactly `[0x00, 0x80]` — one repeat, then clear-to-end.
        let line = vec![0xffu8; 600];
        let mut out = Vec::new();
        encode_line(&line, 1, Some(&[0xff]), &mut out);
        assert_eq!(out, vec![0x80]);
    }

    #[test]
    fn clear_to_end_not_used_when_remainder_is_not_uniform() {
        let mut line = vec![0xffu8; 600];
        line[599] = 0x00;
        let mut out = Vec::new();
        encode_line(&line, 1, Some(&[0xff]), &mut out);
        assert!(!out.contains(&128));
        let decoded = decode_vec(&out, 1, line.len(), true);
        assert_eq!(decoded, line);
    }

    #[test]
    fn truncated_repeat_opcode_is_an_overrun() {
        let mut iter = [0u8].iter().copied();
        let mut out = vec![0u8; 4];
        let result = decode_line(
            || iter.next().ok_or(RasterError::UnexpectedEof),
            4,
            4,
            false,
            &mut out,
        );
        assert!(result.is_err());
    }
}
