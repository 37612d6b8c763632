//! Writes a raster stream: sync word, then for each page a header and its
//! compressed rows.
//!
//! Consecutive identical rows are coalesced into a single compressed
//! representation with a leading repeat count, exactly as
//! `cupsRasterWritePixels` does — a row group is flushed either when a
//! different row arrives or when the 256-row repeat-count ceiling is hit.

use crate::error::{RasterError, Result};
use crate::header::RasterHeader;
use crate::packbits;
use crate::sync::{ByteOrder, SyncWord};
use std::io::Write;

/// Which raster dialect to produce. Only `Pwg` forces network byte order;
/// `Cups` dialects use the running process's host byte order, matching
/// `cupsRasterOpen`'s behavior for non-PWG write modes. `Apple` carries the
/// two values its 8-byte stream preamble and 32-byte packed page headers
/// need up front: the total page count (the preamble is written once,
/// before the first page, so it cannot be learned incrementally) and the
/// print quality to stamp into every page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Pwg,
    Cups(SyncWord),
    Apple { page_count: u32, print_quality: u32 },
}

impl Dialect {
    fn sync_word(self) -> SyncWord {
        match self {
            Dialect::Pwg => SyncWord::V2,
            Dialect::Cups(word) => word,
            Dialect::Apple { .. } => SyncWord::Apple,
        }
    }

    fn byte_order(self) -> ByteOrder {
        match self {
            Dialect::Pwg => ByteOrder::BigEndian,
            Dialect::Cups(_) => ByteOrder::host(),
            Dialect::Apple { .. } => ByteOrder::BigEndian,
        }
    }
}

pub struct RasterWriter<W: Write> {
    sink: W,
    dialect: Dialect,
    wrote_sync: bool,
    bpp: usize,
    bytes_per_line: usize,
    rows_remaining: u32,
    clears_to_white: bool,
    pending: Option<(Vec<u8>, u32)>,
    last_error: crate::error::LastError,
}

impl<W: Write> RasterWriter<W> {
    pub fn new(sink: W, dialect: Dialect) -> Self {
        RasterWriter {
            sink,
            dialect,
            wrote_sync: false,
            bpp: 0,
            bytes_per_line: 0,
            rows_remaining: 0,
            clears_to_white: false,
            pending: None,
            last_error: crate::error::LastError::new(),
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.get()
    }

    fn fail(&self, err: RasterError) -> RasterError {
        self.last_error.record(&err);
        err
    }

    /// Begin a new page: flushes any pending row group from the previous
    /// page, then writes the sync word (first call only) and the header.
    pub fn write_header(&mut self, header: &RasterHeader) -> Result<()> {
        self.flush_pending()?;

        if !self.wrote_sync {
            let bytes = self.dialect.sync_word().encode(self.dialect.byte_order());
            self.sink.write_all(&bytes).map_err(RasterError::from)?;
            if let Dialect::Apple { page_count, .. } = self.dialect {
                let preamble = crate::apple::stream_preamble(page_count);
                self.sink.write_all(&preamble).map_err(RasterError::from)?;
            }
            self.wrote_sync = true;
        }

        match self.dialect {
            Dialect::Apple { print_quality, .. } => {
                let packed = crate::apple::pack_page_header(header, print_quality);
                self.sink.write_all(&packed).map_err(RasterError::from)?;
            }
            Dialect::Pwg => {
                let normalized = header.normalized_for_pwg();
                let mut buf = Vec::new();
                normalized.write_to(self.dialect.byte_order(), &mut buf);
                self.sink.write_all(&buf).map_err(RasterError::from)?;
            }
            Dialect::Cups(_) => {
                let mut buf = Vec::new();
                header.write_to(self.dialect.byte_order(), &mut buf);
                self.sink.write_all(&buf).map_err(RasterError::from)?;
            }
        }

        self.bpp = header.bytes_per_pixel() as usize;
        self.bytes_per_line = header.bytes_per_line as usize;
        self.rows_remaining = header.height;
        self.clears_to_white = header.color_space.clears_to_white();
        Ok(())
    }

    /// Write one row of raw (uncompressed) pixel data, `bytes_per_line`
    /// bytes long.
    pub fn write_row(&mut self, row: &[u8]) -> Result<()> {
        if row.len() != self.bytes_per_line {
            return Err(self.fail(RasterError::MalformedHeader(format!(
                "row is {} bytes, expected {}",
                row.len(),
                self.bytes_per_line
            ))));
        }
        if self.rows_remaining == 0 {
            return Err(self.fail(RasterError::MalformedHeader(
                "wrote more rows than the page header's height declares".into(),
            )));
        }

        match &mut self.pending {
            Some((buffered, count)) if buffered.as_slice() == row && *count < 256 => {
                *count += 1;
            }
            _ => {
                self.flush_pending()?;
                self.pending = Some((row.to_vec(), 1));
            }
        }
        self.rows_remaining -= 1;
        Ok(())
    }

    fn flush_pending(&mut self) -> Result<()> {
        let Some((row, count)) = self.pending.take() else {
            return Ok(());
        };
        let mut out = Vec::with_capacity(row.len() / 2 + 2);
        out.push((count - 1) as u8);
        let fill_byte = if self.clears_to_white { 0xff } else { 0x00 };
        let fill_pixel = vec![fill_byte; self.bpp];
        packbits::encode_line(&row, self.bpp, Some(&fill_pixel), &mut out);
        self.sink.write_all(&out).map_err(RasterError::from)?;
        Ok(())
    }

    /// Flush the final pending row group and the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.flush_pending()?;
        self.sink.flush().map_err(RasterError::from)?;
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ColorSpace;

    #[test]
    fn writes_sync_word_once_across_multiple_pages() {
        let mut h = RasterHeader::for_media(72, 72, 72, 72, ColorSpace::Gray, 8);
        h.width = 2;
        h.height = 2;
        h.bytes_per_line = 2;

        let mut w = RasterWriter::new(Vec::new(), Dialect::Pwg);
        w.write_header(&h).unwrap();
        w.write_row(&[0, 0]).unwrap();
        w.write_row(&[0, 0]).unwrap();
        w.write_header(&h).unwrap();
        w.write_row(&[1, 1]).unwrap();
        w.write_row(&[1, 1]).unwrap();
        let out = w.finish().unwrap();

        let sync = &out[0..4];
        assert_eq!(sync, SyncWord::V2.encode(ByteOrder::BigEndian));
        // Second header starts at sync(4) + header(WIRE_SIZE) + page1 rows.
        let header_end = 4 + crate::header::WIRE_SIZE;
        assert!(out.len() > header_end);
    }

    #[test]
    fn all_white_row_compresses_to_repeat_plus_clear_to_end() {
        // Spec §8 scenario 4: an all-white 600-byte 8-bit grayscale scanline
        // compresses to exactly `[0x00, 0x80]`.
        let mut h = RasterHeader::for_media(72, 72, 72, 72, ColorSpace::Gray, 8);
        h.width = 600;
        h.height = 1;
        h.bytes_per_line = 600;

        let mut w = RasterWriter::new(Vec::new(), Dialect::Pwg);
        w.write_header(&h).unwrap();
        w.write_row(&[0xffu8; 600]).unwrap();
        let out = w.finish().unwrap();

        let body = &out[4 + crate::header::WIRE_SIZE..];
        assert_eq!(body, &[0x00, 0x80]);
    }

    #[test]
    fn coalesces_identical_consecutive_rows() {
        let mut h = RasterHeader::for_media(72, 72, 72, 72, ColorSpace::Gray, 8);
        h.width = 4;
        h.height = 3;
        h.bytes_per_line = 4;

        let mut w = RasterWriter::new(Vec::new(), Dialect::Pwg);
        w.write_header(&h).unwrap();
        w.write_row(&[9, 9, 9, 9]).unwrap();
        w.write_row(&[9, 9, 9, 9]).unwrap();
        w.write_row(&[9, 9, 9, 9]).unwrap();
        let out = w.finish().unwrap();

        let body = &out[4 + crate::header::WIRE_SIZE..];
        // One row-group leading byte (count-1 = 2) then the packbits line.
        assert_eq!(body[0], 2);
    }

    #[test]
    fn pwg_dialect_normalizes_header_before_writing() {
        let mut h = RasterHeader::for_media(72, 72, 72, 72, ColorSpace::Gray, 8);
        h.width = 1;
        h.height = 1;
        h.bytes_per_line = 1;
        h.row_count = 99;

        let mut w = RasterWriter::new(Vec::new(), Dialect::Pwg);
        w.write_header(&h).unwrap();
        w.write_row(&[0]).unwrap();
        let out = w.finish().unwrap();

        let header_bytes = &out[4..4 + crate::header::WIRE_SIZE];
        let parsed = RasterHeader::read_from(ByteOrder::BigEndian, header_bytes).unwrap();
        assert_eq!(parsed.row_count, 0);
        assert_eq!(
            parsed.vendor_integer[crate::header::pwg_integer::ALTERNATE_PRIMARY],
            0xFFFFFF
        );
    }

    #[test]
    fn apple_dialect_writes_preamble_and_packed_header_not_full_header() {
        let mut h = RasterHeader::for_media(72, 72, 72, 72, ColorSpace::Gray, 8);
        h.width = 1;
        h.height = 1;
        h.bytes_per_line = 1;

        let mut w = RasterWriter::new(
            Vec::new(),
            Dialect::Apple {
                page_count: 1,
                print_quality: 4,
            },
        );
        w.write_header(&h).unwrap();
        w.write_row(&[0]).unwrap();
        let out = w.finish().unwrap();

        // sync(4) + preamble(8) + packed header(32) + row-group(1 count byte + data)
        // is far smaller than sync(4) + full v2 header(WIRE_SIZE).
        assert!(out.len() < 4 + crate::header::WIRE_SIZE);
        assert_eq!(&out[4..8], &crate::apple::stream_preamble(1));
    }

    #[test]
    fn rejects_wrong_length_row() {
        let mut h = RasterHeader::for_media(72, 72, 72, 72, ColorSpace::Gray, 8);
        h.width = 4;
        h.height = 1;
        h.bytes_per_line = 4;
        let mut w = RasterWriter::new(Vec::new(), Dialect::Pwg);
        w.write_header(&h).unwrap();
        assert!(w.write_row(&[1, 2, 3]).is_err());
    }
}
