//! Reads a raster stream written by [`crate::writer::RasterWriter`] (or any
//! compliant CUPS/PWG raster producer): sync word once, then per-page header
//! and compressed rows.

use crate::error::{RasterError, Result};
use crate::header::{ColorSpace, RasterHeader};
use crate::packbits;
use crate::sync::{ByteOrder, SyncWord};
use std::io::Read;

pub struct RasterReader<R: Read> {
    source: R,
    byte_order: Option<ByteOrder>,
    sync_word: Option<SyncWord>,
    bpp: usize,
    bytes_per_line: usize,
    rows_remaining: u32,
    current_group: Option<(Vec<u8>, u32)>,
    last_error: crate::error::LastError,
}

impl<R: Read> RasterReader<R> {
    pub fn new(source: R) -> Self {
        RasterReader {
            source,
            byte_order: None,
            sync_word: None,
            bpp: 0,
            bytes_per_line: 0,
            rows_remaining: 0,
            current_group: None,
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

    fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.source
            .read_exact(&mut b)
            .map_err(|e| self.fail(RasterError::from(e)))?;
        Ok(b[0])
    }

    /// Read the next page header. On the first call this also consumes and
    /// validates the stream's 4-byte sync word, fixing the byte order and
    /// dialect for every header that follows (a raster stream never changes
    /// dialect mid-stream). For Apple Raster this also consumes the 8-byte
    /// `AST\0<page-count>` preamble that immediately follows the sync word.
    pub fn read_header(&mut self) -> Result<RasterHeader> {
        if self.byte_order.is_none() {
            let mut sync = [0u8; 4];
            self.source
                .read_exact(&mut sync)
                .map_err(|e| self.fail(RasterError::from(e)))?;
            let (word, order) = SyncWord::decode(u32::from_be_bytes(sync))
                .map_err(|e| self.fail(e))?;
            self.byte_order = Some(order);
            self.sync_word = Some(word);

            if word == SyncWord::Apple {
                let mut preamble = [0u8; 8];
                self.source
                    .read_exact(&mut preamble)
                    .map_err(|e| self.fail(RasterError::from(e)))?;
            }
        }
        let order = self.byte_order.expect("set above");

        let header = if self.sync_word == Some(SyncWord::Apple) {
            let mut buf = [0u8; 32];
            self.source
                .read_exact(&mut buf)
                .map_err(|e| self.fail(RasterError::from(e)))?;
            crate::apple::unpack_page_header(&buf)
        } else {
            let mut buf = vec![0u8; crate::header::WIRE_SIZE];
            self.source
                .read_exact(&mut buf)
                .map_err(|e| self.fail(RasterError::from(e)))?;
            RasterHeader::read_from(order, &buf).map_err(|e| self.fail(e))?
        };

        self.bpp = header.bytes_per_pixel() as usize;
        self.bytes_per_line = header.bytes_per_line as usize;
        self.rows_remaining = header.height;
        self.current_group = None;
        Ok(header)
    }

    /// Read one row of raw pixel data into `out` (must be `bytes_per_line`
    /// bytes), expanding the current repeat-count group as needed and
    /// decoding a fresh group from the stream once it's exhausted.
    pub fn read_row(&mut self, color_space: ColorSpace, out: &mut [u8]) -> Result<()> {
        if out.len() != self.bytes_per_line {
            return Err(self.fail(RasterError::MalformedHeader(format!(
                "row buffer is {} bytes, expected {}",
                out.len(),
                self.bytes_per_line
            ))));
        }
        if self.rows_remaining == 0 {
            return Err(self.fail(RasterError::UnexpectedEof));
        }

        if self.current_group.is_none() {
            let count_byte = self.read_u8()?;
            let count = count_byte as u32 + 1;
            let bpp = self.bpp;
            let bytes_per_line = self.bytes_per_line;
            let fill_ff = color_space.clears_to_white();
            let mut line = vec![0u8; bytes_per_line];
            {
                let source = &mut self.source;
                packbits::decode_line(
                    || {
                        let mut b = [0u8; 1];
                        source.read_exact(&mut b).map_err(RasterError::from)?;
                        Ok(b[0])
                    },
                    bpp,
                    bytes_per_line,
                    fill_ff,
                    &mut line,
                )?;
            }
            self.current_group = Some((line, count));
        }

        let (line, remaining) = self.current_group.as_mut().expect("set above");
        out.copy_from_slice(line);
        *remaining -= 1;
        if *remaining == 0 {
            self.current_group = None;
        }
        self.rows_remaining -= 1;
        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ColorSpace;
    use crate::writer::{Dialect, RasterWriter};

    #[test]
    fn round_trips_a_small_page() {
        let mut h = RasterHeader::for_media(72, 72, 72, 72, ColorSpace::Gray, 8);
        h.width = 4;
        h.height = 3;
        h.bytes_per_line = 4;

        let rows: [[u8; 4]; 3] = [[1, 2, 3, 4], [1, 2, 3, 4], [9, 9, 9, 9]];

        let mut w = RasterWriter::new(Vec::new(), Dialect::Pwg);
        w.write_header(&h).unwrap();
        for row in &rows {
            w.write_row(row).unwrap();
        }
        let bytes = w.finish().unwrap();

        let mut r = RasterReader::new(bytes.as_slice());
        let parsed = r.read_header().unwrap();
        assert_eq!(parsed.width, h.width);
        assert_eq!(parsed.height, h.height);

        let mut buf = [0u8; 4];
        for row in &rows {
            r.read_row(ColorSpace::Gray, &mut buf).unwrap();
            assert_eq!(&buf, row);
        }
    }

    #[test]
    fn round_trips_multiple_pages_with_one_sync_word() {
        let mut h = RasterHeader::for_media(72, 72, 72, 72, ColorSpace::Gray, 8);
        h.width = 2;
        h.height = 1;
        h.bytes_per_line = 2;

        let mut w = RasterWriter::new(Vec::new(), Dialect::Pwg);
        w.write_header(&h).unwrap();
        w.write_row(&[5, 5]).unwrap();
        w.write_header(&h).unwrap();
        w.write_row(&[7, 7]).unwrap();
        let bytes = w.finish().unwrap();

        let mut r = RasterReader::new(bytes.as_slice());
        r.read_header().unwrap();
        let mut buf = [0u8; 2];
        r.read_row(ColorSpace::Gray, &mut buf).unwrap();
        assert_eq!(buf, [5, 5]);

        r.read_header().unwrap();
        r.read_row(ColorSpace::Gray, &mut buf).unwrap();
        assert_eq!(buf, [7, 7]);
    }

    #[test]
    fn round_trips_apple_dialect_with_packed_headers() {
        let mut h = RasterHeader::for_media(72, 72, 72, 72, ColorSpace::Gray, 8);
        h.width = 2;
        h.height = 2;
        h.bytes_per_line = 2;

        let mut w = RasterWriter::new(
            Vec::new(),
            Dialect::Apple {
                page_count: 1,
                print_quality: 4,
            },
        );
        w.write_header(&h).unwrap();
        w.write_row(&[3, 3]).unwrap();
        w.write_row(&[3, 3]).unwrap();
        let bytes = w.finish().unwrap();

        // sync(4) + preamble(8) + packed header(32), no 1796-byte v2 header.
        assert_eq!(&bytes[0..4], &SyncWord::APPLE_BE.to_be_bytes());
        assert_eq!(&bytes[4..7], b"AST");

        let mut r = RasterReader::new(bytes.as_slice());
        let parsed = r.read_header().unwrap();
        assert_eq!(parsed.width, 2);
        assert_eq!(parsed.height, 2);
        assert_eq!(parsed.media_class, "PwgRaster");

        let mut buf = [0u8; 2];
        r.read_row(ColorSpace::Gray, &mut buf).unwrap();
        assert_eq!(buf, [3, 3]);
        r.read_row(ColorSpace::Gray, &mut buf).unwrap();
        assert_eq!(buf, [3, 3]);
    }
}
