//! Apple Raster (URF)'s 32-byte packed per-page header, plus the 8-byte
//! `AST\0<page-count>` stream preamble that precedes the first page.
//!
//! Unlike the CUPS/PWG header, this is always written in network byte order
//! and packs most fields into single bytes rather than `u32`s.

use crate::header::{ColorSpace, RasterHeader};

pub const MEDIA_TYPES: &[&str] = &[
    "auto",
    "stationery",
    "transparency",
    "envelope",
    "cardstock",
    "labels",
    "stationery-letterhead",
    "disc",
    "photographic-matte",
    "photographic-satin",
    "photographic-semi-gloss",
    "photographic-glossy",
    "photographic-high-gloss",
    "other",
];

/// Duplex/tumble byte at offset 2 of the packed header.
fn duplex_byte(duplex: bool, tumble: bool) -> u8 {
    if !duplex {
        1
    } else if tumble {
        2
    } else {
        3
    }
}

/// `appleheader[1]`: a small enum of the colorspaces Apple Raster names.
fn colorspace_byte(cs: ColorSpace) -> u8 {
    match cs {
        ColorSpace::Srgb => 1,
        ColorSpace::Other(16) => 2, // CIELab
        ColorSpace::AdobeRgb => 3,
        ColorSpace::Gray => 4,
        ColorSpace::Rgb => 5,
        ColorSpace::Cmyk => 6,
        _ => 0,
    }
}

fn media_type_index(media_type: &str) -> u8 {
    MEDIA_TYPES
        .iter()
        .position(|&m| m == media_type)
        .unwrap_or(0) as u8
}

/// Pack one page header into the fixed 32-byte Apple Raster form.
pub fn pack_page_header(h: &RasterHeader, print_quality: u32) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[0] = h.bits_per_pixel as u8;
    out[1] = colorspace_byte(h.color_space);
    out[2] = duplex_byte(h.duplex, h.tumble);
    out[3] = print_quality as u8;
    out[4] = media_type_index(&h.media_type);
    out[5] = h.media_position as u8;
    out[12..16].copy_from_slice(&h.width.to_be_bytes());
    out[16..20].copy_from_slice(&h.height.to_be_bytes());
    out[20..24].copy_from_slice(&h.resolution.cross_feed.to_be_bytes());
    out
}

/// The 8-byte `AST\0<page-count>` stream preamble written once, before the
/// first page, when the total page count is already known.
pub fn stream_preamble(page_count: u32) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[0] = b'A';
    out[1] = b'S';
    out[2] = b'T';
    out[3] = 0;
    out[4..8].copy_from_slice(&page_count.to_be_bytes());
    out
}

/// Reads the `<page-count>` back out of an 8-byte stream preamble.
pub fn read_preamble(buf: &[u8; 8]) -> u32 {
    u32::from_be_bytes(buf[4..8].try_into().unwrap())
}

fn colorspace_from_byte(b: u8) -> ColorSpace {
    match b {
        1 => ColorSpace::Srgb,
        2 => ColorSpace::Other(16), // CIELab
        3 => ColorSpace::AdobeRgb,
        4 => ColorSpace::Gray,
        5 => ColorSpace::Rgb,
        6 => ColorSpace::Cmyk,
        _ => ColorSpace::Other(0),
    }
}

fn duplex_tumble_from_byte(b: u8) -> (bool, bool) {
    match b {
        2 => (true, true),
        3 => (true, false),
        _ => (false, false),
    }
}

/// Synthesize a full [`RasterHeader`] from a 32-byte packed Apple Raster
/// page header. Fields the packed form doesn't carry (margins, PWG vendor
/// integers, and so on) are left at their defaults; `media_class` is set to
/// `"PwgRaster"` since Apple Raster has no on-wire media-class field and
/// nothing downstream branches on it for this dialect.
pub fn unpack_page_header(buf: &[u8; 32]) -> RasterHeader {
    let bits_per_pixel = buf[0] as u32;
    let color_space = colorspace_from_byte(buf[1]);
    let (duplex, tumble) = duplex_tumble_from_byte(buf[2]);
    let media_type = MEDIA_TYPES
        .get(buf[4] as usize)
        .copied()
        .unwrap_or("other")
        .to_string();
    let media_position = buf[5] as u32;
    let width = u32::from_be_bytes(buf[12..16].try_into().unwrap());
    let height = u32::from_be_bytes(buf[16..20].try_into().unwrap());
    let cross_feed = u32::from_be_bytes(buf[20..24].try_into().unwrap());

    let num_colors = color_space.num_colors(bits_per_pixel);
    let bits_per_color = if num_colors > 0 {
        bits_per_pixel / num_colors
    } else {
        bits_per_pixel
    };
    let bytes_per_line = (width as u64 * bits_per_pixel as u64).div_ceil(8) as u32;

    RasterHeader {
        media_class: "PwgRaster".to_string(),
        media_type,
        duplex,
        tumble,
        media_position,
        resolution: crate::header::Resolution {
            cross_feed,
            feed: cross_feed,
        },
        width,
        height,
        bits_per_color,
        bits_per_pixel,
        bytes_per_line,
        color_space,
        num_colors_field: num_colors,
        ..RasterHeader::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ColorSpace;

    #[test]
    fn packs_width_height_resolution_as_big_endian() {
        let h = RasterHeader::for_media(612, 792, 300, 300, ColorSpace::Srgb, 8);
        let packed = pack_page_header(&h, 4);
        assert_eq!(u32::from_be_bytes(packed[12..16].try_into().unwrap()), h.width);
        assert_eq!(u32::from_be_bytes(packed[16..20].try_into().unwrap()), h.height);
        assert_eq!(packed[1], 1); // sRGB
    }

    #[test]
    fn duplex_tumble_encodes_to_distinct_bytes() {
        assert_eq!(duplex_byte(false, false), 1);
        assert_eq!(duplex_byte(true, false), 3);
        assert_eq!(duplex_byte(true, true), 2);
    }

    #[test]
    fn preamble_carries_page_count_big_endian() {
        let p = stream_preamble(42);
        assert_eq!(&p[..4], b"AST\0");
        assert_eq!(u32::from_be_bytes(p[4..8].try_into().unwrap()), 42);
        assert_eq!(read_preamble(&p), 42);
    }

    #[test]
    fn unpack_round_trips_dimensions_and_colorspace() {
        let mut h = RasterHeader::for_media(612, 792, 300, 300, ColorSpace::Srgb, 8);
        h.media_type = "stationery".into();
        let packed = pack_page_header(&h, 4);
        let unpacked = unpack_page_header(&packed);
        assert_eq!(unpacked.width, h.width);
        assert_eq!(unpacked.height, h.height);
        assert_eq!(unpacked.resolution.cross_feed, h.resolution.cross_feed);
        assert_eq!(unpacked.color_space, ColorSpace::Srgb);
        assert_eq!(unpacked.media_type, "stationery");
        assert_eq!(unpacked.media_class, "PwgRaster");
    }

    #[test]
    fn unpack_falls_back_to_other_for_unknown_media_type_index() {
        let mut buf = [0u8; 32];
        buf[4] = 255;
        let unpacked = unpack_page_header(&buf);
        assert_eq!(unpacked.media_type, "other");
    }
}
