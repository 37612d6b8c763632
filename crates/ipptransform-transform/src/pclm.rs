// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PCLm driver (§4.3, §6): a restricted PDF container holding one or more
// FlateDecode-compressed image strips per page instead of a free-form
// content stream. Built by hand from `lopdf` types, the same way
// `ipptransform-document`'s `pdf::writer::PdfBuilder` builds its own output
// PDFs — this crate has no dependency on that one, so the construction is
// duplicated in miniature rather than shared.

use std::io::Write as _;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use ipptransform_core::PrintOptions;

use crate::color::{pack_row, resolve_format, RasterFormat};
use crate::dither::BayerMatrix;
use crate::error::Result;
use crate::render::rasterize_page;

/// Strip height in device rows, resolved from `IPP_PCLM_STRIP_HEIGHT_PREFERRED`
/// (clamped to PCLm's allowed 16..=256 range, default 16 per §6).
pub fn strip_height_from_env() -> u32 {
    std::env::var("IPP_PCLM_STRIP_HEIGHT_PREFERRED")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .map(|v| v.clamp(16, 256))
        .unwrap_or(16)
}

/// Renders `pdf_bytes` into a PCLm document: one PDF page per input page,
/// each page's content drawing a stack of Flate-compressed image strips.
pub fn render_pclm(pdf_bytes: &[u8], page_count: u32, opts: &PrintOptions, strip_height: u32) -> Result<Vec<u8>> {
    let format = resolve_format(opts.print_color_mode, opts.quality, &[]);
    let dither = BayerMatrix::new();
    let xdpi = opts.resolution.x_dpi;
    let ydpi = opts.resolution.y_dpi;
    let (page_w_pt, page_h_pt) = opts.media.page_points();

    let mut document = Document::with_version("1.7");
    let pages_id = document.new_object_id();
    let mut page_ids = Vec::new();

    for page_number in 1..=page_count {
        let rendered = rasterize_page(pdf_bytes, page_number, xdpi, ydpi, !format.is_color())?;
        let page_id = build_page(
            &mut document,
            pages_id,
            page_w_pt,
            page_h_pt,
            xdpi,
            ydpi,
            format,
            &dither,
            &rendered,
            strip_height,
        )?;
        page_ids.push(page_id);
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Kids", Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()));
    pages.set("Count", Object::Integer(page_ids.len() as i64));
    document.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    // PCLm viewers key off this marker in `/Extensions` to distinguish a
    // PCLm document from a general-purpose PDF (§6).
    let mut pclm_ext = Dictionary::new();
    pclm_ext.set("BaseVersion", Object::Name(b"1.7".to_vec()));
    pclm_ext.set("ExtensionLevel", Object::Integer(3));
    let mut extensions = Dictionary::new();
    extensions.set("PCLm", Object::Dictionary(pclm_ext));
    catalog.set("Extensions", Object::Dictionary(extensions));
    let catalog_id = document.add_object(catalog);
    document.trailer.set("Root", Object::Reference(catalog_id));
    document.max_id = document.objects.len() as u32;

    let mut out = Vec::new();
    document.save_to(&mut out)?;
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn build_page(
    document: &mut Document,
    pages_id: ObjectId,
    page_w_pt: f64,
    page_h_pt: f64,
    xdpi: u32,
    ydpi: u32,
    format: RasterFormat,
    dither: &BayerMatrix,
    rendered: &crate::render::RenderedPage,
    strip_height: u32,
) -> Result<ObjectId> {
    let mut content = Vec::new();
    let mut xobject_names = Vec::new();
    let mut y = 0u32;
    let mut strip_index = 0usize;

    while y < rendered.height {
        let rows_in_strip = strip_height.min(rendered.height - y);
        let strip_id = embed_strip(document, format, dither, rendered, y, rows_in_strip)?;
        let name = format!("Im{strip_index}");

        // PDF image space is bottom-up; strip `y` is measured from the top
        // of the page, so the placement origin is the page height minus the
        // strip's bottom edge in points.
        let strip_h_pt = rows_in_strip as f64 * 72.0 / ydpi as f64;
        let strip_w_pt = rendered.width as f64 * 72.0 / xdpi as f64;
        let top_pt = page_h_pt - (y as f64 * 72.0 / ydpi as f64);
        let origin_y = top_pt - strip_h_pt;

        content.extend_from_slice(
            format!("q {strip_w_pt} 0 0 {strip_h_pt} 0 {origin_y} cm /{name} Do Q\n").as_bytes(),
        );
        xobject_names.push((name, strip_id));

        y += rows_in_strip;
        strip_index += 1;
    }

    let mut resources = Dictionary::new();
    let mut xobjects = Dictionary::new();
    for (name, id) in &xobject_names {
        xobjects.set(name.as_str(), Object::Reference(*id));
    }
    resources.set("XObject", Object::Dictionary(xobjects));
    let resources_id = document.add_object(resources);

    let content_id = document.add_object(Stream::new(Dictionary::new(), content));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set("MediaBox", Object::Array(vec![0.into(), 0.into(), page_w_pt.into(), page_h_pt.into()]));
    page.set("Resources", Object::Reference(resources_id));
    page.set("Contents", Object::Reference(content_id));
    Ok(document.add_object(page))
}

fn embed_strip(
    document: &mut Document,
    format: RasterFormat,
    dither: &BayerMatrix,
    rendered: &crate::render::RenderedPage,
    first_row: u32,
    row_count: u32,
) -> Result<ObjectId> {
    let mut raw = Vec::new();
    for y in first_row..first_row + row_count {
        raw.extend(pack_row(format, rendered, y, dither));
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    let compressed = encoder.finish()?;

    let (color_space, bits_per_component): (&[u8], i64) = match format {
        RasterFormat::Black1 | RasterFormat::Sgray1 => (b"DeviceGray", 1),
        RasterFormat::Cmyk8 => (b"DeviceCMYK", 8),
        RasterFormat::Black8 | RasterFormat::Sgray8 => (b"DeviceGray", 8),
        _ => (b"DeviceRGB", if format.bits_per_color() == 16 { 16 } else { 8 }),
    };

    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(rendered.width as i64));
    dict.set("Height", Object::Integer(row_count as i64));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(bits_per_component));
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    Ok(document.add_object(Stream::new(dict, compressed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_height_env_clamps_to_allowed_range() {
        std::env::remove_var("IPP_PCLM_STRIP_HEIGHT_PREFERRED");
        assert_eq!(strip_height_from_env(), 16);

        std::env::set_var("IPP_PCLM_STRIP_HEIGHT_PREFERRED", "1000");
        assert_eq!(strip_height_from_env(), 256);

        std::env::set_var("IPP_PCLM_STRIP_HEIGHT_PREFERRED", "4");
        assert_eq!(strip_height_from_env(), 16);

        std::env::set_var("IPP_PCLM_STRIP_HEIGHT_PREFERRED", "64");
        assert_eq!(strip_height_from_env(), 64);
        std::env::remove_var("IPP_PCLM_STRIP_HEIGHT_PREFERRED");
    }
}
