// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Building PDF output directly in `lopdf` terms: the per-input wrapper
// pages `convert` produces for image/text input documents, and the
// composed N-up/booklet output pages `prepare` assembles from them.
// `printpdf`'s page-level API can't do the resource-merge + content-stream
// rewrite composition §4.2 needs, so every page here is built by hand from
// `lopdf::Dictionary`/`Object`/`Stream`.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{PrepError, Result};
use crate::image::EmbeddedImage;

/// Builds a fresh output PDF one page at a time, finishing with a single
/// linear `/Pages` tree.
pub struct PdfBuilder {
    document: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            page_ids: Vec::new(),
        }
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Append a page of `width`x`height` points with the given `/Resources`
    /// and content-stream bytes. Returns the new page's object id.
    pub fn add_page(&mut self, width: f64, height: f64, resources: Dictionary, content: Vec<u8>) -> ObjectId {
        let content_id = self.document.add_object(Stream::new(Dictionary::new(), content));
        let resources_id = self.document.add_object(resources);

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(self.pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), width.into(), height.into()]),
        );
        page.set("Resources", Object::Reference(resources_id));
        page.set("Contents", Object::Reference(content_id));

        let page_id = self.document.add_object(page);
        self.page_ids.push(page_id);
        page_id
    }

    pub fn add_blank_page(&mut self, width: f64, height: f64) -> ObjectId {
        self.add_page(width, height, Dictionary::new(), Vec::new())
    }

    /// Embed a decoded image as an XObject stream (and its `/SMask` alpha
    /// stream, if present). Returns the XObject's object id; the caller
    /// places it under whatever `/XObject` resource name it chooses.
    pub fn embed_image(&mut self, image: &EmbeddedImage) -> ObjectId {
        let smask_id = image.smask.as_ref().map(|data| self.embed_gray_mask(image.width, image.height, data));

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(image.width as i64));
        dict.set("Height", Object::Integer(image.height as i64));
        dict.set("ColorSpace", Object::Name(image.color_space.as_bytes().to_vec()));
        dict.set("BitsPerComponent", Object::Integer(image.bits_per_component as i64));
        dict.set("Filter", Object::Name(image.filter.as_bytes().to_vec()));
        if let Some(smask_id) = smask_id {
            dict.set("SMask", Object::Reference(smask_id));
        }
        self.document.add_object(Stream::new(dict, image.data.clone()))
    }

    fn embed_gray_mask(&mut self, width: u32, height: u32, data: &[u8]) -> ObjectId {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(width as i64));
        dict.set("Height", Object::Integer(height as i64));
        dict.set("ColorSpace", Object::Name(b"DeviceGray".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        self.document.add_object(Stream::new(dict, data.to_vec()))
    }

    /// Register the base-14 Courier font used for plain-text rendering and
    /// banner/error sheets (§4.2), returning its object id. No embedding is
    /// needed — Courier is a standard PDF font.
    pub fn courier_font(&mut self) -> ObjectId {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Font".to_vec()));
        dict.set("Subtype", Object::Name(b"Type1".to_vec()));
        dict.set("BaseFont", Object::Name(b"Courier".to_vec()));
        dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        self.document.add_object(dict)
    }

    /// Finalize the `/Pages` tree and catalog, and serialize to bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set(
            "Kids",
            Object::Array(self.page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        );
        pages.set("Count", Object::Integer(self.page_ids.len() as i64));
        self.document.objects.insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.document.add_object(catalog);
        self.document.trailer.set("Root", Object::Reference(catalog_id));
        self.document.max_id = self.document.objects.len() as u32;

        let mut out = Vec::new();
        self.document.save_to(&mut out).map_err(PrepError::Pdf)?;
        Ok(out)
    }
}

/// Content-stream bytes placing an image XObject named `name` via the
/// six-operand `cm` matrix `[a b c d e f]` (§4.2 scaling/rotation/position).
pub fn image_draw_content(name: &str, matrix: [f64; 6]) -> Vec<u8> {
    format!(
        "q {} {} {} {} {} {} cm /{name} Do Q\n",
        matrix[0], matrix[1], matrix[2], matrix[3], matrix[4], matrix[5]
    )
    .into_bytes()
}

/// Content-stream bytes for one page of monospaced text: `BT`/`ET` text
/// object, `leading`-pt line spacing via `TL`/`T*`, starting at
/// `(origin_x, origin_y)` in PDF points (top-left of the first line's
/// baseline).
pub fn text_page_content(lines: &[String], font_name: &str, font_size: f64, leading: f64, origin_x: f64, origin_y: f64) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"BT\n");
    out.extend_from_slice(format!("/{font_name} {font_size} Tf\n").as_bytes());
    out.extend_from_slice(format!("{leading} TL\n").as_bytes());
    out.extend_from_slice(format!("{origin_x} {origin_y} Td\n").as_bytes());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(b"T*\n");
        }
        out.push(b'(');
        out.extend_from_slice(escape_pdf_string(line).as_bytes());
        out.extend_from_slice(b") Tj\n");
    }
    out.extend_from_slice(b"ET\n");
    out
}

/// Content-stream bytes drawing one N-up/booklet cell: clip to the cell
/// rectangle, apply the placement matrix, then splice in the already
/// remapped cell content (§4.2 `save / clip / matrix / copy-content /
/// restore`).
pub fn cell_draw_content(clip: (f64, f64, f64, f64), matrix: [f64; 6], cell_content: &[u8]) -> Vec<u8> {
    let (x1, y1, x2, y2) = clip;
    let mut out = Vec::new();
    out.extend_from_slice(b"q\n");
    out.extend_from_slice(format!("{x1} {y1} {} {} re W n\n", x2 - x1, y2 - y1).as_bytes());
    out.extend_from_slice(
        format!("{} {} {} {} {} {} cm\n", matrix[0], matrix[1], matrix[2], matrix[3], matrix[4], matrix[5]).as_bytes(),
    );
    out.extend_from_slice(cell_content);
    out.extend_from_slice(b"\nQ\n");
    out
}

fn escape_pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_a_loadable_document() {
        let mut builder = PdfBuilder::new();
        builder.add_blank_page(612.0, 792.0);
        let bytes = builder.finish().unwrap();
        let doc = crate::pdf::reader::from_bytes(&bytes).unwrap();
        assert_eq!(crate::pdf::reader::page_count(&doc), 1);
    }

    #[test]
    fn escape_handles_parens_and_backslash() {
        assert_eq!(escape_pdf_string("a(b)c\\d"), "a\\(b\\)c\\\\d");
    }
}
