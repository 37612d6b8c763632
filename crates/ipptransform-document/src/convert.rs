// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-input-document conversion (§4.2): PDF input is used directly; JPEG
// and PNG are wrapped in a one-page PDF sized to `media` with rotation,
// scaling, and placement computed per the print options; plain text is
// rendered as monospaced pages.

use std::fs;
use std::path::Path;

use lopdf::{Dictionary, Object};
use tracing::{debug, instrument};

use ipptransform_core::{ImagePosition, InputFormat, Margins, PrintOptions, PrintScaling};

use crate::error::{PrepError, Result};
use crate::image::decode_for_embedding;
use crate::pdf::writer::{PdfBuilder, image_draw_content, text_page_content};

const TEXT_FONT_SIZE: f64 = 10.0;
const TEXT_LEADING: f64 = 12.0;
const TEXT_TAB_WIDTH: usize = 8;

/// Convert one input document into an intermediate PDF's bytes.
#[instrument(skip(opts), fields(path = %path.display(), mime = declared_mime))]
pub fn convert_to_intermediate_pdf(path: &Path, declared_mime: &str, opts: &PrintOptions) -> Result<Vec<u8>> {
    match InputFormat::from_mime_type(declared_mime) {
        Some(InputFormat::Pdf) => fs::read(path).map_err(PrepError::Io),
        Some(InputFormat::Jpeg) | Some(InputFormat::Png) => {
            let bytes = fs::read(path).map_err(PrepError::Io)?;
            convert_image(&bytes, declared_mime, opts)
        }
        Some(InputFormat::PlainText) => {
            let text = fs::read_to_string(path).map_err(PrepError::Io)?;
            convert_plain_text(&text, opts)
        }
        // Raster input whose format already matches the requested output is
        // handled upstream as a direct passthrough (bypassing PREP/XFORM
        // entirely); PREP is never asked to wrap it into a PDF.
        Some(InputFormat::PwgRaster) => Err(PrepError::UnsupportedOption(
            "pwg-raster input documents are not converted by document preparation".into(),
        )),
        None => Err(PrepError::UnsupportedOption(format!(
            "unrecognized input document format '{declared_mime}'"
        ))),
    }
}

fn convert_image(bytes: &[u8], mime: &str, opts: &PrintOptions) -> Result<Vec<u8>> {
    let embedded = decode_for_embedding(bytes, mime)?;
    let (page_w, page_h) = opts.media.page_points();
    let (crop_x1, crop_y1, crop_x2, crop_y2) = opts.media.crop_box_points();
    let crop_w = crop_x2 - crop_x1;
    let crop_h = crop_y2 - crop_y1;

    let (img_w, img_h) = (embedded.width as f64, embedded.height as f64);

    // `image-orientation: none` auto-rotates 90 degrees when the image's
    // aspect ratio disagrees with the crop box's.
    let image_is_landscape = img_w >= img_h;
    let crop_is_landscape = crop_w >= crop_h;
    let irot: u32 = if image_is_landscape != crop_is_landscape { 90 } else { 0 };
    let (rotated_w, rotated_h) = if irot == 90 { (img_h, img_w) } else { (img_w, img_h) };

    let scale = resolve_scale(opts, rotated_w, rotated_h, crop_w, crop_h);
    let placed_w = rotated_w * scale;
    let placed_h = rotated_h * scale;

    let (anchor_x, anchor_y) =
        anchor_origin(opts.x_image_position, opts.y_image_position, crop_x1, crop_y1, crop_x2, crop_y2, placed_w, placed_h);
    let shift = opts.image_shift_side1;
    let origin_x = anchor_x + shift.x_pt;
    let origin_y = anchor_y + shift.y_pt;

    let matrix = image_placement_matrix(irot, img_w * scale, img_h * scale, origin_x, origin_y);

    debug!(irot, scale, placed_w, placed_h, "placing converted image");

    let mut builder = PdfBuilder::new();
    let image_id = builder.embed_image(&embedded);

    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let content = image_draw_content("Im0", matrix);
    builder.add_page(page_w, page_h, resources, content);
    builder.finish()
}

/// `print-scaling` resolution (§4.2): `none` is ratio 1; `fit` is the
/// largest ratio keeping the rotated image inside the crop box; `fill` is
/// the smallest ratio covering it; `auto` behaves as `fit` when margins are
/// zero else `fill`, but only when the image would otherwise overflow the
/// crop box; `auto-fit` is `auto` but never upscales.
fn resolve_scale(opts: &PrintOptions, rotated_w: f64, rotated_h: f64, crop_w: f64, crop_h: f64) -> f64 {
    let fit_ratio = (crop_w / rotated_w).min(crop_h / rotated_h);
    let fill_ratio = (crop_w / rotated_w).max(crop_h / rotated_h);
    let margins_zero = opts.media.margins == Margins::default();
    let exceeds = rotated_w > crop_w || rotated_h > crop_h;

    let auto_ratio = if exceeds {
        if margins_zero { fit_ratio } else { fill_ratio }
    } else {
        1.0
    };

    match opts.print_scaling {
        PrintScaling::None => 1.0,
        PrintScaling::Fit => fit_ratio,
        PrintScaling::Fill => fill_ratio,
        PrintScaling::Auto => auto_ratio,
        PrintScaling::AutoFit => auto_ratio.min(1.0),
    }
}

/// Anchor point (bottom-left corner of the placed image) for the
/// `{x,y}-image-position` keywords.
fn anchor_origin(
    x_pos: ImagePosition,
    y_pos: ImagePosition,
    crop_x1: f64,
    crop_y1: f64,
    crop_x2: f64,
    crop_y2: f64,
    placed_w: f64,
    placed_h: f64,
) -> (f64, f64) {
    let x = match x_pos {
        ImagePosition::BottomLeft => crop_x1,
        ImagePosition::TopRight => crop_x2 - placed_w,
        ImagePosition::None | ImagePosition::Center => crop_x1 + (crop_x2 - crop_x1 - placed_w) / 2.0,
    };
    let y = match y_pos {
        ImagePosition::BottomLeft => crop_y1,
        ImagePosition::TopRight => crop_y2 - placed_h,
        ImagePosition::None | ImagePosition::Center => crop_y1 + (crop_y2 - crop_y1 - placed_h) / 2.0,
    };
    (x, y)
}

/// The `cm` matrix operands placing a `W0`x`H0`-pixel image XObject's unit
/// square at `(origin_x, origin_y)` scaled to `w`x`h` points and rotated
/// `irot` degrees counter-clockwise (`irot` from {0, 90, 180, 270}).
fn image_placement_matrix(irot: u32, w: f64, h: f64, origin_x: f64, origin_y: f64) -> [f64; 6] {
    match irot {
        90 => [0.0, w, -h, 0.0, origin_x + h, origin_y],
        180 => [-w, 0.0, 0.0, -h, origin_x + w, origin_y + h],
        270 => [0.0, -w, h, 0.0, origin_x, origin_y + w],
        _ => [w, 0.0, 0.0, h, origin_x, origin_y],
    }
}

fn convert_plain_text(text: &str, opts: &PrintOptions) -> Result<Vec<u8>> {
    let (page_w, page_h) = opts.media.page_points();
    let (crop_x1, _crop_y1, crop_x2, crop_y2) = opts.media.crop_box_points();
    let crop_w = crop_x2 - crop_x1;
    let crop_h = crop_y2 - crop_y1;

    let columns = ((crop_w / (0.6 * TEXT_FONT_SIZE)).floor() as usize).max(1);
    let lines_per_page = ((crop_h / TEXT_LEADING).floor() as usize).max(1);

    let expanded = expand_tabs(text, TEXT_TAB_WIDTH);
    let wrapped: Vec<String> = expanded.lines().flat_map(|line| wrap_line(line, columns)).collect();

    let mut builder = PdfBuilder::new();
    let font_id = builder.courier_font();

    let chunks: Vec<&[String]> = if wrapped.is_empty() {
        vec![&[]]
    } else {
        wrapped.chunks(lines_per_page).collect()
    };

    for (index, page_lines) in chunks.into_iter().enumerate() {
        let page_number = index + 1;
        // Side-2 image shifts apply to even output pages (§4.2).
        let shift = if page_number % 2 == 0 { opts.image_shift_side2 } else { opts.image_shift_side1 };

        let mut fonts = Dictionary::new();
        fonts.set("F0", Object::Reference(font_id));
        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));

        let origin_x = crop_x1 + shift.x_pt;
        let origin_y = crop_y2 + shift.y_pt - TEXT_FONT_SIZE;
        let content = text_page_content(page_lines, "F0", TEXT_FONT_SIZE, TEXT_LEADING, origin_x, origin_y);
        builder.add_page(page_w, page_h, resources, content);
    }

    builder.finish()
}

fn expand_tabs(text: &str, tab_width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split('\n') {
        let mut col = 0usize;
        for ch in line.chars() {
            if ch == '\t' {
                let spaces = tab_width - (col % tab_width);
                out.extend(std::iter::repeat_n(' ', spaces));
                col += spaces;
            } else {
                out.push(ch);
                col += 1;
            }
        }
        out.push('\n');
    }
    out
}

fn wrap_line(line: &str, columns: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    let chars: Vec<char> = line.chars().collect();
    chars.chunks(columns.max(1)).map(|c| c.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipptransform_core::OutputFormat;

    #[test]
    fn resolve_scale_none_is_unscaled() {
        let mut opts = PrintOptions::defaults_for(OutputFormat::Pdf);
        opts.print_scaling = PrintScaling::None;
        assert_eq!(resolve_scale(&opts, 200.0, 100.0, 50.0, 50.0), 1.0);
    }

    #[test]
    fn fit_ratio_shrinks_to_the_tighter_axis() {
        let mut opts = PrintOptions::defaults_for(OutputFormat::Pdf);
        opts.print_scaling = PrintScaling::Fit;
        // 200x100 image into a 100x100 box: fit ratio is 0.5 (width-bound).
        assert_eq!(resolve_scale(&opts, 200.0, 100.0, 100.0, 100.0), 0.5);
    }

    #[test]
    fn fill_ratio_covers_the_looser_axis() {
        let mut opts = PrintOptions::defaults_for(OutputFormat::Pdf);
        opts.print_scaling = PrintScaling::Fill;
        assert_eq!(resolve_scale(&opts, 200.0, 100.0, 100.0, 100.0), 1.0);
    }

    #[test]
    fn auto_fit_never_upscales() {
        let mut opts = PrintOptions::defaults_for(OutputFormat::Pdf);
        opts.print_scaling = PrintScaling::AutoFit;
        // Image already fits — no upscale even though fit would enlarge it.
        assert_eq!(resolve_scale(&opts, 50.0, 50.0, 100.0, 100.0), 1.0);
    }

    #[test]
    fn tabs_expand_to_next_stop() {
        assert_eq!(expand_tabs("a\tb", 8), "a       b\n");
    }

    #[test]
    fn lines_wrap_at_column_count() {
        let wrapped = wrap_line("abcdefgh", 4);
        assert_eq!(wrapped, vec!["abcd".to_string(), "efgh".to_string()]);
    }
}
