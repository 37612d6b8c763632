// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Banner and error-sheet rendering (§4.2): a banner page prepended and
// appended to the job when `job-sheets != none`, rendered with
// title/user/pages/message at 20-pt Courier, and an appended error/warning
// listing when `job-error-sheet.report` calls for one.

use lopdf::{Dictionary, Object};

use ipptransform_core::PrintOptions;

use crate::error::PrepDiagnostic;
use crate::pdf::writer::{PdfBuilder, text_page_content};

const BANNER_FONT_SIZE: f64 = 20.0;
const BANNER_LEADING: f64 = 24.0;

/// Render one banner page carrying the job title, submitting user, page
/// count, and an optional trailing message (used for the front and, on
/// duplex jobs, back banner page).
pub fn render_banner_page(builder: &mut PdfBuilder, opts: &PrintOptions, title: &str, user: &str, page_count: usize, message: &str) {
    let (page_w, page_h) = opts.media.page_points();

    let font_id = builder.courier_font();
    let mut fonts = Dictionary::new();
    fonts.set("F0", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut lines = vec![
        format!("Title: {title}"),
        format!("User: {user}"),
        format!("Pages: {page_count}"),
    ];
    if !message.is_empty() {
        lines.push(String::new());
        lines.push(message.to_string());
    }

    let origin_x = page_w / 2.0 - 180.0;
    let origin_y = page_h / 2.0 + BANNER_LEADING * lines.len() as f64 / 2.0;
    let content = text_page_content(&lines, "F0", BANNER_FONT_SIZE, BANNER_LEADING, origin_x, origin_y);
    builder.add_page(page_w, page_h, resources, content);
}

/// Render the appended error-and-warning listing (§4.2 failure semantics):
/// one line per accumulated [`PrepDiagnostic`], keyed `E` (error) or `I`
/// (informational).
pub fn render_error_sheet(builder: &mut PdfBuilder, opts: &PrintOptions, diagnostics: &[PrepDiagnostic]) {
    let (page_w, page_h) = opts.media.page_points();
    let (crop_x1, _, _, crop_y2) = opts.media.crop_box_points();

    let font_id = builder.courier_font();
    let mut fonts = Dictionary::new();
    fonts.set("F0", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut lines = vec!["Print job diagnostics:".to_string(), String::new()];
    lines.extend(diagnostics.iter().map(|d| format!("[{}] {}", d.key(), d.message)));

    let content = text_page_content(&lines, "F0", 10.0, 12.0, crop_x1, crop_y2 - 10.0);
    builder.add_page(page_w, page_h, resources, content);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipptransform_core::OutputFormat;

    #[test]
    fn banner_and_error_sheet_each_add_one_page() {
        let opts = PrintOptions::defaults_for(OutputFormat::Pdf);
        let mut builder = PdfBuilder::new();
        render_banner_page(&mut builder, &opts, "job", "alice", 3, "");
        render_error_sheet(&mut builder, &opts, &[PrepDiagnostic::error("bad thing")]);
        let bytes = builder.finish().unwrap();
        let doc = crate::pdf::reader::from_bytes(&bytes).unwrap();
        assert_eq!(crate::pdf::reader::page_count(&doc), 2);
    }
}
