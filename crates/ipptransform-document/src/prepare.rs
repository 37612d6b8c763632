// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The PREP orchestrator: ties `convert`, `layout`, `impose`, `resources`,
// and `banner` together into the single `prepare_job` entry point that
// turns a job's input documents into one intermediate PDF ready for XFORM.

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{info, instrument, warn};

use ipptransform_core::{
    InputDocument, InputPageRef, MultipleDocumentHandling, OutputBinOrientation, PageDelivery,
    PreparedPage, PrintOptions, PrintScaling,
};

use crate::banner::{render_banner_page, render_error_sheet};
use crate::convert::convert_to_intermediate_pdf;
use crate::error::{PrepDiagnostic, PrepError, Result};
use crate::impose::{is_back_side, sheet_back_transform};
use crate::layout::{booklet_page_order, build_grid};
use crate::pdf::reader;
use crate::pdf::writer::{cell_draw_content, PdfBuilder};
use crate::resources::{merge_resources, rewrite_content_stream};

/// What `prepare_job` produces: the intermediate PDF plus every non-fatal
/// diagnostic accumulated while building it.
pub struct PreparedJob {
    pub pdf_bytes: Vec<u8>,
    pub diagnostics: Vec<PrepDiagnostic>,
}

/// One successfully opened input document, ready to contribute pages.
struct OpenedDocument {
    index: usize,
    document: Document,
    selected_pages: Vec<ObjectId>,
}

/// Produce one intermediate PDF from `inputs`, applying page selection,
/// per-input conversion, imposition, duplex back-side transforms, copies,
/// and banner/error sheets.
///
/// `passwords[i]` is the `IPP_DOCUMENT_PASSWORD[i]` value for `inputs[i]`
/// (or `None`). A document that fails to open or convert contributes an
/// `E`-keyed diagnostic and is dropped from the job; the whole call fails
/// only if every document is dropped this way.
///
/// `sink_handles_copies` should be `true` when the destination is an IPP
/// printer that will be told `copies` directly — in that case PREP emits a
/// single copy and lets the sink multiply it, per §4.2's note that PREP
/// only expands copies itself when the destination cannot.
#[instrument(skip(inputs, passwords, opts), fields(input_count = inputs.len()))]
pub fn prepare_job(
    inputs: &[InputDocument],
    passwords: &[Option<String>],
    opts: &PrintOptions,
    job_title: &str,
    job_user: &str,
    sink_handles_copies: bool,
) -> Result<PreparedJob> {
    let mut diagnostics = Vec::new();
    let mut opened = Vec::new();

    for (index, input) in inputs.iter().enumerate() {
        let password = passwords.get(index).and_then(|p| p.as_deref());
        match open_and_select(input, index, password, opts) {
            Ok(doc) => opened.push(doc),
            Err(err) => {
                warn!(index, %err, "dropping input document");
                diagnostics.push(PrepDiagnostic::error(format!(
                    "document {index} ({}): {err}",
                    input.path.display()
                )));
            }
        }
    }

    if opened.is_empty() {
        return Err(PrepError::BadInput(
            "every input document failed to open or convert".into(),
        ));
    }

    let copies = if sink_handles_copies { 1 } else { opts.copies.max(1) };
    let logical_pages = build_logical_sequence(&opened, opts, copies);

    let prepared_pages = group_into_output_pages(&logical_pages, opts);
    let total_pages = prepared_pages.len();

    let mut builder = PdfBuilder::new();
    let (page_w, page_h) = opts.media.page_points();

    if !matches!(opts.job_sheets, ipptransform_core::JobSheets::None) {
        render_banner_page(&mut builder, opts, job_title, job_user, total_pages, "");
    }

    let grid = build_grid(opts).0;
    for (page_index, page) in prepared_pages.iter().enumerate() {
        let page_number = (page_index + 1) as u32;
        let back = is_back_side(opts.sides, page_number);
        let transform = if back {
            sheet_back_transform(opts.sides, opts.sheet_back, page_w, page_h)
        } else {
            crate::impose::Affine::IDENTITY
        };

        let mut merged_resources = Dictionary::new();
        let mut content = Vec::new();

        for (cell_index, cell_input) in page.cell_inputs.iter().enumerate() {
            let Some(input_ref) = cell_input else { continue };
            let Some(cell) = grid.cells.get(cell_index) else { continue };
            let Some(source) = opened.iter().find(|d| d.index == input_ref.document_index) else { continue };

            let Some(&source_page_id) = source.selected_pages.get(input_ref.page_number as usize) else {
                continue;
            };

            let source_resources = match reader::resources_of(&source.document, source_page_id) {
                Ok(r) => r,
                Err(err) => {
                    diagnostics.push(PrepDiagnostic::info(format!(
                        "page {} of document {}: {err}",
                        input_ref.page_number, input_ref.document_index
                    )));
                    continue;
                }
            };
            let source_content = match reader::content_of(&source.document, source_page_id) {
                Ok(c) => c,
                Err(err) => {
                    diagnostics.push(PrepDiagnostic::info(format!(
                        "page {} of document {}: {err}",
                        input_ref.page_number, input_ref.document_index
                    )));
                    continue;
                }
            };

            let cloned_resources = match reader::clone_object_into(
                &source.document,
                builder.document_mut(),
                &Object::Dictionary(source_resources),
            ) {
                Ok(Object::Dictionary(d)) => d,
                _ => Dictionary::new(),
            };

            let remap = merge_resources(&mut merged_resources, &cloned_resources, cell_index);
            let rewritten = rewrite_content_stream(&source_content, &remap);

            let media_box = reader::media_box_of(&source.document, source_page_id)
                .unwrap_or([0.0, 0.0, cell.width(), cell.height()]);
            let cell_matrix = cell_placement_matrix(media_box, cell.x1, cell.y1, cell.x2, cell.y2, opts.print_scaling);
            let final_matrix = apply_sheet_back(cell_matrix, transform, page_w, page_h);

            content.extend(cell_draw_content((cell.x1, cell.y1, cell.x2, cell.y2), final_matrix, &rewritten));
        }

        builder.add_page(page_w, page_h, merged_resources, content);
    }

    let error_count = diagnostics.iter().filter(|d| d.is_error).count();
    let report_errors = match opts.job_error_sheet {
        ipptransform_core::ErrorSheetReport::Always => true,
        ipptransform_core::ErrorSheetReport::OnError => error_count > 0,
        ipptransform_core::ErrorSheetReport::Never => false,
    };
    if report_errors {
        render_error_sheet(&mut builder, opts, &diagnostics);
    }

    if !matches!(opts.job_sheets, ipptransform_core::JobSheets::None) {
        render_banner_page(&mut builder, opts, job_title, job_user, total_pages, "");
    }

    let reverse = matches!(opts.output_bin, OutputBinOrientation::FaceUp)
        ^ matches!(opts.page_delivery, PageDelivery::ReverseOrder);
    if reverse {
        warn!("output-bin/page-delivery requested reversed delivery order; XFORM honors this at spool time");
    }

    info!(pages = total_pages, errors = error_count, "document preparation complete");

    let pdf_bytes = builder.finish()?;
    Ok(PreparedJob { pdf_bytes, diagnostics })
}

fn open_and_select(
    input: &InputDocument,
    index: usize,
    password: Option<&str>,
    opts: &PrintOptions,
) -> Result<OpenedDocument> {
    let document = if input.declared_mime_type == "application/pdf" {
        reader::open(&input.path, password)?
    } else {
        let bytes = convert_to_intermediate_pdf(&input.path, &input.declared_mime_type, opts)?;
        reader::from_bytes(&bytes)?
    };

    let all_pages = reader::page_ids(&document);
    let selected_pages = select_pages(&all_pages, input, opts);

    Ok(OpenedDocument {
        index,
        document,
        selected_pages,
    })
}

/// Intersects the document's own `first_page`/`last_page` (if PREP was told
/// which subrange of this specific input to use) with the job-wide
/// `page-ranges` option (1-indexed, inclusive).
fn select_pages(all_pages: &[ObjectId], input: &InputDocument, opts: &PrintOptions) -> Vec<ObjectId> {
    let doc_first = input.first_page.unwrap_or(1);
    let doc_last = input.last_page.unwrap_or(all_pages.len() as u32);

    if opts.page_ranges.is_empty() {
        return all_pages
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                let n = (*i + 1) as u32;
                n >= doc_first && n <= doc_last
            })
            .map(|(_, id)| *id)
            .collect();
    }

    all_pages
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            let n = (*i + 1) as u32;
            n >= doc_first
                && n <= doc_last
                && opts.page_ranges.iter().any(|r| n >= r.first && n <= r.last)
        })
        .map(|(_, id)| *id)
        .collect()
}

/// Expands `multiple-document-handling` and `copies` into the flat sequence
/// of `InputPageRef`s that imposition groups into output pages.
fn build_logical_sequence(opened: &[OpenedDocument], opts: &PrintOptions, copies: u32) -> Vec<InputPageRef> {
    let doc_pages = |doc: &OpenedDocument| -> Vec<InputPageRef> {
        (0..doc.selected_pages.len())
            .map(|page_number| InputPageRef {
                document_index: doc.index,
                page_number: page_number as u32,
            })
            .collect()
    };

    match opts.multiple_document_handling {
        MultipleDocumentHandling::SingleDocument => {
            let mut sequence = Vec::new();
            for doc in opened {
                sequence.extend(doc_pages(doc));
            }
            repeat_collated(sequence, copies)
        }
        MultipleDocumentHandling::SingleDocumentNewSheet => {
            let mut sequence = Vec::new();
            for doc in opened {
                let mut pages = doc_pages(doc);
                if opts.sides.is_duplex() && pages.len() % 2 != 0 {
                    pages.push(InputPageRef {
                        document_index: doc.index,
                        page_number: u32::MAX,
                    });
                }
                sequence.extend(pages);
            }
            repeat_collated(sequence, copies)
        }
        MultipleDocumentHandling::SeparateDocumentsCollatedCopies => {
            let mut sequence = Vec::new();
            for _ in 0..copies {
                for doc in opened {
                    sequence.extend(doc_pages(doc));
                }
            }
            sequence
        }
        MultipleDocumentHandling::SeparateDocumentsUncollatedCopies => {
            let mut sequence = Vec::new();
            for doc in opened {
                for _ in 0..copies {
                    sequence.extend(doc_pages(doc));
                }
            }
            sequence
        }
    }
}

fn repeat_collated(sequence: Vec<InputPageRef>, copies: u32) -> Vec<InputPageRef> {
    let mut out = Vec::with_capacity(sequence.len() * copies as usize);
    for _ in 0..copies {
        out.extend(sequence.iter().copied());
    }
    out
}

/// Groups the flat page sequence into output pages per the job's
/// imposition/number-up settings, honoring booklet page reordering.
fn group_into_output_pages(sequence: &[InputPageRef], opts: &PrintOptions) -> Vec<PreparedPage> {
    let (grid, fill_order) = build_grid(opts);
    let cells_per_page = grid.cells.len();

    let slots: Vec<Option<InputPageRef>> = if matches!(opts.imposition, ipptransform_core::Imposition::Booklet) {
        booklet_page_order(sequence.len())
            .into_iter()
            .map(|slot| slot.map(|i| sequence[i]))
            .collect()
    } else {
        sequence.iter().copied().map(Some).collect()
    };

    let mut pages = Vec::new();
    for chunk in slots.chunks(cells_per_page) {
        let mut cell_inputs: Vec<Option<InputPageRef>> = vec![None; cells_per_page];
        for (order_pos, input_ref) in chunk.iter().enumerate() {
            if let Some(&cell_index) = fill_order.get(order_pos) {
                cell_inputs[cell_index] = *input_ref;
            }
        }
        if cell_inputs.iter().any(Option::is_some) {
            pages.push(PreparedPage { cell_inputs });
        }
    }
    pages
}

/// The `cm` matrix placing a cell's content (whose coordinate space is
/// `media_box`) into the `(x1,y1)`-`(x2,y2)` output rectangle: `fit` unless
/// `print_scaling` is explicitly `fill` (§4.2 page-composition rule).
fn cell_placement_matrix(media_box: [f64; 4], x1: f64, y1: f64, x2: f64, y2: f64, scaling: PrintScaling) -> [f64; 6] {
    let content_w = (media_box[2] - media_box[0]).max(1e-6);
    let content_h = (media_box[3] - media_box[1]).max(1e-6);
    let cell_w = x2 - x1;
    let cell_h = y2 - y1;

    let fit = (cell_w / content_w).min(cell_h / content_h);
    let fill = (cell_w / content_w).max(cell_h / content_h);
    let scale = if matches!(scaling, PrintScaling::Fill) { fill } else { fit };

    let placed_w = content_w * scale;
    let placed_h = content_h * scale;
    let origin_x = x1 + (cell_w - placed_w) / 2.0 - media_box[0] * scale;
    let origin_y = y1 + (cell_h - placed_h) / 2.0 - media_box[1] * scale;

    [scale, 0.0, 0.0, scale, origin_x, origin_y]
}

fn apply_sheet_back(cell_matrix: [f64; 6], back_transform: crate::impose::Affine, _page_w: f64, _page_h: f64) -> [f64; 6] {
    let cell = crate::impose::Affine {
        a: cell_matrix[0],
        b: cell_matrix[1],
        c: cell_matrix[2],
        d: cell_matrix[3],
        e: cell_matrix[4],
        f: cell_matrix[5],
    };
    cell.then(back_transform).to_pdf_operands()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipptransform_core::OutputFormat;
    use std::io::Write as _;

    fn write_blank_pdf(path: &std::path::Path, pages: usize) {
        let mut builder = PdfBuilder::new();
        for _ in 0..pages {
            builder.add_blank_page(612.0, 792.0);
        }
        let bytes = builder.finish().unwrap();
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(&bytes).unwrap();
    }

    #[test]
    fn single_document_prepares_one_page_per_input_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.pdf");
        write_blank_pdf(&path, 3);

        let input = InputDocument::new(path, "application/pdf");
        let opts = PrintOptions::defaults_for(OutputFormat::Pdf);

        let result = prepare_job(&[input], &[None], &opts, "job", "alice", false).unwrap();
        let doc = reader::from_bytes(&result.pdf_bytes).unwrap();
        assert_eq!(reader::page_count(&doc), 3);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn missing_password_drops_document_but_other_inputs_survive() {
        let dir = tempfile::tempdir().unwrap();
        let ok_path = dir.path().join("ok.pdf");
        write_blank_pdf(&ok_path, 1);

        let missing_path = dir.path().join("missing.pdf");
        let inputs = [
            InputDocument::new(missing_path, "application/pdf"),
            InputDocument::new(ok_path, "application/pdf"),
        ];
        let opts = PrintOptions::defaults_for(OutputFormat::Pdf);

        let result = prepare_job(&inputs, &[None, None], &opts, "job", "alice", false).unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].is_error);
    }

    #[test]
    fn every_input_failing_is_a_fatal_error() {
        let inputs = [InputDocument::new(std::path::PathBuf::from("/nonexistent.pdf"), "application/pdf")];
        let opts = PrintOptions::defaults_for(OutputFormat::Pdf);
        let result = prepare_job(&inputs, &[None], &opts, "job", "alice", false);
        assert!(result.is_err());
    }

    #[test]
    fn two_up_halves_the_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.pdf");
        write_blank_pdf(&path, 4);

        let input = InputDocument::new(path, "application/pdf");
        let mut opts = PrintOptions::defaults_for(OutputFormat::Pdf);
        opts.number_up = 2;

        let result = prepare_job(&[input], &[None], &opts, "job", "alice", false).unwrap();
        let doc = reader::from_bytes(&result.pdf_bytes).unwrap();
        assert_eq!(reader::page_count(&doc), 2);
    }

    #[test]
    fn cell_placement_matrix_fits_content_inside_cell() {
        let m = cell_placement_matrix([0.0, 0.0, 200.0, 100.0], 0.0, 0.0, 100.0, 100.0, PrintScaling::Fit);
        assert!((m[0] - 0.5).abs() < 1e-9);
        assert!((m[3] - 0.5).abs() < 1e-9);
    }
}
