// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading input PDFs (with password unlock) and building
// output PDFs directly in `lopdf` terms.

pub mod reader;
pub mod writer;

pub use writer::PdfBuilder;
