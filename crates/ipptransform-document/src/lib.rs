// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Document preparation (PREP): turns 1..N input documents (PDF, JPEG, PNG,
//! plain text) plus a resolved [`ipptransform_core::PrintOptions`] into one
//! intermediate PDF whose pages are the impressions to hand to the
//! transform pipeline — page selection, per-input conversion, N-up and
//! booklet imposition, duplex sheet-back transforms, banners and error
//! sheets.
//!
//! All PDF reading, writing, and composition goes through `lopdf` directly:
//! the resource-dictionary merge and content-stream rewrite composition
//! needs (see [`resources`]) operate on the raw object graph, not a
//! page-level API.

pub mod banner;
pub mod convert;
pub mod error;
pub mod image;
pub mod impose;
pub mod layout;
pub mod pdf;
pub mod prepare;
pub mod resources;

pub use error::{PrepDiagnostic, PrepError, Result};
pub use prepare::prepare_job;
