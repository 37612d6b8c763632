// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding JPEG/PNG inputs into embeddable PDF image
// XObject streams for the one-page wrapper PDFs §4.2 builds around raster
// input documents.

pub mod processor;

pub use processor::{EmbeddedImage, decode_for_embedding};
