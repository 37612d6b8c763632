// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// XFORM: turns PREP's intermediate PDF into the bytes a destination
// actually accepts — PWG/Apple Raster, PCL, PCLm, PostScript, or PDF
// passthrough. See `driver::transform` for the entry point.

pub mod color;
pub mod dither;
pub mod driver;
pub mod error;
pub mod pcl;
pub mod pclm;
pub mod postscript;
pub mod raster_driver;
pub mod render;

pub use driver::transform;
pub use error::{Result, XformError};
