// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// XFORM's local error enum. Converts into `ipptransform_core::PipelineError`
// at the crate boundary, the same layering PREP and SINK use against their
// own local error types.

use ipptransform_core::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XformError {
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("raster codec error: {0}")]
    Raster(#[from] ipptransform_raster::RasterError),

    #[error("bad input: {0}")]
    BadInput(String),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported option: {0}")]
    UnsupportedOption(String),

    #[error("child process failed: {0}")]
    ChildProcessFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, XformError>;

impl From<XformError> for PipelineError {
    fn from(err: XformError) -> Self {
        match err {
            XformError::Pdf(e) => PipelineError::BadInput(format!("malformed PDF: {e}")),
            XformError::Image(e) => PipelineError::BadInput(format!("malformed image: {e}")),
            XformError::Io(e) => PipelineError::IoError(e),
            XformError::Raster(e) => PipelineError::from(e),
            XformError::BadInput(s) => PipelineError::BadInput(s),
            XformError::UnsupportedFormat(s) => PipelineError::UnsupportedFormat(s),
            XformError::UnsupportedOption(s) => PipelineError::UnsupportedOption(s),
            XformError::ChildProcessFailed(s) => PipelineError::ChildProcessFailed(s),
            XformError::Internal(s) => PipelineError::Internal(s),
        }
    }
}
