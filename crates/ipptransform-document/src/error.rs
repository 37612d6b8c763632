// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PREP's local error enum. Converts into `ipptransform_core::PipelineError`
// at the crate boundary, the same layering the architectural template uses
// between its document crate and its core crate.

use ipptransform_core::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad input: {0}")]
    BadInput(String),

    #[error("unsupported option: {0}")]
    UnsupportedOption(String),
}

pub type Result<T> = std::result::Result<T, PrepError>;

impl From<PrepError> for PipelineError {
    fn from(err: PrepError) -> Self {
        match err {
            PrepError::Pdf(e) => PipelineError::BadInput(format!("malformed PDF: {e}")),
            PrepError::Image(e) => PipelineError::BadInput(format!("malformed image: {e}")),
            PrepError::Io(e) => PipelineError::IoError(e),
            PrepError::BadInput(s) => PipelineError::BadInput(s),
            PrepError::UnsupportedOption(s) => PipelineError::UnsupportedOption(s),
        }
    }
}

/// Non-fatal issue accumulated during preparation (§4.2 failure semantics):
/// prep continues past these, but they are surfaced to the caller and, when
/// `job-error-sheet` is enabled, listed on the appended error sheet.
#[derive(Debug, Clone)]
pub struct PrepDiagnostic {
    pub is_error: bool,
    pub message: String,
}

impl PrepDiagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            is_error: false,
            message: message.into(),
        }
    }

    /// The `E`/`I`-keyed prefix the spec's failure-semantics array uses.
    pub fn key(&self) -> char {
        if self.is_error { 'E' } else { 'I' }
    }
}
