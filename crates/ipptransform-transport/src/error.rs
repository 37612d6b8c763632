// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SINK's local error enum. Converts into `ipptransform_core::PipelineError`
// at the crate boundary, the same layering PREP and RSC use.

use ipptransform_core::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ipp protocol error: {0}")]
    Ipp(String),

    #[error("remote printer is busy: {0}")]
    RemoteBusy(String),

    #[error("remote protocol error: {0}")]
    RemoteProtocol(String),

    #[error("authorization canceled: {0}")]
    AuthorizationCanceled(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SinkError>;

impl From<SinkError> for PipelineError {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Io(e) => PipelineError::IoError(e),
            SinkError::Ipp(s) => PipelineError::RemoteProtocol(s),
            SinkError::RemoteBusy(s) => PipelineError::RemoteBusy(s),
            SinkError::RemoteProtocol(s) => PipelineError::RemoteProtocol(s),
            SinkError::AuthorizationCanceled(s) => PipelineError::AuthorizationCanceled(s),
            SinkError::Timeout(s) => PipelineError::Timeout(s),
            SinkError::Internal(s) => PipelineError::Internal(s),
        }
    }
}
