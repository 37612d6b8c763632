// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error taxonomy for the ipptransform pipeline.

use thiserror::Error;

/// Top-level error type threaded through PREP, XFORM, and SINK. RSC keeps
/// its own `RasterError` (it has no dependency on this crate) and converts
/// into a `PipelineError` at the XFORM boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input document is missing, unreadable, or fails basic structural
    /// validation (not malformed wire data — that's `MalformedHeader`).
    #[error("bad input: {0}")]
    BadInput(String),

    /// The requested output format is not one this build knows how to
    /// produce, or the input's declared MIME type is not recognized.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A requested print option's value is not supported by this pipeline
    /// or the destination printer's advertised capabilities.
    #[error("unsupported option: {0}")]
    UnsupportedOption(String),

    /// A raster or driver-specific header failed to parse.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// A compressed row or stream produced more bytes than its declared
    /// bounds allow.
    #[error("compression overrun: {0}")]
    CompressionOverrun(String),

    #[error("i/o error: {0}")]
    IoError(#[from] std::io::Error),

    /// The destination requires credentials the caller did not supply, or
    /// the user canceled an authorization prompt.
    #[error("authorization canceled: {0}")]
    AuthorizationCanceled(String),

    /// The destination reported that it is busy (queue full, printing
    /// another job) — callers should retry per the backoff policy.
    #[error("remote busy: {0}")]
    RemoteBusy(String),

    /// The destination responded but violated the expected wire protocol.
    #[error("remote protocol error: {0}")]
    RemoteProtocol(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    /// A spawned helper process (e.g. a filter) exited non-zero or was
    /// killed by a signal.
    #[error("child process failed: {0}")]
    ChildProcessFailed(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PipelineError>;
