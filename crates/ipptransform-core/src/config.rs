// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `ClientConfig` replaces the original's process-wide `tls_options` /
// credential-path / language-catalog mutable statics with a single struct
// built once by the CLI and threaded by reference through PREP -> XFORM ->
// SINK (Design Notes §9).

use std::time::Duration;

use crate::types::PrintOptions;

/// Explicit, passed-by-reference configuration for one pipeline invocation.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Resolved options for the job currently being processed.
    pub print_options: PrintOptions,
    /// TCP connect timeout (§5: 30s).
    pub connect_timeout: Duration,
    /// Minimum enforced TLS handshake timeout (§5: >= 10s).
    pub tls_handshake_timeout: Duration,
    /// How long to wait for an HTTP `100 Continue` after `Expect: 100-continue`
    /// (§5: 1s).
    pub expect_continue_timeout: Duration,
    /// Maximum total IPP busy-retry attempts (§5: capped at 10).
    pub max_busy_retries: u32,
    /// Prefer gzip content-encoding when the destination advertises it.
    pub prefer_gzip: bool,
    /// Prefer chunked transfer-encoding (always set per §4.4, kept
    /// switchable for raw-socket/file sinks that have no such concept).
    pub chunked_transfer: bool,
    /// Emit diagnostic lines formatted for an embedded caller
    /// (`SERVER_LOGLEVEL` forces every non-DEBUG line to `ERROR:`, §6).
    pub embedded_diagnostics: bool,
}

impl ClientConfig {
    pub fn new(print_options: PrintOptions) -> Self {
        Self {
            print_options,
            connect_timeout: Duration::from_secs(30),
            tls_handshake_timeout: Duration::from_secs(10),
            expect_continue_timeout: Duration::from_secs(1),
            max_busy_retries: 10,
            prefer_gzip: true,
            chunked_transfer: true,
            embedded_diagnostics: std::env::var_os("SERVER_LOGLEVEL").is_some(),
        }
    }
}
