// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The CUPS-style diagnostic channel (§6): lines written to stderr, each
// prefixed with a machine-parsable tag a calling print server greps for.
// `DEBUG:` lines are verbose and may be dropped by the caller; `INFO:`,
// `ATTR:`, and `STATE:` carry job progress and printer-state updates;
// `ERROR:` is fatal. When `ClientConfig.embedded_diagnostics` is set
// (`SERVER_LOGLEVEL` present in the environment) every non-`DEBUG:` line is
// forced to the `ERROR:` prefix, since an embedded caller only greps for
// that one tag.

use std::io::Write;

use ipptransform_core::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Debug,
    Info,
    Attr,
    State,
    Error,
}

impl DiagLevel {
    fn tag(self) -> &'static str {
        match self {
            DiagLevel::Debug => "DEBUG:",
            DiagLevel::Info => "INFO:",
            DiagLevel::Attr => "ATTR:",
            DiagLevel::State => "STATE:",
            DiagLevel::Error => "ERROR:",
        }
    }
}

/// Writes one diagnostic line to `out`, applying the embedded-caller prefix
/// rule from `config`.
pub fn emit<W: Write>(out: &mut W, config: &ClientConfig, level: DiagLevel, message: &str) {
    let tag = if config.embedded_diagnostics && level != DiagLevel::Debug {
        DiagLevel::Error.tag()
    } else {
        level.tag()
    };
    let _ = writeln!(out, "{tag} {message}");
}

/// Convenience wrapper writing to real stderr, as the CLI and status
/// monitor do.
pub fn emit_stderr(config: &ClientConfig, level: DiagLevel, message: &str) {
    emit(&mut std::io::stderr(), config, level, message);
}

/// Formats an `ATTR:` line body for a single IPP attribute, e.g.
/// `marker-levels=45,78,100`.
pub fn attr_line(name: &str, value: &str) -> String {
    format!("{name}={value}")
}

/// Formats a `STATE:` line body, e.g. `-media-empty,+toner-low`. Added
/// reasons are prefixed `+`, cleared reasons `-`.
pub fn state_line(added: &[&str], removed: &[&str]) -> String {
    let mut parts = Vec::with_capacity(added.len() + removed.len());
    parts.extend(added.iter().map(|r| format!("+{r}")));
    parts.extend(removed.iter().map(|r| format!("-{r}")));
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipptransform_core::types::{OutputFormat, PrintOptions};

    fn config(embedded: bool) -> ClientConfig {
        let mut c = ClientConfig::new(PrintOptions::defaults_for(OutputFormat::Pdf));
        c.embedded_diagnostics = embedded;
        c
    }

    #[test]
    fn standalone_mode_keeps_level_prefix() {
        let mut buf = Vec::new();
        emit(&mut buf, &config(false), DiagLevel::Info, "starting job");
        assert_eq!(String::from_utf8(buf).unwrap(), "INFO: starting job\n");
    }

    #[test]
    fn embedded_mode_forces_error_prefix_on_non_debug() {
        let mut buf = Vec::new();
        emit(&mut buf, &config(true), DiagLevel::State, "printer-stopped");
        assert_eq!(String::from_utf8(buf).unwrap(), "ERROR: printer-stopped\n");
    }

    #[test]
    fn embedded_mode_preserves_debug_prefix() {
        let mut buf = Vec::new();
        emit(&mut buf, &config(true), DiagLevel::Debug, "raw bytes written: 4096");
        assert_eq!(String::from_utf8(buf).unwrap(), "DEBUG: raw bytes written: 4096\n");
    }

    #[test]
    fn state_line_formats_added_and_removed_reasons() {
        assert_eq!(
            state_line(&["toner-low"], &["media-empty"]),
            "+toner-low,-media-empty"
        );
    }
}
