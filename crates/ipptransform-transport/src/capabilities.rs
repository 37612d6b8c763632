// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Parses the subset of Get-Printer-Attributes that SINK and XFORM need to
// make delivery decisions: whether Create-Job/Send-Document is available
// (falling back to Print-Job), whether the destination accepts a
// gzip-compressed document body, and which PWG raster document types it
// advertises (the color/quality resolution matrix in XFORM consults this).

use std::collections::HashSet;

use tracing::debug;

/// Flattened, query-only view of a printer's advertised capabilities.
#[derive(Debug, Clone, Default)]
pub struct PrinterCapabilities {
    pub operations_supported: HashSet<String>,
    pub compression_supported: HashSet<String>,
    pub pwg_raster_document_type_supported: HashSet<String>,
    pub pwg_raster_document_resolution_supported: Vec<(u32, u32)>,
}

impl PrinterCapabilities {
    /// Builds a capability view from a flattened attribute map, as returned
    /// by `IppClient::get_printer_attributes`.
    pub fn from_attributes(attrs: &std::collections::HashMap<String, String>) -> Self {
        let split = |key: &str| -> HashSet<String> {
            attrs
                .get(key)
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default()
        };
        let caps = Self {
            operations_supported: split("operations-supported"),
            compression_supported: split("compression-supported"),
            pwg_raster_document_type_supported: split("pwg-raster-document-type-supported"),
            pwg_raster_document_resolution_supported: attrs
                .get("pwg-raster-document-resolution-supported")
                .map(|v| v.split(',').filter_map(|entry| parse_resolution_entry(entry.trim())).collect())
                .unwrap_or_default(),
        };
        debug!(
            create_job = caps.supports_create_job(),
            gzip = caps.supports_gzip(),
            "parsed printer capabilities"
        );
        caps
    }

    pub fn supports_create_job(&self) -> bool {
        self.operations_supported.contains("Create-Job")
            && self.operations_supported.contains("Send-Document")
    }

    pub fn supports_gzip(&self) -> bool {
        self.compression_supported.contains("gzip")
    }

    /// Whether the destination's advertised raster document types include
    /// a color (as opposed to monochrome/bi-level-only) variant.
    pub fn supports_color_raster(&self) -> bool {
        self.pwg_raster_document_type_supported
            .iter()
            .any(|t| t.starts_with("srgb_") || t.starts_with("adobe-rgb_") || t.contains("rgb"))
    }
}

/// Parses one `pwg-raster-document-resolution-supported` entry: either a
/// square `"300dpi"` or an asymmetric `"300x600dpi"` value.
fn parse_resolution_entry(entry: &str) -> Option<(u32, u32)> {
    let entry = entry.strip_suffix("dpi").unwrap_or(entry);
    if let Some((x, y)) = entry.split_once('x') {
        Some((x.parse().ok()?, y.parse().ok()?))
    } else {
        let dpi = entry.parse().ok()?;
        Some((dpi, dpi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn detects_create_job_send_document_pair() {
        let caps = PrinterCapabilities::from_attributes(&attrs(&[(
            "operations-supported",
            "Print-Job,Create-Job,Send-Document,Get-Jobs",
        )]));
        assert!(caps.supports_create_job());
    }

    #[test]
    fn missing_send_document_means_no_create_job_flow() {
        let caps = PrinterCapabilities::from_attributes(&attrs(&[(
            "operations-supported",
            "Print-Job,Create-Job,Get-Jobs",
        )]));
        assert!(!caps.supports_create_job());
    }

    #[test]
    fn gzip_support_parsed_from_compression_list() {
        let caps = PrinterCapabilities::from_attributes(&attrs(&[("compression-supported", "gzip,deflate")]));
        assert!(caps.supports_gzip());
    }

    #[test]
    fn color_raster_detected_from_document_type_list() {
        let caps = PrinterCapabilities::from_attributes(&attrs(&[(
            "pwg-raster-document-type-supported",
            "black_1,sgray_8,srgb_8",
        )]));
        assert!(caps.supports_color_raster());
    }

    #[test]
    fn resolution_list_parses_square_and_asymmetric_entries() {
        let caps = PrinterCapabilities::from_attributes(&attrs(&[(
            "pwg-raster-document-resolution-supported",
            "300dpi,300x600dpi",
        )]));
        assert_eq!(caps.pwg_raster_document_resolution_supported, vec![(300, 300), (300, 600)]);
    }
}
