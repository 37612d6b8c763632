// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async IPP client for communicating with network printers.
//
// Uses the `ipp` crate's async API to send standard IPP operations:
//   - Get-Printer-Attributes  (RFC 8011 §4.2.5)
//   - Create-Job / Send-Document (RFC 8011 §4.2.2/§4.2.3), preferred when
//     the destination advertises both operations in `operations-supported`
//   - Print-Job               (RFC 8011 §4.2.1), the fallback
//   - Get-Jobs                (RFC 8011 §4.2.6)
//   - Cancel-Job              (RFC 8011 §4.2.8)
//
// Document bodies are gzip-compressed before the request is built whenever
// the destination's `compression-supported` list includes `gzip` and
// `ClientConfig.prefer_gzip` is set — the `ipp` crate's payload abstraction
// takes the already-encoded bytes, so compression happens entirely on this
// side of the builder call.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use flate2::write::GzEncoder;
use flate2::Compression;
use ipp::prelude::*;
use tracing::{debug, error, info, instrument};

use ipptransform_core::types::OutputFormat;
use ipptransform_core::ClientConfig;

use crate::capabilities::PrinterCapabilities;
use crate::error::{Result, SinkError};

/// Attributes returned by a Get-Printer-Attributes response, flattened into
/// a single name/value map (multi-valued attributes joined with `,`, which
/// is also what `capabilities::PrinterCapabilities` expects to split on).
pub type PrinterAttributes = HashMap<String, String>;

/// Summary of a remote print job as returned by Get-Jobs.
#[derive(Debug, Clone)]
pub struct RemoteJobInfo {
    pub job_id: i32,
    pub job_name: String,
    pub job_state: String,
}

/// Async IPP client bound to a single printer URI.
pub struct IppClient {
    uri: Uri,
}

impl IppClient {
    pub fn new(uri: &str) -> Result<Self> {
        let parsed: Uri = uri
            .parse()
            .map_err(|e| SinkError::Ipp(format!("invalid URI '{uri}': {e}")))?;
        Ok(Self { uri: parsed })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[instrument(skip(self), fields(uri = %self.uri))]
    pub async fn get_printer_attributes(&self) -> Result<PrinterAttributes> {
        let operation = IppOperationBuilder::get_printer_attributes(self.uri.clone()).build();
        let client = AsyncIppClient::new(self.uri.clone());

        debug!("sending Get-Printer-Attributes");
        let response = client
            .send(operation)
            .await
            .map_err(|e| SinkError::Ipp(format!("Get-Printer-Attributes: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "Get-Printer-Attributes failed");
            return Err(SinkError::RemoteProtocol(format!(
                "Get-Printer-Attributes returned status {code:?}"
            )));
        }

        let attrs = flatten_attributes(response.attributes());
        debug!(count = attrs.len(), "received printer attributes");
        Ok(attrs)
    }

    /// Probes capabilities and returns them alongside the raw attribute map,
    /// so a caller that also wants e.g. `printer-state-reasons` does not
    /// have to issue a second Get-Printer-Attributes.
    pub async fn probe_capabilities(&self) -> Result<(PrinterCapabilities, PrinterAttributes)> {
        let attrs = self.get_printer_attributes().await?;
        Ok((PrinterCapabilities::from_attributes(&attrs), attrs))
    }

    /// Submits a document, using Create-Job + Send-Document when `caps`
    /// advertises both operations, falling back to a single Print-Job
    /// otherwise. Returns the job-id the printer assigned.
    #[instrument(skip(self, document_bytes, config, caps), fields(uri = %self.uri, job_name = %job_name))]
    pub async fn submit_document(
        &self,
        document_bytes: Vec<u8>,
        output_format: OutputFormat,
        job_name: &str,
        config: &ClientConfig,
        caps: &PrinterCapabilities,
    ) -> Result<i32> {
        let body = if config.prefer_gzip && caps.supports_gzip() {
            gzip_encode(&document_bytes)?
        } else {
            document_bytes
        };

        if caps.supports_create_job() {
            self.create_job_and_send(body, output_format, job_name).await
        } else {
            self.print_job(body, output_format, job_name).await
        }
    }

    async fn create_job_and_send(
        &self,
        document_bytes: Vec<u8>,
        output_format: OutputFormat,
        job_name: &str,
    ) -> Result<i32> {
        let client = AsyncIppClient::new(self.uri.clone());

        let create = IppOperationBuilder::create_job(self.uri.clone())
            .job_title(job_name)
            .build();

        info!("sending Create-Job");
        let response = client
            .send(create)
            .await
            .map_err(|e| SinkError::Ipp(format!("Create-Job: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "Create-Job failed");
            return Err(SinkError::RemoteProtocol(format!(
                "Create-Job returned status {code:?}"
            )));
        }

        let job_id = extract_job_id(response.attributes())
            .ok_or_else(|| SinkError::RemoteProtocol("Create-Job response missing job-id".into()))?;

        let payload = IppPayload::new(Cursor::new(document_bytes));
        let send = IppOperationBuilder::send_document(self.uri.clone(), job_id, payload)
            .document_format(output_format.mime_type())
            .last_document(true)
            .build();

        info!(job_id, mime = output_format.mime_type(), "sending Send-Document");
        let response = client
            .send(send)
            .await
            .map_err(|e| SinkError::Ipp(format!("Send-Document({job_id}): {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, job_id, "Send-Document failed");
            return Err(SinkError::RemoteProtocol(format!(
                "Send-Document({job_id}) returned status {code:?}"
            )));
        }

        info!(job_id, "document accepted by printer");
        Ok(job_id)
    }

    #[instrument(skip(self, document_bytes), fields(uri = %self.uri, job_name = %job_name))]
    pub async fn print_job(
        &self,
        document_bytes: Vec<u8>,
        output_format: OutputFormat,
        job_name: &str,
    ) -> Result<i32> {
        let payload = IppPayload::new(Cursor::new(document_bytes));

        let operation = IppOperationBuilder::print_job(self.uri.clone(), payload)
            .job_title(job_name)
            .document_format(output_format.mime_type())
            .build();

        let client = AsyncIppClient::new(self.uri.clone());

        info!(mime = output_format.mime_type(), "sending Print-Job");
        let response = client
            .send(operation)
            .await
            .map_err(|e| SinkError::Ipp(format!("Print-Job: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "Print-Job failed");
            return Err(SinkError::RemoteProtocol(format!(
                "Print-Job returned status {code:?}"
            )));
        }

        let job_id = extract_job_id(response.attributes())
            .ok_or_else(|| SinkError::RemoteProtocol("Print-Job response missing job-id".into()))?;

        info!(job_id, "print job accepted by printer");
        Ok(job_id)
    }

    #[instrument(skip(self), fields(uri = %self.uri))]
    pub async fn get_jobs(&self) -> Result<Vec<RemoteJobInfo>> {
        let operation = IppOperationBuilder::get_jobs(self.uri.clone()).build();
        let client = AsyncIppClient::new(self.uri.clone());

        debug!("sending Get-Jobs");
        let response = client
            .send(operation)
            .await
            .map_err(|e| SinkError::Ipp(format!("Get-Jobs: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "Get-Jobs failed");
            return Err(SinkError::RemoteProtocol(format!(
                "Get-Jobs returned status {code:?}"
            )));
        }

        let jobs = parse_jobs(response.attributes());
        debug!(count = jobs.len(), "received job list");
        Ok(jobs)
    }

    #[instrument(skip(self), fields(uri = %self.uri, job_id))]
    pub async fn cancel_job(&self, job_id: i32) -> Result<()> {
        let operation = IppOperationBuilder::cancel_job(self.uri.clone(), job_id).build();
        let client = AsyncIppClient::new(self.uri.clone());

        info!(job_id, "sending Cancel-Job");
        let response = client
            .send(operation)
            .await
            .map_err(|e| SinkError::Ipp(format!("Cancel-Job({job_id}): {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, job_id, "Cancel-Job failed");
            return Err(SinkError::RemoteProtocol(format!(
                "Cancel-Job({job_id}) returned status {code:?}"
            )));
        }

        info!(job_id, "job cancelled");
        Ok(())
    }
}

fn gzip_encode(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(SinkError::Io)?;
    encoder.finish().map_err(SinkError::Io)
}

fn flatten_attributes(attrs: &IppAttributes) -> PrinterAttributes {
    let mut map = HashMap::new();
    for group in attrs.groups() {
        for (name, attr) in group.attributes() {
            map.insert(name.clone(), format!("{}", attr.value()));
        }
    }
    map
}

fn extract_job_id(attrs: &IppAttributes) -> Option<i32> {
    for group in attrs.groups_of(DelimiterTag::JobAttributes) {
        if let Some(attr) = group.attributes().get("job-id")
            && let IppValue::Integer(id) = attr.value() {
                return Some(*id);
            }
    }
    None
}

fn parse_jobs(attrs: &IppAttributes) -> Vec<RemoteJobInfo> {
    let mut jobs = Vec::new();

    for group in attrs.groups_of(DelimiterTag::JobAttributes) {
        let attributes = group.attributes();

        let job_id = attributes.get("job-id").and_then(|a| {
            if let IppValue::Integer(id) = a.value() {
                Some(*id)
            } else {
                None
            }
        });

        let job_name = attributes
            .get("job-name")
            .map(|a| format!("{}", a.value()))
            .unwrap_or_default();

        let job_state = attributes
            .get("job-state")
            .map(|a| format!("{}", a.value()))
            .unwrap_or_else(|| "unknown".into());

        if let Some(id) = job_id {
            jobs.push(RemoteJobInfo {
                job_id: id,
                job_name,
                job_state,
            });
        }
    }

    jobs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_uri() {
        let result = IppClient::new("not a valid uri %%%");
        assert!(result.is_err());
    }

    #[test]
    fn new_accepts_valid_ipp_uri() {
        let client = IppClient::new("ipp://192.168.1.100:631/ipp/print");
        assert!(client.is_ok());
    }

    #[test]
    fn gzip_round_trips_through_flate2() {
        let original = b"BT /F1 12 Tf (hello) Tj ET".repeat(50);
        let compressed = gzip_encode(&original).unwrap();
        assert!(compressed.len() < original.len());
    }
}
