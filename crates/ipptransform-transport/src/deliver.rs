// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SINK's top-level entry point (§4.4): dispatches a rendered document to
// one of the three transport targets the data model allows — a local file,
// a raw AppSocket/JetDirect TCP connection, or an IPP destination — and for
// the IPP case, drives the busy-retry loop and (optionally) the background
// status monitor around the actual Create-Job/Send-Document or Print-Job
// exchange.

use ipptransform_core::types::OutputFormat;
use ipptransform_core::ClientConfig;
use tracing::{info, warn};

use crate::diagnostics::{self, DiagLevel};
use crate::error::{Result, SinkError};
use crate::ipp_client::IppClient;
use crate::monitor;
use crate::retry::{AttemptOutcome, RetryDecision, RetryState};
use crate::sink::{FileSink, SocketSink};

/// Where a prepared document is sent. Unifies the spec's `TransportSink`
/// variants; `Ipp` is the only one with retry/monitor semantics attached,
/// since `File`/`Socket` have no notion of "busy" at this layer.
pub enum DeliveryTarget {
    File(std::path::PathBuf),
    Socket { host: String, port: u16 },
    Ipp { uri: String },
}

/// What a successful delivery produced, for the CLI to report back.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub bytes_written: usize,
    pub job_id: Option<i32>,
}

/// Delivers `document_bytes` to `target`, honoring the job's resolved
/// `ClientConfig`. `job_name` is used only for the IPP `job-title`
/// attribute. `watch_status` enables the background status monitor for IPP
/// deliveries; it is ignored for `File`/`Socket` targets.
pub async fn deliver(
    target: DeliveryTarget,
    document_bytes: Vec<u8>,
    output_format: OutputFormat,
    job_name: &str,
    config: &ClientConfig,
    watch_status: bool,
) -> Result<DeliveryOutcome> {
    match target {
        DeliveryTarget::File(path) => {
            let mut sink = FileSink::create(&path).await?;
            let n = sink.write_all(&document_bytes).await?;
            sink.flush().await?;
            diagnostics::emit_stderr(config, DiagLevel::Info, &format!("wrote {n} bytes to {}", path.display()));
            Ok(DeliveryOutcome {
                bytes_written: n,
                job_id: None,
            })
        }
        DeliveryTarget::Socket { host, port } => {
            let mut sink = SocketSink::connect(&host, port).await?;
            let n = sink.write_all(&document_bytes).await?;
            sink.flush().await?;
            diagnostics::emit_stderr(config, DiagLevel::Info, &format!("wrote {n} bytes to {host}:{port}"));
            Ok(DeliveryOutcome {
                bytes_written: n,
                job_id: None,
            })
        }
        DeliveryTarget::Ipp { uri } => {
            deliver_ipp(&uri, document_bytes, output_format, job_name, config, watch_status).await
        }
    }
}

async fn deliver_ipp(
    uri: &str,
    document_bytes: Vec<u8>,
    output_format: OutputFormat,
    job_name: &str,
    config: &ClientConfig,
    watch_status: bool,
) -> Result<DeliveryOutcome> {
    let client = IppClient::new(uri)?;
    let (caps, _attrs) = client.probe_capabilities().await?;

    let monitor_handle = if watch_status {
        let monitor_uri = uri.to_string();
        let monitor_config = config.clone();
        Some(monitor::spawn(monitor_config, move || {
            let uri = monitor_uri.clone();
            async move {
                IppClient::new(&uri).ok()?.get_printer_attributes().await.ok()
            }
        }))
    } else {
        None
    };

    let mut retry_state = RetryState::new(config);
    let body_len = document_bytes.len();
    let result = loop {
        match client
            .submit_document(document_bytes.clone(), output_format, job_name, config, &caps)
            .await
        {
            Ok(job_id) => break Ok(DeliveryOutcome {
                bytes_written: body_len,
                job_id: Some(job_id),
            }),
            Err(SinkError::RemoteBusy(reason)) => {
                warn!(reason = %reason, "printer busy");
                match retry_state.advance(AttemptOutcome::Busy) {
                    RetryDecision::RetryAfter(delay) => {
                        diagnostics::emit_stderr(
                            config,
                            DiagLevel::Info,
                            &format!("printer busy, retrying in {}s", delay.as_secs()),
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    RetryDecision::GiveUp => break Err(SinkError::RemoteBusy(reason)),
                    RetryDecision::Done => unreachable!("Busy outcome never resolves to Done"),
                }
            }
            Err(other) => break Err(other),
        }
    };

    if let Some(handle) = &monitor_handle {
        handle.stop();
    }

    if result.is_ok() {
        info!("document delivered");
    }

    result
}
