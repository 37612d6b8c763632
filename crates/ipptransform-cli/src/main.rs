// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `ipptransform` binary (§6): parses the CLI surface, builds a
// `PrintOptions`/`ClientConfig` for the job, and wires PREP -> XFORM -> SINK
// together. PREP and XFORM are synchronous (they shell out to `pdftoppm`/
// `pdftops` and walk PDF object graphs) and run on `spawn_blocking`; SINK is
// the only async stage, since delivery may involve a busy-retry loop and a
// background status monitor.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use ipptransform_core::{
    ClientConfig, InputDocument, MediaSize, MultipleDocumentHandling, OutputFormat, PipelineError,
    PrintColorMode, PrintOptions, PrintQuality, PrintScaling, Resolution, Sides, SheetBack,
};
use ipptransform_document::prepare::prepare_job;
use ipptransform_transform::{color::resolve_resolution, transform};
use ipptransform_transport::diagnostics::{self, DiagLevel};
use ipptransform_transport::{deliver, DeliveryTarget, IppClient};

/// Converts one or more input documents into the wire format a destination
/// accepts, and delivers the result to a file, a raw socket, or an IPP
/// printer.
#[derive(Parser, Debug)]
#[command(name = "ipptransform", version, about, long_about = None)]
struct Cli {
    /// Destination URI (`ipp://`, `ipps://`, or `socket://host:port`).
    #[arg(short = 'd', long = "device-uri", env = "DEVICE_URI")]
    device_uri: Option<String>,

    /// Write the transformed output to this file instead of `device_uri`.
    #[arg(short = 'f', long = "outfile")]
    outfile: Option<PathBuf>,

    /// MIME type of the first input document, overriding content sniffing.
    #[arg(short = 'i', long = "input-type")]
    input_type: Option<String>,

    /// MIME type to produce: one of application/pdf, application/PCLm,
    /// application/postscript, application/vnd.hp-PCL, image/pwg-raster,
    /// image/urf.
    #[arg(short = 'm', long = "output-type", env = "OUTPUT_TYPE")]
    output_type: Option<String>,

    /// A `name=value` print option; may be given multiple times.
    #[arg(short = 'o', long = "option", value_parser = parse_key_value)]
    options: Vec<(String, String)>,

    /// Resolution as `XDPIxYDPI` or a single `DPI` applied to both axes.
    #[arg(short = 'r', long = "resolution")]
    resolution: Option<String>,

    /// Duplex back-side transform: normal, flipped, manual-tumble, rotated.
    #[arg(short = 's', long = "sheet-back")]
    sheet_back: Option<String>,

    /// Comma-separated `pwg-raster-document-type-supported` override, used
    /// when no destination is queried for its own advertised list.
    #[arg(short = 't', long = "types")]
    types: Option<String>,

    /// Increases log verbosity; repeatable.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Input documents, in submission order.
    files: Vec<PathBuf>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}

/// Installs the ambient `tracing` subscriber. This is separate from the
/// `DEBUG:`/`INFO:`/`ATTR:`/`STATE:`/`ERROR:` diagnostic channel (§6), which
/// `ipptransform_transport::diagnostics` writes directly at the lifecycle
/// points that channel is meant to report on; `tracing` covers free-form
/// internal instrumentation, gated by `-v`/`IPPTRANSFORM_DEBUG`/`RUST_LOG`.
fn init_tracing(verbose: u8) {
    let default_level = if std::env::var_os("IPPTRANSFORM_DEBUG").is_some() || verbose > 0 {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), PipelineError> {
    let (mut print_options, explicit_resolution) = build_print_options(&cli)?;
    let target = resolve_target(&cli)?;
    let sink_handles_copies = matches!(target, DeliveryTarget::Ipp { .. });
    let watch_status = matches!(target, DeliveryTarget::Ipp { .. }) && cli.verbose > 0;

    let probe_config = ClientConfig::new(print_options.clone());
    let (supported_raster_types, supported_resolutions) = probe_destination_capabilities(&cli, &target, &probe_config).await;
    print_options.resolution = resolve_resolution(explicit_resolution, print_options.print_color_mode, &supported_resolutions);

    let config = ClientConfig::new(print_options);

    diagnostics::emit_stderr(
        &config,
        DiagLevel::Info,
        &format!("preparing {} input document(s)", cli.files.len()),
    );

    let inputs = build_inputs(&cli)?;
    let passwords = collect_passwords(cli.files.len());

    let job_title = cli
        .files
        .first()
        .and_then(|p| p.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ipptransform job".to_string());
    let job_user = std::env::var("USER").unwrap_or_else(|_| "anonymous".to_string());

    let prepared = prepare_job(&inputs, &passwords, &config.print_options, &job_title, &job_user, sink_handles_copies)
        .map_err(PipelineError::from)?;

    for diag in &prepared.diagnostics {
        let level = if diag.is_error { DiagLevel::Error } else { DiagLevel::Info };
        diagnostics::emit_stderr(&config, level, &diag.message);
    }

    let intermediate = ipptransform_document::pdf::reader::from_bytes(&prepared.pdf_bytes).map_err(PipelineError::from)?;
    let page_count = ipptransform_document::pdf::reader::page_count(&intermediate) as u32;

    diagnostics::emit_stderr(
        &config,
        DiagLevel::Info,
        &format!("transforming {page_count} page(s) to {}", config.print_options.output_format.mime_type()),
    );

    let pdf_bytes = prepared.pdf_bytes;
    let transform_options = config.print_options.clone();
    let rendered = tokio::task::spawn_blocking(move || transform(&pdf_bytes, page_count, &transform_options, &supported_raster_types))
        .await
        .map_err(|err| PipelineError::Internal(format!("transform task panicked: {err}")))?
        .map_err(PipelineError::from)?;

    let output_format = config.print_options.output_format;
    let outcome = deliver(target, rendered, output_format, &job_title, &config, watch_status)
        .await
        .map_err(PipelineError::from)?;

    diagnostics::emit_stderr(
        &config,
        DiagLevel::Info,
        &match outcome.job_id {
            Some(id) => format!("delivered {} bytes (job-id {id})", outcome.bytes_written),
            None => format!("delivered {} bytes", outcome.bytes_written),
        },
    );

    Ok(())
}

/// Probes the destination's advertised raster types (for the color/quality
/// resolution matrix, §4.3) and resolution list (for `resolve_resolution`'s
/// fallback chain), unless `-t`/`-r` were given explicitly — an explicit
/// override always wins over a live probe. Probing here is a second
/// Get-Printer-Attributes beyond the one `deliver` issues internally for its
/// own retry bookkeeping; `XFORM` needs the answer before `SINK` runs, so the
/// two probes cannot be collapsed into one without XFORM and SINK trading
/// the capability object across the async/sync boundary.
async fn probe_destination_capabilities(cli: &Cli, target: &DeliveryTarget, config: &ClientConfig) -> (Vec<String>, Vec<(u32, u32)>) {
    let explicit_types = cli.types.as_ref().map(|types| types.split(',').map(|s| s.trim().to_string()).collect());

    let needs_raster_types = matches!(
        config.print_options.output_format,
        OutputFormat::PwgRaster | OutputFormat::AppleRaster
    );
    let DeliveryTarget::Ipp { uri } = target else {
        return (explicit_types.unwrap_or_default(), Vec::new());
    };
    if explicit_types.is_some() && !needs_raster_types {
        return (explicit_types.unwrap_or_default(), Vec::new());
    }

    match IppClient::new(uri) {
        Ok(client) => match client.probe_capabilities().await {
            Ok((caps, _attrs)) => {
                let types = explicit_types.unwrap_or_else(|| caps.pwg_raster_document_type_supported.into_iter().collect());
                (types, caps.pwg_raster_document_resolution_supported)
            }
            Err(err) => {
                diagnostics::emit_stderr(
                    config,
                    DiagLevel::Debug,
                    &format!("capability probe failed, proceeding without advertised raster types/resolutions: {err}"),
                );
                (explicit_types.unwrap_or_default(), Vec::new())
            }
        },
        Err(err) => {
            diagnostics::emit_stderr(config, DiagLevel::Debug, &format!("could not parse device URI for probing: {err}"));
            (explicit_types.unwrap_or_default(), Vec::new())
        }
    }
}

fn resolve_target(cli: &Cli) -> Result<DeliveryTarget, PipelineError> {
    if let Some(path) = &cli.outfile {
        return Ok(DeliveryTarget::File(path.clone()));
    }
    let Some(uri) = &cli.device_uri else {
        return Err(PipelineError::BadInput("no destination given (-d device-uri or -f outfile)".into()));
    };
    if let Some(rest) = uri.strip_prefix("socket://") {
        let (host, port) = rest
            .split_once(':')
            .ok_or_else(|| PipelineError::UnsupportedOption(format!("socket URI missing port: {uri}")))?;
        let port: u16 = port
            .parse()
            .map_err(|_| PipelineError::UnsupportedOption(format!("invalid socket port in {uri}")))?;
        return Ok(DeliveryTarget::Socket {
            host: host.to_string(),
            port,
        });
    }
    if uri.starts_with("ipp://") || uri.starts_with("ipps://") {
        return Ok(DeliveryTarget::Ipp { uri: uri.clone() });
    }
    if let Some(path) = uri.strip_prefix("file://") {
        return Ok(DeliveryTarget::File(PathBuf::from(path)));
    }
    Err(PipelineError::UnsupportedOption(format!("unsupported device URI scheme: {uri}")))
}

fn build_inputs(cli: &Cli) -> Result<Vec<InputDocument>, PipelineError> {
    if cli.files.is_empty() {
        return Err(PipelineError::BadInput("no input documents given".into()));
    }
    cli.files
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let declared = indexed_env("CONTENT_TYPE", index)
                .or_else(|| if index == 0 { cli.input_type.clone() } else { None })
                .or_else(|| sniff_mime_type(path));
            let declared = declared
                .ok_or_else(|| PipelineError::UnsupportedFormat(format!("cannot determine input type for {}", path.display())))?;
            Ok(InputDocument::new(path.clone(), declared))
        })
        .collect()
}

fn sniff_mime_type(path: &std::path::Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "ras" | "pwg" => "image/pwg-raster",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(mime.to_string())
}

fn collect_passwords(count: usize) -> Vec<Option<String>> {
    (0..count).map(|i| indexed_env("IPP_DOCUMENT_PASSWORD", i)).collect()
}

fn indexed_env(prefix: &str, index: usize) -> Option<String> {
    std::env::var(format!("{prefix}{index}")).ok()
}

/// Builds the job's resolved `PrintOptions` plus any explicit `-r` override.
/// The override is threaded back to the caller rather than written into
/// `opts.resolution` directly, since it must win over a live destination
/// probe that runs after this function returns (`resolve_resolution`).
fn build_print_options(cli: &Cli) -> Result<(PrintOptions, Option<Resolution>), PipelineError> {
    let mime = cli
        .output_type
        .as_deref()
        .ok_or_else(|| PipelineError::UnsupportedFormat("no output type given (-m or OUTPUT_TYPE)".into()))?;
    let output_format = OutputFormat::from_mime_type(mime)
        .ok_or_else(|| PipelineError::UnsupportedFormat(format!("unrecognized output type: {mime}")))?;

    let mut opts = PrintOptions::defaults_for(output_format);

    let explicit_resolution = cli.resolution.as_deref().map(parse_resolution).transpose()?;
    if let Some(raw) = &cli.sheet_back {
        opts.sheet_back = parse_sheet_back(raw)?;
    }

    for (key, value) in &cli.options {
        if let Err(warning) = apply_option(&mut opts, key, value) {
            diagnostics::emit_stderr(
                &ClientConfig::new(opts.clone()),
                DiagLevel::Info,
                &format!("ignoring unsupported option {key}={value}: {warning}"),
            );
        }
    }

    Ok((opts, explicit_resolution))
}

fn parse_resolution(raw: &str) -> Result<Resolution, PipelineError> {
    if let Some((x, y)) = raw.split_once('x') {
        let x_dpi = x.parse().map_err(|_| PipelineError::UnsupportedOption(format!("bad resolution: {raw}")))?;
        let y_dpi = y.parse().map_err(|_| PipelineError::UnsupportedOption(format!("bad resolution: {raw}")))?;
        Ok(Resolution { x_dpi, y_dpi })
    } else {
        let dpi: u32 = raw.parse().map_err(|_| PipelineError::UnsupportedOption(format!("bad resolution: {raw}")))?;
        Ok(Resolution { x_dpi: dpi, y_dpi: dpi })
    }
}

fn parse_sheet_back(raw: &str) -> Result<SheetBack, PipelineError> {
    match raw {
        "normal" => Ok(SheetBack::Normal),
        "flipped" => Ok(SheetBack::Flipped),
        "manual-tumble" => Ok(SheetBack::ManualTumble),
        "rotated" => Ok(SheetBack::Rotated),
        _ => Err(PipelineError::UnsupportedOption(format!("unrecognized sheet-back: {raw}"))),
    }
}

/// Applies one `-o name=value` pair to `opts`, covering the options a job
/// submission commonly carries. An unrecognized name or value is reported
/// as a non-fatal warning by the caller rather than aborting the job — the
/// option-parsing surface itself is outside this design's core scope (§1),
/// so this purposefully covers the common cases rather than every IPP
/// attribute.
fn apply_option(opts: &mut PrintOptions, key: &str, value: &str) -> Result<(), String> {
    match key {
        "sides" => {
            opts.sides = match value {
                "one-sided" => Sides::OneSided,
                "two-sided-long-edge" => Sides::TwoSidedLongEdge,
                "two-sided-short-edge" => Sides::TwoSidedShortEdge,
                other => return Err(format!("unknown sides value: {other}")),
            };
            Ok(())
        }
        "print-color-mode" => {
            opts.print_color_mode = match value {
                "color" => PrintColorMode::Color,
                "monochrome" => PrintColorMode::Monochrome,
                "bi-level" => PrintColorMode::BiLevel,
                "auto" => PrintColorMode::Auto,
                other => return Err(format!("unknown print-color-mode value: {other}")),
            };
            Ok(())
        }
        "print-quality" => {
            opts.quality = match value {
                "draft" | "3" => PrintQuality::Draft,
                "normal" | "4" => PrintQuality::Normal,
                "high" | "5" => PrintQuality::High,
                other => return Err(format!("unknown print-quality value: {other}")),
            };
            Ok(())
        }
        "print-scaling" => {
            opts.print_scaling = match value {
                "none" => PrintScaling::None,
                "fit" => PrintScaling::Fit,
                "fill" => PrintScaling::Fill,
                "auto" => PrintScaling::Auto,
                "auto-fit" => PrintScaling::AutoFit,
                other => return Err(format!("unknown print-scaling value: {other}")),
            };
            Ok(())
        }
        "copies" => {
            opts.copies = value.parse().map_err(|_| format!("copies must be a positive integer: {value}"))?;
            Ok(())
        }
        "number-up" => {
            opts.number_up = value.parse().map_err(|_| format!("number-up must be an integer: {value}"))?;
            Ok(())
        }
        "multiple-document-handling" => {
            opts.multiple_document_handling = match value {
                "single-document" => MultipleDocumentHandling::SingleDocument,
                "single-document-new-sheet" => MultipleDocumentHandling::SingleDocumentNewSheet,
                "separate-documents-collated-copies" => MultipleDocumentHandling::SeparateDocumentsCollatedCopies,
                "separate-documents-uncollated-copies" => MultipleDocumentHandling::SeparateDocumentsUncollatedCopies,
                other => return Err(format!("unknown multiple-document-handling value: {other}")),
            };
            Ok(())
        }
        "media" => {
            opts.media = media_preset(value).ok_or_else(|| format!("unknown media preset: {value}"))?;
            Ok(())
        }
        _ => Err("not a recognized print option".to_string()),
    }
}

/// The two PWG default media sizes the rest of the pipeline already assumes
/// elsewhere (`pcl::media_size_code`); anything else is unrecognized here.
fn media_preset(name: &str) -> Option<MediaSize> {
    let (width, height) = if name.starts_with("na_letter") {
        (21590, 27940)
    } else if name.starts_with("iso_a4") {
        (21000, 29700)
    } else {
        return None;
    };
    Some(MediaSize {
        width,
        height,
        margins: Default::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_value_splits_on_first_equals() {
        assert_eq!(parse_key_value("sides=two-sided-long-edge").unwrap(), ("sides".to_string(), "two-sided-long-edge".to_string()));
        assert!(parse_key_value("no-equals-sign").is_err());
    }

    #[test]
    fn parse_resolution_handles_single_and_paired_values() {
        assert_eq!(parse_resolution("600").unwrap(), Resolution { x_dpi: 600, y_dpi: 600 });
        assert_eq!(parse_resolution("300x600").unwrap(), Resolution { x_dpi: 300, y_dpi: 600 });
        assert!(parse_resolution("bogus").is_err());
    }

    #[test]
    fn apply_option_rejects_unknown_keys() {
        let mut opts = PrintOptions::defaults_for(OutputFormat::Pdf);
        assert!(apply_option(&mut opts, "not-a-real-option", "x").is_err());
    }

    #[test]
    fn apply_option_sets_sides_and_copies() {
        let mut opts = PrintOptions::defaults_for(OutputFormat::Pdf);
        apply_option(&mut opts, "sides", "two-sided-long-edge").unwrap();
        apply_option(&mut opts, "copies", "3").unwrap();
        assert_eq!(opts.sides, Sides::TwoSidedLongEdge);
        assert_eq!(opts.copies, 3);
    }

    #[test]
    fn sniff_mime_type_recognizes_common_extensions() {
        assert_eq!(sniff_mime_type(std::path::Path::new("a.pdf")).as_deref(), Some("application/pdf"));
        assert_eq!(sniff_mime_type(std::path::Path::new("a.jpg")).as_deref(), Some("image/jpeg"));
        assert!(sniff_mime_type(std::path::Path::new("a.xyz")).is_none());
    }

    #[test]
    fn build_print_options_threads_explicit_resolution_separately() {
        let cli = Cli {
            device_uri: None,
            outfile: Some(PathBuf::from("/tmp/out.pwg")),
            input_type: None,
            output_type: Some("image/pwg-raster".to_string()),
            options: Vec::new(),
            resolution: Some("600x1200".to_string()),
            sheet_back: None,
            types: None,
            verbose: 0,
            files: Vec::new(),
        };
        let (opts, explicit) = build_print_options(&cli).unwrap();
        assert_eq!(explicit, Some(Resolution { x_dpi: 600, y_dpi: 1200 }));
        assert_eq!(opts.resolution, Resolution { x_dpi: 300, y_dpi: 300 });
    }

    #[test]
    fn resolve_target_prefers_outfile_over_device_uri() {
        let cli = Cli {
            device_uri: Some("ipp://example/print".to_string()),
            outfile: Some(PathBuf::from("/tmp/out.pdf")),
            input_type: None,
            output_type: None,
            options: Vec::new(),
            resolution: None,
            sheet_back: None,
            types: None,
            verbose: 0,
            files: Vec::new(),
        };
        assert!(matches!(resolve_target(&cli).unwrap(), DeliveryTarget::File(_)));
    }
}
