// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The status monitor: an optional auxiliary task that polls
// Get-Printer-Attributes for `marker-*`, `printer-alert`,
// `printer-state-reasons`, and `printer-supply*` while the main document
// transfer is in flight, emitting `STATE:`/`ATTR:` diagnostic lines when
// those attributes change. It shares no mutable state with the transfer
// itself — only a cancellation flag, checked at each sleep boundary so the
// task never outlives the job it was watching.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ipptransform_core::ClientConfig;
use tokio::time::sleep;
use tracing::debug;

use crate::diagnostics::{self, DiagLevel};
use crate::retry::FibonacciDelay;

const WATCHED_PREFIXES: [&str; 4] = ["marker-", "printer-alert", "printer-state-reasons", "printer-supply"];

/// A handle the job-submission task uses to stop the monitor once the
/// transfer completes, whether it succeeded or failed.
#[derive(Clone)]
pub struct MonitorHandle {
    cancel: Arc<AtomicBool>,
}

impl MonitorHandle {
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

fn watched(attrs: &HashMap<String, String>) -> HashMap<String, String> {
    attrs
        .iter()
        .filter(|(k, _)| WATCHED_PREFIXES.iter().any(|p| k.starts_with(p)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Diffs two watched-attribute snapshots into the `+reason`/`-reason` pairs
/// a `STATE:` line needs; only `printer-state-reasons` (a comma-separated
/// keyword set) is diffed this way, everything else is reported verbatim
/// via `ATTR:` whenever its value changes.
fn diff_state_reasons(previous: &str, current: &str) -> (Vec<String>, Vec<String>) {
    let prev: HashSet<&str> = previous.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    let curr: HashSet<&str> = current.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    let added = curr.difference(&prev).map(|s| s.to_string()).collect();
    let removed = prev.difference(&curr).map(|s| s.to_string()).collect();
    (added, removed)
}

/// Spawns the monitor as a tokio task, polling `poll` (typically a closure
/// wrapping `IppClient::get_printer_attributes`) on the Fibonacci delay
/// sequence. Returns a [`MonitorHandle`] the caller stops at job end.
pub fn spawn<F, Fut>(config: ClientConfig, mut poll: F) -> MonitorHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Option<HashMap<String, String>>> + Send,
{
    let cancel = Arc::new(AtomicBool::new(false));
    let handle = MonitorHandle { cancel: cancel.clone() };

    tokio::spawn(async move {
        let mut delays = FibonacciDelay::new();
        let mut last: HashMap<String, String> = HashMap::new();

        while !cancel.load(Ordering::Relaxed) {
            if let Some(attrs) = poll().await {
                let current = watched(&attrs);
                for (key, value) in &current {
                    match last.get(key) {
                        Some(prev) if prev == value => {}
                        Some(prev) if key == "printer-state-reasons" => {
                            let (added, removed) = diff_state_reasons(prev, value);
                            let added_refs: Vec<&str> = added.iter().map(String::as_str).collect();
                            let removed_refs: Vec<&str> = removed.iter().map(String::as_str).collect();
                            let line = diagnostics::state_line(&added_refs, &removed_refs);
                            diagnostics::emit_stderr(&config, DiagLevel::State, &line);
                        }
                        _ => {
                            let line = diagnostics::attr_line(key, value);
                            diagnostics::emit_stderr(&config, DiagLevel::Attr, &line);
                        }
                    }
                }
                last = current;
            } else {
                debug!("status monitor poll failed, will retry");
            }

            let delay = delays.next().expect("infinite iterator");
            sleep(delay).await;
        }
    });

    handle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_detects_added_and_removed_reasons() {
        let (added, removed) = diff_state_reasons("media-empty,door-open", "door-open,toner-low");
        assert_eq!(added, vec!["toner-low".to_string()]);
        assert_eq!(removed, vec!["media-empty".to_string()]);
    }

    #[test]
    fn watched_filters_to_known_prefixes() {
        let mut attrs = HashMap::new();
        attrs.insert("marker-levels".to_string(), "45".to_string());
        attrs.insert("job-name".to_string(), "report.pdf".to_string());
        attrs.insert("printer-supply-info-uri".to_string(), "http://x".to_string());
        let filtered = watched(&attrs);
        assert!(filtered.contains_key("marker-levels"));
        assert!(filtered.contains_key("printer-supply-info-uri"));
        assert!(!filtered.contains_key("job-name"));
    }
}
