// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Busy-retry backoff. The delay between attempts follows the fixed
// Fibonacci sequence 1, 1, 2, 3, 5, 8, 13, 21, 34, 55 seconds; once the
// sequence is exhausted it wraps back to the start rather than growing
// without bound. The status monitor (`monitor.rs`) reuses the same
// sequence for its poll interval.

use std::time::Duration;

use ipptransform_core::ClientConfig;
use tracing::{debug, warn};

const FIBONACCI_SECONDS: [u64; 10] = [1, 1, 2, 3, 5, 8, 13, 21, 34, 55];

/// An infinite, wrapping iterator over the Fibonacci backoff sequence.
#[derive(Debug, Clone)]
pub struct FibonacciDelay {
    next_index: usize,
}

impl FibonacciDelay {
    pub fn new() -> Self {
        Self { next_index: 0 }
    }
}

impl Default for FibonacciDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for FibonacciDelay {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let seconds = FIBONACCI_SECONDS[self.next_index % FIBONACCI_SECONDS.len()];
        self.next_index += 1;
        Some(Duration::from_secs(seconds))
    }
}

/// Outcome of one submission attempt, as classified by the caller from
/// whatever transport-specific status it observed (IPP status code, HTTP
/// status line, or `errno` for a raw socket/file sink).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    /// The destination is busy; retry after the next backoff delay.
    Busy,
    /// The destination rejected the request and retrying will not help.
    Fatal,
}

/// Drives the busy-retry loop: tracks how many attempts have been spent and
/// hands back the next delay, honoring `ClientConfig.max_busy_retries`.
pub struct RetryState {
    delays: FibonacciDelay,
    attempts: u32,
    max_attempts: u32,
}

impl RetryState {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            delays: FibonacciDelay::new(),
            attempts: 0,
            max_attempts: config.max_busy_retries,
        }
    }

    /// Given the outcome of the attempt just made, decide what to do next.
    pub fn advance(&mut self, outcome: AttemptOutcome) -> RetryDecision {
        match outcome {
            AttemptOutcome::Success => RetryDecision::Done,
            AttemptOutcome::Fatal => RetryDecision::GiveUp,
            AttemptOutcome::Busy => {
                self.attempts += 1;
                if self.attempts >= self.max_attempts {
                    warn!(attempts = self.attempts, "exhausted busy-retry budget");
                    RetryDecision::GiveUp
                } else {
                    let delay = self.delays.next().expect("infinite iterator");
                    debug!(attempt = self.attempts, delay_secs = delay.as_secs(), "retrying after busy response");
                    RetryDecision::RetryAfter(delay)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    Done,
    GiveUp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipptransform_core::types::{OutputFormat, PrintOptions};

    fn test_config() -> ClientConfig {
        ClientConfig::new(PrintOptions::defaults_for(OutputFormat::Pdf))
    }

    #[test]
    fn sequence_matches_fibonacci_then_wraps() {
        let delays: Vec<u64> = FibonacciDelay::new().take(12).map(|d| d.as_secs()).collect();
        assert_eq!(
            delays,
            vec![1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 1, 1]
        );
    }

    #[test]
    fn busy_retries_stop_at_configured_cap() {
        let mut config = test_config();
        config.max_busy_retries = 3;
        let mut state = RetryState::new(&config);
        assert_eq!(state.advance(AttemptOutcome::Busy), RetryDecision::RetryAfter(Duration::from_secs(1)));
        assert_eq!(state.advance(AttemptOutcome::Busy), RetryDecision::RetryAfter(Duration::from_secs(1)));
        assert_eq!(state.advance(AttemptOutcome::Busy), RetryDecision::GiveUp);
    }

    #[test]
    fn fatal_outcome_gives_up_immediately() {
        let config = test_config();
        let mut state = RetryState::new(&config);
        assert_eq!(state.advance(AttemptOutcome::Fatal), RetryDecision::GiveUp);
    }

    #[test]
    fn success_reports_done() {
        let config = test_config();
        let mut state = RetryState::new(&config);
        assert_eq!(state.advance(AttemptOutcome::Success), RetryDecision::Done);
    }
}
