// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SINK: delivers a rendered document to its destination — a file, a raw
// AppSocket/JetDirect socket, or an IPP printer — with busy-retry,
// authorization negotiation, and an optional background status monitor.

pub mod auth;
pub mod capabilities;
pub mod deliver;
pub mod diagnostics;
pub mod error;
pub mod ipp_client;
pub mod monitor;
pub mod retry;
pub mod sink;

pub use capabilities::PrinterCapabilities;
pub use deliver::{deliver, DeliveryOutcome, DeliveryTarget};
pub use error::{Result, SinkError};
pub use ipp_client::IppClient;
pub use retry::{FibonacciDelay, RetryState};
