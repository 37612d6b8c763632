// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ipptransform-core — domain types, the resolved print option set, and the
// unified error taxonomy shared by PREP, XFORM, and SINK.

pub mod config;
pub mod error;
pub mod types;

pub use config::ClientConfig;
pub use error::PipelineError;
pub use types::*;
