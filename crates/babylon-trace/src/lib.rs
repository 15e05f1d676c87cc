// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tracing and evaluation for Babylon live examples.
//!
//! [`Tracer`] runs one parsed [`Example`](babylon_annotate::Example) under
//! a statement listener and fills in its probes, assertions and result.
//! [`Evaluator`] answers "what is the value here" for a cursor position,
//! trying a literal, recorded coverage, a run to the target section and
//! finally a global evaluation, in that order.

pub mod context;
pub mod coverage;
pub mod error;
pub mod evaluator;
mod listener;
pub mod runner;
pub mod tracer;

pub use context::{TraceContext, TraceOptions};
pub use coverage::{CoverageCollector, CoverageData, CoverageStore};
pub use error::{EvaluateError, TraceError};
pub use evaluator::{Evaluation, Evaluator};
pub use runner::{runner_reference, RUNNER_PREFIX};
pub use tracer::Tracer;
