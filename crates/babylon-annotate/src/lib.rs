// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Babylon annotations.
//!
//! Examples are declared in comments above a function:
//!
//! ```text
//! /* <Example :name="small" :probe-mode="all" w=2 h=3 /> */
//! function area(w, h) {
//!   // <Probe />
//!   let a = w * h
//!   // <Assertion example="small" expected=6 />
//!   return a
//! }
//! ```
//!
//! This crate extracts them into [`Example`] values; the tracer fills in
//! what a run observed.

pub mod literal;
pub mod model;
pub mod parser;
pub mod scaffold;

pub use literal::Literal;
pub use model::{
    glyph, Assertion, AssertionPayload, AssertionSite, Captured, Example, Probe, ProbeMode,
    ProbeSite,
};
pub use parser::{Marker, ParseContext, PatternError, DEFAULT_MISSING_ARGUMENT};
pub use scaffold::ExampleScaffold;
