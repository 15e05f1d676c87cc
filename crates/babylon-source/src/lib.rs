// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source text coordinates for Babylon.
//!
//! Byte spans, the line/column [`TextMap`], and [`SourceSection`], the
//! location every runtime event and recorded probe is keyed by.

pub mod section;
pub mod source;
pub mod span;
pub mod text_map;

pub use section::{file_name, resolve_sibling_uri, SourceSection};
pub use source::Source;
pub use span::Span;
pub use text_map::{TextMap, TextMapError};
