// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Execution-runtime capability surface.
//!
//! The tracer and evaluator only ever talk to a guest language through the
//! traits in this crate: parse a program, parse a snippet inline against a
//! live frame, and attach listeners to instrumented execution events.

pub mod documents;
pub mod event;
pub mod filter;
pub mod frame;
pub mod runtime;
pub mod subscription;
pub mod tag;
pub mod value;

pub use documents::{DocumentStore, FsDocuments, MemoryDocuments};
pub use event::{EventContext, ExecutionListener, SharedListener};
pub use filter::EventFilter;
pub use frame::{Frame, MaterializedFrame};
pub use runtime::{
    ArgumentDeclaration, Callable, Evaluable, FunctionDeclaration, GuestError, GuestErrorKind,
    NodeInfo, NodeKind, Outcome, Runtime,
};
pub use subscription::Subscription;
pub use tag::{Tag, TagSet};
pub use value::Value;
