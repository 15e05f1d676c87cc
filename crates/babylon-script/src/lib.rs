// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Babylon script: a small dynamically typed language with an instrumented
//! tree-walk interpreter.
//!
//! It is the reference guest for the annotation tracer. Programs are parsed
//! with imports resolved next to the importing document, and every statement
//! and expression can be observed through [`babylon_runtime::Runtime`].

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

mod env;
mod instrument;
mod interp;
mod locate;
mod runtime;

pub use interp::{Limits, RuntimeDiagnostic, RuntimeError};
pub use runtime::ScriptRuntime;
