// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Babylon Language Server
//!
//! Runs annotated examples and shows what they observed:
//! - Decorations with probe and assertion results (`babylon/publishDecorations`)
//! - Hover values from the expression evaluator
//! - Code lenses to add and run examples
//! - Diagnostics for syntax errors and runner references

mod backend;
mod commands;
mod convert;
mod decorations;
mod engine;
mod server;

use tower_lsp::{LspService, Server};

use crate::backend::Backend;

#[tokio::main]
async fn main() {
    babylon_config::init_logging(&babylon_config::Config::default().log.level, false);

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
