// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! LanguageServer trait implementation.

use serde_json::Value as Json;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::LanguageServer;

use crate::backend::Backend;
use crate::commands::{self, AddExampleArgs, RunExamplesArgs, ADD_EXAMPLE, RUN_EXAMPLES};

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|folder| folder.uri.to_file_path().ok());
        self.configure(root.as_deref()).await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                code_lens_provider: Some(CodeLensOptions {
                    resolve_provider: Some(false),
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![ADD_EXAMPLE.to_string(), RUN_EXAMPLES.to_string()],
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "babylon-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "Babylon language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.document_changed(params.text_document.uri, params.text_document.text)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // With FULL sync, the last change carries the entire document
        if let Some(change) = params.content_changes.into_iter().last() {
            self.document_changed(params.text_document.uri, change.text)
                .await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.document_closed(params.text_document.uri).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        Ok(self
            .hover_at(position.text_document.uri, position.position)
            .await)
    }

    async fn code_lens(&self, params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        Ok(self.code_lenses(params.text_document.uri).await)
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Json>> {
        match params.command.as_str() {
            RUN_EXAMPLES => {
                let args: RunExamplesArgs =
                    commands::parse_args(params.arguments).map_err(Error::invalid_params)?;
                self.run_examples(args.uri).await;
            }
            ADD_EXAMPLE => {
                let args: AddExampleArgs =
                    commands::parse_args(params.arguments).map_err(Error::invalid_params)?;
                self.add_example(args).await;
            }
            other => {
                return Err(Error::invalid_params(format!("unknown command: {}", other)));
            }
        }
        Ok(None)
    }
}
