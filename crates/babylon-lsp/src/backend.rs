// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Server state and the work behind each request.

use std::collections::HashMap;
use std::path::Path;

use tokio::sync::{Mutex, RwLock};
use tower_lsp::lsp_types::*;
use tower_lsp::Client;
use tracing::{debug, info, warn};

use babylon_config::Config;
use babylon_diagnostics::{Diagnostic, ToDiagnostic};
use babylon_runtime::FsDocuments;
use babylon_trace::{CoverageStore, Evaluation};

use crate::commands::{self, AddExampleArgs};
use crate::convert::{position_to_line_col, to_lsp_diagnostic};
use crate::decorations::{PublishDecorations, PublishDecorationsParams};
use crate::engine::Engine;

/// Frames recorded by example runs, and the edit revision they belong to.
#[derive(Debug, Default)]
pub struct CoverageState {
    store: CoverageStore,
    revision: u64,
}

impl CoverageState {
    pub fn store(&self) -> &CoverageStore {
        &self.store
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// `uri` changed: its frames are stale and runs started earlier are too.
    pub fn edited(&mut self, uri: &str) {
        self.revision += 1;
        self.store.invalidate(uri);
    }

    /// Keep a run's coverage for `uri` if nothing was edited since the run
    /// started at `revision`.
    pub fn accept(&mut self, revision: u64, uri: &str, coverage: CoverageStore) -> bool {
        if revision != self.revision {
            return false;
        }
        self.store.invalidate(uri);
        self.store.merge(coverage);
        true
    }
}

#[derive(Debug)]
pub struct Backend {
    pub client: Client,
    pub documents: RwLock<HashMap<Url, String>>,
    /// Frames recorded by the last example runs, for hover.
    pub coverage: Mutex<CoverageState>,
    pub config: RwLock<Config>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: RwLock::new(HashMap::new()),
            coverage: Mutex::new(CoverageState::default()),
            config: RwLock::new(Config::default()),
        }
    }

    /// Load `babylon.toml` from the workspace root, if there is one.
    pub async fn configure(&self, root: Option<&Path>) {
        let Some(root) = root else {
            return;
        };
        match babylon_config::load_or_default(None, root) {
            Ok(config) => {
                info!(root = %root.display(), "configuration loaded");
                *self.config.write().await = config;
            }
            Err(err) => {
                warn!(error = %err, "configuration ignored");
                self.client
                    .show_message(MessageType::WARNING, format!("babylon: {}", err))
                    .await;
            }
        }
    }

    /// Run `work` on a blocking thread against the current documents.
    ///
    /// `None` when the engine could not be built or the task died; both are
    /// logged here.
    async fn with_engine<T, F>(&self, work: F) -> Option<T>
    where
        F: FnOnce(&Engine) -> T + Send + 'static,
        T: Send + 'static,
    {
        let documents = self.snapshot().await;
        let config = self.config.read().await.clone();
        let task = tokio::task::spawn_blocking(move || {
            Engine::new(documents, &config).map(|engine| work(&engine))
        });
        match task.await {
            Ok(Ok(result)) => Some(result),
            Ok(Err(err)) => {
                warn!(error = %err, "engine unavailable");
                None
            }
            Err(err) => {
                warn!(error = %err, "engine task failed");
                None
            }
        }
    }

    /// Open documents over the file system.
    async fn snapshot(&self) -> FsDocuments {
        let mut snapshot = FsDocuments::new();
        for (uri, text) in self.documents.read().await.iter() {
            snapshot.insert(uri.to_string(), text.clone());
        }
        snapshot
    }

    pub async fn document_changed(&self, uri: Url, text: String) {
        self.documents.write().await.insert(uri.clone(), text.clone());
        self.coverage.lock().await.edited(uri.as_str());
        self.publish_diagnostics(uri, &text, None).await;
    }

    pub async fn document_closed(&self, uri: Url) {
        self.documents.write().await.remove(&uri);
        self.coverage.lock().await.edited(uri.as_str());
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    /// Publish the document's diagnostics, with `extra` from a request.
    pub async fn publish_diagnostics(&self, uri: Url, text: &str, extra: Option<Diagnostic>) {
        let key = uri.to_string();
        let Some(diagnostics) = self
            .with_engine(move |engine| engine.diagnostics_with(&key, extra))
            .await
        else {
            return;
        };
        let lsp_diagnostics = diagnostics
            .iter()
            .map(|diag| to_lsp_diagnostic(text, diag))
            .collect();
        self.client.publish_diagnostics(uri, lsp_diagnostics, None).await;
    }

    pub async fn code_lenses(&self, uri: Url) -> Option<Vec<CodeLens>> {
        let key = uri.to_string();
        let lenses = self
            .with_engine(move |engine| {
                let declarations = engine.declarations(&key).ok()?;
                let examples = engine.examples(&key).unwrap_or_default();
                Some(commands::code_lenses(&key, &declarations, &examples))
            })
            .await;
        lenses.flatten()
    }

    /// Evaluate the node under the cursor.
    pub async fn hover_at(&self, uri: Url, position: Position) -> Option<Hover> {
        let text = self.documents.read().await.get(&uri)?.clone();
        let (line, col) = position_to_line_col(&text, position);
        let coverage = self.coverage.lock().await.store().clone();
        let key = uri.to_string();
        let result = self
            .with_engine(move |engine| engine.evaluate(&key, line, col, &coverage))
            .await?;

        let markdown = match result {
            Ok(Evaluation::Value(value)) => format!("```\n{}\n```", value.repr()),
            Ok(Evaluation::Error(message)) => format!("**error:** {}", message),
            Ok(Evaluation::Unknown) => return None,
            Err(err) => {
                self.publish_diagnostics(uri, &text, Some(err.to_diagnostic())).await;
                return None;
            }
        };
        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: markdown,
            }),
            range: None,
        })
    }

    /// Trace every example of `uri`, keep the coverage, and publish the
    /// decorations.
    pub async fn run_examples(&self, uri: String) {
        let revision = self.coverage.lock().await.revision();
        let key = uri.clone();
        let outcome = self
            .with_engine(move |engine| {
                engine.run_examples(&key).map(|(examples, coverage)| {
                    let decorations = engine.decorations(&examples);
                    (examples.len(), coverage, decorations)
                })
            })
            .await;
        let (count, coverage, mut decorations) = match outcome {
            Some(Ok(result)) => result,
            Some(Err(err)) => {
                self.client
                    .show_message(MessageType::ERROR, format!("babylon: {}", err))
                    .await;
                return;
            }
            None => return,
        };

        if !self.coverage.lock().await.accept(revision, &uri, coverage) {
            debug!(uri = %uri, "documents edited during the run; coverage dropped");
        }
        // Always publish for the document itself so stale decorations clear.
        decorations.entry(uri.clone()).or_default();
        debug!(uri = %uri, examples = count, documents = decorations.len(), "publishing decorations");
        for (uri, decorations) in decorations {
            self.client
                .send_notification::<PublishDecorations>(PublishDecorationsParams { uri, decorations })
                .await;
        }
    }

    /// Insert a new example annotation above the requested function.
    pub async fn add_example(&self, args: AddExampleArgs) {
        let Ok(url) = Url::parse(&args.uri) else {
            warn!(uri = %args.uri, "add example: bad uri");
            return;
        };
        let key = args.uri.clone();
        let line = args.line;
        let declaration = self
            .with_engine(move |engine| {
                engine
                    .declarations(&key)
                    .ok()?
                    .into_iter()
                    .find(|decl| decl.start_line == line)
            })
            .await
            .flatten();
        let placeholder = self.config.read().await.annotations.missing_argument.clone();
        let annotation = commands::scaffold(&args, declaration.as_ref(), &placeholder);

        let at = Position::new(args.line.saturating_sub(1) as u32, 0);
        let edit = TextEdit {
            range: Range::new(at, at),
            new_text: format!("{}\n", annotation),
        };
        let workspace_edit = WorkspaceEdit {
            changes: Some(HashMap::from([(url, vec![edit])])),
            ..WorkspaceEdit::default()
        };
        if let Err(err) = self.client.apply_edit(workspace_edit).await {
            warn!(error = %err, "add example edit rejected");
        }
    }
}
