// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! One command's view of a document and the runtime that executes it.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use babylon_config::Config;
use babylon_runtime::{DocumentStore, FsDocuments};
use babylon_script::{Limits, ScriptRuntime};
use babylon_trace::TraceContext;

pub struct Session {
    pub ctx: TraceContext,
    /// Also held by `ctx`; kept concrete to drain `print` output.
    pub runtime: Rc<ScriptRuntime>,
    /// The document's URI: its path as given on the command line.
    pub uri: String,
    pub text: String,
}

impl Session {
    pub fn open(path: &Path, config: &Config) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|err| format!("cannot read {}: {}", path.display(), err))?;
        let uri = path.to_string_lossy().into_owned();

        let mut documents = FsDocuments::new();
        documents.insert(uri.clone(), text.clone());
        let documents: Rc<dyn DocumentStore> = Rc::new(documents);

        let runtime = Rc::new(
            ScriptRuntime::new(Rc::clone(&documents))
                .with_limits(Limits::with_step_limit(config.trace.step_limit)),
        );
        let ctx = TraceContext::configured(runtime.clone(), documents, config)
            .map_err(|err| err.to_string())?;
        Ok(Self {
            ctx,
            runtime,
            uri,
            text,
        })
    }

    /// File name for messages.
    pub fn name(&self) -> &str {
        babylon_source::file_name(&self.uri)
    }
}
