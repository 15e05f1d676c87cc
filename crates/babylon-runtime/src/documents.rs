// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Current document text by URI.

use std::collections::HashMap;
use std::fs;

use tracing::debug;

pub trait DocumentStore {
    fn text(&self, uri: &str) -> Option<String>;
}

/// Documents held in memory, as an editor has them open.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocuments {
    docs: HashMap<String, String>,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, text: impl Into<String>) {
        self.docs.insert(uri.into(), text.into());
    }

    pub fn remove(&mut self, uri: &str) -> Option<String> {
        self.docs.remove(uri)
    }
}

impl DocumentStore for MemoryDocuments {
    fn text(&self, uri: &str) -> Option<String> {
        self.docs.get(uri).cloned()
    }
}

/// In-memory overlay over the file system. URIs are paths, optionally
/// prefixed with `file://`.
#[derive(Debug, Clone, Default)]
pub struct FsDocuments {
    overlay: MemoryDocuments,
}

impl FsDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, text: impl Into<String>) {
        self.overlay.insert(uri, text);
    }
}

impl DocumentStore for FsDocuments {
    fn text(&self, uri: &str) -> Option<String> {
        if let Some(text) = self.overlay.text(uri) {
            return Some(text);
        }
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        match fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(err) => {
                debug!(uri, error = %err, "document not readable");
                None
            }
        }
    }
}
