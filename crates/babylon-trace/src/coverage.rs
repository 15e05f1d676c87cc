// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Frames captured during traces, kept for fast hover answers.
//!
//! The store is owned by the caller and outlives individual runs. Entries
//! are keyed by document and statement coordinates; a later run of the same
//! statement replaces the earlier frame.

use std::collections::HashMap;
use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::debug;

use babylon_runtime::{EventContext, ExecutionListener, Frame, MaterializedFrame, Value};
use babylon_source::SourceSection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageData {
    /// Frame as it was when the statement finished.
    pub frame: MaterializedFrame,
    /// The document whose run produced the frame.
    pub runner_uri: String,
}

/// Statement coordinates: start line, start column, end line, end column.
type SectionKey = (usize, usize, usize, usize);

fn key(section: &SourceSection) -> SectionKey {
    (
        section.start_line,
        section.start_col,
        section.end_line,
        section.end_col,
    )
}

#[derive(Debug, Clone, Default)]
pub struct CoverageStore {
    documents: HashMap<String, HashMap<SectionKey, CoverageData>>,
}

impl CoverageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, section: &SourceSection, data: CoverageData) {
        self.documents
            .entry(section.uri.clone())
            .or_default()
            .insert(key(section), data);
    }

    pub fn get(&self, section: &SourceSection) -> Option<&CoverageData> {
        self.documents.get(&section.uri)?.get(&key(section))
    }

    /// Data of the last section in `sections` that has any.
    pub fn latest_before(&self, sections: &[SourceSection]) -> Option<&CoverageData> {
        sections.iter().rev().find_map(|section| self.get(section))
    }

    /// The runner that last reached `section`.
    pub fn runner_for(&self, section: &SourceSection) -> Option<&str> {
        self.get(section).map(|data| data.runner_uri.as_str())
    }

    /// Forget everything recorded for `uri`; its text changed.
    pub fn invalidate(&mut self, uri: &str) {
        if self.documents.remove(uri).is_some() {
            debug!(uri, "coverage invalidated");
        }
    }

    pub fn has_data(&self, uri: &str) -> bool {
        self.documents.get(uri).is_some_and(|sections| !sections.is_empty())
    }

    /// Take over every entry of `other`. Entries for the same statement are
    /// replaced.
    pub fn merge(&mut self, other: CoverageStore) {
        for (uri, sections) in other.documents {
            self.documents.entry(uri).or_default().extend(sections);
        }
    }
}

/// Statement listener that buffers frames during one run.
///
/// Listeners cannot borrow the store across the run, so records are kept
/// here and moved over with [`CoverageCollector::drain_into`] afterwards.
#[derive(Debug)]
pub struct CoverageCollector {
    runner_uri: String,
    records: Vec<(SourceSection, MaterializedFrame)>,
}

impl CoverageCollector {
    pub fn new(runner_uri: impl Into<String>) -> Self {
        Self {
            runner_uri: runner_uri.into(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn drain_into(&mut self, store: &mut CoverageStore) {
        for (section, frame) in self.records.drain(..) {
            store.record(
                &section,
                CoverageData {
                    frame,
                    runner_uri: self.runner_uri.clone(),
                },
            );
        }
    }
}

impl ExecutionListener for CoverageCollector {
    fn on_return_value(
        &mut self,
        ctx: &EventContext,
        frame: &dyn Frame,
        _result: Option<&Value>,
    ) -> ControlFlow<Value> {
        self.records.push((ctx.section.clone(), frame.materialize()));
        ControlFlow::Continue(())
    }
}
