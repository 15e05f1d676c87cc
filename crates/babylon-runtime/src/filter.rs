// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Event filters: which instrumented nodes a listener hears from.

use babylon_source::SourceSection;

use crate::tag::{Tag, TagSet};

/// Builder-style filter over node tags and source ranges.
///
/// An empty filter matches every node. Each constraint that is set must
/// hold for a node to match.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    tags: TagSet,
    section: Option<SourceSection>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match nodes carrying any of the given tags.
    pub fn tag_is(mut self, tag: Tag) -> Self {
        self.tags = self.tags.with(tag);
        self
    }

    /// Match only nodes at exactly this document range.
    pub fn section_equals(mut self, section: &SourceSection) -> Self {
        self.section = Some(section.clone());
        self
    }

    pub fn matches(&self, section: &SourceSection, tags: TagSet) -> bool {
        if !self.tags.is_empty() && !self.tags.intersects(tags) {
            return false;
        }
        if let Some(exact) = &self.section {
            if !exact.same_range(section) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use babylon_source::{Source, Span};

    fn section(uri: &str, text: &str, span: Span) -> SourceSection {
        Source::new(uri, text).section(span).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let s = section("a.bab", "x = 1", Span::new(0, 5));
        assert!(EventFilter::new().matches(&s, TagSet::empty()));
    }

    #[test]
    fn tags_match_any() {
        let s = section("a.bab", "x = 1", Span::new(0, 5));
        let filter = EventFilter::new().tag_is(Tag::Statement).tag_is(Tag::Call);
        assert!(filter.matches(&s, TagSet::of(&[Tag::Statement])));
        assert!(filter.matches(&s, TagSet::of(&[Tag::Call, Tag::Expression])));
        assert!(!filter.matches(&s, TagSet::of(&[Tag::Expression])));
    }

    #[test]
    fn exact_section() {
        let text = "a + b\nc";
        let target = section("a.bab", text, Span::new(4, 5));
        let other = section("a.bab", text, Span::new(0, 5));
        let filter = EventFilter::new().section_equals(&target);
        assert!(filter.matches(&target, TagSet::empty()));
        assert!(!filter.matches(&other, TagSet::empty()));
    }
}
