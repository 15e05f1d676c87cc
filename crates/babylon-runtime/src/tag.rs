// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Node tags used to select which instrumented nodes emit events.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Statement,
    Expression,
    ReadVariable,
    Literal,
    Call,
}

impl Tag {
    fn bit(self) -> u8 {
        match self {
            Tag::Statement => 1,
            Tag::Expression => 1 << 1,
            Tag::ReadVariable => 1 << 2,
            Tag::Literal => 1 << 3,
            Tag::Call => 1 << 4,
        }
    }
}

/// A small set of tags.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TagSet(u8);

impl TagSet {
    pub const fn empty() -> Self {
        TagSet(0)
    }

    pub fn of(tags: &[Tag]) -> Self {
        tags.iter().fold(TagSet::empty(), |set, &tag| set.with(tag))
    }

    #[must_use]
    pub fn with(self, tag: Tag) -> Self {
        TagSet(self.0 | tag.bit())
    }

    pub fn contains(self, tag: Tag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn intersects(self, other: TagSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const ALL: [Tag; 5] = [
            Tag::Statement,
            Tag::Expression,
            Tag::ReadVariable,
            Tag::Literal,
            Tag::Call,
        ];
        f.debug_set()
            .entries(ALL.iter().filter(|tag| self.contains(**tag)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_membership() {
        let set = TagSet::of(&[Tag::Expression, Tag::ReadVariable]);
        assert!(set.contains(Tag::ReadVariable));
        assert!(!set.contains(Tag::Statement));
        assert!(set.intersects(TagSet::empty().with(Tag::Expression)));
        assert!(TagSet::empty().is_empty());
        assert_eq!(format!("{:?}", set), "{Expression, ReadVariable}");
    }
}
