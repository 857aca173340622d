//! Insertion-ordered, deduplicated tag collections.

use std::collections::HashSet;

use super::Tag;

/// A set of tags that remembers first-insertion order.
///
/// Header output must be byte-stable across runs, so iteration order is the
/// order tags were first added rather than hash order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<Tag>,
    seen: HashSet<Tag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag, returning `false` if it was already present.
    pub fn insert(&mut self, tag: Tag) -> bool {
        if !self.seen.insert(tag.clone()) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.seen.contains(tag)
    }

    pub fn contains_wildcard(&self) -> bool {
        self.tags.iter().any(Tag::is_wildcard)
    }

    pub fn is_subset(&self, other: &TagSet) -> bool {
        self.tags.iter().all(|tag| other.contains(tag))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.tags.iter()
    }

    pub fn as_slice(&self) -> &[Tag] {
        &self.tags
    }

    pub fn into_vec(self) -> Vec<Tag> {
        self.tags
    }
}

impl Extend<Tag> for TagSet {
    fn extend<I: IntoIterator<Item = Tag>>(&mut self, iter: I) {
        for tag in iter {
            self.insert(tag);
        }
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for TagSet {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.into_iter()
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

/// Remove duplicates from `tags`, keeping the first occurrence of each.
pub fn dedup_in_place(tags: &mut Vec<Tag>) {
    let mut seen = HashSet::with_capacity(tags.len());
    tags.retain(|tag| seen.insert(tag.clone()));
}
