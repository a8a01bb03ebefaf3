use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeBounds;

use crate::model::instant::Instant;

/// Inverted index: tag name → ascending set of instants whose task has the tag.
///
/// Owned by the task store and only updated alongside it. A tag whose last
/// instant is removed disappears from the index.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    tags: BTreeMap<String, BTreeSet<Instant>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: &str, at: Instant) {
        self.tags.entry(tag.to_string()).or_default().insert(at);
    }

    pub fn remove(&mut self, tag: &str, at: Instant) {
        if let Some(set) = self.tags.get_mut(tag) {
            set.remove(&at);
            if set.is_empty() {
                self.tags.remove(tag);
            }
        }
    }

    /// Instants carrying `tag` within `range`, ascending.
    /// An unknown tag yields an empty vector.
    pub fn range<R: RangeBounds<Instant>>(&self, tag: &str, range: R) -> Vec<Instant> {
        self.tags
            .get(tag)
            .map(|set| set.range(range).copied().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, tag: &str, at: Instant) -> bool {
        self.tags.get(tag).is_some_and(|set| set.contains(&at))
    }

    /// Every indexed tag with the instants carrying it, tags ascending
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<Instant>)> {
        self.tags.iter().map(|(tag, set)| (tag.as_str(), set))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
