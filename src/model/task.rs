use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Marker character accepted (and stripped) in front of tag names
pub const TAG_MARKER: char = '#';

/// A scheduled task: a title and a set of tags.
///
/// The task does not know its own instant; the store owning it does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Free-text title
    pub title: String,
    /// Tags (without the `#` prefix), kept sorted for display
    tags: BTreeSet<String>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Task {
            title: title.into(),
            tags: BTreeSet::new(),
        }
    }

    /// Builder-style constructor used when tags are known up front.
    /// Fails on the first name outside the tag alphabet.
    pub fn with_tags<I, S>(title: impl Into<String>, tags: I) -> Result<Self, InvalidTag>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut task = Task::new(title);
        for tag in tags {
            task.tags.insert(normalize_tag(tag.as_ref())?);
        }
        Ok(task)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Add a tag. Returns false if the task already had it.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        self.tags.insert(tag.to_string())
    }

    /// Remove a tag. Returns false if the task did not have it.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    /// Remove every tag, returning the removed set
    pub fn clear_tags(&mut self) -> BTreeSet<String> {
        std::mem::take(&mut self.tags)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }
}

/// A tag name that is empty or uses characters outside the tag alphabet
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tag '{0}': use letters, digits and _ - . / : + @")]
pub struct InvalidTag(pub String);

/// Characters allowed in a tag name. Tag expressions use the same alphabet,
/// so every stored tag can be queried.
pub fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '+' | '@')
}

/// Strip surrounding whitespace and one leading `#`, then check the name
pub fn normalize_tag(raw: &str) -> Result<String, InvalidTag> {
    let trimmed = raw.trim();
    let name = trimmed.strip_prefix(TAG_MARKER).unwrap_or(trimmed);
    if name.is_empty() || !name.chars().all(is_tag_char) {
        return Err(InvalidTag(raw.to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("#work"), Ok("work".into()));
        assert_eq!(normalize_tag("work"), Ok("work".into()));
        assert_eq!(normalize_tag(" #home "), Ok("home".into()));
        assert_eq!(normalize_tag("v1.2-rc+x@host:a/b_c"), Ok("v1.2-rc+x@host:a/b_c".into()));
        assert!(normalize_tag("#").is_err());
        assert!(normalize_tag("").is_err());
        assert!(normalize_tag("two words").is_err());
    }

    #[test]
    fn test_normalize_tag_rejects_expression_syntax() {
        for raw in ["a&b", "##work", "x(y", "q!", "a)", "|"] {
            assert_eq!(normalize_tag(raw), Err(InvalidTag(raw.to_string())), "{raw}");
        }
    }

    #[test]
    fn test_with_tags_reports_invalid_name() {
        assert_eq!(
            Task::with_tags("Review", ["work", "a&b"]),
            Err(InvalidTag("a&b".to_string()))
        );
    }

    #[test]
    fn test_tags_have_set_semantics() {
        let mut task = Task::new("Dentist");
        assert!(task.add_tag("health"));
        assert!(!task.add_tag("health"));
        assert_eq!(task.tag_count(), 1);
        assert!(!task.remove_tag("absent"));
        assert!(task.remove_tag("health"));
        assert_eq!(task.tag_count(), 0);
    }

    #[test]
    fn test_tags_iterate_sorted() {
        let task = Task::with_tags("Review", ["#work", "urgent", "#admin"]).unwrap();
        assert_eq!(task.tags().collect::<Vec<_>>(), vec!["admin", "urgent", "work"]);
    }

    #[test]
    fn test_clear_tags_returns_previous() {
        let mut task = Task::with_tags("Review", ["a", "b"]).unwrap();
        let removed = task.clear_tags();
        assert_eq!(removed.len(), 2);
        assert!(!task.has_tag("a"));
    }
}
