//! Tags helper for consistent tag handling with serialization support.

use serde::{Deserialize, Serialize};

/// A deduplicated set of case-sensitive tag names.
///
/// Wraps the `Vec<Option<String>>` shape used by the array-typed database
/// column and keeps at most one occurrence of each name. Two tags are the
/// same tag exactly when their names are byte-equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<Option<String>>);

impl Tags {
    /// Creates a new empty `Tags` collection.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a `Tags` collection from the raw database column shape.
    ///
    /// `None` entries and duplicates are discarded.
    pub fn from_raw(tags: Vec<Option<String>>) -> Self {
        let mut this = Self::new();
        for tag in tags.into_iter().flatten() {
            this.add(tag);
        }
        this
    }

    /// Creates a `Tags` collection from tag names, discarding duplicates.
    pub fn from_strings<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut this = Self::new();
        for tag in tags {
            this.add(tag);
        }
        this
    }

    /// Returns whether the collection contains the specified tag.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t.as_deref() == Some(tag))
    }

    /// Adds a new tag to the collection if it doesn't already exist.
    /// Returns `true` if the tag was added, `false` if it already existed.
    pub fn add<S: Into<String>>(&mut self, tag: S) -> bool {
        let tag = tag.into();
        if self.contains(&tag) {
            false
        } else {
            self.0.push(Some(tag));
            true
        }
    }

    /// Removes a tag from the collection.
    /// Returns `true` if the tag was found and removed, `false` otherwise.
    pub fn remove(&mut self, tag: &str) -> bool {
        let initial_len = self.0.len();
        self.0.retain(|t| t.as_deref() != Some(tag));
        self.0.len() != initial_len
    }

    /// Returns an iterator over the tag names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|tag| tag.as_deref())
    }

    /// Returns the tag names as owned strings.
    pub fn as_strings(&self) -> Vec<String> {
        self.0.iter().filter_map(|tag| tag.clone()).collect()
    }

    /// Returns the number of tags in the collection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Tags> for Vec<Option<String>> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

impl From<Vec<String>> for Tags {
    fn from(tags: Vec<String>) -> Self {
        Self::from_strings(tags)
    }
}

impl FromIterator<String> for Tags {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::from_strings(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_deduplicates() {
        let mut tags = Tags::new();
        assert!(tags.add("rust"));
        assert!(!tags.add("rust"));
        assert_eq!(tags.as_strings(), vec!["rust"]);
    }

    #[test]
    fn names_are_case_sensitive() {
        let tags = Tags::from_strings(["Rust", "rust"]);
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("Rust"));
        assert!(tags.contains("rust"));
        assert!(!tags.contains("RUST"));
    }

    #[test]
    fn from_raw_discards_nulls_and_duplicates() {
        let tags = Tags::from_raw(vec![
            Some("a".to_string()),
            None,
            Some("b".to_string()),
            Some("a".to_string()),
        ]);
        assert_eq!(tags.as_strings(), vec!["a", "b"]);
    }

    #[test]
    fn remove_existing() {
        let mut tags = Tags::from_strings(["a", "b"]);
        assert!(tags.remove("a"));
        assert!(!tags.remove("a"));
        assert_eq!(tags.as_strings(), vec!["b"]);
    }
}
