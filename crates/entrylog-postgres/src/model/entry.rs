//! Main entry model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use serde::{Deserialize, Serialize};

use crate::schema::entries;
use crate::types::Tags;

/// A single authored record in the entries table.
///
/// Entries are immutable value objects on the Rust side; mutations go through
/// the `with_*` and [`touched`] copy-update methods, which return a new value.
/// The identifier is assigned externally (see
/// [`EntryRepository::next_entry_id`]) and never changes afterwards.
///
/// The `last_modified_date` column is the sole ordering key for both
/// pagination strategies: after any legal mutation it is at or after
/// `created_date`.
///
/// [`touched`]: Entry::touched
/// [`EntryRepository::next_entry_id`]: crate::query::EntryRepository::next_entry_id
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Entry {
    /// Unique entry identifier, externally sequenced.
    pub entry_id: i32,
    /// Entry title.
    pub title: String,
    /// Free-form entry body.
    pub content: String,
    /// Tags for classification, deduplicated by name.
    pub tags: Vec<Option<String>>,
    /// Author of the creation stamp.
    pub created_by: String,
    /// Instant of the creation stamp, immutable.
    pub created_date: Timestamp,
    /// Author of the last mutation.
    pub last_modified_by: String,
    /// Instant of the last mutation; pagination ordering key.
    pub last_modified_date: Timestamp,
}

/// An author-and-instant pair stamped onto an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    /// Name of the author.
    pub name: String,
    /// Instant the stamp was taken.
    pub date: jiff::Timestamp,
}

impl AuditStamp {
    /// Creates a new stamp from an author name and an instant.
    pub fn new(name: impl Into<String>, date: jiff::Timestamp) -> Self {
        Self {
            name: name.into(),
            date,
        }
    }

    /// Creates a stamp for the given author taken now.
    pub fn now(name: impl Into<String>) -> Self {
        Self::new(name, jiff::Timestamp::now())
    }

    /// Returns a copy of this stamp with a different instant.
    pub fn with_date(&self, date: jiff::Timestamp) -> Self {
        Self::new(self.name.clone(), date)
    }
}

impl Entry {
    /// Creates a new entry value.
    pub fn new(
        entry_id: i32,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Tags,
        created: AuditStamp,
        last_modified: AuditStamp,
    ) -> Self {
        Self {
            entry_id,
            title: title.into(),
            content: content.into(),
            tags: tags.into(),
            created_by: created.name,
            created_date: created.date.into(),
            last_modified_by: last_modified.name,
            last_modified_date: last_modified.date.into(),
        }
    }

    /// Returns the creation stamp.
    pub fn created(&self) -> AuditStamp {
        AuditStamp::new(self.created_by.clone(), self.created_date.into())
    }

    /// Returns the last-modification stamp.
    pub fn last_modified(&self) -> AuditStamp {
        AuditStamp::new(self.last_modified_by.clone(), self.last_modified_date.into())
    }

    /// Returns the instant of the last mutation, the cursor key for keyset pagination.
    pub fn last_modified_at(&self) -> jiff::Timestamp {
        self.last_modified_date.into()
    }

    /// Returns the tags as a deduplicating [`Tags`] container.
    pub fn tags(&self) -> Tags {
        Tags::from_raw(self.tags.clone())
    }

    /// Returns whether the entry carries the given tag (case-sensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.as_deref() == Some(tag))
    }

    /// Returns a copy of this entry with a different title.
    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }

    /// Returns a copy of this entry with a different body.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..self.clone()
        }
    }

    /// Returns a copy of this entry with different tags.
    pub fn with_tags(&self, tags: Tags) -> Self {
        Self {
            tags: tags.into(),
            ..self.clone()
        }
    }

    /// Returns a copy of this entry stamped with a new last-modification.
    ///
    /// The stamp's instant must not precede `created_date`; callers stamping
    /// with [`AuditStamp::now`] satisfy this by construction.
    pub fn touched(&self, last_modified: AuditStamp) -> Self {
        Self {
            last_modified_by: last_modified.name,
            last_modified_date: last_modified.date.into(),
            ..self.clone()
        }
    }
}
