//! Offset-based pagination for database queries.
//!
//! Offset pagination is suitable for shallow page access or when users need
//! to jump to a specific page number. Each request costs O(offset) on typical
//! indexes; for deep iteration prefer cursor-based pagination.

use serde::{Deserialize, Serialize};

use crate::{PgError, PgResult};

/// A validated request for one offset-based page.
///
/// Page numbers are zero-based. Construction rejects a negative page number
/// or a non-positive page size as [`PgError::InvalidRequest`] before any
/// query executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetPageRequest {
    number: i64,
    size: i64,
}

impl OffsetPageRequest {
    /// Creates a new request for the given zero-based page number and page size.
    pub fn new(number: i64, size: i64) -> PgResult<Self> {
        if number < 0 {
            return Err(PgError::invalid_request("page number must not be negative"));
        }
        if size <= 0 {
            return Err(PgError::invalid_request("page size must be positive"));
        }
        Ok(Self { number, size })
    }

    /// Returns the zero-based page number.
    pub fn number(&self) -> i64 {
        self.number
    }

    /// Returns the page size.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Returns the number of rows to skip.
    pub fn offset(&self) -> i64 {
        self.number * self.size
    }
}

/// Result of an offset-paginated query.
///
/// An immutable snapshot of one page plus the totals needed to derive page
/// navigation. A request past the last page yields empty content with the
/// totals still correct.
#[derive(Debug, Clone)]
pub struct OffsetPage<T> {
    content: Vec<T>,
    size: i64,
    number: i64,
    total_elements: i64,
}

impl<T> OffsetPage<T> {
    /// Creates a new page from query results and the total row count.
    pub fn new(content: Vec<T>, request: OffsetPageRequest, total_elements: i64) -> Self {
        Self {
            content,
            size: request.size(),
            number: request.number(),
            total_elements,
        }
    }

    /// Returns the page content, most recently modified first.
    pub fn content(&self) -> &[T] {
        &self.content
    }

    /// Consumes the page and returns its content.
    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// Returns the requested page size.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Returns the zero-based page number.
    pub fn number(&self) -> i64 {
        self.number
    }

    /// Returns the total number of rows matching the query across all pages.
    pub fn total_elements(&self) -> i64 {
        self.total_elements
    }

    /// Returns the total number of pages; zero when there are no rows.
    pub fn total_pages(&self) -> i64 {
        (self.total_elements + self.size - 1) / self.size
    }

    /// Returns whether a page follows this one.
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages() - 1
    }

    /// Returns whether a page precedes this one.
    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    /// Returns the number of rows in this page.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns whether this page holds no rows.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Maps the content to a different type, keeping the page metadata.
    pub fn map<U, F>(self, f: F) -> OffsetPage<U>
    where
        F: FnMut(T) -> U,
    {
        OffsetPage {
            content: self.content.into_iter().map(f).collect(),
            size: self.size,
            number: self.number,
            total_elements: self.total_elements,
        }
    }
}
