//! Pagination types for database queries.
//!
//! This module provides both offset-based and cursor-based pagination.
//! Offset pagination gives random page access with totals but degrades with
//! depth; cursor (keyset) pagination stays efficient at any depth and
//! supports bidirectional navigation.

mod cursor;
mod offset;

pub use cursor::{CursorPage, CursorPageRequest, EntryCursor, Navigation, split_page};
pub use offset::{OffsetPage, OffsetPageRequest};
