//! Database query repositories.
//!
//! Repositories are traits implemented directly on the async connection, so
//! any connection (pooled or not, primary or replica) can execute them.
//!
//! # Pagination
//!
//! Listing operations come in two flavors: offset-based
//! ([`OffsetPageRequest`]) for shallow random access with totals, and
//! cursor-based ([`CursorPageRequest`]) for stable deep iteration.
//!
//! [`OffsetPageRequest`]: crate::types::OffsetPageRequest
//! [`CursorPageRequest`]: crate::types::CursorPageRequest

mod entry;

pub use entry::EntryRepository;
