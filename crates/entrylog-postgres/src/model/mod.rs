//! Database models for the entries table.

mod entry;

pub use entry::{AuditStamp, Entry};
