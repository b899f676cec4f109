//! Value types shared across models and queries.

mod pagination;
mod tags;

pub use pagination::{
    CursorPage, CursorPageRequest, EntryCursor, Navigation, OffsetPage, OffsetPageRequest,
    split_page,
};
pub use tags::Tags;
