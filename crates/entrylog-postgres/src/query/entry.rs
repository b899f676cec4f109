//! Entry repository: CRUD, tag lookup and the two pagination engines.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::Entry;
use crate::types::{CursorPage, CursorPageRequest, Navigation, OffsetPage, OffsetPageRequest};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for entry database operations.
///
/// Implemented for [`PgConnection`], so both pooled connections and plain
/// connections can run these operations. Identifiers are allocated
/// externally through [`next_entry_id`]; lookups that find nothing return
/// `Ok(None)` rather than an error.
///
/// [`next_entry_id`]: EntryRepository::next_entry_id
pub trait EntryRepository {
    /// Allocates the next entry identifier from the `entry_id_seq` sequence.
    fn next_entry_id(&mut self) -> impl Future<Output = PgResult<i32>> + Send;

    /// Inserts a new entry and returns the stored row.
    fn insert_entry(&mut self, entry: Entry) -> impl Future<Output = PgResult<Entry>> + Send;

    /// Inserts a batch of entries in one statement, returning the inserted count.
    fn insert_entries(
        &mut self,
        entries: Vec<Entry>,
    ) -> impl Future<Output = PgResult<usize>> + Send;

    /// Finds an entry by its identifier.
    fn find_entry_by_id(
        &mut self,
        entry_id: i32,
    ) -> impl Future<Output = PgResult<Option<Entry>>> + Send;

    /// Lists entries carrying the given tag, most recently modified first.
    fn find_entries_by_tag(
        &mut self,
        tag: &str,
    ) -> impl Future<Output = PgResult<Vec<Entry>>> + Send;

    /// Overwrites the mutable columns of an existing entry, returning the stored row.
    fn update_entry(&mut self, entry: Entry) -> impl Future<Output = PgResult<Entry>> + Send;

    /// Deletes an entry, returning the number of rows removed.
    fn delete_entry(&mut self, entry_id: i32) -> impl Future<Output = PgResult<usize>> + Send;

    /// Counts entries, optionally restricted to one tag.
    fn count_entries(
        &mut self,
        tag: Option<&str>,
    ) -> impl Future<Output = PgResult<i64>> + Send;

    /// Fetches one offset-based page plus the total count over the same predicate.
    ///
    /// A page number past the end yields empty content with correct totals.
    /// Cost grows with the offset; prefer [`cursor_list_entries`] for deep
    /// iteration.
    ///
    /// [`cursor_list_entries`]: EntryRepository::cursor_list_entries
    fn offset_list_entries(
        &mut self,
        request: OffsetPageRequest,
        tag: Option<&str>,
    ) -> impl Future<Output = PgResult<OffsetPage<Entry>>> + Send;

    /// Fetches one cursor-based page using an exclusive keyset boundary on
    /// `last_modified_date`.
    ///
    /// Fetches one row past the page size; that row's presence alone decides
    /// whether an adjacent page exists, so no count query runs. Both
    /// directions order by `(last_modified_date, entry_id)` so ties resolve
    /// identically for `NEXT` and `PREVIOUS`.
    fn cursor_list_entries(
        &mut self,
        request: CursorPageRequest<jiff::Timestamp>,
        tag: Option<&str>,
    ) -> impl Future<Output = PgResult<CursorPage<Entry, jiff::Timestamp>>> + Send;
}

/// Builds the tag predicate for the array-typed tags column.
fn tag_filter(tag: &str) -> Vec<Option<String>> {
    vec![Some(tag.to_owned())]
}

/// Converts a query failure into [`PgError`], tagging the failed operation.
fn query_error(operation: &'static str, error: diesel::result::Error) -> PgError {
    tracing::error!(
        target: TRACING_TARGET_QUERY,
        operation,
        error = %error,
        "Entry query failed"
    );
    PgError::from(error)
}

impl EntryRepository for PgConnection {
    async fn next_entry_id(&mut self) -> PgResult<i32> {
        #[derive(QueryableByName)]
        struct NextEntryId {
            #[diesel(sql_type = diesel::sql_types::Int4)]
            next_id: i32,
        }

        let row: NextEntryId =
            diesel::sql_query("SELECT nextval('entry_id_seq')::int AS next_id")
                .get_result(self)
                .await
                .map_err(|error| query_error("next_entry_id", error))?;

        Ok(row.next_id)
    }

    async fn insert_entry(&mut self, entry: Entry) -> PgResult<Entry> {
        use schema::entries;

        let entry = diesel::insert_into(entries::table)
            .values(&entry)
            .returning(Entry::as_returning())
            .get_result(self)
            .await
            .map_err(|error| query_error("insert_entry", error))?;

        Ok(entry)
    }

    async fn insert_entries(&mut self, entries: Vec<Entry>) -> PgResult<usize> {
        use schema::entries;

        let inserted = diesel::insert_into(entries::table)
            .values(&entries)
            .execute(self)
            .await
            .map_err(|error| query_error("insert_entries", error))?;

        Ok(inserted)
    }

    async fn find_entry_by_id(&mut self, entry_id: i32) -> PgResult<Option<Entry>> {
        use schema::entries::dsl;

        let entry = dsl::entries
            .filter(dsl::entry_id.eq(entry_id))
            .select(Entry::as_select())
            .first(self)
            .await
            .optional()
            .map_err(|error| query_error("find_entry_by_id", error))?;

        Ok(entry)
    }

    async fn find_entries_by_tag(&mut self, tag: &str) -> PgResult<Vec<Entry>> {
        use schema::entries::{self, dsl};

        let entries = entries::table
            .filter(dsl::tags.contains(tag_filter(tag)))
            .order((dsl::last_modified_date.desc(), dsl::entry_id.desc()))
            .select(Entry::as_select())
            .load(self)
            .await
            .map_err(|error| query_error("find_entries_by_tag", error))?;

        Ok(entries)
    }

    async fn update_entry(&mut self, entry: Entry) -> PgResult<Entry> {
        use schema::entries::{self, dsl};

        let entry = diesel::update(entries::table.filter(dsl::entry_id.eq(entry.entry_id)))
            .set((
                dsl::title.eq(&entry.title),
                dsl::content.eq(&entry.content),
                dsl::tags.eq(&entry.tags),
                dsl::last_modified_by.eq(&entry.last_modified_by),
                dsl::last_modified_date.eq(&entry.last_modified_date),
            ))
            .returning(Entry::as_returning())
            .get_result(self)
            .await
            .map_err(|error| query_error("update_entry", error))?;

        Ok(entry)
    }

    async fn delete_entry(&mut self, entry_id: i32) -> PgResult<usize> {
        use schema::entries::{self, dsl};

        let deleted = diesel::delete(entries::table.filter(dsl::entry_id.eq(entry_id)))
            .execute(self)
            .await
            .map_err(|error| query_error("delete_entry", error))?;

        Ok(deleted)
    }

    async fn count_entries(&mut self, tag: Option<&str>) -> PgResult<i64> {
        use schema::entries;

        let mut query = entries::table.into_boxed();
        if let Some(tag) = tag {
            query = query.filter(entries::dsl::tags.contains(tag_filter(tag)));
        }

        let total = query
            .count()
            .get_result::<i64>(self)
            .await
            .map_err(|error| query_error("count_entries", error))?;

        Ok(total)
    }

    async fn offset_list_entries(
        &mut self,
        request: OffsetPageRequest,
        tag: Option<&str>,
    ) -> PgResult<OffsetPage<Entry>> {
        use schema::entries::{self, dsl};

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            number = request.number(),
            size = request.size(),
            tag = ?tag,
            "Fetching offset page of entries"
        );

        let total = self.count_entries(tag).await?;

        let mut query = entries::table.into_boxed();
        if let Some(tag) = tag {
            query = query.filter(dsl::tags.contains(tag_filter(tag)));
        }

        let content = query
            .order((dsl::last_modified_date.desc(), dsl::entry_id.desc()))
            .offset(request.offset())
            .limit(request.size())
            .select(Entry::as_select())
            .load(self)
            .await
            .map_err(|error| query_error("offset_list_entries", error))?;

        Ok(OffsetPage::new(content, request, total))
    }

    async fn cursor_list_entries(
        &mut self,
        request: CursorPageRequest<jiff::Timestamp>,
        tag: Option<&str>,
    ) -> PgResult<CursorPage<Entry, jiff::Timestamp>> {
        use schema::entries::{self, dsl};

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            navigation = %request.navigation(),
            size = request.size(),
            has_cursor = request.cursor().is_some(),
            tag = ?tag,
            "Fetching cursor page of entries"
        );

        let mut query = entries::table.into_boxed();
        if let Some(tag) = tag {
            query = query.filter(dsl::tags.contains(tag_filter(tag)));
        }

        let boundary = request
            .cursor()
            .map(|cursor| jiff_diesel::Timestamp::from(*cursor));

        let rows: Vec<Entry> = match (request.navigation(), &boundary) {
            (Navigation::Next, Some(boundary)) => {
                query
                    .filter(dsl::last_modified_date.lt(boundary))
                    .order((dsl::last_modified_date.desc(), dsl::entry_id.desc()))
                    .limit(request.fetch_limit())
                    .select(Entry::as_select())
                    .load(self)
                    .await
            }
            (Navigation::Next, None) => {
                query
                    .order((dsl::last_modified_date.desc(), dsl::entry_id.desc()))
                    .limit(request.fetch_limit())
                    .select(Entry::as_select())
                    .load(self)
                    .await
            }
            (Navigation::Previous, Some(boundary)) => {
                query
                    .filter(dsl::last_modified_date.gt(boundary))
                    .order((dsl::last_modified_date.asc(), dsl::entry_id.asc()))
                    .limit(request.fetch_limit())
                    .select(Entry::as_select())
                    .load(self)
                    .await
            }
            (Navigation::Previous, None) => {
                query
                    .order((dsl::last_modified_date.asc(), dsl::entry_id.asc()))
                    .limit(request.fetch_limit())
                    .select(Entry::as_select())
                    .load(self)
                    .await
            }
        }
        .map_err(|error| query_error("cursor_list_entries", error))?;

        Ok(CursorPage::from_rows(rows, &request, |entry| {
            entry.last_modified_at()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_filter_wraps_for_array_column() {
        assert_eq!(tag_filter("rust"), vec![Some("rust".to_string())]);
    }

    #[test]
    fn query_error_preserves_source() {
        let err = query_error("find_entry_by_id", diesel::result::Error::NotFound);
        assert!(matches!(err, PgError::Query(diesel::result::Error::NotFound)));
    }
}
