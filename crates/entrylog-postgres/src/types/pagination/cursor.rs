//! Cursor-based (keyset) pagination for database queries.
//!
//! Cursor pagination filters by a boundary value instead of skipping a row
//! count, so performance stays constant regardless of page depth. A cursor is
//! the `last_modified_date` instant of a boundary row from a previously
//! fetched page; navigation works in both directions without re-scanning
//! from the start.
//!
//! The engine fetches one row more than requested; the mere presence of that
//! extra row signals that an adjacent page exists, avoiding a separate
//! existence-check query. [`split_page`] implements that step as a pure
//! function.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{PgError, PgResult};

/// Direction of cursor navigation relative to a page boundary.
///
/// `Next` moves towards older entries (descending last-modified order),
/// `Previous` towards newer ones.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Navigation {
    /// Fetch the page after the cursor (older entries).
    Next,
    /// Fetch the page before the cursor (newer entries).
    Previous,
}

/// Splits a `size + 1` row fetch into page content and a has-more flag.
///
/// The extra row, when present, is dropped before presentation; it only
/// signals that another page exists past this one. For [`Navigation::Previous`]
/// the rows arrive in ascending order and are reversed back to descending
/// order after truncation, so cursors read off the result are already in
/// presentation order.
pub fn split_page<T>(mut rows: Vec<T>, size: i64, navigation: Navigation) -> (Vec<T>, bool) {
    let has_more = rows.len() as i64 > size;
    if has_more {
        rows.truncate(size as usize);
    }
    if navigation == Navigation::Previous {
        rows.reverse();
    }
    (rows, has_more)
}

/// A validated request for one cursor-based page.
///
/// An absent cursor means "start from the newest entry" when navigating
/// [`Navigation::Next`], or "start from the oldest entry" when navigating
/// [`Navigation::Previous`]. Construction rejects a non-positive page size as
/// [`PgError::InvalidRequest`] before any query executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPageRequest<C> {
    cursor: Option<C>,
    size: i64,
    navigation: Navigation,
}

impl<C> CursorPageRequest<C> {
    /// Creates a new request.
    pub fn new(cursor: Option<C>, size: i64, navigation: Navigation) -> PgResult<Self> {
        if size <= 0 {
            return Err(PgError::invalid_request("page size must be positive"));
        }
        Ok(Self {
            cursor,
            size,
            navigation,
        })
    }

    /// Creates a request for the first page (newest entries, no cursor).
    pub fn first(size: i64) -> PgResult<Self> {
        Self::new(None, size, Navigation::Next)
    }

    /// Creates a request for the last page (oldest entries, no cursor).
    pub fn last(size: i64) -> PgResult<Self> {
        Self::new(None, size, Navigation::Previous)
    }

    /// Returns the cursor marking the exclusive keyset boundary, if any.
    pub fn cursor(&self) -> Option<&C> {
        self.cursor.as_ref()
    }

    /// Returns the requested page size.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Returns the navigation direction.
    pub fn navigation(&self) -> Navigation {
        self.navigation
    }

    /// Returns the row limit to fetch: the page size plus the peek-ahead row.
    pub fn fetch_limit(&self) -> i64 {
        self.size + 1
    }
}

/// Result of a cursor-paginated query.
///
/// Content is always presented in descending last-modified order, regardless
/// of the navigation direction that produced it. The head and tail cursors
/// are read off the final content, after truncation and reordering, and are
/// `None` for an empty page, so callers must not assume their presence.
#[derive(Debug, Clone)]
pub struct CursorPage<T, C> {
    content: Vec<T>,
    size: i64,
    has_next: bool,
    has_previous: bool,
    head_cursor: Option<C>,
    tail_cursor: Option<C>,
}

impl<T, C> CursorPage<T, C> {
    /// Assembles a page from a raw `size + 1` row fetch.
    ///
    /// `rows` must be the result of the keyset query for `request`: ordered
    /// descending for [`Navigation::Next`], ascending for
    /// [`Navigation::Previous`], at most [`CursorPageRequest::fetch_limit`]
    /// rows. `cursor_fn` extracts the cursor value from a row.
    ///
    /// A cursor in the request implies history on the cursor's side of the
    /// boundary, so the matching flag is set unconditionally; the flag for
    /// the fetch direction comes from the peek-ahead row.
    pub fn from_rows<F>(rows: Vec<T>, request: &CursorPageRequest<C>, cursor_fn: F) -> Self
    where
        F: Fn(&T) -> C,
    {
        let (content, has_more) = split_page(rows, request.size(), request.navigation());
        let (has_next, has_previous) = match request.navigation() {
            Navigation::Next => (has_more, request.cursor().is_some()),
            Navigation::Previous => (request.cursor().is_some(), has_more),
        };

        // Cursors are computed only after truncation and reordering.
        let tail_cursor = content.first().map(&cursor_fn);
        let head_cursor = content.last().map(&cursor_fn);

        Self {
            content,
            size: request.size(),
            has_next,
            has_previous,
            head_cursor,
            tail_cursor,
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

    /// Returns whether a page of older entries exists after this one.
    pub fn has_next(&self) -> bool {
        self.has_next
    }

    /// Returns whether a page of newer entries exists before this one.
    pub fn has_previous(&self) -> bool {
        self.has_previous
    }

    /// Returns the cursor of the last (bottommost, oldest-in-page) element.
    ///
    /// Pass it to a [`Navigation::Next`] request to fetch the page below.
    /// `None` when the page is empty.
    pub fn head_cursor(&self) -> Option<&C> {
        self.head_cursor.as_ref()
    }

    /// Returns the cursor of the first (topmost, newest-in-page) element.
    ///
    /// Pass it to a [`Navigation::Previous`] request to fetch the page above.
    /// `None` when the page is empty.
    pub fn tail_cursor(&self) -> Option<&C> {
        self.tail_cursor.as_ref()
    }

    /// Returns the number of rows in this page.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns whether this page holds no rows.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Maps the content to a different type, keeping flags and cursors.
    pub fn map<U, F>(self, f: F) -> CursorPage<U, C>
    where
        F: FnMut(T) -> U,
    {
        CursorPage {
            content: self.content.into_iter().map(f).collect(),
            size: self.size,
            has_next: self.has_next,
            has_previous: self.has_previous,
            head_cursor: self.head_cursor,
            tail_cursor: self.tail_cursor,
        }
    }
}

/// Opaque wire form of a pagination cursor.
///
/// Encodes the boundary instant as URL-safe base64 so callers can hand it
/// around without depending on its structure. A malformed string is rejected
/// as [`PgError::InvalidRequest`], never silently treated as "no cursor".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EntryCursor(jiff::Timestamp);

impl EntryCursor {
    /// Creates a cursor from a boundary instant.
    pub fn new(timestamp: jiff::Timestamp) -> Self {
        Self(timestamp)
    }

    /// Returns the boundary instant.
    pub fn timestamp(&self) -> jiff::Timestamp {
        self.0
    }

    /// Encodes the cursor as a URL-safe base64 string.
    pub fn encode(&self) -> String {
        BASE64_URL_SAFE_NO_PAD.encode(self.0.to_string().as_bytes())
    }

    /// Decodes a cursor from a URL-safe base64 string.
    pub fn decode(encoded: &str) -> PgResult<Self> {
        let bytes = BASE64_URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| PgError::invalid_request("cursor is not valid base64"))?;
        let data = String::from_utf8(bytes)
            .map_err(|_| PgError::invalid_request("cursor is not valid UTF-8"))?;
        let timestamp = data
            .parse()
            .map_err(|_| PgError::invalid_request("cursor does not contain a valid instant"))?;
        Ok(Self(timestamp))
    }
}

impl std::fmt::Display for EntryCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl From<jiff::Timestamp> for EntryCursor {
    fn from(timestamp: jiff::Timestamp) -> Self {
        Self(timestamp)
    }
}

impl From<EntryCursor> for jiff::Timestamp {
    fn from(cursor: EntryCursor) -> Self {
        cursor.0
    }
}

impl From<EntryCursor> for String {
    fn from(cursor: EntryCursor) -> Self {
        cursor.encode()
    }
}

impl TryFrom<String> for EntryCursor {
    type Error = PgError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EntryCursor::decode(&value)
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;

    /// `(entry id, last-modified instant)` stand-in for a stored row.
    type Row = (i32, Timestamp);

    fn ts(second: i64) -> Timestamp {
        Timestamp::from_second(second).unwrap()
    }

    /// A store of `count` rows where row `i` (1-based) was modified at
    /// instant `i`; higher ids are more recent.
    fn store(count: i32) -> Vec<Row> {
        (1..=count).map(|i| (i, ts(i as i64))).collect()
    }

    /// Mimics the keyset query: boundary filter, direction-matched order on
    /// `(last_modified, id)`, then the `size + 1` limit.
    fn fetch(store: &[Row], request: &CursorPageRequest<Timestamp>) -> Vec<Row> {
        let mut rows: Vec<Row> = store
            .iter()
            .copied()
            .filter(|(_, modified)| match (request.navigation(), request.cursor()) {
                (Navigation::Next, Some(cursor)) => modified < cursor,
                (Navigation::Previous, Some(cursor)) => modified > cursor,
                (_, None) => true,
            })
            .collect();
        match request.navigation() {
            Navigation::Next => rows.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0))),
            Navigation::Previous => rows.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0))),
        }
        rows.truncate(request.fetch_limit() as usize);
        rows
    }

    fn page(store: &[Row], request: &CursorPageRequest<Timestamp>) -> CursorPage<Row, Timestamp> {
        CursorPage::from_rows(fetch(store, request), request, |row| row.1)
    }

    fn ids(page: &CursorPage<Row, Timestamp>) -> Vec<i32> {
        page.content().iter().map(|(id, _)| *id).collect()
    }

    #[test]
    fn request_validation() {
        assert!(CursorPageRequest::<Timestamp>::first(1).is_ok());
        assert!(matches!(
            CursorPageRequest::<Timestamp>::first(0),
            Err(PgError::InvalidRequest(_))
        ));
        assert!(matches!(
            CursorPageRequest::new(Some(ts(1)), -3, Navigation::Previous),
            Err(PgError::InvalidRequest(_))
        ));
    }

    #[test]
    fn fetch_limit_peeks_one_extra() {
        let request = CursorPageRequest::<Timestamp>::first(50).unwrap();
        assert_eq!(request.fetch_limit(), 51);
    }

    #[test]
    fn navigation_parses_wire_names() {
        assert_eq!("NEXT".parse::<Navigation>().unwrap(), Navigation::Next);
        assert_eq!(
            "PREVIOUS".parse::<Navigation>().unwrap(),
            Navigation::Previous
        );
        assert!("SIDEWAYS".parse::<Navigation>().is_err());
    }

    #[test]
    fn split_page_drops_extra_row() {
        let (content, has_more) = split_page(vec![5, 4, 3], 2, Navigation::Next);
        assert_eq!(content, vec![5, 4]);
        assert!(has_more);
    }

    #[test]
    fn split_page_exact_fetch_has_no_more() {
        let (content, has_more) = split_page(vec![2, 1], 2, Navigation::Next);
        assert_eq!(content, vec![2, 1]);
        assert!(!has_more);
    }

    #[test]
    fn split_page_previous_truncates_then_reverses() {
        // Ascending fetch; the extra row is the one furthest from the cursor.
        let (content, has_more) = split_page(vec![3, 4, 5], 2, Navigation::Previous);
        assert_eq!(content, vec![4, 3]);
        assert!(has_more);
    }

    #[test]
    fn split_page_empty() {
        let (content, has_more) = split_page(Vec::<i32>::new(), 3, Navigation::Next);
        assert!(content.is_empty());
        assert!(!has_more);
    }

    #[test]
    fn empty_store_next() {
        let request = CursorPageRequest::first(10).unwrap();
        let page = page(&store(0), &request);
        assert!(page.is_empty());
        assert!(!page.has_next());
        assert!(!page.has_previous());
        assert!(page.head_cursor().is_none());
        assert!(page.tail_cursor().is_none());
    }

    #[test]
    fn empty_store_previous() {
        let request = CursorPageRequest::last(10).unwrap();
        let page = page(&store(0), &request);
        assert!(page.is_empty());
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn five_entry_next_scenario() {
        let rows = store(5);

        let page0 = page(&rows, &CursorPageRequest::first(2).unwrap());
        assert_eq!(ids(&page0), vec![5, 4]);
        assert!(page0.has_next());
        assert!(!page0.has_previous());
        assert_eq!(page0.tail_cursor(), Some(&ts(5)));
        assert_eq!(page0.head_cursor(), Some(&ts(4)));

        let request1 =
            CursorPageRequest::new(page0.head_cursor().copied(), 2, Navigation::Next).unwrap();
        let page1 = page(&rows, &request1);
        assert_eq!(ids(&page1), vec![3, 2]);
        assert!(page1.has_next());
        assert!(page1.has_previous());
        assert_eq!(page1.tail_cursor(), Some(&ts(3)));
        assert_eq!(page1.head_cursor(), Some(&ts(2)));

        let request2 =
            CursorPageRequest::new(page1.head_cursor().copied(), 2, Navigation::Next).unwrap();
        let page2 = page(&rows, &request2);
        assert_eq!(ids(&page2), vec![1]);
        assert!(!page2.has_next());
        assert!(page2.has_previous());
        assert_eq!(page2.tail_cursor(), Some(&ts(1)));
        assert_eq!(page2.head_cursor(), Some(&ts(1)));
    }

    #[test]
    fn five_entry_previous_scenario() {
        let rows = store(5);

        let page0 = page(&rows, &CursorPageRequest::last(2).unwrap());
        assert_eq!(ids(&page0), vec![2, 1]);
        assert!(!page0.has_next());
        assert!(page0.has_previous());
        assert_eq!(page0.tail_cursor(), Some(&ts(2)));
        assert_eq!(page0.head_cursor(), Some(&ts(1)));

        let request1 =
            CursorPageRequest::new(page0.tail_cursor().copied(), 2, Navigation::Previous).unwrap();
        let page1 = page(&rows, &request1);
        assert_eq!(ids(&page1), vec![4, 3]);
        assert!(page1.has_next());
        assert!(page1.has_previous());

        let request2 =
            CursorPageRequest::new(page1.tail_cursor().copied(), 2, Navigation::Previous).unwrap();
        let page2 = page(&rows, &request2);
        assert_eq!(ids(&page2), vec![5]);
        assert!(page2.has_next());
        assert!(!page2.has_previous());
    }

    #[test]
    fn exact_multiple_next_has_no_spurious_page() {
        let rows = store(4);

        let page0 = page(&rows, &CursorPageRequest::first(2).unwrap());
        assert_eq!(ids(&page0), vec![4, 3]);
        assert!(page0.has_next());

        let request1 =
            CursorPageRequest::new(page0.head_cursor().copied(), 2, Navigation::Next).unwrap();
        let page1 = page(&rows, &request1);
        assert_eq!(ids(&page1), vec![2, 1]);
        assert!(!page1.has_next());
        assert!(page1.has_previous());
    }

    #[test]
    fn exact_multiple_previous_has_no_spurious_page() {
        let rows = store(4);

        let page0 = page(&rows, &CursorPageRequest::last(2).unwrap());
        assert_eq!(ids(&page0), vec![2, 1]);
        assert!(page0.has_previous());

        let request1 =
            CursorPageRequest::new(page0.tail_cursor().copied(), 2, Navigation::Previous).unwrap();
        let page1 = page(&rows, &request1);
        assert_eq!(ids(&page1), vec![4, 3]);
        assert!(!page1.has_previous());
        assert!(page1.has_next());
    }

    #[test]
    fn next_walk_visits_every_row_once() {
        for size in [1i64, 2, 3, 5, 7, 11] {
            let rows = store(11);
            let mut visited = Vec::new();
            let mut request = CursorPageRequest::first(size).unwrap();
            loop {
                let page = page(&rows, &request);
                visited.extend(ids(&page));
                if !page.has_next() {
                    break;
                }
                request = CursorPageRequest::new(
                    page.head_cursor().copied(),
                    size,
                    Navigation::Next,
                )
                .unwrap();
            }
            let expected: Vec<i32> = (1..=11).rev().collect();
            assert_eq!(visited, expected, "size {size}");
        }
    }

    #[test]
    fn previous_walk_visits_every_row_once() {
        for size in [1i64, 2, 3, 5, 7, 11] {
            let rows = store(11);
            let mut visited = Vec::new();
            let mut request = CursorPageRequest::last(size).unwrap();
            loop {
                let page = page(&rows, &request);
                // Pages walked upwards stack on top of what was seen so far.
                let mut chunk = ids(&page);
                chunk.extend(visited);
                visited = chunk;
                if !page.has_previous() {
                    break;
                }
                request = CursorPageRequest::new(
                    page.tail_cursor().copied(),
                    size,
                    Navigation::Previous,
                )
                .unwrap();
            }
            let expected: Vec<i32> = (1..=11).rev().collect();
            assert_eq!(visited, expected, "size {size}");
        }
    }

    #[test]
    fn round_trip_reconstructs_forward_sequence() {
        let rows = store(9);
        let size = 4i64;

        // Walk NEXT to the end, remembering the last page.
        let mut request = CursorPageRequest::first(size).unwrap();
        let mut forward = Vec::new();
        let mut last_page = page(&rows, &request);
        loop {
            forward.extend(ids(&last_page));
            if !last_page.has_next() {
                break;
            }
            request =
                CursorPageRequest::new(last_page.head_cursor().copied(), size, Navigation::Next)
                    .unwrap();
            last_page = page(&rows, &request);
        }

        // Walk PREVIOUS back up from the last page's cursors.
        let mut backward = ids(&last_page);
        let mut cursor = last_page.tail_cursor().copied();
        let mut has_previous = last_page.has_previous();
        while has_previous {
            let request =
                CursorPageRequest::new(cursor, size, Navigation::Previous).unwrap();
            let page = page(&rows, &request);
            let mut chunk = ids(&page);
            chunk.extend(backward);
            backward = chunk;
            cursor = page.tail_cursor().copied();
            has_previous = page.has_previous();
        }

        assert_eq!(backward, forward);
    }

    #[test]
    fn cursor_wire_round_trip() {
        let cursor = EntryCursor::new(ts(12_345));
        let encoded = cursor.encode();
        let decoded = EntryCursor::decode(&encoded).expect("decode should succeed");
        assert_eq!(decoded, cursor);
        assert_eq!(decoded.timestamp(), ts(12_345));
    }

    #[test]
    fn cursor_decode_rejects_garbage() {
        for garbage in ["", "not base64 !!", "bm90IGEgdGltZXN0YW1w"] {
            assert!(matches!(
                EntryCursor::decode(garbage),
                Err(PgError::InvalidRequest(_))
            ));
        }
    }
}
