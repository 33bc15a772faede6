//! Offset pagination over an arbitrary SQL listing.
//!
//! `paginate` runs two statements: a `COUNT(*)` over the shaped listing and
//! the shaped listing itself with `LIMIT`/`OFFSET`. They are not run in a
//! transaction, so a write landing between them can leave `total`/`last_page`
//! one off from the rows returned, and a row near a page boundary can show up
//! twice or not at all across consecutive pages. Listings are eventually
//! consistent; no locking or retry is attempted.

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 5;
/// Largest `limit` accepted from a query string; bigger values are clamped.
pub const MAX_LIMIT: u32 = 100;

/// A validated page window. Both fields are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// `None` when either value is zero.
    pub fn new(page: u32, limit: u32) -> Option<Self> {
        (page >= 1 && limit >= 1).then_some(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Saturates instead of overflowing for huge page numbers.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1).saturating_mul(i64::from(self.limit))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Raw `?page=&limit=` (or `perPage`) query string values.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
}

impl PageParams {
    /// Non-numeric, zero and negative values fall back to the defaults;
    /// `limit` is clamped to [`MAX_LIMIT`].
    pub fn to_request(&self) -> PageRequest {
        let page = positive_or(self.page.as_deref(), DEFAULT_PAGE);
        let limit = positive_or(
            self.limit.as_deref().or(self.per_page.as_deref()),
            DEFAULT_LIMIT,
        )
        .min(MAX_LIMIT);
        PageRequest { page, limit }
    }
}

fn positive_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(default)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub from: i64,
    pub to: i64,
    pub last_page: i64,
    pub per_page: u32,
    pub total: i64,
}

impl<T> Page<T> {
    /// `from` is `offset + 1` even for an empty page.
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        let total = total.max(0);
        let limit = i64::from(request.limit);
        let offset = request.offset();

        Self {
            data,
            current_page: request.page,
            from: offset.saturating_add(1),
            to: offset.saturating_add(limit).min(total),
            last_page: total.saturating_add(limit - 1) / limit,
            per_page: request.limit,
            total,
        }
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            from: self.from,
            to: self.to,
            last_page: self.last_page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("pagination count query failed: {0}")]
    Count(#[source] sqlx::Error),
    #[error("pagination fetch query failed: {0}")]
    Fetch(#[source] sqlx::Error),
}

/// The base statement of a listing: a `SELECT ... FROM ...` without
/// `WHERE`/`ORDER BY`/`LIMIT`, plus the ordering used when fetching.
#[derive(Debug, Clone, Copy)]
pub struct Listing<'a> {
    pub select: &'a str,
    pub order_by: &'a str,
}

/// Appends joins or filters to a listing. Applied to both the count and the
/// fetch, so it must only push clauses that are valid right after `FROM`.
pub type Shape<'s> = &'s (dyn for<'q> Fn(&mut QueryBuilder<'q, Sqlite>) + Send + Sync);

pub async fn paginate<T>(
    db: &SqlitePool,
    listing: Listing<'_>,
    request: PageRequest,
    shape: Option<Shape<'_>>,
) -> Result<Page<T>, PaginationError>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM (");
    count.push(listing.select);
    if let Some(shape) = shape {
        shape(&mut count);
    }
    count.push(")");

    let total: i64 = count
        .build_query_scalar()
        .fetch_one(db)
        .await
        .map_err(PaginationError::Count)?;

    let mut fetch = QueryBuilder::<Sqlite>::new(listing.select);
    if let Some(shape) = shape {
        shape(&mut fetch);
    }
    fetch.push(" ORDER BY ").push(listing.order_by);
    fetch.push(" LIMIT ").push_bind(i64::from(request.limit()));
    fetch.push(" OFFSET ").push_bind(request.offset());

    let data = fetch
        .build_query_as::<T>()
        .fetch_all(db)
        .await
        .map_err(PaginationError::Fetch)?;

    Ok(Page::new(data, request, total))
}
