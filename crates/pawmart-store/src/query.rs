//! Listing query engine: turns the raw `page`/`limit`/`category`/`search`/
//! `sort` request parameters into a deterministic, safe filter over the
//! listings collection.
//!
//! User text is never handed to the server-side `$regex` operator as-is; it
//! is escaped first so pattern metacharacters match literally.

use mongodb::bson::{Document, doc};

use crate::model::Listing;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: i64 = 12;

/// Sentinel category value meaning "no category filter".
pub const CATEGORY_ALL: &str = "All";

/// Result ordering for a listing page. Ties are broken by the storage
/// layer's natural order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    /// Descending by `date`. The fallback for absent or unknown `sort`.
    #[default]
    NewestFirst,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("price_asc") => SortOrder::PriceAsc,
            Some("price_desc") => SortOrder::PriceDesc,
            _ => SortOrder::NewestFirst,
        }
    }

    pub(crate) fn sort_document(self) -> Document {
        match self {
            SortOrder::PriceAsc => doc! { "price": 1 },
            SortOrder::PriceDesc => doc! { "price": -1 },
            SortOrder::NewestFirst => doc! { "date": -1 },
        }
    }
}

/// Normalized query parameters for a page of listings.
///
/// Construct via [`ListingQuery::from_raw`], which applies the defaults and
/// clamps out-of-range input so the skip offset can never go negative.
#[derive(Debug, Clone)]
pub struct ListingQuery {
    pub page: u64,
    pub limit: i64,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: SortOrder,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            category: None,
            search: None,
            sort: SortOrder::default(),
        }
    }
}

impl ListingQuery {
    /// Build a query from raw request parameters.
    ///
    /// `page` and `limit` fall back to their defaults when missing,
    /// non-numeric, or below 1. A `category` of `"All"` (or empty) means no
    /// category filter; an empty `search` means no name filter.
    pub fn from_raw(
        page: Option<&str>,
        limit: Option<&str>,
        category: Option<&str>,
        search: Option<&str>,
        sort: Option<&str>,
    ) -> Self {
        Self {
            page: positive(page).map_or(DEFAULT_PAGE, |v| v as u64),
            limit: positive(limit).unwrap_or(DEFAULT_LIMIT),
            category: category
                .filter(|c| !c.is_empty() && *c != CATEGORY_ALL)
                .map(str::to_owned),
            search: search.filter(|s| !s.is_empty()).map(str::to_owned),
            sort: SortOrder::parse(sort),
        }
    }

    /// The combined filter: category-match AND name-match when both are
    /// present, match-all when neither is.
    pub(crate) fn filter_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(category) = &self.category {
            filter.insert("category", literal_regex(category));
        }
        if let Some(search) = &self.search {
            filter.insert("name", literal_regex(search));
        }
        filter
    }

    pub(crate) fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit as u64)
    }
}

/// Case-insensitive substring match with the user text escaped so characters
/// meaningful to the pattern engine are matched literally.
fn literal_regex(text: &str) -> Document {
    doc! { "$regex": regex_lite::escape(text), "$options": "i" }
}

pub(crate) fn total_pages(total: u64, limit: i64) -> u64 {
    // limit >= 1 is guaranteed by from_raw.
    total.div_ceil(limit as u64)
}

/// One page of listings plus pagination metadata. `total` counts every match
/// regardless of pagination.
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub data: Vec<Listing>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}

fn positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v >= 1)
}
