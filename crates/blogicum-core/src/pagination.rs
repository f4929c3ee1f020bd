//! Page-number pagination with forgiving page resolution.
//!
//! A missing or non-numeric page number resolves to the first page; a page
//! number below one or past the end resolves to the last page. An empty
//! result set still has a single, empty page.

use serde::Serialize;

/// Number of posts shown on one feed page.
pub const POSTS_PER_PAGE: u64 = 10;

/// A requested page, as it arrived in the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: Option<i64>,
    per_page: u64,
}

impl PageRequest {
    /// Parse the raw `page` query parameter.
    pub fn from_query(raw: Option<&str>) -> Self {
        Self {
            number: raw.and_then(|s| s.trim().parse().ok()),
            per_page: POSTS_PER_PAGE,
        }
    }

    /// Clamp the request against a result set of `total` items.
    pub fn resolve(&self, total: u64) -> PageWindow {
        let num_pages = total.div_ceil(self.per_page).max(1);
        let number = match self.number {
            None => 1,
            Some(n) if n < 1 => num_pages,
            Some(n) => (n as u64).min(num_pages),
        };

        PageWindow {
            number,
            num_pages,
            per_page: self.per_page,
            total,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::from_query(None)
    }
}

/// The resolved position of a page inside a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub per_page: u64,
    pub total: u64,
}

impl PageWindow {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// One page of items.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub window: PageWindow,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
            window,
        }
    }

    /// Cut the window out of an already ordered, complete result list.
    pub fn slice(all: Vec<T>, request: &PageRequest) -> Self {
        let window = request.resolve(all.len() as u64);
        let items = all
            .into_iter()
            .skip(window.offset() as usize)
            .take(window.limit() as usize)
            .collect();
        Self::new(items, window)
    }
}
