//! Offset pagination for record listings.

use serde::{Deserialize, Serialize};

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// A page request.
///
/// Pages are zero-based. A `page_size` of zero is treated as the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Zero-based page number.
    #[serde(default)]
    pub page: u32,

    /// Number of records per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Creates a page request.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Returns a copy whose page size is at most `max`.
    pub fn clamped(self, max: u32) -> Self {
        let page_size = match self.page_size {
            0 => DEFAULT_PAGE_SIZE.min(max),
            n => n.min(max),
        };
        Self { page: self.page, page_size }
    }

    /// Returns the effective page size.
    pub fn limit(&self) -> u32 {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        }
    }

    /// Returns the number of records to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.limit())
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// Zero-based page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Total matching records across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Creates a page for the given request.
    pub fn new(items: Vec<T>, pagination: &Pagination, total: u64) -> Self {
        Self {
            items,
            page: pagination.page,
            page_size: pagination.limit(),
            total,
        }
    }

    /// Returns `true` if later pages exist.
    pub fn has_next(&self) -> bool {
        let seen = u64::from(self.page) * u64::from(self.page_size) + self.items.len() as u64;
        seen < self.total
    }

    /// Maps the items, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }
}
