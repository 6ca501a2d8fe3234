//! Offset pagination for catalog listings.

use catalog_core::{DomainError, DomainResult};

/// Page size used when the caller does not provide one.
pub const DEFAULT_PAGE_LIMIT: u32 = 15;

/// A validated `limit`/`offset` window.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Page {
    limit: u32,
    offset: u32,
}

impl Page {
    /// Build a page from optional caller input, applying defaults.
    ///
    /// `limit` must be positive; `offset` defaults to 0.
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> DomainResult<Self> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit == 0 {
            return Err(DomainError::validation("limit must be a positive integer"));
        }
        Ok(Self {
            limit,
            offset: offset.unwrap_or(0),
        })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Bounds of this page within a collection of `len` elements.
    pub fn bounds(&self, len: usize) -> core::ops::Range<usize> {
        let start = (self.offset as usize).min(len);
        let end = start.saturating_add(self.limit as usize).min(len);
        start..end
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}
