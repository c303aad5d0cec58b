//! Page requests and responses for listing endpoints.

use serde::{Deserialize, Serialize};

/// Default page size when none (or a non-positive one) is given.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A normalized page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Normalize raw caller input: `page < 1` becomes 1, `size < 1` becomes
    /// [`DEFAULT_PAGE_SIZE`], `size > 100` becomes [`MAX_PAGE_SIZE`].
    #[must_use]
    pub fn new(page: i64, page_size: i64) -> Self {
        let page = u32::try_from(page.max(1)).unwrap_or(u32::MAX);
        let page_size = if page_size < 1 {
            DEFAULT_PAGE_SIZE
        } else {
            u32::try_from(page_size.min(i64::from(MAX_PAGE_SIZE))).unwrap_or(MAX_PAGE_SIZE)
        };
        Self { page, page_size }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of items to skip.
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }

    /// Maximum number of items to return.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.page_size as usize
    }

    /// Cut one page out of an already-ordered iterator, counting the total.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> (Vec<T>, u64) {
        let mut total = 0_u64;
        let mut page = Vec::with_capacity(self.limit());
        let (offset, limit) = (self.offset(), self.limit());

        for (index, item) in items.into_iter().enumerate() {
            total += 1;
            if index >= offset && page.len() < limit {
                page.push(item);
            }
        }

        (page, total)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, i64::from(DEFAULT_PAGE_SIZE))
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Total matching items across all pages.
    pub total: u64,
    /// Number of pages.
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page response.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page(),
            page_size: request.page_size(),
            total,
            total_pages: total.div_ceil(u64::from(request.page_size())),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_out_of_range_input() {
        assert_eq!(PageRequest::new(0, 0), PageRequest::new(1, 10));
        assert_eq!(PageRequest::new(-3, -1).page(), 1);
        assert_eq!(PageRequest::new(2, 500).page_size(), 100);
        assert_eq!(PageRequest::new(3, 25).offset(), 50);
    }

    #[test]
    fn slice_counts_everything() {
        let request = PageRequest::new(2, 3);
        let (items, total) = request.slice(1..=8);
        assert_eq!(items, vec![4, 5, 6]);
        assert_eq!(total, 8);

        let (items, total) = PageRequest::new(4, 3).slice(1..=8);
        assert!(items.is_empty());
        assert_eq!(total, 8);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(vec![1, 2], PageRequest::new(1, 10), 21);
        assert_eq!(page.total_pages, 3);
        assert_eq!(Page::<u8>::new(vec![], PageRequest::default(), 0).total_pages, 0);
    }
}
