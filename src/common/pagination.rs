// src/common/pagination.rs

use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
// Maior página cujo offset ainda cabe em i64
pub const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

/// Página já normalizada (1 <= page <= MAX_PAGE, 1 <= limit <= MAX_LIMIT).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// Envelope de listagem consumido pelo frontend
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
    pub limit: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        let total_pages = if total <= 0 {
            0
        } else {
            (total + page.limit - 1) / page.limit
        };
        Self {
            items,
            total,
            page: page.page,
            total_pages,
            limit: page.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_is_normalized() {
        assert_eq!(Page::new(None, None), Page { page: 1, limit: DEFAULT_LIMIT });
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, limit: 1 });
        assert_eq!(Page::new(Some(-3), Some(5000)), Page { page: 1, limit: MAX_LIMIT });
        assert_eq!(Page::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_does_not_overflow_offset() {
        let page = Page::new(Some(i64::MAX), Some(MAX_LIMIT));
        assert_eq!(page.page, MAX_PAGE);
        assert!(page.offset() > 0);
        assert_eq!(page.offset(), (MAX_PAGE - 1) * MAX_LIMIT);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(Some(1), Some(10));
        assert_eq!(Paginated::<u8>::new(vec![], 0, page).total_pages, 0);
        assert_eq!(Paginated::<u8>::new(vec![], 10, page).total_pages, 1);
        assert_eq!(Paginated::<u8>::new(vec![], 11, page).total_pages, 2);
    }
}
