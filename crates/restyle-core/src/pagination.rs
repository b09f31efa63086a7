//! # Pagination
//!
//! Page parameters and page-info math shared by every list endpoint.
//!
//! ## Shape
//! ```text
//! request:   ?page=2&limit=10          → PageRequest { page: 2, limit: 10 }
//! response:  pagination: {
//!              currentPage, totalPages, totalCount,
//!              limit, hasNextPage, hasPrevPage
//!            }
//! ```

use serde::{Deserialize, Serialize};

/// Default page size when the caller sends none.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Hard ceiling on page size to keep list queries bounded.
pub const MAX_PAGE_LIMIT: i64 = 100;

// =============================================================================
// Page Request
// =============================================================================

/// Requested page window. Out-of-range values are clamped, not rejected.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Creates a page request, clamping into valid ranges.
    pub fn new(page: i64, limit: i64) -> Self {
        PageRequest { page, limit }.clamped()
    }

    /// Clamps page to ≥1 and limit to 1..=MAX_PAGE_LIMIT.
    pub fn clamped(self) -> Self {
        PageRequest {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> i64 {
        let clamped = self.clamped();
        (clamped.page - 1) * clamped.limit
    }
}

// =============================================================================
// Page Info
// =============================================================================

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageInfo {
    /// Computes page metadata from a total row count and the request.
    pub fn compute(total_count: i64, request: PageRequest) -> Self {
        let request = request.clamped();
        let total_pages = if total_count == 0 {
            0
        } else {
            (total_count + request.limit - 1) / request.limit
        };
        PageInfo {
            current_page: request.page,
            total_pages,
            total_count,
            limit: request.limit,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

/// A page of rows plus its metadata, returned by repository list methods.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub rows: Vec<T>,
    pub pagination: PageInfo,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::default();
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let req = PageRequest::new(0, 0);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 1);

        let req = PageRequest::new(3, 1000);
        assert_eq!(req.limit, MAX_PAGE_LIMIT);
        assert_eq!(req.offset(), 2 * MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_page_info_math() {
        let info = PageInfo::compute(25, PageRequest::new(2, 10));
        assert_eq!(info.current_page, 2);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.total_count, 25);
        assert!(info.has_next_page);
        assert!(info.has_prev_page);

        let last = PageInfo::compute(25, PageRequest::new(3, 10));
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);
    }

    #[test]
    fn test_page_info_empty() {
        let info = PageInfo::compute(0, PageRequest::default());
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next_page);
        assert!(!info.has_prev_page);
    }
}
