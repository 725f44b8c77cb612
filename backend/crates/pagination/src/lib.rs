//! Page/limit pagination primitives shared by BloodConnect endpoints.
//!
//! Listing endpoints accept `page` and `limit` query parameters. This crate
//! validates them once, at the edge, so repositories only ever see a
//! well-formed [`PageRequest`] and handlers return a uniform [`Page`]
//! envelope.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default page size applied when the client omits `limit`.
pub const DEFAULT_LIMIT: u32 = 10;
/// Upper bound on `limit` to keep result sets bounded.
pub const MAX_LIMIT: u32 = 100;

/// Validation failures for pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// `page` was zero; pages are one-based.
    #[error("page must be at least 1")]
    ZeroPage,
    /// `limit` was zero.
    #[error("limit must be at least 1")]
    ZeroLimit,
    /// `limit` exceeded [`MAX_LIMIT`].
    #[error("limit must be at most {max}")]
    LimitTooLarge {
        /// The enforced maximum.
        max: u32,
    },
}

/// A validated, one-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Validate raw `page`/`limit` values, applying defaults for `None`.
    pub fn try_new(page: Option<u32>, limit: Option<u32>) -> Result<Self, PageRequestError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if page == 0 {
            return Err(PageRequestError::ZeroPage);
        }
        if limit == 0 {
            return Err(PageRequestError::ZeroLimit);
        }
        if limit > MAX_LIMIT {
            return Err(PageRequestError::LimitTooLarge { max: MAX_LIMIT });
        }
        Ok(Self { page, limit })
    }

    /// One-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of items in the page.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items to skip for this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// A page of results together with the total matching count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, at most `limit` of them.
    pub items: Vec<T>,
    /// One-based page number echoed back.
    pub page: u32,
    /// Page size echoed back.
    pub limit: u32,
    /// Total number of items matching the filter, across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Assemble a page envelope from items and the request that produced it.
    pub fn new(items: Vec<T>, request: &PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page(),
            limit: request.limit(),
            total,
        }
    }

    /// Map the items while keeping the envelope metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_apply_when_parameters_are_omitted() {
        let request = PageRequest::try_new(None, None).expect("defaults valid");
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), DEFAULT_LIMIT);
        assert_eq!(request.offset(), 0);
    }

    #[rstest]
    #[case(Some(0), None, PageRequestError::ZeroPage)]
    #[case(None, Some(0), PageRequestError::ZeroLimit)]
    #[case(None, Some(MAX_LIMIT + 1), PageRequestError::LimitTooLarge { max: MAX_LIMIT })]
    fn out_of_range_parameters_are_rejected(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] expected: PageRequestError,
    ) {
        let err = PageRequest::try_new(page, limit).expect_err("invalid parameters");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case(1, 10, 0)]
    #[case(2, 10, 10)]
    #[case(3, 25, 50)]
    fn offset_skips_previous_pages(#[case] page: u32, #[case] limit: u32, #[case] offset: u64) {
        let request = PageRequest::try_new(Some(page), Some(limit)).expect("valid");
        assert_eq!(request.offset(), offset);
    }

    #[rstest]
    fn map_preserves_envelope_metadata() {
        let request = PageRequest::try_new(Some(2), Some(5)).expect("valid");
        let page = Page::new(vec![1, 2, 3], &request, 13).map(|n| n * 2);
        assert_eq!(page.items, vec![2, 4, 6]);
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 5);
        assert_eq!(page.total, 13);
    }
}
