//! # Pagination
//!
//! Turns `(page, page_size)` into a bounded window and wraps every listing
//! in the same `{data, metadata}` envelope.
//!
//! ## Window Arithmetic
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  page=2, page_size=5, total_records=6                                   │
//! │                                                                         │
//! │  rows:   [0] [1] [2] [3] [4] │ [5]                                      │
//! │           └──── page 1 ────┘   └ page 2                                 │
//! │                                                                         │
//! │  offset      = (page - 1) × page_size      = 5                          │
//! │  window      = [offset, offset + page_size) = [5, 10)                   │
//! │  total_pages = ceil(total_records / page_size) = 2                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `total_records` must come from a count query that applies the same
//! filtering and grouping as the data query, minus the window.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::ValidationResult;
use crate::MAX_PAGE_SIZE;

// =============================================================================
// Page Request
// =============================================================================

/// A validated, 1-based page window.
///
/// Fields are private so every instance has passed [`PageRequest::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validates and creates a page request.
    ///
    /// ## Rules
    /// - `page >= 1`
    /// - `1 <= page_size <= MAX_PAGE_SIZE`
    ///
    /// ## Example
    /// ```rust
    /// use orderly_core::pagination::PageRequest;
    ///
    /// assert!(PageRequest::new(1, 20).is_ok());
    /// assert!(PageRequest::new(0, 20).is_err());
    /// assert!(PageRequest::new(1, 0).is_err());
    /// ```
    pub fn new(page: u32, page_size: u32) -> ValidationResult<Self> {
        if page == 0 {
            return Err(ValidationError::MustBePositive {
                field: "page".to_string(),
            });
        }

        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::OutOfRange {
                field: "page_size".to_string(),
                min: 1,
                max: MAX_PAGE_SIZE as i64,
            });
        }

        Ok(PageRequest { page, page_size })
    }

    /// Validates raw signed inputs as they arrive from query strings.
    pub fn from_raw(page: i64, page_size: i64) -> ValidationResult<Self> {
        let page = u32::try_from(page).map_err(|_| ValidationError::MustBePositive {
            field: "page".to_string(),
        })?;
        let page_size = u32::try_from(page_size).map_err(|_| ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE as i64,
        })?;
        Self::new(page, page_size)
    }

    /// The first page with the given size.
    pub fn first(page_size: u32) -> ValidationResult<Self> {
        Self::new(1, page_size)
    }

    /// 1-based page number.
    #[inline]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Rows per page.
    #[inline]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows to skip, as bound to `OFFSET`.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    /// Rows to return, as bound to `LIMIT`.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Total-count context for a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub total_records: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub page_size: u32,
}

impl PageMetadata {
    /// Builds metadata from a count result.
    ///
    /// Negative counts (which a backend never returns) are clamped to zero.
    pub fn new(total_records: i64, request: PageRequest) -> Self {
        let total_records = total_records.max(0) as u64;
        let page_size = request.page_size() as u64;

        PageMetadata {
            total_records,
            total_pages: total_records.div_ceil(page_size),
            current_page: request.page(),
            page_size: request.page_size(),
        }
    }
}

/// The uniform `{data, metadata}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub metadata: PageMetadata,
}

impl<T> Page<T> {
    /// Wraps a window of rows with its total count.
    ///
    /// Rows beyond `page_size` are dropped so `data.len() <= page_size`
    /// holds even if a backend ignored `LIMIT`.
    pub fn new(mut data: Vec<T>, total_records: i64, request: PageRequest) -> Self {
        data.truncate(request.page_size() as usize);
        Page {
            data,
            metadata: PageMetadata::new(total_records, request),
        }
    }

    /// Transforms each row, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            metadata: self.metadata,
        }
    }

    /// Whether this page is past the last record.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
