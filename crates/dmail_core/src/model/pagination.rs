//! Pagination input for list queries.
//!
//! # Invariants
//! - Effective page size is `DEFAULT_PAGE_SIZE` when the input is not positive,
//!   and never exceeds `MAX_PAGE_SIZE`.
//! - Effective page number is never negative.
//! - A present `cursor_id` selects cursor mode and makes `page_number` unused.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Pagination controls plus an entity-shaped exact-match filter.
///
/// Field names follow the query-string keys accepted by the HTTP layer:
/// `id` (cursor), `pn`, `ps`, and the entity fields flattened alongside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationFilter<E> {
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub cursor_id: Option<i64>,
    #[serde(flatten)]
    pub filter: E,
    /// Zero-based page number, offset mode only.
    #[serde(rename = "pn", default)]
    pub page_number: i64,
    #[serde(rename = "ps", default)]
    pub page_size: i64,
}

/// Which pagination strategy a filter resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Rows with `id > cursor`, ascending by id.
    Cursor { after_id: i64, limit: i64 },
    /// Skip `offset` rows, ascending by id.
    Offset { limit: i64, offset: i64 },
}

impl<E> PaginationFilter<E> {
    /// Creates a first-page offset filter with default page size.
    pub fn new(filter: E) -> Self {
        Self {
            cursor_id: None,
            filter,
            page_number: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_cursor(mut self, cursor_id: i64) -> Self {
        self.cursor_id = Some(cursor_id);
        self
    }

    pub fn with_page(mut self, page_number: i64, page_size: i64) -> Self {
        self.page_number = page_number;
        self.page_size = page_size;
        self
    }

    pub fn effective_page_size(&self) -> i64 {
        if self.page_size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size.min(MAX_PAGE_SIZE)
        }
    }

    pub fn effective_page_number(&self) -> i64 {
        self.page_number.max(0)
    }

    /// Rewrites `page_size`/`page_number` to their effective values.
    pub fn set_defaults(&mut self) {
        self.page_size = self.effective_page_size();
        self.page_number = self.effective_page_number();
    }

    /// Resolves the pagination mode; cursor takes priority over page number.
    pub fn mode(&self) -> PageMode {
        let limit = self.effective_page_size();
        match self.cursor_id {
            Some(after_id) => PageMode::Cursor { after_id, limit },
            None => PageMode::Offset {
                limit,
                offset: self.effective_page_number().saturating_mul(limit),
            },
        }
    }
}
