use serde::Serialize;

use crate::error::ApiError;

pub const PAGE_SIZE: i64 = 5;
/// Marker used in `next`/`previous` when there is no such page.
pub const NO_PAGE: &str = "none";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub items_per_page: i64,
    pub next: String,
    pub previous: String,
    pub total_count: i64,
    pub page_count: i64,
}

/// Slice of the id-ordered post collection selected by a page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub offset: i64,
    pub limit: i64,
    pub meta: PageMeta,
}

impl PageWindow {
    /// Pages are 1-based. Anything below 1 reads page 1; a page past the last
    /// one is a bad request unless the collection is empty.
    pub fn compute(total_count: i64, requested: Option<i64>) -> Result<Self, ApiError> {
        let page = requested.unwrap_or(1).max(1);
        let page_count = (total_count + PAGE_SIZE - 1) / PAGE_SIZE;
        if page_count > 0 && page > page_count {
            return Err(ApiError::BadRequest);
        }

        let bottom = (page - 1).saturating_mul(PAGE_SIZE);
        let top = page.saturating_mul(PAGE_SIZE);

        let next = if top >= total_count {
            NO_PAGE.to_string()
        } else {
            format!("?page={}", page + 1)
        };
        let previous = if bottom < 1 {
            NO_PAGE.to_string()
        } else {
            format!("?page={}", page - 1)
        };

        Ok(Self {
            page,
            offset: bottom,
            limit: PAGE_SIZE,
            meta: PageMeta {
                items_per_page: PAGE_SIZE,
                next,
                previous,
                total_count,
                page_count,
            },
        })
    }
}
