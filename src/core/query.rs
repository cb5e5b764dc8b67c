//! Query parameters and pagination utilities

use serde::Serialize;
use std::collections::HashMap;

/// Query-string parameter carrying the 1-based page number
pub const PAGE_PARAM: &str = "p";

/// Pages shown before the current one in the page-link window
const WINDOW_LEAD: usize = 5;

/// Width of the page-link window beyond its first page
const WINDOW_SPAN: usize = 10;

/// Requested page of a listing
///
/// `page_size` is fixed per listing; only the page number comes from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page_number: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Clamps `page_number` to at least 1 and `page_size` to at least 1
    pub fn new(page_number: usize, page_size: usize) -> Self {
        Self {
            page_number: page_number.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Read the page number from [`PAGE_PARAM`]; missing, non-numeric or < 1 means page 1
    pub fn from_params(params: &HashMap<String, String>, page_size: usize) -> Self {
        let page_number = params
            .get(PAGE_PARAM)
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map_or(1, |p| usize::try_from(p).unwrap_or(usize::MAX));

        Self::new(page_number, page_size)
    }

    /// Storage bounds for this page
    pub fn fetch_window(&self) -> FetchWindow {
        FetchWindow {
            skip: self.page_size.saturating_mul(self.page_number - 1),
            limit: self.page_size,
        }
    }
}

/// `skip`/`limit` handed to the storage engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchWindow {
    pub skip: usize,
    pub limit: usize,
}

/// Pagination arithmetic for one listing
///
/// `page_count_divisor` only drives the page-link display; the fetch limit is
/// always `page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    pub page_count_divisor: usize,
}

impl Paginator {
    pub fn new(page_count_divisor: usize) -> Self {
        Self {
            page_count_divisor: page_count_divisor.max(1),
        }
    }

    pub fn paginate(&self, total_count: usize, request: &PageRequest) -> PageWindow {
        let page_number = request.page_number.max(1);
        let page_count = total_count.div_ceil(self.page_count_divisor);
        let window_start = page_number.saturating_sub(WINDOW_LEAD).max(1);
        let window_end = window_start
            .saturating_add(WINDOW_SPAN)
            .min(page_count)
            .max(window_start);

        PageWindow {
            page_number,
            page_size: request.page_size,
            total_count,
            page_count,
            window_start,
            window_end,
            fetch: PageRequest::new(page_number, request.page_size).fetch_window(),
        }
    }
}

/// Everything about a page except its items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub page_number: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub page_count: usize,
    pub window_start: usize,
    pub window_end: usize,
    #[serde(skip)]
    pub fetch: FetchWindow,
}

impl PageWindow {
    pub fn with_items<T>(self, items: Vec<T>) -> PageResult<T> {
        PageResult {
            items,
            pagination: self,
        }
    }
}

/// A fetched page plus its pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub pagination: PageWindow,
}

/// Sort direction for a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Single-field sort
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse `field`, `field:asc` or `field:desc`
    pub fn parse(s: &str) -> Option<Self> {
        let (field, direction) = match s.split_once(':') {
            Some((field, "desc")) => (field, SortDirection::Desc),
            Some((field, "asc")) => (field, SortDirection::Asc),
            Some(_) => return None,
            None => (s, SortDirection::Asc),
        };
        (!field.is_empty()).then(|| Self {
            field: field.to_string(),
            direction,
        })
    }
}
