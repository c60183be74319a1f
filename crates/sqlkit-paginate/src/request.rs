//! Pagination request parameters.

use serde::{Deserialize, Serialize};
use sqlkit_common::PaginationConfig;

/// How many page links a pager shows around the edges and the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagerShape {
    /// Pages always shown at the start.
    pub left_edge: u64,
    /// Pages shown before the current page.
    pub left_current: u64,
    /// Pages shown after the current page.
    pub right_current: u64,
    /// Pages always shown at the end.
    pub right_edge: u64,
}

impl Default for PagerShape {
    fn default() -> Self {
        Self {
            left_edge: 2,
            left_current: 2,
            right_current: 4,
            right_edge: 2,
        }
    }
}

impl PagerShape {
    pub fn new(left_edge: u64, left_current: u64, right_current: u64, right_edge: u64) -> Self {
        Self {
            left_edge,
            left_current,
            right_current,
            right_edge,
        }
    }
}

impl From<&PaginationConfig> for PagerShape {
    fn from(cfg: &PaginationConfig) -> Self {
        Self {
            left_edge: cfg.left_edge,
            left_current: cfg.left_current,
            right_current: cfg.right_current,
            right_edge: cfg.right_edge,
        }
    }
}

/// Parameters of a single pagination request.
///
/// `page` and `per_page` are signed so that raw request input can be passed
/// through unchecked; the paginator clamps both to at least 1.
///
/// Deserializes from flat query-string style input:
///
/// ```
/// use sqlkit_paginate::PageRequest;
///
/// let req: PageRequest = serde_json::from_str(r#"{"page": 3, "per_page": 25}"#).unwrap();
/// assert_eq!(req.page, 3);
/// assert_eq!(req.padding, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
    /// Precomputed item count. Trusted as-is when present.
    pub total: Option<u64>,
    /// Extra items fetched on each side of the page window.
    pub padding: u64,
    /// Return the source unmodified instead of slicing a window out of it.
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(flatten)]
    pub shape: PagerShape,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            total: None,
            padding: 0,
            is_static: false,
            shape: PagerShape::default(),
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page,
            per_page,
            ..Self::default()
        }
    }

    /// Build a request using configured defaults, clamping `per_page` to the
    /// configured maximum.
    pub fn from_config(cfg: &PaginationConfig, page: Option<i64>, per_page: Option<i64>) -> Self {
        let per_page = cfg.clamp_per_page(per_page.map(|n| n.max(0) as u64));
        Self {
            page: page.unwrap_or(1),
            per_page: i64::try_from(per_page).unwrap_or(i64::MAX),
            shape: PagerShape::from(cfg),
            ..Self::default()
        }
    }

    pub fn total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn padding(mut self, padding: u64) -> Self {
        self.padding = padding;
        self
    }

    pub fn static_source(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn shape(mut self, shape: PagerShape) -> Self {
        self.shape = shape;
        self
    }

    /// `page` clamped to at least 1.
    pub fn normalized_page(&self) -> u64 {
        self.page.max(1) as u64
    }

    /// `per_page` clamped to at least 1.
    pub fn normalized_per_page(&self) -> u64 {
        self.per_page.max(1) as u64
    }
}
