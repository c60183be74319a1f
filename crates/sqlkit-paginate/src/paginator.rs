//! The page window itself.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::pager::{PageLink, PageLinks};
use crate::request::{PageRequest, PagerShape};
use crate::source::{IterSource, ResultSource};

/// Per-item transform applied while the window is materialized.
pub type Callback<T> = Arc<dyn Fn(T) -> T + Send + Sync>;

/// A bounded window over a result source plus the metadata a pager needs.
///
/// The total is resolved once at construction (from the request, or by
/// counting the source) and the window is fetched at most once. Asking for a
/// page past the end is not an error: the window is simply empty while
/// `total` and `pages` stay accurate.
///
/// ```
/// use sqlkit_paginate::{PageRequest, Paginator};
///
/// let p = Paginator::from_vec((1..=25).collect::<Vec<u32>>(), PageRequest::new(3, 10));
/// assert_eq!(p.items(), &[21, 22, 23, 24, 25]);
/// assert_eq!(p.pages(), 3);
/// assert!(!p.has_next());
/// ```
pub struct Paginator<T> {
    page: u64,
    per_page: u64,
    total: u64,
    pages: u64,
    padding: u64,
    is_static: bool,
    shape: PagerShape,
    offset: u64,
    limit: u64,
    items: Vec<T>,
    callback: Option<Callback<T>>,
}

impl<T> Paginator<T> {
    /// Paginate `source` according to `request`.
    ///
    /// Any error raised by the source while counting or fetching is returned
    /// unchanged; no partial paginator is produced.
    pub fn new<S>(source: S, request: PageRequest) -> Result<Self, S::Error>
    where
        S: ResultSource<T>,
    {
        Self::build(source, request, None)
    }

    /// Like [`Paginator::new`], applying `callback` to every item of the
    /// window in order.
    pub fn with_callback<S, F>(
        source: S,
        request: PageRequest,
        callback: F,
    ) -> Result<Self, S::Error>
    where
        S: ResultSource<T>,
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        let callback: Callback<T> = Arc::new(callback);
        Self::build(source, request, Some(callback))
    }

    /// Paginate an in-memory vector.
    pub fn from_vec(items: Vec<T>, request: PageRequest) -> Self {
        infallible(Self::new(items, request))
    }

    /// Paginate any iterable. Without a total in the request the iterable is
    /// collected in full to count it.
    pub fn from_iterable<I>(iterable: I, request: PageRequest) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        infallible(Self::new(IterSource::new(iterable), request))
    }

    fn build<S>(
        mut source: S,
        request: PageRequest,
        callback: Option<Callback<T>>,
    ) -> Result<Self, S::Error>
    where
        S: ResultSource<T>,
    {
        let page = request.normalized_page();
        let per_page = request.normalized_per_page();
        let padding = request.padding;

        let total = match request.total {
            Some(total) => total,
            None => source.total()?,
        };
        let pages = page_count(total, per_page);

        let (offset, limit, items) = if request.is_static {
            let items = source.all(total)?;
            (0, items.len() as u64, items)
        } else {
            let (offset, limit) = window_bounds(page, per_page, padding, total, pages);
            let items = if limit == 0 {
                Vec::new()
            } else {
                source.window(offset, limit)?
            };
            (offset, limit, items)
        };

        tracing::debug!(
            page,
            per_page,
            total,
            pages,
            offset,
            fetched = items.len(),
            "resolved page window"
        );

        let items = match &callback {
            Some(cb) => items.into_iter().map(|item| cb(item)).collect(),
            None => items,
        };

        Ok(Self {
            page,
            per_page,
            total,
            pages,
            padding,
            is_static: request.is_static,
            shape: request.shape,
            offset,
            limit,
            items,
            callback,
        })
    }

    /// Current page number, at least 1.
    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of items in the whole source.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of pages, at least 1 even for an empty source.
    pub fn pages(&self) -> u64 {
        self.pages
    }

    pub fn padding(&self) -> u64 {
        self.padding
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Offset of the fetched window in the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of items the window was allowed to hold.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// The window, including padding.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    pub fn prev_num(&self) -> Option<u64> {
        self.has_prev().then(|| self.page - 1)
    }

    pub fn next_num(&self) -> Option<u64> {
        self.has_next().then(|| self.page + 1)
    }

    /// Zero-based indexes of the first and last item of the requested page
    /// within the whole source, ignoring padding. `None` when the page holds
    /// no items.
    pub fn pages_range(&self) -> Option<(u64, u64)> {
        let first = (self.page - 1).checked_mul(self.per_page)?;
        if first >= self.total {
            return None;
        }
        let last = first.saturating_add(self.per_page).min(self.total) - 1;
        Some((first, last))
    }

    /// Page links using the shape from the request.
    pub fn iter_pages(&self) -> PageLinks {
        self.iter_pages_with(self.shape)
    }

    pub fn iter_pages_with(&self, shape: PagerShape) -> PageLinks {
        PageLinks::new(self.page, self.pages, shape)
    }

    /// Serializable summary for API responses.
    pub fn meta(&self) -> PageMeta {
        PageMeta {
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
            has_prev: self.has_prev(),
            has_next: self.has_next(),
            prev_num: self.prev_num(),
            next_num: self.next_num(),
            links: self.iter_pages().collect(),
        }
    }

    /// A request for `page` that reuses this paginator's resolved total, so
    /// the source is not counted again.
    pub fn request_for(&self, page: i64) -> PageRequest {
        PageRequest {
            page,
            per_page: i64::try_from(self.per_page).unwrap_or(i64::MAX),
            total: Some(self.total),
            padding: self.padding,
            is_static: self.is_static,
            shape: self.shape,
        }
    }

    /// Paginate `source` again at another page, keeping the total, padding,
    /// pager shape and callback of this paginator.
    pub fn to_page<S>(&self, source: S, page: i64) -> Result<Self, S::Error>
    where
        S: ResultSource<T>,
    {
        Self::build(source, self.request_for(page), self.callback.clone())
    }

    /// Transform every item, keeping the page metadata.
    pub fn map<U, F>(self, f: F) -> Paginator<U>
    where
        F: FnMut(T) -> U,
    {
        Paginator {
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
            padding: self.padding,
            is_static: self.is_static,
            shape: self.shape,
            offset: self.offset,
            limit: self.limit,
            items: self.items.into_iter().map(f).collect(),
            callback: None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Paginator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("page", &self.page)
            .field("per_page", &self.per_page)
            .field("total", &self.total)
            .field("pages", &self.pages)
            .field("padding", &self.padding)
            .field("is_static", &self.is_static)
            .field("items", &self.items)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl<'a, T> IntoIterator for &'a Paginator<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> IntoIterator for Paginator<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Page metadata without the items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_num: Option<u64>,
    pub next_num: Option<u64>,
    pub links: Vec<PageLink>,
}

/// Paginate `source` with default padding and pager shape.
pub fn paginate<T, S>(source: S, page: i64, per_page: i64) -> Result<Paginator<T>, S::Error>
where
    S: ResultSource<T>,
{
    Paginator::new(source, PageRequest::new(page, per_page))
}

/// `max(1, ceil(total / per_page))`.
pub fn page_count(total: u64, per_page: u64) -> u64 {
    total.div_ceil(per_page.max(1)).max(1)
}

/// Offset and length of the window for `page`, padding included.
///
/// The window is empty when the source is empty or `page` is past the last
/// page.
fn window_bounds(page: u64, per_page: u64, padding: u64, total: u64, pages: u64) -> (u64, u64) {
    let start = (page - 1)
        .saturating_mul(per_page)
        .saturating_sub(padding);
    if total == 0 || page > pages || start >= total {
        return (start, 0);
    }
    let size = per_page.saturating_add(padding.saturating_mul(2));
    (start, size.min(total - start))
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
