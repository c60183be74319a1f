//! Page-link sequences for rendering compact pagers such as
//! `1 2 … 5 6 [7] 8 9 … 20 21`.

use serde::Serialize;

use crate::request::PagerShape;

/// One entry of a pager.
///
/// Serializes as the page number, or `null` for a gap, which is what most
/// templates expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageLink {
    Page(u64),
    /// An elided range, rendered as an ellipsis.
    Gap,
}

impl PageLink {
    pub fn page(self) -> Option<u64> {
        match self {
            PageLink::Page(n) => Some(n),
            PageLink::Gap => None,
        }
    }

    pub fn is_gap(self) -> bool {
        matches!(self, PageLink::Gap)
    }
}

/// Lazy iterator over the links of a pager.
///
/// Included pages are the leading edge `1..=left_edge`, the block
/// `page-left_current..=page+right_current`, and the trailing edge of
/// `right_edge` pages. A single [`PageLink::Gap`] separates included pages
/// that are not adjacent.
#[derive(Debug, Clone)]
pub struct PageLinks {
    pages: u64,
    ranges: [(u64, u64); 3],
    last: u64,
    pending: Option<u64>,
}

impl PageLinks {
    pub fn new(page: u64, pages: u64, shape: PagerShape) -> Self {
        let head = (1, shape.left_edge.min(pages));
        let block = (
            page.saturating_sub(shape.left_current).max(1),
            page.saturating_add(shape.right_current).min(pages),
        );
        let tail = (
            pages.saturating_sub(shape.right_edge).saturating_add(1).max(1),
            if shape.right_edge == 0 { 0 } else { pages },
        );
        Self {
            pages,
            ranges: [head, block, tail],
            last: 0,
            pending: None,
        }
    }

    /// Smallest included page strictly greater than `after`.
    fn next_included(&self, after: u64) -> Option<u64> {
        let candidate = after.checked_add(1)?;
        if candidate > self.pages {
            return None;
        }
        self.ranges
            .iter()
            .filter(|&&(lo, hi)| lo <= hi && candidate <= hi)
            .map(|&(lo, _)| lo.max(candidate))
            .min()
    }
}

impl Iterator for PageLinks {
    type Item = PageLink;

    fn next(&mut self) -> Option<PageLink> {
        if let Some(n) = self.pending.take() {
            self.last = n;
            return Some(PageLink::Page(n));
        }
        let n = self.next_included(self.last)?;
        if self.last != 0 && n != self.last + 1 {
            self.pending = Some(n);
            return Some(PageLink::Gap);
        }
        self.last = n;
        Some(PageLink::Page(n))
    }
}

impl std::iter::FusedIterator for PageLinks {}
