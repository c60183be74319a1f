//! Result sources a [`Paginator`](crate::Paginator) can read from.
//!
//! A source either knows how to count and slice itself ([`QuerySource`],
//! typically a SQL query) or has to be materialized to be counted
//! ([`Vec`] and [`IterSource`]). Both are driven through [`ResultSource`],
//! which is what the paginator actually consumes.

use std::convert::Infallible;

/// A source that can count its rows and fetch an `OFFSET`/`LIMIT` slice.
pub trait QuerySource<T> {
    /// Error raised by the underlying store.
    type Error;

    /// Total number of rows the source would produce.
    fn count(&self) -> Result<u64, Self::Error>;

    /// Fetch at most `limit` rows starting at `offset`, in source order.
    fn slice(&self, offset: u64, limit: u64) -> Result<Vec<T>, Self::Error>;

    /// Fetch every row. `total` is the row count already resolved by the
    /// caller, so the default never counts again.
    fn fetch_all(&self, total: u64) -> Result<Vec<T>, Self::Error> {
        self.slice(0, total)
    }
}

/// The capability interface the paginator consumes.
///
/// `total` is called at most once and only when the caller did not supply a
/// total. Afterwards exactly one of `window` or `all` consumes the source.
pub trait ResultSource<T> {
    /// Error raised while counting or fetching.
    type Error;

    /// Count the rows of the source.
    fn total(&mut self) -> Result<u64, Self::Error>;

    /// Fetch at most `limit` rows starting at `offset`.
    fn window(self, offset: u64, limit: u64) -> Result<Vec<T>, Self::Error>;

    /// Return the source unmodified. `total` is the resolved row count.
    fn all(self, total: u64) -> Result<Vec<T>, Self::Error>;
}

impl<T, Q> ResultSource<T> for &Q
where
    Q: QuerySource<T>,
{
    type Error = Q::Error;

    fn total(&mut self) -> Result<u64, Self::Error> {
        self.count()
    }

    fn window(self, offset: u64, limit: u64) -> Result<Vec<T>, Self::Error> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.slice(offset, limit)
    }

    fn all(self, total: u64) -> Result<Vec<T>, Self::Error> {
        self.fetch_all(total)
    }
}

impl<T> ResultSource<T> for Vec<T> {
    type Error = Infallible;

    fn total(&mut self) -> Result<u64, Self::Error> {
        Ok(self.len() as u64)
    }

    fn window(mut self, offset: u64, limit: u64) -> Result<Vec<T>, Self::Error> {
        Ok(take_window(&mut self, offset, limit))
    }

    fn all(self, _total: u64) -> Result<Vec<T>, Self::Error> {
        Ok(self)
    }
}

/// Adapter for any iterable that cannot count itself.
///
/// Counting drains the iterator into memory, so pagination over an
/// `IterSource` is O(n) in the size of the whole source. Supply a total in
/// the request, or use a [`QuerySource`], when the source is large.
pub struct IterSource<I: IntoIterator> {
    pending: Option<I>,
    items: Vec<I::Item>,
}

impl<I: IntoIterator> IterSource<I> {
    pub fn new(iter: I) -> Self {
        Self {
            pending: Some(iter),
            items: Vec::new(),
        }
    }

    fn materialize(&mut self) -> &[I::Item] {
        if let Some(iter) = self.pending.take() {
            self.items = iter.into_iter().collect();
            tracing::debug!(
                count = self.items.len(),
                "materialized non-countable source to resolve its total"
            );
        }
        &self.items
    }
}

impl<I: IntoIterator> ResultSource<I::Item> for IterSource<I> {
    type Error = Infallible;

    fn total(&mut self) -> Result<u64, Self::Error> {
        Ok(self.materialize().len() as u64)
    }

    fn window(mut self, offset: u64, limit: u64) -> Result<Vec<I::Item>, Self::Error> {
        let items = match self.pending {
            // Total was supplied by the caller; only walk as far as needed.
            Some(iter) => iter
                .into_iter()
                .skip(to_usize(offset))
                .take(to_usize(limit))
                .collect(),
            None => take_window(&mut self.items, offset, limit),
        };
        Ok(items)
    }

    fn all(self, _total: u64) -> Result<Vec<I::Item>, Self::Error> {
        Ok(match self.pending {
            Some(iter) => iter.into_iter().collect(),
            None => self.items,
        })
    }
}

fn take_window<T>(items: &mut Vec<T>, offset: u64, limit: u64) -> Vec<T> {
    let start = to_usize(offset).min(items.len());
    let end = start.saturating_add(to_usize(limit)).min(items.len());
    items.drain(start..end).collect()
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}
