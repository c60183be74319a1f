//! Sqlkit-Paginate: page windows over queries, vectors, and iterators.
//!
//! - **Sources**: [`QuerySource`] for anything that can count and slice
//!   itself (SQL queries), [`Vec`] and [`IterSource`] for in-memory data
//! - **Windows**: [`Paginator`] resolves the total once, fetches one window
//!   (optionally padded) and exposes previous/next navigation
//! - **Pagers**: [`PageLinks`] yields page numbers and [`PageLink::Gap`]
//!   markers for compact pager controls
//!
//! # Examples
//!
//! ```
//! use sqlkit_paginate::{PageLink, PageRequest, Paginator};
//!
//! let p = Paginator::from_iterable(1..=490, PageRequest::new(10, 20));
//! assert_eq!(p.pages(), 25);
//! assert_eq!(p.items().first(), Some(&181));
//!
//! let links: Vec<Option<u64>> = p.iter_pages().map(PageLink::page).collect();
//! assert_eq!(links[..3], [Some(1), Some(2), None]);
//! ```

pub mod pager;
pub mod paginator;
pub mod request;
pub mod source;

pub use pager::{PageLink, PageLinks};
pub use paginator::{page_count, paginate, Callback, PageMeta, Paginator};
pub use request::{PageRequest, PagerShape};
pub use source::{IterSource, QuerySource, ResultSource};
