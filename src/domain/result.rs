//! Query results
//!
//! A `QueryResult` is the immutable output of one query: ordered items,
//! pagination metadata and classification flags. Items are kept in the
//! order the repository returned them, duplicates included.

use std::rc::Rc;

use super::item::ContentItem;

/// How a query resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Exactly one item resolved by id or slug
    Single,
    /// A listing that returned items
    Listing,
    /// Nothing matched (or the repository failed)
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    items: Vec<Rc<ContentItem>>,
    found_count: u64,
    page_count: u64,
    kind: ResultKind,
    error: Option<String>,
}

impl QueryResult {
    pub fn single(item: ContentItem) -> Self {
        Self {
            items: vec![Rc::new(item)],
            found_count: 1,
            page_count: 1,
            kind: ResultKind::Single,
            error: None,
        }
    }

    /// A listing page; zero items yields a not-found result that still
    /// reports `found_count` (e.g. a page past the end).
    pub fn listing(items: Vec<ContentItem>, found_count: u64, page_count: u64) -> Self {
        let kind = if items.is_empty() {
            ResultKind::NotFound
        } else {
            ResultKind::Listing
        };
        Self {
            items: items.into_iter().map(Rc::new).collect(),
            found_count,
            page_count: page_count.max(1),
            kind,
            error: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            items: Vec::new(),
            found_count: 0,
            page_count: 1,
            kind: ResultKind::NotFound,
            error: None,
        }
    }

    /// Empty result carrying the repository failure that caused it
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::not_found()
        }
    }

    pub fn items(&self) -> &[Rc<ContentItem>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total matching items before pagination
    pub fn found_count(&self) -> u64 {
        self.found_count
    }

    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    pub fn is_single(&self) -> bool {
        self.kind == ResultKind::Single
    }

    /// Listing that returned more than one item
    pub fn is_archive(&self) -> bool {
        self.kind == ResultKind::Listing && self.items.len() > 1
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ResultKind::NotFound
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
