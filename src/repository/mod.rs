//! Content repository port
//!
//! The query engine depends only on `ContentRepository`. Expected misses are
//! `Ok(None)` / empty results; `RepositoryError` is reserved for a backend
//! that could not answer at all. `InMemoryRepository` is the reference
//! adapter used by the CLI and tests.

mod memory;
mod record;

use thiserror::Error;

use crate::domain::{ContentItem, ItemId};
use crate::query::QueryPlan;

pub use memory::InMemoryRepository;
pub use record::{Author, ContentFixture, RawItem};

/// Failures of the backing store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The backing capability is missing or offline
    #[error("repository unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with an error
    #[error("repository backend failed: {0}")]
    Backend(String),

    /// A stored record could not be normalized into a content item
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Ids matching a plan (one page of them) and the total before pagination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub ids: Vec<ItemId>,
    pub total: u64,
}

/// The content store the query engine reads from
pub trait ContentRepository {
    /// Materialize one item.
    fn find_by_id(&self, id: ItemId) -> Result<Option<ContentItem>, RepositoryError>;

    /// Resolve a slug to an item id.
    fn find_by_slug(&self, slug: &str) -> Result<Option<ItemId>, RepositoryError>;

    /// Resolve an exact title to an item id; used when a slug lookup misses.
    fn find_by_title(&self, _title: &str) -> Result<Option<ItemId>, RepositoryError> {
        Ok(None)
    }

    /// Filter, order and paginate according to `plan`.
    fn search(&self, plan: &QueryPlan) -> Result<SearchResult, RepositoryError>;

    /// Materialize items in the order of `ids`, duplicates included.
    fn load_many(&self, ids: &[ItemId]) -> Result<Vec<ContentItem>, RepositoryError>;
}
