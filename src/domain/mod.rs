//! Domain types for postloop
//!
//! - ContentItem: the normalized item every loop iterates over
//! - QueryCriteria: what a query asks for
//! - AttributeFilter: key/operator/value constraints on item attributes
//! - QueryResult: what a query produced

pub mod criteria;
pub mod filter;
pub mod item;
pub mod result;

pub use criteria::{
    AuthorFilter, OrderDirection, OrderField, Ordering, PageSize, QueryCriteria, StatusFilter, TypeFilter,
};
pub use filter::{AttributeFilter, CompareOp};
pub use item::{ContentItem, ContentStatus, ItemId, slugify};
pub use result::{QueryResult, ResultKind};
