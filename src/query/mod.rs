//! Query engine
//!
//! Turns `QueryCriteria` into a `QueryPlan`, runs it against a
//! `ContentRepository` and wraps the result in a loopable `Query`.

mod args;
pub mod engine;
pub mod plan;

pub use engine::Query;
pub use plan::{QueryPlan, SearchTerm, page_count, parse_search, resolve_offset};
