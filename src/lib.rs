//! postloop - query loop and hook dispatch runtime
//!
//! Renders content from a foreign store through a legacy template API: a
//! `Query` resolves criteria against a `ContentRepository`, its cursor walks
//! the result and publishes each item into the request's active context, and
//! the `HookRegistry` lets listeners observe and filter along the way. All
//! mutable state is owned by a per-request `Request`.

pub mod config;
pub mod domain;
pub mod error;
pub mod hooks;
pub mod loops;
pub mod query;
pub mod repository;
pub mod request;

pub use error::{Error, Result};
pub use query::Query;
pub use request::Request;
