//! Hook dispatch runtime
//!
//! Filters pass a value through a priority-ordered chain of callbacks;
//! actions run callbacks for their side effects. Both share one registry
//! per request, see `crate::request::Request`.

pub mod callable;
pub mod registry;
pub mod value;

pub use callable::{Callable, CallbackFn, CallbackId};
pub use registry::{ALL_HOOK, DEFAULT_ARITY, DEFAULT_PRIORITY, HookRegistry};
pub use value::HookValue;

/// Fired once before the first item of a loop: `(loop)`
pub const LOOP_START: &str = "loop_start";

/// Fired for every item a loop advances to: `(item, loop)`
pub const THE_POST: &str = "the_post";

/// Fired once when a loop runs out of items: `(loop)`
pub const LOOP_END: &str = "loop_end";
