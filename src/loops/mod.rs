//! The loop: cursors over query results and the request's active item.

pub mod context;
pub mod cursor;

pub use context::{ActiveItemContext, PAGE_BREAK, SharedContext, split_pages};
pub use cursor::{LoopCursor, LoopId, LoopPhase, LoopSnapshot};
