//! Request scope
//!
//! Everything the loop engine mutates lives here: the hook registry (with its
//! dispatch stack and fire counters), the active item context and the loop id
//! sequence. Build one `Request` per render request and pass it by reference
//! to queries and cursors; nothing is shared between requests.

use std::cell::{Cell, Ref, RefMut};
use std::rc::Rc;

use crate::config::QueryConfig;
use crate::hooks::HookRegistry;
use crate::loops::{ActiveItemContext, LoopId, SharedContext};

#[derive(Debug, Default)]
pub struct Request {
    hooks: HookRegistry,
    context: SharedContext,
    defaults: QueryConfig,
    next_loop_id: Cell<LoopId>,
}

impl Request {
    /// A fresh request with default query settings
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh request using the given query defaults
    pub fn with_config(defaults: QueryConfig) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn context(&self) -> Ref<'_, ActiveItemContext> {
        self.context.borrow()
    }

    /// Mutable access for cursors and for callers setting the requested
    /// page or show-full flag. Do not hold it across a hook dispatch.
    pub fn context_mut(&self) -> RefMut<'_, ActiveItemContext> {
        self.context.borrow_mut()
    }

    /// A handle hook listeners can capture to read the current item.
    pub fn shared_context(&self) -> SharedContext {
        Rc::clone(&self.context)
    }

    pub fn query_defaults(&self) -> &QueryConfig {
        &self.defaults
    }

    /// Allocate the id for a new loop; ids start at 1.
    pub fn next_loop_id(&self) -> LoopId {
        let id = self.next_loop_id.get() + 1;
        self.next_loop_id.set(id);
        id
    }
}
